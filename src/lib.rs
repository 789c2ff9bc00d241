//! hdrcombine: appends C++ sources to their paired headers, keeping each header's encoding.

pub mod cli;
pub mod combine;
pub mod config;
pub mod listing;
pub mod model;

// Re-exports for CLI and consumers.
pub use combine::{
    locate_pairs, merge_pair, run_all, DecodedContent, EncodingResolver, ExtensionPair,
    MergeError, RunOptions,
};
pub use listing::{parse_listing, ListingError, ListingRecord, ListingSelectors};
pub use model::{AggregateResult, FilePair, MergeOutcome, MergeStatus};
