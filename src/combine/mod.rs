//! Source-to-counterpart merging: pair location, encoding resolution, append, and the
//! directory-wide run that aggregates outcomes.

pub mod encoding;
mod error;
mod locate;
mod merger;

pub use encoding::{encode_lossy, DecodedContent, EncodedText, EncodingResolver};
pub use error::MergeError;
pub use locate::{locate_pairs, ExtensionPair};
pub use merger::{merge_pair, separator, RULE_CHAR, RULE_WIDTH};

use crate::model::{AggregateResult, MergeOutcome};
use std::path::Path;

/// Settings for one `run_all` call.
#[derive(Default)]
pub struct RunOptions<'a> {
    pub extensions: ExtensionPair,
    pub resolver: EncodingResolver,
    /// Called once per outcome, in processing order, as soon as the pair is done.
    pub on_outcome: Option<&'a dyn Fn(&MergeOutcome)>,
}

/// Merge every source file in `directory` into its counterpart.
///
/// Pairs are processed one at a time in locator order and every outcome is kept; a failed
/// pair never stops the run. Only an unusable root ends it early, with no outcomes and
/// `all_succeeded = false`.
pub fn run_all(directory: &Path, options: &RunOptions<'_>) -> AggregateResult {
    let pairs = match check_root(directory)
        .and_then(|()| locate_pairs(directory, &options.extensions))
    {
        Ok(pairs) => pairs,
        Err(e) => {
            tracing::debug!(
                directory = %directory.display(),
                error = %e,
                "cannot process directory"
            );
            return AggregateResult::root_failure(e.to_string());
        }
    };

    let mut outcomes = Vec::with_capacity(pairs.len());
    for pair in &pairs {
        let outcome = merge_pair(pair, &options.resolver);
        if let Some(cb) = options.on_outcome {
            cb(&outcome);
        }
        outcomes.push(outcome);
    }
    AggregateResult::from_outcomes(outcomes)
}

fn check_root(directory: &Path) -> Result<(), MergeError> {
    let invalid = |reason: String| MergeError::InvalidRoot {
        path: directory.to_path_buf(),
        reason,
    };
    match std::fs::metadata(directory) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(invalid("not a directory".to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(invalid("does not exist".to_string()))
        }
        Err(e) => Err(invalid(e.to_string())),
    }
}
