//! Appends a source file's text to its counterpart, under the counterpart's encoding.

use crate::combine::encoding::{encode_lossy, DecodedContent, EncodingResolver};
use crate::combine::error::MergeError;
use crate::model::{FilePair, MergeOutcome, MergeStatus};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Character repeated to draw the separator rules.
pub const RULE_CHAR: char = '=';
/// Width of each separator rule.
pub const RULE_WIDTH: usize = 80;

/// Separator written before the appended content. Existing merged files use this exact
/// layout: two blank lines, a rule, a `//` line naming the source, a rule, two blank lines.
pub fn separator(source_name: &str) -> String {
    let rule = RULE_CHAR.to_string().repeat(RULE_WIDTH);
    format!("\n\n{rule}\n// {source_name} file content\n{rule}\n\n")
}

enum Attempt {
    CounterpartMissing,
    Appended(AppendReport),
}

struct AppendReport {
    source: Side,
    counterpart: Side,
    replaced: usize,
}

/// What the resolver decided for one file.
struct Side {
    encoding: &'static str,
    lossy: bool,
    malformed: usize,
    first_malformed: Option<usize>,
}

impl Side {
    fn of(content: &DecodedContent) -> Self {
        Side {
            encoding: content.encoding_name(),
            lossy: content.lossy,
            malformed: content.malformed_offsets.len(),
            first_malformed: content.malformed_offsets.first().copied(),
        }
    }

    fn describe(&self, role: &str, primary: &str) -> String {
        match (self.lossy, self.first_malformed) {
            (true, Some(offset)) => format!(
                "{} {} fallback, {} malformed sequence(s) under {}, first at byte {}",
                role, self.encoding, self.malformed, primary, offset
            ),
            (true, None) => format!("{} {} fallback", role, self.encoding),
            (false, _) => format!("{} {}", role, self.encoding),
        }
    }
}

/// Merge one pair. Never returns an error: every failure becomes the outcome's status.
pub fn merge_pair(pair: &FilePair, resolver: &EncodingResolver) -> MergeOutcome {
    let (status, detail) = match try_merge(pair, resolver) {
        Ok(Attempt::CounterpartMissing) => (
            MergeStatus::CounterpartMissing,
            format!("{} not found", pair.counterpart_path.display()),
        ),
        Ok(Attempt::Appended(report)) => {
            let primary = resolver
                .candidates()
                .first()
                .map(|e| e.name())
                .unwrap_or_default();
            let mut detail = format!(
                "{}, {}",
                report.source.describe("source", primary),
                report.counterpart.describe("counterpart", primary)
            );
            if report.replaced > 0 {
                detail.push_str(&format!(
                    "; {} character(s) not representable in {} replaced with '?'",
                    report.replaced, report.counterpart.encoding
                ));
            }
            let status = if report.source.lossy || report.counterpart.lossy {
                MergeStatus::DecodeFallback
            } else {
                MergeStatus::Merged
            };
            (status, detail)
        }
        Err(e) => {
            tracing::debug!(
                source = %pair.source_path.display(),
                error = %e,
                "merge failed"
            );
            (MergeStatus::IoError, e.to_string())
        }
    };
    MergeOutcome {
        pair: pair.clone(),
        status,
        detail,
    }
}

fn try_merge(pair: &FilePair, resolver: &EncodingResolver) -> Result<Attempt, MergeError> {
    let counterpart_path = &pair.counterpart_path;
    match fs::metadata(counterpart_path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(Attempt::CounterpartMissing)
        }
        Err(source) => {
            return Err(MergeError::Metadata {
                path: counterpart_path.clone(),
                source,
            })
        }
        Ok(meta) if !meta.is_file() => {
            return Err(MergeError::CounterpartNotFile {
                path: counterpart_path.clone(),
            })
        }
        Ok(_) => {}
    }

    let source = resolver.resolve(read_bytes(&pair.source_path)?);
    log_resolved(&pair.source_path, &source);
    // Only the encoding matters; the counterpart's existing bytes are left as they are.
    let counterpart = resolver.resolve(read_bytes(counterpart_path)?);
    log_resolved(counterpart_path, &counterpart);

    let mut text = separator(&pair.source_name());
    text.push_str(source.text_without_bom());
    let encoded = encode_lossy(counterpart.encoding, &text);
    if encoded.replaced > 0 {
        tracing::debug!(
            path = %counterpart_path.display(),
            encoding = counterpart.encoding_name(),
            replaced = encoded.replaced,
            "characters replaced while re-encoding"
        );
    }
    append(counterpart_path, &encoded.bytes)?;

    Ok(Attempt::Appended(AppendReport {
        source: Side::of(&source),
        counterpart: Side::of(&counterpart),
        replaced: encoded.replaced,
    }))
}

/// Per-file trace only. Anything the user must see is already in the outcome detail.
fn log_resolved(path: &Path, content: &DecodedContent) {
    tracing::debug!(
        path = %path.display(),
        encoding = content.encoding_name(),
        lossy = content.lossy,
        malformed = content.malformed_offsets.len(),
        bytes = content.bytes.len(),
        "resolved encoding"
    );
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, MergeError> {
    fs::read(path).map_err(|source| MergeError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Append `bytes` to an existing file. Never creates or truncates.
fn append(path: &Path, bytes: &[u8]) -> Result<(), MergeError> {
    let mut file = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|source| MergeError::OpenAppend {
            path: path.to_path_buf(),
            source,
        })?;
    file.write_all(bytes)
        .and_then(|()| file.flush())
        .map_err(|source| MergeError::Write {
            path: path.to_path_buf(),
            source,
        })
}
