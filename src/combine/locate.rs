//! Pair location: source files in one directory and their counterpart paths.

use crate::combine::error::MergeError;
use crate::model::FilePair;
use std::fs;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_SOURCE_EXTENSION: &str = "cpp";
pub const DEFAULT_TARGET_EXTENSION: &str = "h";

/// Source and target file extensions, without leading dots.
///
/// The two must differ so that substituting one for the other maps every source file to a
/// distinct counterpart that is never itself a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionPair {
    source: String,
    target: String,
}

impl Default for ExtensionPair {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE_EXTENSION.to_string(),
            target: DEFAULT_TARGET_EXTENSION.to_string(),
        }
    }
}

impl ExtensionPair {
    /// Validate and build a pair. A single leading dot on either side is accepted and dropped.
    pub fn new(source: &str, target: &str) -> Result<Self, MergeError> {
        let input = format!("{}:{}", source, target);
        let source = normalize_extension(source, &input)?;
        let target = normalize_extension(target, &input)?;
        if source == target {
            return Err(MergeError::InvalidExtensions {
                input,
                reason: "source and target extensions must differ".to_string(),
            });
        }
        Ok(Self { source, target })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl FromStr for ExtensionPair {
    type Err = MergeError;

    /// Parse `SRC:TGT`, e.g. `cpp:h` or `.cc:.hh`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (source, target) = s.trim().split_once(':').ok_or_else(|| {
            MergeError::InvalidExtensions {
                input: s.to_string(),
                reason: "expected 'source:target' (e.g. cpp:h)".to_string(),
            }
        })?;
        Self::new(source.trim(), target.trim())
    }
}

fn normalize_extension(ext: &str, input: &str) -> Result<String, MergeError> {
    let ext = ext.strip_prefix('.').unwrap_or(ext);
    let reason = if ext.is_empty() {
        Some("extension is empty")
    } else if ext.contains('.') {
        Some("extension must not contain '.'")
    } else if ext.contains(['/', '\\']) {
        Some("extension must not contain a path separator")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(MergeError::InvalidExtensions {
            input: input.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(ext.to_string()),
    }
}

/// Every regular file directly in `directory` with the source extension, paired with its
/// counterpart path, sorted by file name. Hidden files are skipped. The extension match is
/// case-sensitive.
///
/// An entry that cannot be stat'ed (other than a dangling link) is still returned, so its
/// merge fails with the underlying error instead of vanishing from the report. Counterpart
/// existence is not checked here.
pub fn locate_pairs(
    directory: &Path,
    extensions: &ExtensionPair,
) -> Result<Vec<FilePair>, MergeError> {
    let read_dir_err = |source: std::io::Error| MergeError::ReadDir {
        path: directory.to_path_buf(),
        source,
    };
    let mut sources = Vec::new();
    for entry in fs::read_dir(directory).map_err(read_dir_err)? {
        let path = entry.map_err(read_dir_err)?.path();
        let hidden = path
            .file_name()
            .map(|n| n.to_string_lossy().starts_with('.'))
            .unwrap_or(true);
        if hidden || path.extension().map_or(true, |e| e != extensions.source()) {
            continue;
        }
        // Follows symlinks; dangling links and directories named *.cpp are not sources.
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => continue,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "skipping dangling link");
                continue;
            }
            // Kept as a source so the merge reports the error for this pair.
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "cannot stat source");
            }
        }
        sources.push(path);
    }
    sources.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let pairs: Vec<FilePair> = sources
        .into_iter()
        .map(|source_path| FilePair {
            counterpart_path: source_path.with_extension(extensions.target()),
            source_path,
        })
        .collect();
    tracing::debug!(
        directory = %directory.display(),
        count = pairs.len(),
        "located source files"
    );
    Ok(pairs)
}
