//! Optional config file loading. Search order: ./hdrcombine.toml, then
//! $XDG_CONFIG_HOME/hdrcombine/config.toml (or ~/.config/hdrcombine/config.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file contents. All fields optional; only present keys override defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case", default, deny_unknown_fields)]
pub struct Config {
    /// Extension of the files whose content is appended (default "cpp").
    pub source_extension: Option<String>,
    /// Extension of the counterpart files that receive it (default "h").
    pub target_extension: Option<String>,
    /// Candidate encodings in priority order, as labels (default ["utf-8", "euc-kr"]).
    pub encodings: Option<Vec<String>>,
}

/// Search order: (1) ./hdrcombine.toml, (2) $XDG_CONFIG_HOME/hdrcombine/config.toml.
/// Missing file returns Ok(None). Invalid TOML or I/O error reading a present file returns Err.
pub fn load_config() -> Result<Option<Config>, String> {
    let cwd = std::env::current_dir()
        .map_err(|e| format!("Cannot determine current directory: {}", e))?;
    let mut paths = vec![cwd.join("hdrcombine.toml")];
    if let Some(d) = dirs::config_dir() {
        paths.push(d.join("hdrcombine").join("config.toml"));
    }
    load_first(&paths)
}

/// Load the first of `paths` that exists.
pub fn load_first(paths: &[PathBuf]) -> Result<Option<Config>, String> {
    match paths.iter().find(|p| p.exists()) {
        Some(path) => load_file(path).map(Some),
        None => Ok(None),
    }
}

fn load_file(path: &Path) -> Result<Config, String> {
    let s = std::fs::read_to_string(path)
        .map_err(|e| format!("Cannot read config {}: {}", path.display(), e))?;
    toml::from_str(&s).map_err(|e| format!("Invalid config {}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_config() {
        let c: Config = toml::from_str("").unwrap();
        assert!(c.source_extension.is_none());
        assert!(c.target_extension.is_none());
        assert!(c.encodings.is_none());
    }

    #[test]
    fn parse_full_config() {
        let s = r#"
            source_extension = "cc"
            target_extension = "hh"
            encodings = ["utf-8", "shift_jis", "euc-kr"]
        "#;
        let c: Config = toml::from_str(s).unwrap();
        assert_eq!(c.source_extension.as_deref(), Some("cc"));
        assert_eq!(c.target_extension.as_deref(), Some("hh"));
        assert_eq!(
            c.encodings,
            Some(vec![
                "utf-8".to_string(),
                "shift_jis".to_string(),
                "euc-kr".to_string()
            ])
        );
    }

    #[test]
    fn parse_partial_config() {
        let c: Config = toml::from_str(r#"target_extension = "hpp""#).unwrap();
        assert!(c.source_extension.is_none());
        assert_eq!(c.target_extension.as_deref(), Some("hpp"));
        assert!(c.encodings.is_none());
    }

    #[test]
    fn invalid_toml_errors() {
        assert!(toml::from_str::<Config>("encodings = [").is_err());
    }

    #[test]
    fn unknown_key_errors() {
        assert!(toml::from_str::<Config>("output_dir = \"out\"").is_err());
    }

    #[test]
    fn load_first_skips_missing_and_reads_present() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let missing = dir.path().join("absent.toml");
        let present = dir.path().join("hdrcombine.toml");
        std::fs::write(&present, "source_extension = \"c\"")?;

        assert!(load_first(&[missing.clone()])?.is_none());
        let c = load_first(&[missing, present])?.ok_or("config not loaded")?;
        assert_eq!(c.source_extension.as_deref(), Some("c"));
        Ok(())
    }

    #[test]
    fn load_first_reports_invalid_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("hdrcombine.toml");
        std::fs::write(&path, "encodings = 3")?;
        let err = load_first(&[path]).err().ok_or("expected error")?;
        assert!(err.starts_with("Invalid config "));
        Ok(())
    }
}
