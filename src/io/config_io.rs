use std::fs;
use std::path::{Path, PathBuf};

use crate::io::store_io::atomic_write;
use crate::model::config::Config;

/// Error type for config file operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config.toml: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("could not parse config.toml: {0}")]
    DocumentError(#[from] toml_edit::TomlError),
    #[error("invalid config key: {0} (expected section.key, e.g. tasks.on_duplicate)")]
    InvalidKey(String),
    #[error("config key not set: {0}")]
    MissingKey(String),
}

/// Read the config, returning both the parsed config and the raw
/// toml_edit document for round-trip-safe editing. A missing file yields
/// defaults and an empty document.
pub fn read_config(path: &Path) -> Result<(Config, toml_edit::DocumentMut), ConfigError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            String::new()
        }
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };
    let config: Config = toml::from_str(&text)?;
    let doc: toml_edit::DocumentMut = text.parse()?;
    Ok((config, doc))
}

/// Write the config document back to disk, preserving formatting.
pub fn write_config(path: &Path, doc: &toml_edit::DocumentMut) -> Result<(), ConfigError> {
    atomic_write(path, doc.to_string().as_bytes()).map_err(|e| ConfigError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

fn split_key(key: &str) -> Result<(&str, &str), ConfigError> {
    match key.split_once('.') {
        Some((section, field)) if !section.is_empty() && !field.is_empty() => {
            Ok((section, field))
        }
        _ => Err(ConfigError::InvalidKey(key.to_string())),
    }
}

/// Look up a `section.key` value as display text
pub fn get_value(doc: &toml_edit::DocumentMut, key: &str) -> Result<String, ConfigError> {
    let (section, field) = split_key(key)?;
    let item = doc
        .get(section)
        .and_then(|s| s.get(field))
        .ok_or_else(|| ConfigError::MissingKey(key.to_string()))?;
    Ok(match item.as_str() {
        Some(s) => s.to_string(),
        None => item.to_string().trim().to_string(),
    })
}

/// Set a `section.key` value. Integers and booleans are stored as such,
/// everything else as a string. The result must still parse as a `Config`.
pub fn set_value(
    doc: &mut toml_edit::DocumentMut,
    key: &str,
    value: &str,
) -> Result<Config, ConfigError> {
    let (section, field) = split_key(key)?;
    if !doc.contains_key(section) {
        doc[section] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    doc[section][field] = if let Ok(n) = value.parse::<i64>() {
        toml_edit::value(n)
    } else if let Ok(b) = value.parse::<bool>() {
        toml_edit::value(b)
    } else {
        toml_edit::value(value)
    };
    let config: Config = toml::from_str(&doc.to_string())?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::DuplicatePolicy;
    use tempfile::TempDir;

    fn sample_config() -> &'static str {
        r#"# my settings
[tasks]
id_prefix = "J"   # job
on_duplicate = "merge"
"#
    }

    #[test]
    fn round_trip_preserves_comments() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, sample_config()).unwrap();

        let (config, doc) = read_config(&path).unwrap();
        assert_eq!(config.tasks.id_prefix, "J");
        write_config(&path, &doc).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), sample_config());
    }

    #[test]
    fn missing_file_is_default() {
        let tmp = TempDir::new().unwrap();
        let (config, doc) = read_config(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert!(doc.is_empty());
    }

    #[test]
    fn set_and_get() {
        let mut doc: toml_edit::DocumentMut = sample_config().parse().unwrap();
        let config = set_value(&mut doc, "tasks.on_duplicate", "reject").unwrap();
        assert_eq!(config.tasks.on_duplicate, DuplicatePolicy::Reject);
        assert_eq!(get_value(&doc, "tasks.on_duplicate").unwrap(), "reject");
        assert!(doc.to_string().contains("# job"));

        let config = set_value(&mut doc, "watch.tick_ms", "250").unwrap();
        assert_eq!(config.watch.tick_ms, 250);
        assert_eq!(get_value(&doc, "watch.tick_ms").unwrap(), "250");
    }

    #[test]
    fn set_rejects_invalid_values() {
        let mut doc: toml_edit::DocumentMut = sample_config().parse().unwrap();
        assert!(matches!(
            set_value(&mut doc, "tasks.on_duplicate", "ask"),
            Err(ConfigError::ParseError(_))
        ));
        assert!(matches!(
            set_value(&mut doc, "tick_ms", "5"),
            Err(ConfigError::InvalidKey(_))
        ));
    }

    #[test]
    fn get_missing_key() {
        let doc: toml_edit::DocumentMut = sample_config().parse().unwrap();
        assert!(matches!(
            get_value(&doc, "watch.tick_ms"),
            Err(ConfigError::MissingKey(_))
        ));
    }
}
