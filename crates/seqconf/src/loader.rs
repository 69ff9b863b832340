//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, SeqConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local).
/// Only returns files that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with an explicit override path.
///
/// If `override_path` is provided and exists, it replaces the local override.
pub fn discover_config_files_with_override(override_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/seqlearn/config.toml");
    if system.exists() {
        files.push(system);
    }

    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("seqlearn/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = override_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("seqlearn.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Load and merge the given files in order, starting from compiled defaults.
pub fn load_files(paths: &[PathBuf]) -> Result<SeqConfig, ConfigError> {
    let mut merged = toml::Table::new();
    for path in paths {
        let table = load_table(path)?;
        merge_tables(&mut merged, table);
    }

    toml::Value::Table(merged)
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::Parse {
            path: paths.last().cloned().unwrap_or_default(),
            message: e.to_string(),
        })
}

/// Read one file as a raw TOML table.
///
/// The table is also checked against the config schema so type errors are
/// reported against the file that introduced them.
pub fn load_table(path: &Path) -> Result<toml::Table, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_table(&contents, path)
}

fn parse_table(contents: &str, path: &Path) -> Result<toml::Table, ConfigError> {
    let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let _: SeqConfig = toml::Value::Table(table.clone())
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    Ok(table)
}

/// Overlay `overlay` onto `base`; nested tables merge, everything else replaces.
pub fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Apply `SEQLEARN_*` environment variable overrides.
pub fn apply_env_overrides(config: &mut SeqConfig, sources: &mut ConfigSources) {
    apply_overrides_from(config, sources, |name| env::var(name).ok());
}

/// Apply overrides from an arbitrary variable lookup.
///
/// Numeric variables that fail to parse are skipped.
pub fn apply_overrides_from<F>(config: &mut SeqConfig, sources: &mut ConfigSources, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("SEQLEARN_STEPS_PER_BEAT") {
        if let Ok(steps) = v.parse() {
            config.quantize.steps_per_beat = steps;
            sources.env_overrides.push("SEQLEARN_STEPS_PER_BEAT".to_string());
        }
    }
    if let Some(v) = lookup("SEQLEARN_MIN_NOTE") {
        if let Ok(note) = v.parse() {
            config.codec.min_note = note;
            sources.env_overrides.push("SEQLEARN_MIN_NOTE".to_string());
        }
    }
    if let Some(v) = lookup("SEQLEARN_MAX_NOTE") {
        if let Ok(note) = v.parse() {
            config.codec.max_note = note;
            sources.env_overrides.push("SEQLEARN_MAX_NOTE".to_string());
        }
    }
    if let Some(v) = lookup("SEQLEARN_TRANSPOSE_TO_KEY") {
        if let Ok(key) = v.parse() {
            config.codec.transpose_to_key = key;
            sources.env_overrides.push("SEQLEARN_TRANSPOSE_TO_KEY".to_string());
        }
    }
    if let Some(v) = lookup("SEQLEARN_LOG_LEVEL") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("SEQLEARN_LOG_LEVEL".to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_discover_config_files() {
        // Just verify it doesn't panic
        let _files = discover_config_files();
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml = r#"
[codec]
min_note = 36
"#;
        let table = parse_table(toml, Path::new("test.toml")).unwrap();
        let config: SeqConfig = toml::Value::Table(table).try_into().unwrap();
        assert_eq!(config.codec.min_note, 36);
        // Other values should be defaults
        assert_eq!(config.codec.max_note, 84);
        assert_eq!(config.quantize.steps_per_beat, 4);
    }

    #[test]
    fn test_parse_rejects_wrong_type() {
        let toml = r#"
[quantize]
steps_per_beat = "four"
"#;
        let err = parse_table(toml, Path::new("bad.toml")).unwrap_err();
        match err {
            ConfigError::Parse { path, .. } => assert_eq!(path, PathBuf::from("bad.toml")),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_later_files_win_per_key() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.toml");
        let second = dir.path().join("second.toml");
        std::fs::write(&first, "[codec]\nmin_note = 40\nmax_note = 90\n").unwrap();
        std::fs::write(&second, "[codec]\nmax_note = 100\n").unwrap();

        let config = load_files(&[first, second]).unwrap();
        assert_eq!(config.codec.min_note, 40);
        assert_eq!(config.codec.max_note, 100);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = load_files(&[missing]).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("SEQLEARN_STEPS_PER_BEAT", "12"),
            ("SEQLEARN_MIN_NOTE", "not-a-number"),
            ("SEQLEARN_LOG_LEVEL", "trace"),
        ]
        .into_iter()
        .collect();

        let mut config = SeqConfig::default();
        let mut sources = ConfigSources::default();
        apply_overrides_from(&mut config, &mut sources, |name| {
            vars.get(name).map(|v| v.to_string())
        });

        assert_eq!(config.quantize.steps_per_beat, 12);
        assert_eq!(config.codec.min_note, 48);
        assert_eq!(config.telemetry.log_level, "trace");
        assert_eq!(
            sources.env_overrides,
            vec!["SEQLEARN_STEPS_PER_BEAT", "SEQLEARN_LOG_LEVEL"]
        );
    }
}
