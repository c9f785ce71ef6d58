use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::BenchError;
use crate::types::{OutputFormat, SubjectName};

pub const CONFIG_ENV: &str = "ULPBENCH_CONFIG";
pub const SEED_ENV: &str = "ULPBENCH_SEED";
pub const SUBJECT_ENV: &str = "ULPBENCH_SUBJECT";
pub const FORMAT_ENV: &str = "ULPBENCH_FORMAT";
pub const LOG_ENV: &str = "ULPBENCH_LOG";

/// Run settings that are not part of the command line.
///
/// Layered as defaults, then the TOML config file, then `ULPBENCH_*`
/// environment variables.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Fixed PRNG seed. A fresh one is drawn per run when absent.
    pub seed: Option<u64>,
    pub subject: SubjectName,
    pub format: OutputFormat,
    /// `tracing` filter directives, e.g. `ulpbench=debug`.
    pub log: Option<String>,
}

impl Config {
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, BenchError> {
        toml::from_str(text).map_err(|source| BenchError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, BenchError> {
        let text = std::fs::read_to_string(path).map_err(|source| BenchError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text, path)
    }

    /// `{config_dir}/ulpbench/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ulpbench").join("config.toml"))
    }

    /// Resolve the effective configuration.
    ///
    /// `var` looks up an environment variable; pass `|k| std::env::var(k).ok()`
    /// in production. A file named by `ULPBENCH_CONFIG` must exist, the
    /// default location is optional.
    pub fn resolve<F>(var: F, default_path: Option<PathBuf>) -> Result<Self, BenchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match var(CONFIG_ENV).filter(|v| !v.trim().is_empty()) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => match default_path {
                Some(path) if path.is_file() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        if let Some(value) = var(SEED_ENV) {
            let seed = value.trim().parse().map_err(|_| BenchError::InvalidSetting {
                key: SEED_ENV,
                value: value.clone(),
            })?;
            config.seed = Some(seed);
        }
        if let Some(value) = var(SUBJECT_ENV) {
            config.subject = value.parse()?;
        }
        if let Some(value) = var(FORMAT_ENV) {
            config.format = value.parse()?;
        }
        if let Some(value) = var(LOG_ENV).filter(|v| !v.trim().is_empty()) {
            config.log = Some(value);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_without_file_or_env() {
        let config = Config::resolve(lookup(&[]), None).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.subject, SubjectName::SqrtDiff);
        assert_eq!(config.format, OutputFormat::Text);
        assert!(config.seed.is_none());
    }

    #[test]
    fn missing_default_file_is_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("ulpbench").join("config.toml");
        let config = Config::resolve(lookup(&[]), Some(path)).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn file_settings_are_loaded() {
        let file = write_config("seed = 12\nsubject = \"hypot\"\nformat = \"json\"\n");
        let config = Config::resolve(lookup(&[]), Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.seed, Some(12));
        assert_eq!(config.subject, SubjectName::Hypot);
        assert_eq!(config.format, OutputFormat::Json);
    }

    #[test]
    fn env_overrides_file() {
        let file = write_config("seed = 12\nsubject = \"hypot\"\n");
        let path = file.path().to_str().unwrap().to_string();
        let config = Config::resolve(
            lookup(&[
                (CONFIG_ENV, path.as_str()),
                (SEED_ENV, " 99 "),
                (SUBJECT_ENV, "fma"),
                (LOG_ENV, "debug"),
            ]),
            None,
        )
        .unwrap();
        assert_eq!(config.seed, Some(99));
        assert_eq!(config.subject, SubjectName::Fma);
        assert_eq!(config.log.as_deref(), Some("debug"));
    }

    #[test]
    fn explicit_config_path_must_exist() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("absent.toml");
        let err = Config::resolve(
            lookup(&[(CONFIG_ENV, path.to_str().unwrap())]),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, BenchError::ConfigRead { .. }));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let file = write_config("iterations = 5\n");
        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, BenchError::ConfigParse { .. }));
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn bad_seed_is_reported() {
        let err = Config::resolve(lookup(&[(SEED_ENV, "abc")]), None).unwrap_err();
        assert!(matches!(err, BenchError::InvalidSetting { key: SEED_ENV, .. }));
        assert_eq!(err.to_string(), "Invalid value 'abc' for ULPBENCH_SEED");
    }

    #[test]
    fn bad_subject_is_reported() {
        let err = Config::resolve(lookup(&[(SUBJECT_ENV, "tan")]), None).unwrap_err();
        assert!(matches!(err, BenchError::UnknownSubject { .. }));
    }
}
