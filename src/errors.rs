use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum BenchError {
    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value '{value}' for {key}")]
    InvalidSetting { key: &'static str, value: String },

    #[error("Unknown subject '{name}'. Supported: sqrt-diff, hypot, fma")]
    UnknownSubject { name: String },
}
