use thiserror::Error;

/// All errors that can occur in paperwatch-core.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Store error in {path}: {message}")]
    StoreError { path: String, message: String },

    #[error("Invalid legacy record: {0}")]
    LegacyRecord(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
