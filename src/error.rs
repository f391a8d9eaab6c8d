//! Error types for schema verification and instance validation

use thiserror::Error;

/// Result type for the loading and configuration surfaces
pub type Result<T> = std::result::Result<T, Error>;

/// A schema correctness violation.
///
/// Only the first violation found is reported; a schema that produces one of
/// these must be fixed before it can be used for validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("ambiguous or invalid schema form")]
    InvalidForm,

    #[error("no such definition: {0}")]
    NoSuchDefinition(String),

    #[error("no such type: {0}")]
    InvalidType(String),

    #[error("repeated enum value: {0}")]
    RepeatedEnumValue(String),

    #[error("repeated property in properties and optionalProperties: {0}")]
    RepeatedProperty(String),

    #[error("value of discriminator mapping is not of properties form")]
    NonPropertiesMapping,

    #[error("discriminator tag repeated in properties or optionalProperties: {0}")]
    RepeatedTagInProperties(String),
}

/// Failure of the validation engine itself.
///
/// This is distinct from an instance being invalid: invalid instances are
/// reported through [`crate::ValidationResult`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidateError {
    #[error("maximum evaluation depth exceeded")]
    MaxDepthExceeded,
}

/// Errors from the surfaces around the core: decoding, configuration and I/O
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),
}
