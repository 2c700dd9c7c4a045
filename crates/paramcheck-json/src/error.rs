/// Errors that can occur while loading or using schema documents.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The schema file could not be loaded.
    #[error("failed to load schema: {0}")]
    LoadFailed(String),

    /// The schema document is not valid JSON or has unknown fields.
    #[error("schema document is not valid: {0}")]
    Json(#[from] serde_json::Error),

    /// The document compiled into an invalid parameter tree.
    #[error("failed to build schema: {0}")]
    Schema(#[from] paramcheck_core::SchemaError),

    /// The document combines settings that do not fit together.
    #[error("invalid schema document: {0}")]
    InvalidDocument(String),

    /// No schema registered under the given name.
    #[error("no schema registered under '{0}'")]
    NoSchema(String),
}

pub type Result<T> = std::result::Result<T, RegistryError>;
