/// Errors raised while building a schema.
///
/// These are authoring mistakes. They surface from `build()` at startup and
/// never from `check`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// A leaf, custom, or named object parameter was given an empty name.
    #[error("parameter name must not be empty")]
    EmptyName,

    /// A leaf parameter was built without any check predicate.
    #[error(
        "no checks provided for parameter '{0}' (use checks::always_pass() if it should only be present)"
    )]
    MissingChecks(String),

    /// Two children of the same object parameter share a name.
    #[error("parameter '{name}' declared more than once in object '{object}'")]
    DuplicateParameter { object: String, name: String },
}

pub type Result<T> = std::result::Result<T, SchemaError>;
