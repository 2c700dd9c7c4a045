use std::fmt;

use crate::config::{DEFAULT_MISSING_MESSAGE, DEFAULT_NULL_MESSAGE};

/// Classification of a failed check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The parameter was not provided.
    MissingRequiredParameter,
    /// The parameter was explicitly null but null is not accepted.
    InvalidNullParameter,
    /// The parameter was provided but a check predicate rejected it.
    InvalidParameterValue,
    /// The parameter could not be read or formatted as the declared type.
    ParameterCastFailure,
    /// A conditionally-required group of parameters was jointly absent.
    MultipleMissingParameters,
}

impl ErrorKind {
    /// Stable snake_case identifier, suitable for wire output.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::MissingRequiredParameter => "missing_required_parameter",
            ErrorKind::InvalidNullParameter => "invalid_null_parameter",
            ErrorKind::InvalidParameterValue => "invalid_parameter_value",
            ErrorKind::ParameterCastFailure => "parameter_cast_failure",
            ErrorKind::MultipleMissingParameters => "multiple_missing_parameters",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed check, as seen by whoever called `check`.
///
/// `path` lists the names from the outermost named object down to the
/// parameter that failed. Ancestors only ever prepend to it; `kind`,
/// `message`, and `safe_to_show` travel up unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamFailure {
    pub path: Vec<String>,
    pub kind: ErrorKind,
    pub message: String,
    /// Whether `message` may be returned verbatim to the external caller.
    pub safe_to_show: bool,
}

impl ParamFailure {
    /// Create a failure with an empty path.
    pub fn new(kind: ErrorKind, message: impl Into<String>, safe_to_show: bool) -> Self {
        Self {
            path: Vec::new(),
            kind,
            message: message.into(),
            safe_to_show,
        }
    }

    /// `name` was not provided.
    pub fn missing(name: &str) -> Self {
        Self::new(
            ErrorKind::MissingRequiredParameter,
            DEFAULT_MISSING_MESSAGE,
            true,
        )
        .within(name)
    }

    /// `name` was set to null but does not accept null.
    pub fn null_not_allowed(name: &str) -> Self {
        Self::new(ErrorKind::InvalidNullParameter, DEFAULT_NULL_MESSAGE, true).within(name)
    }

    /// Prepend `parent` to the failing path.
    pub fn within(mut self, parent: impl Into<String>) -> Self {
        self.path.insert(0, parent.into());
        self
    }

    /// Dotted failing path, e.g. `address.zip`. Empty for a root failure.
    pub fn failing_path(&self) -> String {
        self.path.join(".")
    }

    /// Message to hand to the external caller: the literal message when it
    /// is flagged safe, `generic` otherwise.
    pub fn public_message<'a>(&'a self, generic: &'a str) -> &'a str {
        if self.safe_to_show {
            &self.message
        } else {
            generic
        }
    }

    /// True when this is a missing failure for the child that produced it,
    /// rather than for one of that child's descendants.
    pub(crate) fn is_absent_within(&self, depth: usize) -> bool {
        self.kind == ErrorKind::MissingRequiredParameter && self.path.len() <= depth
    }
}

impl fmt::Display for ParamFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}: {}", self.kind, self.message)
        } else {
            write!(f, "{} at '{}': {}", self.kind, self.failing_path(), self.message)
        }
    }
}

impl std::error::Error for ParamFailure {}

/// Why a retriever, formatter, or check refused a value.
///
/// A missing message is replaced by the stage's default message. Formatters
/// and retrievers should use [`Rejection::hidden`] unless the message only
/// describes permitted values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rejection {
    pub message: Option<String>,
    pub safe_to_show: bool,
}

impl Rejection {
    /// Rejection whose message may be shown to the caller.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            safe_to_show: true,
        }
    }

    /// Rejection whose message must stay internal.
    pub fn hidden(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            safe_to_show: false,
        }
    }

    pub(crate) fn into_failure(self, name: &str, kind: ErrorKind, default_message: &str) -> ParamFailure {
        let message = self
            .message
            .unwrap_or_else(|| default_message.to_string());
        ParamFailure::new(kind, message, self.safe_to_show).within(name)
    }
}

/// Outcome of a leaf or custom parameter check.
pub type CheckOutcome = std::result::Result<(), ParamFailure>;

/// Outcome of an object parameter check.
pub type ObjectCheckOutcome = std::result::Result<ObjectChecked, ParamFailure>;

/// What an object parameter check found provided and valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectChecked {
    /// Name of the object parameter; `None` for a root or array slot.
    pub name: Option<String>,
    /// Leaves and nested objects that passed, in evaluation order.
    pub provided: Vec<String>,
    /// Results of nested objects that passed.
    pub objects: Vec<ObjectChecked>,
    /// Custom parameters that passed.
    pub custom: Vec<String>,
    /// The object was explicitly null and null was accepted.
    pub null: bool,
}

impl ObjectChecked {
    pub(crate) fn named(name: Option<&str>) -> Self {
        Self {
            name: name.map(str::to_string),
            ..Self::default()
        }
    }

    /// Whether a leaf or nested object named `name` was provided and passed.
    pub fn contains(&self, name: &str) -> bool {
        self.provided.iter().any(|p| p == name)
    }

    /// Whether a custom parameter named `name` passed.
    pub fn contains_custom(&self, name: &str) -> bool {
        self.custom.iter().any(|c| c == name)
    }

    /// Result of the nested object `name`, if it was provided and passed.
    pub fn object(&self, name: &str) -> Option<&ObjectChecked> {
        self.objects
            .iter()
            .find(|o| o.name.as_deref() == Some(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_prepends_segments() {
        let failure = ParamFailure::missing("zip").within("address").within("order");
        assert_eq!(failure.path, vec!["order", "address", "zip"]);
        assert_eq!(failure.failing_path(), "order.address.zip");
        assert_eq!(failure.kind, ErrorKind::MissingRequiredParameter);
    }

    #[test]
    fn public_message_hides_unsafe_text() {
        let safe = ParamFailure::new(ErrorKind::InvalidParameterValue, "must be > 5", true);
        let hidden = ParamFailure::new(ErrorKind::ParameterCastFailure, "i64 parse: invalid digit", false);

        assert_eq!(safe.public_message("generic"), "must be > 5");
        assert_eq!(hidden.public_message("generic"), "generic");
    }

    #[test]
    fn rejection_without_message_uses_default() {
        let failure = Rejection::default().into_failure(
            "age",
            ErrorKind::InvalidParameterValue,
            "Did not meet requirements.",
        );
        assert_eq!(failure.message, "Did not meet requirements.");
        assert!(!failure.safe_to_show);
        assert_eq!(failure.failing_path(), "age");
    }

    #[test]
    fn absent_only_at_own_depth() {
        let own = ParamFailure::missing("address");
        let nested = ParamFailure::missing("zip").within("address");

        assert!(own.is_absent_within(1));
        assert!(!nested.is_absent_within(1));
        assert!(!ParamFailure::null_not_allowed("address").is_absent_within(1));
    }

    #[test]
    fn display_includes_kind_and_path() {
        let failure = ParamFailure::null_not_allowed("email");
        assert_eq!(
            failure.to_string(),
            "invalid_null_parameter at 'email': Cannot be null."
        );
    }

    #[test]
    fn checked_lookup_helpers() {
        let mut root = ObjectChecked::named(None);
        let mut address = ObjectChecked::named(Some("address"));
        address.provided.push("zip".to_string());
        root.provided.push("email".to_string());
        root.provided.push("address".to_string());
        root.objects.push(address);
        root.custom.push("billing".to_string());

        assert!(root.contains("email"));
        assert!(root.contains_custom("billing"));
        assert!(root.object("address").is_some_and(|a| a.contains("zip")));
        assert!(root.object("missing").is_none());
    }
}
