use std::fmt;
use std::sync::Arc;

use crate::error::{Result, SchemaError};
use crate::outcome::{CheckOutcome, ErrorKind, ParamFailure};

/// Cross-field check over a whole container.
pub type CustomCheckFn<C> = Arc<dyn Fn(&C) -> std::result::Result<(), CustomFailure> + Send + Sync>;

/// Failure reported by a custom check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomFailure {
    pub kind: ErrorKind,
    pub message: String,
    pub safe_to_show: bool,
}

impl CustomFailure {
    /// The container's values do not satisfy the invariant. Safe to show.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::InvalidParameterValue,
            message: message.into(),
            safe_to_show: true,
        }
    }

    /// Invariant failed for a reason that must stay internal.
    pub fn hidden(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::InvalidParameterValue,
            message: message.into(),
            safe_to_show: false,
        }
    }

    /// Something the invariant needs was not provided.
    pub fn missing(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::MissingRequiredParameter,
            message: message.into(),
            safe_to_show: true,
        }
    }

    /// A group of parameters required together is absent.
    pub fn missing_together<S: AsRef<str>>(names: &[S]) -> Self {
        let names: Vec<&str> = names.iter().map(AsRef::as_ref).collect();
        Self {
            kind: ErrorKind::MultipleMissingParameters,
            message: format!("Required together, but missing: {}.", names.join(", ")),
            safe_to_show: true,
        }
    }
}

/// Validator with access to the entire enclosing container.
///
/// Used for invariants spanning sibling fields, e.g. "email is required
/// when e_billing is true". Failures are reported under this parameter's
/// own name.
pub struct CustomParam<C: ?Sized> {
    name: String,
    check: CustomCheckFn<C>,
}

impl<C: ?Sized> CustomParam<C> {
    pub fn new<F>(name: impl Into<String>, check: F) -> Result<Self>
    where
        F: Fn(&C) -> std::result::Result<(), CustomFailure> + Send + Sync + 'static,
    {
        let name = name.into();
        if name.is_empty() {
            return Err(SchemaError::EmptyName);
        }
        Ok(Self {
            name,
            check: Arc::new(check),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn check(&self, container: &C) -> CheckOutcome {
        (self.check)(container).map_err(|failure| {
            ParamFailure::new(failure.kind, failure.message, failure.safe_to_show)
                .within(self.name.as_str())
        })
    }
}

impl<C: ?Sized> Clone for CustomParam<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            check: Arc::clone(&self.check),
        }
    }
}

impl<C: ?Sized> fmt::Debug for CustomParam<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomParam")
            .field("name", &self.name)
            .finish()
    }
}
