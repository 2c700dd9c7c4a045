use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::config::{DEFAULT_CAST_MESSAGE, DEFAULT_FORMAT_MESSAGE, DEFAULT_INVALID_MESSAGE};
use crate::outcome::{CheckOutcome, ErrorKind, ParamFailure, Rejection};

/// Check predicate run against a retrieved (and formatted) value.
pub type CheckFn<T> = Arc<dyn Fn(&T) -> Result<(), Rejection> + Send + Sync>;

/// Format step; returns the replacement value.
pub type FormatFn<T> = Arc<dyn Fn(T) -> Result<T, Rejection> + Send + Sync>;

/// Writes a formatted value back into the container under `name`.
pub type InsertFn<C, T> = Arc<dyn Fn(&str, &mut C, &T) + Send + Sync>;

/// Reads a named value of type `T` out of a container of type `C`.
///
/// Chosen per leaf when the schema is built, so each value type gets a
/// retriever that knows how to read it.
pub trait Retriever<C: ?Sized, T>: Send + Sync {
    /// Returns `Ok(None)` when the value is absent or null, and a
    /// [`Rejection`] when it is present but cannot be read as `T`.
    ///
    /// May write a converted value back into `container`.
    fn retrieve(&self, name: &str, container: &mut C) -> Result<Option<T>, Rejection>;

    /// True when `name` is present in `container` with an explicit null.
    fn is_present_null(&self, name: &str, container: &C) -> bool;
}

/// [`Retriever`] assembled from a pair of closures.
pub struct FnRetriever<R, N> {
    retrieve: R,
    null_check: N,
}

impl<R, N> FnRetriever<R, N> {
    pub fn new<C: ?Sized, T>(retrieve: R, null_check: N) -> Self
    where
        R: Fn(&str, &mut C) -> Result<Option<T>, Rejection> + Send + Sync,
        N: Fn(&str, &C) -> bool + Send + Sync,
    {
        Self {
            retrieve,
            null_check,
        }
    }
}

impl<C: ?Sized, T, R, N> Retriever<C, T> for FnRetriever<R, N>
where
    R: Fn(&str, &mut C) -> Result<Option<T>, Rejection> + Send + Sync,
    N: Fn(&str, &C) -> bool + Send + Sync,
{
    fn retrieve(&self, name: &str, container: &mut C) -> Result<Option<T>, Rejection> {
        (self.retrieve)(name, container)
    }

    fn is_present_null(&self, name: &str, container: &C) -> bool {
        (self.null_check)(name, container)
    }
}

/// A named parameter that an [`ObjectParam`](crate::ObjectParam) can hold
/// in its leaf collections, whatever its value type.
pub trait LeafCheck<C: ?Sized>: Send + Sync {
    fn name(&self) -> &str;
    fn check(&self, container: &mut C) -> CheckOutcome;
}

/// Validates one named value: retrieve, format, then check.
///
/// Build with [`LeafParamBuilder`](crate::LeafParamBuilder).
pub struct LeafParam<C: ?Sized, T> {
    pub(crate) name: String,
    pub(crate) retriever: Arc<dyn Retriever<C, T>>,
    pub(crate) formatters: Vec<FormatFn<T>>,
    pub(crate) insert: Option<InsertFn<C, T>>,
    pub(crate) checks: Vec<CheckFn<T>>,
    pub(crate) can_be_null: bool,
    pub(crate) invalid_message: Option<String>,
}

impl<C: ?Sized, T> LeafParam<C, T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn can_be_null(&self) -> bool {
        self.can_be_null
    }

    /// Run the retrieve → format → check pipeline against `container`.
    pub fn check(&self, container: &mut C) -> CheckOutcome {
        let retrieved = self
            .retriever
            .retrieve(&self.name, container)
            .map_err(|r| r.into_failure(&self.name, ErrorKind::ParameterCastFailure, DEFAULT_CAST_MESSAGE))?;

        let mut value = match retrieved {
            Some(value) => value,
            None if self.retriever.is_present_null(&self.name, container) => {
                if self.can_be_null {
                    return Ok(());
                }
                return Err(ParamFailure::null_not_allowed(&self.name));
            }
            None => return Err(ParamFailure::missing(&self.name)),
        };

        if !self.formatters.is_empty() {
            for format in &self.formatters {
                value = format(value).map_err(|r| {
                    r.into_failure(&self.name, ErrorKind::ParameterCastFailure, DEFAULT_FORMAT_MESSAGE)
                })?;
            }
            if let Some(insert) = &self.insert {
                trace!(param = %self.name, "writing formatted value back into container");
                insert(&self.name, container, &value);
            }
        }

        for check in &self.checks {
            if let Err(rejection) = check(&value) {
                return Err(self.invalid(rejection));
            }
        }

        Ok(())
    }

    fn invalid(&self, rejection: Rejection) -> ParamFailure {
        match &self.invalid_message {
            Some(message) => ParamFailure::new(
                ErrorKind::InvalidParameterValue,
                message.clone(),
                rejection.safe_to_show,
            )
            .within(self.name.as_str()),
            None => rejection.into_failure(
                &self.name,
                ErrorKind::InvalidParameterValue,
                DEFAULT_INVALID_MESSAGE,
            ),
        }
    }
}

impl<C: ?Sized, T> LeafCheck<C> for LeafParam<C, T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, container: &mut C) -> CheckOutcome {
        LeafParam::check(self, container)
    }
}

impl<C: ?Sized, T> Clone for LeafParam<C, T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            retriever: Arc::clone(&self.retriever),
            formatters: self.formatters.clone(),
            insert: self.insert.clone(),
            checks: self.checks.clone(),
            can_be_null: self.can_be_null,
            invalid_message: self.invalid_message.clone(),
        }
    }
}

impl<C: ?Sized, T> fmt::Debug for LeafParam<C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeafParam")
            .field("name", &self.name)
            .field("formatters", &self.formatters.len())
            .field("insert", &self.insert.is_some())
            .field("checks", &self.checks.len())
            .field("can_be_null", &self.can_be_null)
            .finish()
    }
}
