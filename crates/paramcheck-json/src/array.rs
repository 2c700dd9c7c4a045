//! Array params.
//!
//! An [`ArrayParam`] locates a named JSON array and runs one
//! [`ElementCheck`] against every element in order. Element checks come in
//! three shapes: an unnamed [`ObjectParam`] for arrays of objects, an
//! [`ElementParam`] for arrays of scalars, and [`ArrayElements`] for arrays
//! nested directly inside arrays.

use std::fmt;
use std::sync::Arc;

use paramcheck_core::{
    CheckFn, CheckOutcome, ErrorKind, FormatFn, LeafCheck, ObjectParam, ParamFailure, Rejection,
    Result, SchemaError, DEFAULT_CAST_MESSAGE, DEFAULT_FORMAT_MESSAGE, DEFAULT_INVALID_MESSAGE,
    DEFAULT_NULL_MESSAGE,
};
use serde_json::Value;
use tracing::trace;

use crate::config::RetrieveOptions;
use crate::field::{json_kind, JsonType};

/// Check run against one array element.
pub trait ElementCheck: Send + Sync {
    /// Failure paths are relative to the element; the array prepends the
    /// element's index.
    fn check_element(&self, element: &mut Value) -> CheckOutcome;
}

impl ElementCheck for ObjectParam<Value> {
    fn check_element(&self, element: &mut Value) -> CheckOutcome {
        self.check(element).map(|_| ())
    }
}

fn rejected(rejection: Rejection, kind: ErrorKind, default_message: &str) -> ParamFailure {
    let message = rejection
        .message
        .unwrap_or_else(|| default_message.to_string());
    ParamFailure::new(kind, message, rejection.safe_to_show)
}

/// Scalar element pipeline: read as `T`, format, then check.
pub struct ElementParam<T> {
    options: RetrieveOptions,
    can_be_null: bool,
    formatters: Vec<FormatFn<T>>,
    write_back: bool,
    checks: Vec<CheckFn<T>>,
    invalid_message: Option<String>,
}

impl<T: JsonType> ElementParam<T> {
    /// Elements must already be of type `T`; there are no checks beyond that.
    pub fn new() -> Self {
        Self::with_options(RetrieveOptions::default())
    }

    /// `options` apply per element: strings may be parsed as `T` and the
    /// parsed value written back into the array.
    pub fn with_options(options: RetrieveOptions) -> Self {
        Self {
            options,
            can_be_null: false,
            formatters: Vec::new(),
            write_back: false,
            checks: Vec::new(),
            invalid_message: None,
        }
    }

    pub fn can_be_null(mut self, can_be_null: bool) -> Self {
        self.can_be_null = can_be_null;
        self
    }

    pub fn format<F>(mut self, format: F) -> Self
    where
        F: Fn(T) -> std::result::Result<T, Rejection> + Send + Sync + 'static,
    {
        self.formatters.push(Arc::new(format));
        self
    }

    /// Replace each element with its formatted value.
    pub fn write_back_formatted(mut self) -> Self {
        self.write_back = true;
        self
    }

    pub fn check<F>(mut self, check: F) -> Self
    where
        F: Fn(&T) -> std::result::Result<(), Rejection> + Send + Sync + 'static,
    {
        self.checks.push(Arc::new(check));
        self
    }

    /// Shown instead of the check's own message when a check rejects.
    pub fn invalid_message(mut self, message: impl Into<String>) -> Self {
        self.invalid_message = Some(message.into());
        self
    }

    fn read(&self, element: &mut Value) -> std::result::Result<T, ParamFailure> {
        if let Some(value) = T::from_json(element) {
            return Ok(value);
        }
        let parsed = match &*element {
            Value::String(text) if self.options.parse_if_string => {
                T::parse_str(text).ok_or_else(|| {
                    rejected(
                        Rejection::hidden(format!("could not parse string as {}", T::NAME)),
                        ErrorKind::ParameterCastFailure,
                        DEFAULT_CAST_MESSAGE,
                    )
                })?
            }
            other => {
                return Err(rejected(
                    Rejection::hidden(format!("expected {}, found {}", T::NAME, json_kind(other))),
                    ErrorKind::ParameterCastFailure,
                    DEFAULT_CAST_MESSAGE,
                ))
            }
        };
        if self.options.replace_cast_in_map {
            *element = parsed.to_json();
        }
        Ok(parsed)
    }
}

impl<T: JsonType> Default for ElementParam<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: JsonType> ElementCheck for ElementParam<T> {
    fn check_element(&self, element: &mut Value) -> CheckOutcome {
        if element.is_null() {
            if self.can_be_null {
                return Ok(());
            }
            return Err(ParamFailure::new(
                ErrorKind::InvalidNullParameter,
                DEFAULT_NULL_MESSAGE,
                true,
            ));
        }

        let mut value = self.read(element)?;

        if !self.formatters.is_empty() {
            for format in &self.formatters {
                value = format(value).map_err(|r| {
                    rejected(r, ErrorKind::ParameterCastFailure, DEFAULT_FORMAT_MESSAGE)
                })?;
            }
            if self.write_back {
                *element = value.to_json();
            }
        }

        for check in &self.checks {
            if let Err(rejection) = check(&value) {
                return Err(match &self.invalid_message {
                    Some(message) => ParamFailure::new(
                        ErrorKind::InvalidParameterValue,
                        message.clone(),
                        rejection.safe_to_show,
                    ),
                    None => rejected(
                        rejection,
                        ErrorKind::InvalidParameterValue,
                        DEFAULT_INVALID_MESSAGE,
                    ),
                });
            }
        }
        Ok(())
    }
}

impl<T> Clone for ElementParam<T> {
    fn clone(&self) -> Self {
        Self {
            options: self.options,
            can_be_null: self.can_be_null,
            formatters: self.formatters.clone(),
            write_back: self.write_back,
            checks: self.checks.clone(),
            invalid_message: self.invalid_message.clone(),
        }
    }
}

impl<T: JsonType> fmt::Debug for ElementParam<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementParam")
            .field("type", &T::NAME)
            .field("options", &self.options)
            .field("can_be_null", &self.can_be_null)
            .field("formatters", &self.formatters.len())
            .field("checks", &self.checks.len())
            .finish()
    }
}

/// The unnamed part of an array: size checks plus the element check.
///
/// Used directly as the element check of an outer array to express arrays
/// of arrays.
#[derive(Clone)]
pub struct ArrayElements {
    elements: Arc<dyn ElementCheck>,
    size_checks: Vec<CheckFn<Vec<Value>>>,
    can_be_null: bool,
}

impl ArrayElements {
    pub fn new<E>(elements: E) -> Self
    where
        E: ElementCheck + 'static,
    {
        Self {
            elements: Arc::new(elements),
            size_checks: Vec::new(),
            can_be_null: false,
        }
    }

    /// Check against the whole array before any element is visited, e.g.
    /// `checks::len_between(1, 10)`.
    pub fn size_check<F>(mut self, check: F) -> Self
    where
        F: Fn(&Vec<Value>) -> std::result::Result<(), Rejection> + Send + Sync + 'static,
    {
        self.size_checks.push(Arc::new(check));
        self
    }

    /// Only consulted when this array is itself an element of another array.
    pub fn can_be_null(mut self, can_be_null: bool) -> Self {
        self.can_be_null = can_be_null;
        self
    }

    fn check_items(&self, items: &mut Vec<Value>) -> CheckOutcome {
        for check in &self.size_checks {
            check(&*items)
                .map_err(|r| rejected(r, ErrorKind::InvalidParameterValue, DEFAULT_INVALID_MESSAGE))?;
        }
        for (index, item) in items.iter_mut().enumerate() {
            self.elements
                .check_element(item)
                .map_err(|failure| failure.within(index.to_string()))?;
        }
        Ok(())
    }
}

impl ElementCheck for ArrayElements {
    fn check_element(&self, element: &mut Value) -> CheckOutcome {
        match element {
            Value::Array(items) => self.check_items(items),
            Value::Null if self.can_be_null => Ok(()),
            Value::Null => Err(ParamFailure::new(
                ErrorKind::InvalidNullParameter,
                DEFAULT_NULL_MESSAGE,
                true,
            )),
            other => Err(ParamFailure::new(
                ErrorKind::ParameterCastFailure,
                format!("expected array, found {}", json_kind(other)),
                false,
            )),
        }
    }
}

impl fmt::Debug for ArrayElements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayElements")
            .field("size_checks", &self.size_checks.len())
            .field("can_be_null", &self.can_be_null)
            .finish_non_exhaustive()
    }
}

/// A named JSON array whose elements all pass the same check.
///
/// Behaves like a leaf in its parent object. An element failure is
/// reported under `name.<index>` followed by the element's own path.
#[derive(Debug, Clone)]
pub struct ArrayParam {
    name: String,
    items: ArrayElements,
    can_be_null: bool,
}

impl ArrayParam {
    /// `elements` is an unnamed object param, an [`ElementParam`], or an
    /// [`ArrayElements`].
    pub fn new<E>(name: impl Into<String>, elements: E) -> Result<Self>
    where
        E: ElementCheck + 'static,
    {
        Self::with_items(name, ArrayElements::new(elements))
    }

    pub fn with_items(name: impl Into<String>, items: ArrayElements) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(SchemaError::EmptyName);
        }
        Ok(Self {
            name,
            items,
            can_be_null: false,
        })
    }

    pub fn can_be_null(mut self, can_be_null: bool) -> Self {
        self.can_be_null = can_be_null;
        self
    }

    pub fn size_check<F>(mut self, check: F) -> Self
    where
        F: Fn(&Vec<Value>) -> std::result::Result<(), Rejection> + Send + Sync + 'static,
    {
        self.items = self.items.size_check(check);
        self
    }
}

impl LeafCheck<Value> for ArrayParam {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, container: &mut Value) -> CheckOutcome {
        let name = self.name.as_str();
        match container.get_mut(name) {
            None => Err(ParamFailure::missing(name)),
            Some(Value::Null) if self.can_be_null => Ok(()),
            Some(Value::Null) => Err(ParamFailure::null_not_allowed(name)),
            Some(Value::Array(items)) => {
                trace!(param = name, len = items.len(), "checking array elements");
                self.items
                    .check_items(items)
                    .map_err(|failure| failure.within(name))
            }
            Some(other) => Err(ParamFailure::new(
                ErrorKind::ParameterCastFailure,
                format!("{name}: expected array, found {}", json_kind(other)),
                false,
            )
            .within(name)),
        }
    }
}
