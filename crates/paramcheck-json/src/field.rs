//! Typed leaf retrieval from JSON objects.

use std::marker::PhantomData;

use paramcheck_core::{LeafParamBuilder, Rejection, Retriever};
use serde_json::{Map, Value};
use tracing::trace;

use crate::config::RetrieveOptions;

/// A value type a leaf can read out of a JSON object.
pub trait JsonType: Sized + Send + Sync + 'static {
    /// Name used in cast failure messages.
    const NAME: &'static str;

    /// Read `value` as `Self` without conversion.
    fn from_json(value: &Value) -> Option<Self>;

    /// Parse a JSON string's contents as `Self`.
    fn parse_str(raw: &str) -> Option<Self>;

    fn to_json(&self) -> Value;
}

impl JsonType for i64 {
    const NAME: &'static str = "integer";

    fn from_json(value: &Value) -> Option<Self> {
        value.as_i64()
    }

    fn parse_str(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }

    fn to_json(&self) -> Value {
        Value::from(*self)
    }
}

impl JsonType for u64 {
    const NAME: &'static str = "unsigned integer";

    fn from_json(value: &Value) -> Option<Self> {
        value.as_u64()
    }

    fn parse_str(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }

    fn to_json(&self) -> Value {
        Value::from(*self)
    }
}

impl JsonType for f64 {
    const NAME: &'static str = "number";

    fn from_json(value: &Value) -> Option<Self> {
        value.as_f64()
    }

    fn parse_str(raw: &str) -> Option<Self> {
        raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }

    fn to_json(&self) -> Value {
        Value::from(*self)
    }
}

impl JsonType for bool {
    const NAME: &'static str = "boolean";

    fn from_json(value: &Value) -> Option<Self> {
        value.as_bool()
    }

    fn parse_str(raw: &str) -> Option<Self> {
        match raw.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    fn to_json(&self) -> Value {
        Value::Bool(*self)
    }
}

impl JsonType for String {
    const NAME: &'static str = "string";

    fn from_json(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }

    fn parse_str(raw: &str) -> Option<Self> {
        Some(raw.to_string())
    }

    fn to_json(&self) -> Value {
        Value::String(self.clone())
    }
}

impl JsonType for Value {
    const NAME: &'static str = "value";

    fn from_json(value: &Value) -> Option<Self> {
        Some(value.clone())
    }

    fn parse_str(raw: &str) -> Option<Self> {
        Some(Value::String(raw.to_string()))
    }

    fn to_json(&self) -> Value {
        self.clone()
    }
}

impl JsonType for Vec<Value> {
    const NAME: &'static str = "array";

    fn from_json(value: &Value) -> Option<Self> {
        value.as_array().cloned()
    }

    fn parse_str(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    fn to_json(&self) -> Value {
        Value::Array(self.clone())
    }
}

impl JsonType for Map<String, Value> {
    const NAME: &'static str = "object";

    fn from_json(value: &Value) -> Option<Self> {
        value.as_object().cloned()
    }

    fn parse_str(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    fn to_json(&self) -> Value {
        Value::Object(self.clone())
    }
}

/// JSON type name of `value`, for messages.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// [`Retriever`] reading a field of type `T` from a JSON object.
///
/// Values of the wrong JSON type are rejected with a hidden message.
pub struct JsonField<T> {
    options: RetrieveOptions,
    _type: PhantomData<fn() -> T>,
}

impl<T: JsonType> JsonField<T> {
    pub fn new() -> Self {
        Self::with_options(RetrieveOptions::default())
    }

    pub fn with_options(options: RetrieveOptions) -> Self {
        Self {
            options,
            _type: PhantomData,
        }
    }

    pub fn options(&self) -> RetrieveOptions {
        self.options
    }
}

impl<T: JsonType> Default for JsonField<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: JsonType> Retriever<Value, T> for JsonField<T> {
    fn retrieve(&self, name: &str, container: &mut Value) -> Result<Option<T>, Rejection> {
        let parsed = match container.get(name) {
            None | Some(Value::Null) => return Ok(None),
            Some(raw) => {
                if let Some(value) = T::from_json(raw) {
                    return Ok(Some(value));
                }
                match raw {
                    Value::String(text) if self.options.parse_if_string => {
                        T::parse_str(text).ok_or_else(|| {
                            Rejection::hidden(format!("{name}: could not parse string as {}", T::NAME))
                        })?
                    }
                    other => {
                        return Err(Rejection::hidden(format!(
                            "{name}: expected {}, found {}",
                            T::NAME,
                            json_kind(other)
                        )))
                    }
                }
            }
        };

        if self.options.replace_cast_in_map {
            if let Some(slot) = container.get_mut(name) {
                trace!(param = name, kind = T::NAME, "replacing string with parsed value");
                *slot = parsed.to_json();
            }
        }
        Ok(Some(parsed))
    }

    fn is_present_null(&self, name: &str, container: &Value) -> bool {
        container.get(name).is_some_and(Value::is_null)
    }
}

/// Write-back for format steps: stores the formatted value under the
/// parameter's name.
pub fn insert_field<T: JsonType>() -> impl Fn(&str, &mut Value, &T) + Send + Sync + Clone {
    |name: &str, container: &mut Value, value: &T| {
        if let Some(object) = container.as_object_mut() {
            object.insert(name.to_string(), value.to_json());
        }
    }
}

/// Leaf builder for a JSON field of type `T` with default options.
pub fn field<T: JsonType>(name: impl Into<String>) -> LeafParamBuilder<Value, T> {
    LeafParamBuilder::new(name, JsonField::<T>::new())
}

/// Leaf builder for a JSON field of type `T` with explicit options.
pub fn field_with<T: JsonType>(
    name: impl Into<String>,
    options: RetrieveOptions,
) -> LeafParamBuilder<Value, T> {
    LeafParamBuilder::new(name, JsonField::<T>::with_options(options))
}

#[cfg(test)]
mod tests {
    use paramcheck_core::{checks, format, ErrorKind};
    use serde_json::json;

    use super::*;

    #[test]
    fn string_number_needs_parse_option() {
        let strict = field::<i64>("int")
            .check(checks::greater_than(5))
            .build()
            .unwrap();
        let mut payload = json!({"int": "12"});

        let failure = strict.check(&mut payload).unwrap_err();
        assert_eq!(failure.kind, ErrorKind::ParameterCastFailure);
        assert!(!failure.safe_to_show);
        assert_eq!(payload, json!({"int": "12"}));
    }

    #[test]
    fn parse_without_replace_leaves_container() {
        let leaf = field_with::<i64>("int", RetrieveOptions::parse())
            .check(checks::greater_than(5))
            .build()
            .unwrap();
        let mut payload = json!({"int": "12"});

        assert!(leaf.check(&mut payload).is_ok());
        assert_eq!(payload, json!({"int": "12"}));
    }

    #[test]
    fn parse_and_replace_writes_back() {
        let leaf = field_with::<i64>("int", RetrieveOptions::parse_and_replace())
            .check(checks::greater_than(5))
            .build()
            .unwrap();
        let mut payload = json!({"int": "12"});

        assert!(leaf.check(&mut payload).is_ok());
        assert_eq!(payload, json!({"int": 12}));
    }

    #[test]
    fn unparseable_string_is_hidden_cast_failure() {
        let leaf = field_with::<bool>("flag", RetrieveOptions::parse_and_replace())
            .check(checks::always_pass())
            .build()
            .unwrap();
        let mut payload = json!({"flag": "yes"});

        let failure = leaf.check(&mut payload).unwrap_err();
        assert_eq!(failure.kind, ErrorKind::ParameterCastFailure);
        assert_eq!(failure.message, "flag: could not parse string as boolean");
        assert!(!failure.safe_to_show);
        assert_eq!(payload, json!({"flag": "yes"}));
    }

    #[test]
    fn missing_and_null_are_distinguished() {
        let leaf = field::<String>("email")
            .check(checks::non_empty())
            .build()
            .unwrap();

        let missing = leaf.check(&mut json!({})).unwrap_err();
        assert_eq!(missing.kind, ErrorKind::MissingRequiredParameter);

        let null = leaf.check(&mut json!({"email": null})).unwrap_err();
        assert_eq!(null.kind, ErrorKind::InvalidNullParameter);
    }

    #[test]
    fn formatted_string_is_written_back() {
        let leaf = field::<String>("email")
            .format(format::trim())
            .format(format::lowercase())
            .insert(insert_field::<String>())
            .check(checks::min_len(3))
            .build()
            .unwrap();
        let mut payload = json!({"email": "  Bob@Example.COM "});

        assert!(leaf.check(&mut payload).is_ok());
        assert_eq!(payload, json!({"email": "bob@example.com"}));
    }

    #[test]
    fn array_and_object_types() {
        let tags = field::<Vec<Value>>("tags")
            .check(checks::non_empty())
            .build()
            .unwrap();
        assert!(tags.check(&mut json!({"tags": ["a"]})).is_ok());
        assert!(tags.check(&mut json!({"tags": []})).is_err());
        assert!(tags.check(&mut json!({"tags": {"a": 1}})).is_err());

        let meta = field::<Map<String, Value>>("meta")
            .check(checks::always_pass())
            .build()
            .unwrap();
        assert!(meta.check(&mut json!({"meta": {}})).is_ok());
    }

    #[test]
    fn floats_reject_non_finite_strings() {
        assert_eq!(f64::parse_str("1.5"), Some(1.5));
        assert_eq!(f64::parse_str("NaN"), None);
        assert_eq!(u64::from_json(&json!(-1)), None);
    }
}
