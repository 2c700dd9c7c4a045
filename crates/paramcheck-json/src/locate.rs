use paramcheck_core::{Locate, ObjectParamBuilder, Rejection};
use serde_json::Value;

use crate::field::json_kind;

/// [`Locate`] for JSON objects.
///
/// An unnamed object param operates on the container itself; a named one
/// on the JSON object stored under its name.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonObject;

impl Locate<Value> for JsonObject {
    fn locate<'a>(
        &self,
        name: Option<&str>,
        container: &'a mut Value,
    ) -> Result<Option<&'a mut Value>, Rejection> {
        let target = match name {
            None => Some(container),
            Some(name) => container.get_mut(name),
        };
        match target {
            None | Some(Value::Null) => Ok(None),
            Some(value) if value.is_object() => Ok(Some(value)),
            Some(other) => Err(Rejection::hidden(format!(
                "{}: expected object, found {}",
                name.unwrap_or("<root>"),
                json_kind(other)
            ))),
        }
    }

    fn is_present_null(&self, name: Option<&str>, container: &Value) -> bool {
        match name {
            None => container.is_null(),
            Some(name) => container.get(name).is_some_and(Value::is_null),
        }
    }
}

/// Builder for the unnamed object param checking a whole JSON payload.
pub fn root() -> ObjectParamBuilder<Value> {
    ObjectParamBuilder::root(JsonObject)
}

/// Builder for an object param nested under `name`.
pub fn object(name: impl Into<String>) -> ObjectParamBuilder<Value> {
    ObjectParamBuilder::named(name, JsonObject)
}
