//! Custom params for groups of fields that are required together.
//!
//! Each one reports [`ErrorKind::MultipleMissingParameters`] listing every
//! missing member of the group, rather than failing on the first.

use paramcheck_core::{CustomFailure, CustomParam, ErrorKind, Result};
use serde_json::Value;

fn is_provided(container: &Value, field: &str) -> bool {
    container.get(field).is_some_and(|value| !value.is_null())
}

fn missing_from<'a>(container: &Value, fields: &'a [String]) -> Vec<&'a str> {
    fields
        .iter()
        .filter(|field| !is_provided(container, field))
        .map(String::as_str)
        .collect()
}

fn owned(fields: &[&str]) -> Vec<String> {
    fields.iter().map(|f| f.to_string()).collect()
}

/// Either every field in `fields` is provided, or none is.
pub fn required_together(name: impl Into<String>, fields: &[&str]) -> Result<CustomParam<Value>> {
    let fields = owned(fields);
    CustomParam::new(name, move |container: &Value| {
        let missing = missing_from(container, &fields);
        if missing.is_empty() || missing.len() == fields.len() {
            return Ok(());
        }
        Err(CustomFailure::missing_together(&missing))
    })
}

/// At least one field in `fields` is provided.
pub fn at_least_one_of(name: impl Into<String>, fields: &[&str]) -> Result<CustomParam<Value>> {
    let fields = owned(fields);
    CustomParam::new(name, move |container: &Value| {
        if fields.iter().any(|field| is_provided(container, field)) {
            return Ok(());
        }
        Err(CustomFailure {
            kind: ErrorKind::MultipleMissingParameters,
            message: format!("At least one required, but none provided: {}.", fields.join(", ")),
            safe_to_show: true,
        })
    })
}

/// Every field in `dependents` is provided whenever `trigger` is provided
/// and satisfies `condition`.
pub fn required_if<F>(
    name: impl Into<String>,
    trigger: &str,
    condition: F,
    dependents: &[&str],
) -> Result<CustomParam<Value>>
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    let trigger = trigger.to_string();
    let dependents = owned(dependents);
    CustomParam::new(name, move |container: &Value| {
        let triggered = container
            .get(&trigger)
            .is_some_and(|value| !value.is_null() && condition(value));
        if !triggered {
            return Ok(());
        }
        let missing = missing_from(container, &dependents);
        if missing.is_empty() {
            return Ok(());
        }
        Err(CustomFailure::missing_together(&missing))
    })
}
