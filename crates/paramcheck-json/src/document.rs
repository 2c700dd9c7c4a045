//! Declarative schema documents.
//!
//! A document is the JSON description of one object param. Compiling it
//! runs the same builders a hand-written schema uses, so every authoring
//! error surfaces when the document is loaded rather than when a payload is
//! checked.

use std::fmt::Display;
use std::sync::Arc;

use paramcheck_core::checks::{self, HasLength};
use paramcheck_core::{
    format, CheckFn, CustomParam, FormatFn, LeafCheck, LeafParam, LeafParamBuilder, ObjectParam,
    ObjectParamBuilder, Rejection,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::array::{ArrayElements, ArrayParam, ElementParam};
use crate::conditional::{at_least_one_of, required_if, required_together};
use crate::config::RetrieveOptions;
use crate::error::{RegistryError, Result};
use crate::field::{insert_field, JsonField, JsonType};
use crate::locate::JsonObject;

/// Description of one object param.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDocument {
    /// Unset for a payload root or an array element.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub continue_on_optional_failure: bool,
    #[serde(default)]
    pub can_be_null: bool,
    #[serde(default)]
    pub required: Vec<FieldSpec>,
    #[serde(default)]
    pub optional: Vec<FieldSpec>,
    #[serde(default)]
    pub required_objects: Vec<SchemaDocument>,
    #[serde(default)]
    pub optional_objects: Vec<SchemaDocument>,
    #[serde(default)]
    pub required_arrays: Vec<ArraySpec>,
    #[serde(default)]
    pub optional_arrays: Vec<ArraySpec>,
    /// Cross-field groups, all evaluated as required custom params.
    #[serde(default)]
    pub conditions: Vec<ConditionSpec>,
}

/// Value type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Integer,
    Unsigned,
    Number,
    Boolean,
    String,
    Array,
    Object,
    Any,
}

/// Format steps available to string fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatStep {
    Trim,
    Lowercase,
    Uppercase,
}

/// Description of one leaf, or of the elements of an array field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    /// Left empty in `items`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FieldType,
    #[serde(default)]
    pub can_be_null: bool,
    #[serde(default)]
    pub parse_if_string: bool,
    #[serde(default)]
    pub replace_cast_in_map: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub format: Vec<FormatStep>,
    /// Write the formatted value back into the payload.
    #[serde(default)]
    pub insert_formatted: bool,
    /// Inclusive bound; must be representable in the field's type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Number>,
    /// Characters for strings, elements for arrays, entries for objects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default)]
    pub non_empty: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalid_message: Option<String>,
    /// Checked against every element of an array field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<FieldSpec>>,
}

/// Description of an array whose elements are objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArraySpec {
    pub name: String,
    #[serde(default)]
    pub can_be_null: bool,
    #[serde(default)]
    pub non_empty: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    pub element: SchemaDocument,
}

/// Cross-field group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConditionSpec {
    RequiredTogether {
        name: String,
        fields: Vec<String>,
    },
    AtLeastOneOf {
        name: String,
        fields: Vec<String>,
    },
    /// `fields` are required when `trigger` is provided and equals `equals`
    /// (or is provided at all, when `equals` is unset).
    RequiredIf {
        name: String,
        trigger: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        equals: Option<Value>,
        fields: Vec<String>,
    },
}

impl SchemaDocument {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build the object param this document describes.
    pub fn compile(&self) -> Result<ObjectParam<Value>> {
        let mut builder = match &self.name {
            Some(name) => ObjectParamBuilder::named(name.clone(), JsonObject),
            None => ObjectParamBuilder::root(JsonObject),
        }
        .continue_on_optional_failure(self.continue_on_optional_failure)
        .can_be_null(self.can_be_null);

        for spec in &self.required {
            builder = compile_field(builder, spec, true)?;
        }
        for spec in &self.optional {
            builder = compile_field(builder, spec, false)?;
        }

        for nested in &self.required_objects {
            builder = builder.required_object(compile_nested(nested)?);
        }
        for nested in &self.optional_objects {
            builder = builder.optional_object(compile_nested(nested)?);
        }

        for array in &self.required_arrays {
            builder = builder.required(compile_array(array)?);
        }
        for array in &self.optional_arrays {
            builder = builder.optional(compile_array(array)?);
        }

        for condition in &self.conditions {
            builder = builder.required_custom(compile_condition(condition)?);
        }

        Ok(builder.build()?)
    }
}

fn compile_nested(document: &SchemaDocument) -> Result<ObjectParam<Value>> {
    if document.name.is_none() {
        return Err(RegistryError::InvalidDocument(
            "nested objects need a name".to_string(),
        ));
    }
    document.compile()
}

fn compile_array(spec: &ArraySpec) -> Result<ArrayParam> {
    if let Some(name) = &spec.element.name {
        return Err(RegistryError::InvalidDocument(format!(
            "array '{}' element must be unnamed, found '{name}'",
            spec.name
        )));
    }
    let lengths = Lengths {
        non_empty: spec.non_empty,
        min: spec.min_length,
        max: spec.max_length,
    };
    let items = with_size_checks(ArrayElements::new(spec.element.compile()?), lengths);
    Ok(ArrayParam::with_items(spec.name.clone(), items)?.can_be_null(spec.can_be_null))
}

fn compile_condition(spec: &ConditionSpec) -> Result<CustomParam<Value>> {
    let custom = match spec {
        ConditionSpec::RequiredTogether { name, fields } => {
            required_together(name.clone(), &borrowed(fields))?
        }
        ConditionSpec::AtLeastOneOf { name, fields } => {
            at_least_one_of(name.clone(), &borrowed(fields))?
        }
        ConditionSpec::RequiredIf {
            name,
            trigger,
            equals,
            fields,
        } => {
            let equals = equals.clone();
            required_if(
                name.clone(),
                trigger,
                move |value| equals.as_ref().is_none_or(|expected| expected == value),
                &borrowed(fields),
            )?
        }
    };
    Ok(custom)
}

fn borrowed(fields: &[String]) -> Vec<&str> {
    fields.iter().map(String::as_str).collect()
}

fn attach<L>(builder: ObjectParamBuilder<Value>, required: bool, leaf: L) -> ObjectParamBuilder<Value>
where
    L: LeafCheck<Value> + 'static,
{
    if required {
        builder.required(leaf)
    } else {
        builder.optional(leaf)
    }
}

fn compile_field(
    builder: ObjectParamBuilder<Value>,
    spec: &FieldSpec,
    required: bool,
) -> Result<ObjectParamBuilder<Value>> {
    spec.validate()?;
    if spec.name.is_empty() {
        return Err(RegistryError::InvalidDocument(
            "fields need a name".to_string(),
        ));
    }
    let builder = match spec.kind {
        FieldType::Integer => {
            let found = numeric_checks(spec, Number::as_i64)?;
            attach(builder, required, scalar_leaf::<i64>(spec, found)?)
        }
        FieldType::Unsigned => {
            let found = numeric_checks(spec, Number::as_u64)?;
            attach(builder, required, scalar_leaf::<u64>(spec, found)?)
        }
        FieldType::Number => {
            let found = numeric_checks(spec, Number::as_f64)?;
            attach(builder, required, scalar_leaf::<f64>(spec, found)?)
        }
        FieldType::Boolean => attach(builder, required, scalar_leaf::<bool>(spec, Vec::new())?),
        FieldType::Any => attach(builder, required, scalar_leaf::<Value>(spec, Vec::new())?),
        FieldType::String => attach(builder, required, string_leaf(spec)?),
        FieldType::Array => match &spec.items {
            Some(items) => attach(builder, required, array_leaf(spec, items)?),
            None => {
                let found = length_checks::<Vec<Value>>(spec.lengths(), Vec::len);
                attach(builder, required, scalar_leaf::<Vec<Value>>(spec, found)?)
            }
        },
        FieldType::Object => {
            let found = length_checks::<Map<String, Value>>(spec.lengths(), Map::len);
            attach(builder, required, scalar_leaf::<Map<String, Value>>(spec, found)?)
        }
    };
    Ok(builder)
}

impl FieldSpec {
    fn validate(&self) -> Result<()> {
        let numeric = matches!(
            self.kind,
            FieldType::Integer | FieldType::Unsigned | FieldType::Number
        );
        let sized = matches!(
            self.kind,
            FieldType::String | FieldType::Array | FieldType::Object
        );

        if (self.min.is_some() || self.max.is_some()) && !numeric {
            return Err(self.invalid("min/max apply to numeric fields"));
        }
        if (self.min_length.is_some() || self.max_length.is_some() || self.non_empty) && !sized {
            return Err(self.invalid("length checks apply to string, array, and object fields"));
        }
        if (!self.format.is_empty() || self.insert_formatted) && self.kind != FieldType::String {
            return Err(self.invalid("format steps apply to string fields"));
        }
        if self.one_of.is_some() && matches!(self.kind, FieldType::Array | FieldType::Object) {
            return Err(self.invalid("one_of applies to scalar fields"));
        }
        if self.replace_cast_in_map && !self.parse_if_string {
            return Err(self.invalid("replace_cast_in_map requires parse_if_string"));
        }
        if self.items.is_some() {
            if self.kind != FieldType::Array {
                return Err(self.invalid("items apply to array fields"));
            }
            if self.parse_if_string {
                return Err(self.invalid("parse_if_string does not apply to arrays with items"));
            }
        }
        Ok(())
    }

    /// Validation for an `items` entry, which describes array elements.
    fn validate_items(&self, array: &str) -> Result<()> {
        if !self.name.is_empty() {
            return Err(RegistryError::InvalidDocument(format!(
                "array '{array}' items must be unnamed, found '{}'",
                self.name
            )));
        }
        self.validate()
    }

    fn invalid(&self, reason: &str) -> RegistryError {
        let name = if self.name.is_empty() { "items" } else { self.name.as_str() };
        RegistryError::InvalidDocument(format!("field '{name}': {reason}"))
    }

    fn options(&self) -> RetrieveOptions {
        RetrieveOptions {
            parse_if_string: self.parse_if_string,
            replace_cast_in_map: self.replace_cast_in_map,
        }
    }

    fn lengths(&self) -> Lengths {
        Lengths {
            non_empty: self.non_empty,
            min: self.min_length,
            max: self.max_length,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Lengths {
    non_empty: bool,
    min: Option<usize>,
    max: Option<usize>,
}

/// A measured length, so the library's length predicates apply to any
/// value with a length function.
struct Length(usize);

impl HasLength for Length {
    fn length(&self) -> usize {
        self.0
    }
}

fn length_checks<T: 'static>(lengths: Lengths, len: fn(&T) -> usize) -> Vec<CheckFn<T>> {
    let mut predicates: Vec<CheckFn<Length>> = Vec::new();
    if lengths.non_empty {
        predicates.push(Arc::new(checks::non_empty::<Length>()));
    }
    if let Some(min) = lengths.min {
        predicates.push(Arc::new(checks::min_len::<Length>(min)));
    }
    if let Some(max) = lengths.max {
        predicates.push(Arc::new(checks::max_len::<Length>(max)));
    }
    predicates
        .into_iter()
        .map(|predicate| -> CheckFn<T> { Arc::new(move |value: &T| predicate(&Length(len(value)))) })
        .collect()
}

/// `min`/`max` read in the field's own type, so integer bounds are compared
/// exactly.
fn numeric_checks<T>(spec: &FieldSpec, read: fn(&Number) -> Option<T>) -> Result<Vec<CheckFn<T>>>
where
    T: PartialOrd + Display + Send + Sync + Clone + 'static,
{
    let mut found: Vec<CheckFn<T>> = Vec::new();
    if let Some(min) = &spec.min {
        found.push(Arc::new(checks::at_least(bound(spec, "min", min, read)?)));
    }
    if let Some(max) = &spec.max {
        found.push(Arc::new(checks::at_most(bound(spec, "max", max, read)?)));
    }
    Ok(found)
}

fn bound<T>(spec: &FieldSpec, which: &str, number: &Number, read: fn(&Number) -> Option<T>) -> Result<T> {
    read(number).ok_or_else(|| {
        spec.invalid(&format!("{which} {number} is not representable as {:?}", spec.kind))
    })
}

fn one_of_json<T: JsonType>(allowed: Vec<Value>) -> CheckFn<T> {
    Arc::new(move |value: &T| {
        if allowed.contains(&value.to_json()) {
            return Ok(());
        }
        let options: Vec<String> = allowed.iter().map(Value::to_string).collect();
        Err(Rejection::new(format!("must be one of: {}", options.join(", "))))
    })
}

fn format_step(step: FormatStep) -> FormatFn<String> {
    match step {
        FormatStep::Trim => Arc::new(format::trim()),
        FormatStep::Lowercase => Arc::new(format::lowercase()),
        FormatStep::Uppercase => Arc::new(format::uppercase()),
    }
}

fn base<T: JsonType>(spec: &FieldSpec) -> LeafParamBuilder<Value, T> {
    let builder = LeafParamBuilder::new(spec.name.clone(), JsonField::<T>::with_options(spec.options()))
        .can_be_null(spec.can_be_null);
    match &spec.invalid_message {
        Some(message) => builder.invalid_message(message.clone()),
        None => builder,
    }
}

/// Add `one_of` and make sure the leaf has at least one check.
fn finish_leaf<T: JsonType>(
    spec: &FieldSpec,
    mut builder: LeafParamBuilder<Value, T>,
    mut found: Vec<CheckFn<T>>,
) -> Result<LeafParam<Value, T>> {
    if let Some(allowed) = &spec.one_of {
        found.push(one_of_json::<T>(allowed.clone()));
    }
    if found.is_empty() {
        builder = builder.check(checks::always_pass());
    }
    for check in found {
        builder = builder.check(move |value: &T| check(value));
    }
    Ok(builder.build()?)
}

fn scalar_leaf<T: JsonType>(spec: &FieldSpec, found: Vec<CheckFn<T>>) -> Result<LeafParam<Value, T>> {
    finish_leaf(spec, base::<T>(spec), found)
}

fn string_leaf(spec: &FieldSpec) -> Result<LeafParam<Value, String>> {
    let mut builder = base::<String>(spec);
    for step in &spec.format {
        let step = format_step(*step);
        builder = builder.format(move |value: String| step(value));
    }
    if spec.insert_formatted {
        builder = builder.insert(insert_field::<String>());
    }
    let found = length_checks::<String>(spec.lengths(), |v| v.chars().count());
    finish_leaf(spec, builder, found)
}

fn array_leaf(spec: &FieldSpec, items: &FieldSpec) -> Result<ArrayParam> {
    let elements = array_elements(spec, items)?;
    Ok(ArrayParam::with_items(spec.name.clone(), elements)?.can_be_null(spec.can_be_null))
}

fn with_size_checks(mut elements: ArrayElements, lengths: Lengths) -> ArrayElements {
    for check in length_checks::<Vec<Value>>(lengths, Vec::len) {
        elements = elements.size_check(move |items: &Vec<Value>| check(items));
    }
    elements
}

/// Size checks come from the array's own spec, element checks from `items`.
fn array_elements(spec: &FieldSpec, items: &FieldSpec) -> Result<ArrayElements> {
    items.validate_items(&spec.name)?;
    let elements = match items.kind {
        FieldType::Integer => {
            let found = numeric_checks(items, Number::as_i64)?;
            ArrayElements::new(element_param::<i64>(items, found))
        }
        FieldType::Unsigned => {
            let found = numeric_checks(items, Number::as_u64)?;
            ArrayElements::new(element_param::<u64>(items, found))
        }
        FieldType::Number => {
            let found = numeric_checks(items, Number::as_f64)?;
            ArrayElements::new(element_param::<f64>(items, found))
        }
        FieldType::Boolean => ArrayElements::new(element_param::<bool>(items, Vec::new())),
        FieldType::Any => ArrayElements::new(element_param::<Value>(items, Vec::new())),
        FieldType::String => ArrayElements::new(string_element(items)),
        FieldType::Array => match &items.items {
            Some(inner) => {
                ArrayElements::new(array_elements(items, inner)?.can_be_null(items.can_be_null))
            }
            None => {
                let found = length_checks::<Vec<Value>>(items.lengths(), Vec::len);
                ArrayElements::new(element_param::<Vec<Value>>(items, found))
            }
        },
        FieldType::Object => {
            let found = length_checks::<Map<String, Value>>(items.lengths(), Map::len);
            ArrayElements::new(element_param::<Map<String, Value>>(items, found))
        }
    };
    Ok(with_size_checks(elements, spec.lengths()))
}

fn element_param<T: JsonType>(spec: &FieldSpec, mut found: Vec<CheckFn<T>>) -> ElementParam<T> {
    let mut element = ElementParam::<T>::with_options(spec.options()).can_be_null(spec.can_be_null);
    if let Some(message) = &spec.invalid_message {
        element = element.invalid_message(message.clone());
    }
    if let Some(allowed) = &spec.one_of {
        found.push(one_of_json::<T>(allowed.clone()));
    }
    for check in found {
        element = element.check(move |value: &T| check(value));
    }
    element
}

fn string_element(spec: &FieldSpec) -> ElementParam<String> {
    let found = length_checks::<String>(spec.lengths(), |v| v.chars().count());
    let mut element = element_param::<String>(spec, found);
    for step in &spec.format {
        let step = format_step(*step);
        element = element.format(move |value: String| step(value));
    }
    if spec.insert_formatted {
        element = element.write_back_formatted();
    }
    element
}
