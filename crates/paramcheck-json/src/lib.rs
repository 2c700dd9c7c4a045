//! JSON adapter for paramcheck.
//!
//! Implements the engine's container boundary for `serde_json::Value` and
//! adds what a service needs around it: typed field retrieval, array params
//! over objects, scalars, and nested arrays, conditional field groups,
//! declarative schema documents, a named schema registry, and a
//! serializable check report.

pub mod array;
pub mod conditional;
pub mod config;
pub mod document;
pub mod error;
pub mod field;
pub mod locate;
pub mod registry;
pub mod report;

pub use array::{ArrayElements, ArrayParam, ElementCheck, ElementParam};
pub use conditional::{at_least_one_of, required_if, required_together};
pub use config::{RegistryConfig, RetrieveOptions};
pub use document::{ArraySpec, ConditionSpec, FieldSpec, FieldType, FormatStep, SchemaDocument};
pub use error::{RegistryError, Result};
pub use field::{field, field_with, insert_field, JsonField, JsonType};
pub use locate::{object, root, JsonObject};
pub use registry::SchemaRegistry;
pub use report::CheckReport;
