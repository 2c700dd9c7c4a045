//! Container-agnostic check engine for dynamically-typed request parameters.
//!
//! A schema is a tree of parameters built once at startup:
//! - [`LeafParam`] validates one named value (retrieve → format → check)
//! - [`CustomParam`] validates invariants across a whole container
//! - [`ObjectParam`] locates a sub-container and runs its required and
//!   optional children in declaration order
//!
//! Checking never panics on bad input. Every failure is a [`ParamFailure`]
//! value carrying a path, an [`ErrorKind`], a message, and a flag telling
//! the boundary layer whether the message may be shown to the caller.
//!
//! The engine does not know what a container is. Adapters supply a
//! [`Retriever`] per leaf value type and a [`Locate`] per object.

pub mod builder;
pub mod checks;
pub mod config;
pub mod custom;
pub mod error;
pub mod format;
pub mod leaf;
pub mod object;
pub mod outcome;

pub use builder::{LeafParamBuilder, ObjectParamBuilder};
pub use config::{
    DEFAULT_CAST_MESSAGE, DEFAULT_FORMAT_MESSAGE, DEFAULT_INVALID_MESSAGE,
    DEFAULT_MISSING_MESSAGE, DEFAULT_NULL_MESSAGE, GENERIC_FAILURE_MESSAGE,
};
pub use custom::{CustomFailure, CustomParam};
pub use error::{Result, SchemaError};
pub use leaf::{CheckFn, FnRetriever, FormatFn, LeafCheck, LeafParam, Retriever};
pub use object::{Locate, ObjectParam};
pub use outcome::{CheckOutcome, ErrorKind, ObjectCheckOutcome, ObjectChecked, ParamFailure, Rejection};
