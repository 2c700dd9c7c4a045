//! Schema-driven validation and normalization of request parameters.
//!
//! paramcheck checks dynamically-typed payloads against schemas declared in
//! code or in JSON documents, tells required from optional fields, and
//! decides which failure messages are safe to show to an external caller.
//!
//! # Crate Structure
//!
//! - [`core`]: container-agnostic engine (leaf, custom, and object params)
//! - [`json`]: `serde_json` adapter, schema documents, and registry (behind `json` feature)

/// Re-export engine types.
pub mod core {
    pub use paramcheck_core::*;
}

/// Re-export JSON adapter types (requires `json` feature).
#[cfg(feature = "json")]
pub mod json {
    pub use paramcheck_json::*;
}
