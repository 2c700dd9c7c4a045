//! Default failure messages.
//!
//! Used when a retriever, formatter, or check rejects a value without
//! saying why.

/// Required parameter was not provided.
pub const DEFAULT_MISSING_MESSAGE: &str = "Required, but was not provided.";

/// Parameter was set to null but null is not accepted.
pub const DEFAULT_NULL_MESSAGE: &str = "Cannot be null.";

/// A check predicate failed without a message.
pub const DEFAULT_INVALID_MESSAGE: &str = "Did not meet requirements.";

/// The value could not be read as the declared type.
pub const DEFAULT_CAST_MESSAGE: &str = "Was of incorrect data type.";

/// A formatter failed without a message.
pub const DEFAULT_FORMAT_MESSAGE: &str = "Was not formattable.";

/// Shown to callers in place of any message not flagged safe.
pub const GENERIC_FAILURE_MESSAGE: &str = "Invalid request parameters.";
