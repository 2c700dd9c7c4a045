//! Common string format steps.

use crate::outcome::Rejection;

pub fn trim() -> impl Fn(String) -> Result<String, Rejection> + Send + Sync + Clone {
    |value: String| {
        let trimmed = value.trim();
        if trimmed.len() == value.len() {
            Ok(value)
        } else {
            Ok(trimmed.to_string())
        }
    }
}

pub fn lowercase() -> impl Fn(String) -> Result<String, Rejection> + Send + Sync + Clone {
    |value: String| Ok(value.to_lowercase())
}

pub fn uppercase() -> impl Fn(String) -> Result<String, Rejection> + Send + Sync + Clone {
    |value: String| Ok(value.to_uppercase())
}

/// Rejects values longer than `max` characters before any later step runs.
pub fn max_chars(max: usize) -> impl Fn(String) -> Result<String, Rejection> + Send + Sync + Clone {
    move |value: String| {
        if value.chars().count() > max {
            Err(Rejection::hidden(format!(
                "value of {} chars exceeds format limit {max}",
                value.chars().count()
            )))
        } else {
            Ok(value)
        }
    }
}
