use paramcheck_core::{ObjectCheckOutcome, GENERIC_FAILURE_MESSAGE};
use serde::{Deserialize, Serialize};

/// Serializable summary of an object check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckReport {
    pub successful: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failing_parameter_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safe_to_show: Option<bool>,
    /// Top-level parameters that were provided and passed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provided: Vec<String>,
}

impl CheckReport {
    pub fn from_outcome(outcome: &ObjectCheckOutcome) -> Self {
        match outcome {
            Ok(checked) => Self {
                successful: true,
                failing_parameter_path: None,
                kind: None,
                message: None,
                safe_to_show: None,
                provided: checked.provided.clone(),
            },
            Err(failure) => Self {
                successful: false,
                failing_parameter_path: Some(failure.failing_path()).filter(|p| !p.is_empty()),
                kind: Some(failure.kind.as_str().to_string()),
                message: Some(failure.message.clone()),
                safe_to_show: Some(failure.safe_to_show),
                provided: Vec::new(),
            },
        }
    }

    /// View suitable for the external caller, using the default generic
    /// message.
    pub fn public(&self) -> Self {
        self.public_with(GENERIC_FAILURE_MESSAGE)
    }

    /// View suitable for the external caller: a message not flagged safe is
    /// replaced by `generic`.
    pub fn public_with(&self, generic: &str) -> Self {
        let mut view = self.clone();
        if view.safe_to_show == Some(false) {
            view.message = Some(generic.to_string());
        }
        view
    }
}

impl From<&ObjectCheckOutcome> for CheckReport {
    fn from(outcome: &ObjectCheckOutcome) -> Self {
        Self::from_outcome(outcome)
    }
}
