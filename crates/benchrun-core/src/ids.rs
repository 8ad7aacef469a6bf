//! Newtype wrappers for identifiers to ensure type safety.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier from a string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the inner string reference.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

string_id!(
    /// Stable identifier of a benchmark instance (e.g. `astropy__astropy-12907`).
    InstanceId
);

string_id!(
    /// Short registry key of a model (e.g. `claude_budget`).
    ModelKey
);

string_id!(
    /// Identifier under which a prediction batch is submitted for evaluation.
    RunId
);

impl RunId {
    /// Run identifier for a baseline batch of `problems` instances.
    pub fn baseline(model_key: &ModelKey, problems: usize) -> Self {
        Self(format!("baseline_{}_{}problems", model_key, problems))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_run_id() {
        let key = ModelKey::new("grok_best");
        assert_eq!(RunId::baseline(&key, 50).as_str(), "baseline_grok_best_50problems");
    }

    #[test]
    fn test_id_display() {
        let id = InstanceId::new("django__django-11099");
        assert_eq!(format!("{}", id), "django__django-11099");
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = InstanceId::from("x1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"x1\"");
    }
}
