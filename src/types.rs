use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::fmt;

/// Outcome of one refactoring attempt.
///
/// Serialises as `{"succeeded": true, "source_code": …}` or
/// `{"succeeded": false, "error_message": …}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RefactorResult {
    Succeeded { source_code: String },
    Failed { error_message: String },
}

impl Serialize for RefactorResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("RefactorResult", 2)?;
        match self {
            RefactorResult::Succeeded { source_code } => {
                s.serialize_field("succeeded", &true)?;
                s.serialize_field("source_code", source_code)?;
            }
            RefactorResult::Failed { error_message } => {
                s.serialize_field("succeeded", &false)?;
                s.serialize_field("error_message", error_message)?;
            }
        }
        s.end()
    }
}

impl RefactorResult {
    pub fn success(source_code: impl Into<String>) -> Self {
        RefactorResult::Succeeded {
            source_code: source_code.into(),
        }
    }

    pub fn failure(error_message: impl Into<String>) -> Self {
        RefactorResult::Failed {
            error_message: error_message.into(),
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self, RefactorResult::Succeeded { .. })
    }

    /// The generated source, if the refactoring succeeded.
    pub fn source_code(&self) -> Option<&str> {
        match self {
            RefactorResult::Succeeded { source_code } => Some(source_code),
            RefactorResult::Failed { .. } => None,
        }
    }

    /// Why the refactoring failed, if it did.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            RefactorResult::Succeeded { .. } => None,
            RefactorResult::Failed { error_message } => Some(error_message),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        // Both variants hold only strings and booleans.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// The generated source verbatim, or the failure message.
impl fmt::Display for RefactorResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefactorResult::Succeeded { source_code } => f.write_str(source_code),
            RefactorResult::Failed { error_message } => f.write_str(error_message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_accessors() {
        let r = RefactorResult::success("acc = [i for i in x]\n");
        assert!(r.succeeded());
        assert_eq!(r.source_code(), Some("acc = [i for i in x]\n"));
        assert_eq!(r.error_message(), None);
    }

    #[test]
    fn test_failure_accessors() {
        let r = RefactorResult::failure("for loop target out of scope");
        assert!(!r.succeeded());
        assert_eq!(r.source_code(), None);
        assert_eq!(r.error_message(), Some("for loop target out of scope"));
    }

    #[test]
    fn test_equal_fields_compare_equal() {
        assert_eq!(RefactorResult::success("a"), RefactorResult::success("a"));
        assert_ne!(RefactorResult::success("a"), RefactorResult::failure("a"));
    }

    #[test]
    fn test_json_shape() {
        assert_eq!(
            RefactorResult::success("x = [i for i in y]\n").to_json(),
            json!({"succeeded": true, "source_code": "x = [i for i in y]\n"})
        );
        assert_eq!(
            RefactorResult::failure("for loop target out of scope").to_json(),
            json!({"succeeded": false, "error_message": "for loop target out of scope"})
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(RefactorResult::failure("nope").to_string(), "nope");
    }
}
