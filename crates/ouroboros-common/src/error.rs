//! Error types for ouroboros

use thiserror::Error;

/// Result type alias for ouroboros operations
pub type Result<T> = std::result::Result<T, DataBridgeError>;

/// Unified error type for all ouroboros operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataBridgeError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    // Relation composition errors. All of these are caused by caller input or
    // model definitions and are never retried.

    /// Model name absent from the registry
    #[error("Model not defined: {0}")]
    ModelNotDefined(String),

    /// Association name absent from the model
    #[error("Association not defined: {0}")]
    AssociationNotDefined(String),

    /// Field token is neither a declared field, an association, nor an expression
    #[error("Field not defined: {0}")]
    FieldNotDefined(String),

    /// Selection operation token outside the include/exclude/default families
    #[error("Invalid select field operation: {0}")]
    SelectFieldOperationInvalid(String),

    /// Unknown join type token, or a join condition that is not a predicate
    #[error("Invalid join type: {0}")]
    JoinTypeInvalid(String),
}

impl DataBridgeError {
    /// Returns true if this error is potentially retryable
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Returns true if the error was raised while resolving a join or selection
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            DataBridgeError::ModelNotDefined(_)
                | DataBridgeError::AssociationNotDefined(_)
                | DataBridgeError::FieldNotDefined(_)
                | DataBridgeError::SelectFieldOperationInvalid(_)
                | DataBridgeError::JoinTypeInvalid(_)
        )
    }
}

impl From<serde_json::Error> for DataBridgeError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            DataBridgeError::Deserialization(err.to_string())
        } else {
            DataBridgeError::Serialization(err.to_string())
        }
    }
}

impl From<serde_yaml::Error> for DataBridgeError {
    fn from(err: serde_yaml::Error) -> Self {
        DataBridgeError::Deserialization(format!("YAML error: {}", err))
    }
}

impl From<std::io::Error> for DataBridgeError {
    fn from(err: std::io::Error) -> Self {
        DataBridgeError::Internal(format!("I/O error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_deserialization() {
        let err = DataBridgeError::Deserialization("missing field".to_string());
        assert_eq!(err.to_string(), "Deserialization error: missing field");
    }

    #[test]
    fn test_error_display_validation() {
        let err = DataBridgeError::Validation("field required".to_string());
        assert_eq!(err.to_string(), "Validation error: field required");
    }

    #[test]
    fn test_error_display_association_not_defined() {
        let err = DataBridgeError::AssociationNotDefined("author".to_string());
        assert_eq!(err.to_string(), "Association not defined: author");
    }

    #[test]
    fn test_error_display_field_not_defined() {
        let err = DataBridgeError::FieldNotDefined("nonexistent".to_string());
        assert_eq!(err.to_string(), "Field not defined: nonexistent");
    }

    #[test]
    fn test_error_display_join_type_invalid() {
        let err = DataBridgeError::JoinTypeInvalid("cross".to_string());
        assert_eq!(err.to_string(), "Invalid join type: cross");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: DataBridgeError = json_err.into();
        assert!(matches!(err, DataBridgeError::Deserialization(_)));
    }

    #[test]
    fn test_from_serde_yaml_error() {
        let yaml_err = serde_yaml::from_str::<Vec<String>>("{ not: a list").unwrap_err();
        let err: DataBridgeError = yaml_err.into();
        assert!(matches!(err, DataBridgeError::Deserialization(_)));
    }

    #[test]
    fn test_resolution_errors_are_not_retryable() {
        let errors = [
            DataBridgeError::AssociationNotDefined("a".to_string()),
            DataBridgeError::FieldNotDefined("f".to_string()),
            DataBridgeError::SelectFieldOperationInvalid("op".to_string()),
            DataBridgeError::JoinTypeInvalid("jt".to_string()),
        ];
        for err in &errors {
            assert!(err.is_resolution_error());
            assert!(!err.is_retryable());
        }
        assert!(!DataBridgeError::Validation("v".to_string()).is_resolution_error());
    }

    #[test]
    fn test_result_type_err() {
        let result: Result<i32> = Err(DataBridgeError::Internal("failed".to_string()));
        assert!(result.is_err());
    }
}
