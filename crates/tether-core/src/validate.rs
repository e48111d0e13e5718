#![forbid(unsafe_code)]

//! Validators gate values on their way into the source.
//!
//! Any `Fn(&Value) -> ValidationResult` is a validator.

use std::fmt;

use crate::value::Value;

/// A rejected value and the message to show for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

pub trait BindingValidator {
    fn validate(&self, value: &Value) -> ValidationResult;
}

impl<F> BindingValidator for F
where
    F: Fn(&Value) -> ValidationResult,
{
    fn validate(&self, value: &Value) -> ValidationResult {
        self(value)
    }
}

/// Rejects `Null` and empty text.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredValidator;

impl BindingValidator for RequiredValidator {
    fn validate(&self, value: &Value) -> ValidationResult {
        match value {
            Value::Null => Err(ValidationError::new("Value is required")),
            Value::Text(text) if text.is_empty() => Err(ValidationError::new("Value is required")),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_null_and_empty_text() {
        assert!(RequiredValidator.validate(&Value::Null).is_err());
        assert!(RequiredValidator.validate(&Value::from("")).is_err());
        assert!(RequiredValidator.validate(&Value::from("x")).is_ok());
        assert!(RequiredValidator.validate(&Value::Int(0)).is_ok());
    }

    #[test]
    fn required_message() {
        let err = RequiredValidator.validate(&Value::Null).unwrap_err();
        assert_eq!(err.message(), "Value is required");
    }

    #[test]
    fn closures_are_validators() {
        let positive = |v: &Value| match v.as_int() {
            Some(n) if n > 0 => Ok(()),
            _ => Err(ValidationError::new("must be positive")),
        };
        assert!(positive.validate(&Value::Int(3)).is_ok());
        assert_eq!(
            positive.validate(&Value::Int(-1)).unwrap_err().to_string(),
            "must be positive"
        );
    }
}
