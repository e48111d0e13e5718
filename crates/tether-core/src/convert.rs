#![forbid(unsafe_code)]

//! Value converters.
//!
//! A [`BindingConverter`] maps between two [`ValueType`]s in both directions.
//! Registration in [`BindingSettings`](crate::settings::BindingSettings)
//! stores it under `(first, second)` and derives the reverse `(second, first)`
//! entry automatically by swapping `convert` and `convert_back`.
//!
//! The engine looks converters up as `(target type, source type)`:
//! `convert` carries target values into the source, `convert_back` carries
//! source values into the target.

use std::fmt;
use std::rc::Rc;

use crate::value::{Value, ValueType};

/// Why a value could not be converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionError {
    reason: String,
}

impl ConversionError {
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

impl std::error::Error for ConversionError {}

pub type ConversionResult = Result<Value, ConversionError>;

/// Symmetric conversion between two value types.
pub trait BindingConverter {
    fn first_type(&self) -> ValueType;

    fn second_type(&self) -> ValueType;

    /// Convert a value of the first type into the second.
    fn convert(&self, value: Value) -> ConversionResult;

    /// Convert a value of the second type into the first.
    fn convert_back(&self, value: Value) -> ConversionResult;
}

/// The reverse direction of a registered converter.
pub(crate) struct ReversedConverter {
    inner: Rc<dyn BindingConverter>,
}

impl ReversedConverter {
    pub(crate) fn new(inner: Rc<dyn BindingConverter>) -> Self {
        Self { inner }
    }
}

impl BindingConverter for ReversedConverter {
    fn first_type(&self) -> ValueType {
        self.inner.second_type()
    }

    fn second_type(&self) -> ValueType {
        self.inner.first_type()
    }

    fn convert(&self, value: Value) -> ConversionResult {
        self.inner.convert_back(value)
    }

    fn convert_back(&self, value: Value) -> ConversionResult {
        self.inner.convert(value)
    }
}

/// Text ⇄ integer. `Null` converts to `Null` in both directions.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringToIntegerConverter;

impl BindingConverter for StringToIntegerConverter {
    fn first_type(&self) -> ValueType {
        ValueType::Text
    }

    fn second_type(&self) -> ValueType {
        ValueType::Int
    }

    fn convert(&self, value: Value) -> ConversionResult {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Text(text) => text
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| ConversionError::new("Incorrect number")),
            other => Err(ConversionError::new(format!("expected text, got {other}"))),
        }
    }

    fn convert_back(&self, value: Value) -> ConversionResult {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Int(i) => Ok(Value::Text(i.to_string())),
            other => Err(ConversionError::new(format!("expected int, got {other}"))),
        }
    }
}

type ConvertFn = Box<dyn Fn(Value) -> ConversionResult>;

/// Converter assembled from two closures.
///
/// ```
/// use tether_core::convert::{BindingConverter, ConversionError, FnConverter};
/// use tether_core::value::{Value, ValueType};
///
/// let yes_no = FnConverter::new(
///     ValueType::Bool,
///     ValueType::Text,
///     |v| Ok(Value::from(if v.as_bool() == Some(true) { "yes" } else { "no" })),
///     |v| match v.as_text() {
///         Some("yes") => Ok(Value::Bool(true)),
///         Some("no") => Ok(Value::Bool(false)),
///         _ => Err(ConversionError::new("expected yes or no")),
///     },
/// );
/// assert_eq!(yes_no.convert(Value::Bool(true)).unwrap(), Value::from("yes"));
/// ```
pub struct FnConverter {
    first: ValueType,
    second: ValueType,
    forward: ConvertFn,
    backward: ConvertFn,
}

impl FnConverter {
    pub fn new(
        first: ValueType,
        second: ValueType,
        forward: impl Fn(Value) -> ConversionResult + 'static,
        backward: impl Fn(Value) -> ConversionResult + 'static,
    ) -> Self {
        Self {
            first,
            second,
            forward: Box::new(forward),
            backward: Box::new(backward),
        }
    }
}

impl BindingConverter for FnConverter {
    fn first_type(&self) -> ValueType {
        self.first
    }

    fn second_type(&self) -> ValueType {
        self.second
    }

    fn convert(&self, value: Value) -> ConversionResult {
        (self.forward)(value)
    }

    fn convert_back(&self, value: Value) -> ConversionResult {
        (self.backward)(value)
    }
}

impl fmt::Debug for FnConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnConverter")
            .field("first", &self.first)
            .field("second", &self.second)
            .finish()
    }
}
