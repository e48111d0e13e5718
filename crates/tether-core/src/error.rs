#![forbid(unsafe_code)]

//! Error type for binding construction, binding and propagation.
//!
//! Configuration problems (unknown properties, missing converters or
//! adapters, missing accessors) surface from `bind()` and are never recovered
//! internally. Conversion and validation failures are *not* errors here: they
//! travel through the result listener as a
//! [`BindingResult`](crate::mode::BindingResult).

use std::fmt;

use crate::adapter::AdapterError;
use crate::mode::BindingMode;
use crate::property::PropertyError;
use crate::settings::SettingsError;
use crate::value::ValueType;

/// Endpoint of a binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Source,
    Target,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => f.write_str("source"),
            Self::Target => f.write_str("target"),
        }
    }
}

/// An accessor the effective mode needs but the property lacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Accessor {
    SourceGetter,
    SourceSetter,
    TargetGetter,
    TargetSetter,
}

impl fmt::Display for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SourceGetter => "source property getter",
            Self::SourceSetter => "source property setter",
            Self::TargetGetter => "target property getter",
            Self::TargetSetter => "target property setter",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    /// Empty identifier passed at construction.
    Argument(&'static str),
    /// Resolving or accessing a property failed.
    Property { side: Side, error: PropertyError },
    /// The target cannot notify and no adapter is registered for its type.
    AdapterNotFound { target: &'static str },
    /// The adapter does not declare the bound target property.
    UnknownAdapterProperty { adapter: &'static str, property: String },
    /// A UI adapter reported `Default` as its default update trigger.
    InvalidAdapterTrigger { adapter: &'static str },
    /// Types differ, a converter is required, and none is registered.
    ConverterNotFound { from: ValueType, to: ValueType },
    MissingAccessor(Accessor),
    /// A collection relay needs a list-typed property on `side`.
    NotASequence { side: Side },
    /// `update_target`/`update_source` called in a mode that forbids it.
    Mode {
        operation: &'static str,
        mode: BindingMode,
    },
    /// The operation needs a bound binding.
    NotBound { operation: &'static str },
    Adapter(AdapterError),
    Settings(SettingsError),
    /// A group was bound without a source.
    GroupWithoutSource,
    /// Group settings cannot change while the group is bound.
    GroupBound,
}

impl fmt::Display for BindingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Argument(what) => write!(f, "{what} is empty"),
            Self::Property { side, error } => write!(f, "{side} property: {error}"),
            Self::AdapterNotFound { target } => write!(f, "adapter for {target} not found"),
            Self::UnknownAdapterProperty { adapter, property } => {
                write!(f, "{adapter} does not declare property '{property}'")
            }
            Self::InvalidAdapterTrigger { adapter } => write!(
                f,
                "{adapter} returned Default as its default update trigger"
            ),
            Self::ConverterNotFound { from, to } => {
                write!(f, "converter for {from} -> {to} not found")
            }
            Self::MissingAccessor(accessor) => write!(f, "{accessor} not found"),
            Self::NotASequence { side } => {
                write!(f, "{side} property must be a sequence to relay a collection")
            }
            Self::Mode { operation, mode } => {
                write!(f, "cannot {operation} in {mode} binding mode")
            }
            Self::NotBound { operation } => write!(f, "cannot {operation}: binding is not bound"),
            Self::Adapter(e) => write!(f, "adapter: {e}"),
            Self::Settings(e) => write!(f, "settings: {e}"),
            Self::GroupWithoutSource => f.write_str("binding group has no source"),
            Self::GroupBound => f.write_str("cannot change settings of a bound binding group"),
        }
    }
}

impl std::error::Error for BindingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Property { error, .. } => Some(error),
            Self::Adapter(e) => Some(e),
            Self::Settings(e) => Some(e),
            _ => None,
        }
    }
}

impl From<AdapterError> for BindingError {
    fn from(e: AdapterError) -> Self {
        Self::Adapter(e)
    }
}

impl From<SettingsError> for BindingError {
    fn from(e: SettingsError) -> Self {
        Self::Settings(e)
    }
}

impl BindingError {
    pub(crate) fn source_property(error: PropertyError) -> Self {
        Self::Property {
            side: Side::Source,
            error,
        }
    }

    pub(crate) fn target_property(error: PropertyError) -> Self {
        Self::Property {
            side: Side::Target,
            error,
        }
    }

    /// Whether this is a configuration problem detected while binding.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Property { .. }
                | Self::AdapterNotFound { .. }
                | Self::UnknownAdapterProperty { .. }
                | Self::InvalidAdapterTrigger { .. }
                | Self::ConverterNotFound { .. }
                | Self::MissingAccessor(_)
                | Self::NotASequence { .. }
                | Self::Settings(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn messages_name_the_problem() {
        let e = BindingError::ConverterNotFound {
            from: ValueType::Text,
            to: ValueType::Float,
        };
        assert_eq!(e.to_string(), "converter for text -> float not found");
        assert_eq!(
            BindingError::MissingAccessor(Accessor::SourceSetter).to_string(),
            "source property setter not found"
        );
        assert_eq!(
            BindingError::Mode {
                operation: "update target",
                mode: BindingMode::OneWayToSource
            }
            .to_string(),
            "cannot update target in OneWayToSource binding mode"
        );
    }

    #[test]
    fn property_errors_are_chained() {
        let e = BindingError::source_property(PropertyError::InvalidName("X".into()));
        assert!(e.source().is_some());
        assert!(e.is_configuration());
        assert!(!BindingError::Argument("source property").is_configuration());
    }

    #[test]
    fn from_settings_error() {
        let e: BindingError = SettingsError::DuplicateAdapter { target: "Widget" }.into();
        assert!(matches!(e, BindingError::Settings(_)));
    }
}
