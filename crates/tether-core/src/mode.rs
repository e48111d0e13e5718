#![forbid(unsafe_code)]

//! Synchronization modes, update triggers and per-sync results.

use std::fmt;
use std::rc::Rc;

/// Direction policy of a binding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BindingMode {
    /// Copy source into target once, at bind time.
    OneTime,
    /// Push every source change into the target.
    OneWay,
    /// Push target changes into the source; never update the target.
    OneWayToSource,
    /// Keep both sides in sync.
    TwoWay,
    /// Let the target's capability decide (resolved at bind time).
    #[default]
    Default,
}

impl BindingMode {
    /// Whether `update_target` is permitted in this mode.
    #[must_use]
    pub const fn updates_target(self) -> bool {
        matches!(self, Self::OneTime | Self::OneWay | Self::TwoWay)
    }

    /// Whether `update_source` is permitted in this mode.
    #[must_use]
    pub const fn updates_source(self) -> bool {
        matches!(self, Self::OneWayToSource | Self::TwoWay)
    }

    /// Whether the source is observed after the initial flush.
    #[must_use]
    pub const fn listens_to_source(self) -> bool {
        matches!(self, Self::OneWay | Self::TwoWay)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::OneTime => "OneTime",
            Self::OneWay => "OneWay",
            Self::OneWayToSource => "OneWayToSource",
            Self::TwoWay => "TwoWay",
            Self::Default => "Default",
        }
    }
}

impl fmt::Display for BindingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What pushes a target-side edit into the source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum UpdateSourceTrigger {
    /// Use the adapter's default trigger.
    #[default]
    Default,
    /// Only an explicit `update_source` call.
    Explicit,
    /// When the target loses focus.
    LostFocus,
    /// On every target property change.
    PropertyChanged,
}

impl UpdateSourceTrigger {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::Explicit => "Explicit",
            Self::LostFocus => "LostFocus",
            Self::PropertyChanged => "PropertyChanged",
        }
    }
}

impl fmt::Display for UpdateSourceTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one synchronization attempt, delivered to the result listener.
///
/// Conversion and validation failures are mutually exclusive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BindingResult {
    Success,
    ConversionFailed(String),
    ValidationFailed(String),
}

impl BindingResult {
    #[must_use]
    pub fn has_error(&self) -> bool {
        !matches!(self, Self::Success)
    }

    #[must_use]
    pub fn has_conversion_error(&self) -> bool {
        matches!(self, Self::ConversionFailed(_))
    }

    #[must_use]
    pub fn has_validation_error(&self) -> bool {
        matches!(self, Self::ValidationFailed(_))
    }

    /// Error message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success => None,
            Self::ConversionFailed(message) | Self::ValidationFailed(message) => Some(message),
        }
    }
}

/// Receives a [`BindingResult`] after every synchronization attempt.
pub type ResultListener = Rc<dyn Fn(&BindingResult)>;
