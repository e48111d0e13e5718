#![forbid(unsafe_code)]

//! Converter and adapter registries plus binding policy.
//!
//! [`BindingSettings`] is an explicit configuration object: build one at the
//! composition root and hand `Rc` clones to every binding that should share
//! it. Registries are filled during setup and only read afterwards.
//!
//! # Invariants
//!
//! 1. For every registered converter `(A, B)` the reverse `(B, A)` is also
//!    registered.
//! 2. A direction is registered at most once; a duplicate fails at
//!    registration time and leaves the registry unchanged.
//! 3. At most one adapter exists per concrete target type.
//!
//! # Policy Configuration
//!
//! With the `policy-config` feature, [`BindingPolicy`] can be loaded from
//! TOML or JSON:
//!
//! ```toml
//! update_source_if_binding_fails = false
//! ```

use std::any::TypeId;
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;

use crate::adapter::BindingAdapter;
use crate::convert::{BindingConverter, ReversedConverter, StringToIntegerConverter};
use crate::value::ValueType;

/// Registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    DuplicateConverter { first: ValueType, second: ValueType },
    DuplicateAdapter { target: &'static str },
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateConverter { first, second } => {
                write!(f, "converter for {first} -> {second} is already registered")
            }
            Self::DuplicateAdapter { target } => {
                write!(f, "adapter for {target} is already registered")
            }
        }
    }
}

impl std::error::Error for SettingsError {}

/// Behaviour knobs copied into every new binding.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "policy-config",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct BindingPolicy {
    /// When conversion or validation of a target value fails, write `Null`
    /// into the source (`true`) or leave the source untouched (`false`).
    pub update_source_if_binding_fails: bool,
}

impl Default for BindingPolicy {
    fn default() -> Self {
        Self {
            update_source_if_binding_fails: true,
        }
    }
}

/// Errors from loading a [`BindingPolicy`].
#[cfg(feature = "policy-config")]
#[derive(Debug)]
pub enum PolicyError {
    Toml(toml::de::Error),
    Json(serde_json::Error),
}

#[cfg(feature = "policy-config")]
impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Toml(e) => write!(f, "invalid policy TOML: {e}"),
            Self::Json(e) => write!(f, "invalid policy JSON: {e}"),
        }
    }
}

#[cfg(feature = "policy-config")]
impl std::error::Error for PolicyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Toml(e) => Some(e),
            Self::Json(e) => Some(e),
        }
    }
}

#[cfg(feature = "policy-config")]
impl BindingPolicy {
    /// Parse a policy from TOML. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Toml`] on malformed input.
    pub fn from_toml_str(input: &str) -> Result<Self, PolicyError> {
        toml::from_str(input).map_err(PolicyError::Toml)
    }

    /// Parse a policy from JSON. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Json`] on malformed input.
    pub fn from_json_str(input: &str) -> Result<Self, PolicyError> {
        serde_json::from_str(input).map_err(PolicyError::Json)
    }
}

/// Converters, adapters and policy shared by a set of bindings.
#[derive(Default)]
pub struct BindingSettings {
    converters: AHashMap<(ValueType, ValueType), Rc<dyn BindingConverter>>,
    adapters: AHashMap<TypeId, Rc<dyn BindingAdapter>>,
    policy: BindingPolicy,
}

impl BindingSettings {
    /// Empty registries, default policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registries preloaded with the built-in text/integer converter.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut settings = Self::new();
        settings
            .converters
            .insert((ValueType::Text, ValueType::Int), Rc::new(StringToIntegerConverter));
        settings.converters.insert(
            (ValueType::Int, ValueType::Text),
            Rc::new(ReversedConverter::new(Rc::new(StringToIntegerConverter))),
        );
        settings
    }

    /// Register `converter` and its reverse.
    ///
    /// # Errors
    ///
    /// [`SettingsError::DuplicateConverter`] if either direction exists.
    pub fn add_converter(&mut self, converter: impl BindingConverter + 'static) -> Result<(), SettingsError> {
        let forward: Rc<dyn BindingConverter> = Rc::new(converter);
        let first = forward.first_type();
        let second = forward.second_type();
        for key in [(first, second), (second, first)] {
            if self.converters.contains_key(&key) {
                return Err(SettingsError::DuplicateConverter {
                    first: key.0,
                    second: key.1,
                });
            }
        }
        let backward: Rc<dyn BindingConverter> = Rc::new(ReversedConverter::new(Rc::clone(&forward)));
        self.converters.insert((first, second), forward);
        self.converters.insert((second, first), backward);
        tracing::debug!(%first, %second, "converter registered");
        Ok(())
    }

    /// Converter whose `convert` maps `first` into `second`.
    #[must_use]
    pub fn converter_for(&self, first: ValueType, second: ValueType) -> Option<Rc<dyn BindingConverter>> {
        self.converters.get(&(first, second)).cloned()
    }

    /// Register an adapter for its concrete target type.
    ///
    /// # Errors
    ///
    /// [`SettingsError::DuplicateAdapter`] if the type already has one.
    pub fn add_adapter(&mut self, adapter: impl BindingAdapter + 'static) -> Result<(), SettingsError> {
        let target = adapter.target_type();
        if self.adapters.contains_key(&target) {
            return Err(SettingsError::DuplicateAdapter {
                target: adapter.target_type_name(),
            });
        }
        tracing::debug!(target = adapter.target_type_name(), "adapter registered");
        self.adapters.insert(target, Rc::new(adapter));
        Ok(())
    }

    #[must_use]
    pub fn adapter_for(&self, target: TypeId) -> Option<Rc<dyn BindingAdapter>> {
        self.adapters.get(&target).cloned()
    }

    #[must_use]
    pub fn policy(&self) -> &BindingPolicy {
        &self.policy
    }

    pub fn set_policy(&mut self, policy: BindingPolicy) {
        self.policy = policy;
    }

    #[must_use]
    pub fn converter_count(&self) -> usize {
        self.converters.len()
    }

    #[must_use]
    pub fn adapter_count(&self) -> usize {
        self.adapters.len()
    }
}

impl fmt::Debug for BindingSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingSettings")
            .field("converter_count", &self.converters.len())
            .field("adapter_count", &self.adapters.len())
            .field("policy", &self.policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::FnConverter;
    use crate::value::Value;

    fn bool_text() -> FnConverter {
        FnConverter::new(
            ValueType::Bool,
            ValueType::Text,
            |v| Ok(Value::from(v.as_bool().map(|b| b.to_string()))),
            |v| Ok(Value::from(v.as_text().map(|t| t == "true"))),
        )
    }

    #[test]
    fn defaults_register_both_directions() {
        let settings = BindingSettings::with_defaults();
        assert_eq!(settings.converter_count(), 2);
        let text_to_int = settings
            .converter_for(ValueType::Text, ValueType::Int)
            .unwrap();
        assert_eq!(text_to_int.convert(Value::from("3")).unwrap(), Value::Int(3));
        let int_to_text = settings
            .converter_for(ValueType::Int, ValueType::Text)
            .unwrap();
        assert_eq!(int_to_text.convert(Value::Int(3)).unwrap(), Value::from("3"));
    }

    #[test]
    fn reverse_is_derived_on_registration() {
        let mut settings = BindingSettings::new();
        settings.add_converter(bool_text()).unwrap();
        let back = settings
            .converter_for(ValueType::Text, ValueType::Bool)
            .unwrap();
        assert_eq!(back.convert(Value::from("true")).unwrap(), Value::Bool(true));
    }

    #[test]
    fn duplicate_direction_is_rejected_without_side_effects() {
        let mut settings = BindingSettings::with_defaults();
        let dup = FnConverter::new(ValueType::Int, ValueType::Text, Ok, Ok);
        assert_eq!(
            settings.add_converter(dup),
            Err(SettingsError::DuplicateConverter {
                first: ValueType::Int,
                second: ValueType::Text
            })
        );
        assert_eq!(settings.converter_count(), 2);
    }

    #[test]
    fn missing_converter_is_none() {
        let settings = BindingSettings::new();
        assert!(settings
            .converter_for(ValueType::Float, ValueType::Text)
            .is_none());
    }

    #[test]
    fn policy_defaults_to_fail_open() {
        assert!(BindingSettings::new().policy().update_source_if_binding_fails);
    }

    #[cfg(feature = "policy-config")]
    #[test]
    fn policy_loads_from_toml_and_json() {
        let p = BindingPolicy::from_toml_str("update_source_if_binding_fails = false").unwrap();
        assert!(!p.update_source_if_binding_fails);
        let p = BindingPolicy::from_json_str("{}").unwrap();
        assert!(p.update_source_if_binding_fails);
        assert!(BindingPolicy::from_toml_str("update_source_if_binding_fails = 3").is_err());
    }
}
