#![forbid(unsafe_code)]

//! Adapter capability for targets that cannot notify on their own.
//!
//! Third-party widgets usually cannot implement
//! [`NotifyPropertyChanged`](crate::listener::NotifyPropertyChanged) or expose
//! an accessor table. A [`BindingAdapter`] registered for the widget's concrete
//! type stands in for both. UI-flavoured adapters additionally implement
//! [`UiBindingAdapter`], which supplies a default update trigger and
//! focus-loss notifications.

use std::any::{Any, TypeId};
use std::fmt;
use std::rc::Rc;

use crate::listener::{ListenerHandle, PropertyChangedListener};
use crate::mode::{BindingMode, UpdateSourceTrigger};
use crate::value::{Value, ValueType};

/// Callback fired when a UI target loses focus.
pub type FocusLostListener = Rc<dyn Fn()>;

/// Errors raised by adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// The adapter does not know this property.
    UnknownProperty {
        adapter: &'static str,
        property: String,
    },
    /// The adapter knows the property but not this operation on it.
    Unsupported {
        adapter: &'static str,
        operation: &'static str,
        property: String,
    },
    /// The target handed to the adapter is not of its type.
    WrongTarget { adapter: &'static str },
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownProperty { adapter, property } => {
                write!(f, "{adapter} has no property '{property}'")
            }
            Self::Unsupported {
                adapter,
                operation,
                property,
            } => write!(f, "{adapter} does not support {operation} on '{property}'"),
            Self::WrongTarget { adapter } => write!(f, "target is not a {adapter}"),
        }
    }
}

impl std::error::Error for AdapterError {}

/// Access and change subscription for one concrete target type.
pub trait BindingAdapter {
    /// The concrete target type this adapter serves.
    fn target_type(&self) -> TypeId;

    /// Human-readable target type name for diagnostics.
    fn target_type_name(&self) -> &'static str;

    /// Declared type of `property`, or `None` if unknown.
    fn target_property_type(&self, property: &str) -> Option<ValueType>;

    fn get_value(&self, target: &dyn Any, property: &str) -> Result<Value, AdapterError>;

    fn set_value(&self, target: &dyn Any, property: &str, value: Value) -> Result<(), AdapterError>;

    /// Subscribe to changes of the target's properties.
    fn add_change_listener(
        &self,
        target: &dyn Any,
        listener: PropertyChangedListener,
    ) -> Result<ListenerHandle, AdapterError>;

    fn remove_change_listener(&self, target: &dyn Any, handle: ListenerHandle) -> Result<(), AdapterError>;

    /// Mode used when a binding declares `BindingMode::Default`.
    fn default_mode(&self) -> BindingMode;

    /// UI capabilities, if this is a UI-flavoured adapter.
    fn as_ui(&self) -> Option<&dyn UiBindingAdapter> {
        None
    }
}

/// Extra capabilities of adapters for interactive widgets.
pub trait UiBindingAdapter: BindingAdapter {
    /// Trigger used when a binding declares `UpdateSourceTrigger::Default`.
    /// Must not return `Default`.
    fn default_update_trigger(&self) -> UpdateSourceTrigger;

    fn add_focus_lost_listener(
        &self,
        target: &dyn Any,
        listener: FocusLostListener,
    ) -> Result<ListenerHandle, AdapterError>;

    fn remove_focus_lost_listener(&self, target: &dyn Any, handle: ListenerHandle) -> Result<(), AdapterError>;
}

/// How a bound binding reaches its target, fixed from bind to unbind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    /// The target notifies and is accessed through its accessor table.
    DirectNotifying,
    /// A UI adapter with its own update trigger and focus events.
    AdaptedUi,
    /// A plain adapter: change subscription only.
    AdaptedPlain,
}

impl Capability {
    pub(crate) fn of(adapter: &dyn BindingAdapter) -> Self {
        if adapter.as_ui().is_some() {
            Self::AdaptedUi
        } else {
            Self::AdaptedPlain
        }
    }

    #[must_use]
    pub const fn is_adapted(self) -> bool {
        !matches!(self, Self::DirectNotifying)
    }
}
