#![forbid(unsafe_code)]

//! Property synchronization engine for Tether.
//!
//! This crate provides:
//! - [`Binding`] to keep a target property in sync with a source property
//!   under a [`BindingMode`], without feedback loops
//! - [`resolve`](property::resolve) for name-convention property lookup over
//!   explicit accessor tables ([`TypeDescriptor`])
//! - [`ObservableList`] and collection relays between list-valued properties
//! - [`BindingSettings`] holding converters, adapters and the fail-open policy
//! - [`BindingGroup`] for several bindings sharing one source
//!
//! Everything is single-threaded: bindings, sources and targets share state
//! through `Rc` and must stay on the thread that created them.

pub mod adapter;
pub mod binding;
pub mod convert;
pub mod endpoint;
pub mod error;
pub mod group;
pub mod listener;
pub mod mode;
pub mod observable;
pub mod property;
mod relay;
pub mod settings;
pub mod validate;
pub mod value;

pub use adapter::{AdapterError, BindingAdapter, Capability, FocusLostListener, UiBindingAdapter};
pub use binding::Binding;
pub use convert::{BindingConverter, ConversionError, FnConverter, StringToIntegerConverter};
pub use endpoint::{BindingSource, BindingTarget};
pub use error::{Accessor, BindingError, Side};
pub use group::BindingGroup;
pub use listener::{
    ListenerHandle, NotifyPropertyChanged, PropertyChangeSupport, PropertyChangedListener,
};
pub use mode::{BindingMode, BindingResult, ResultListener, UpdateSourceTrigger};
pub use observable::{ListDelta, ObservableList};
pub use property::{MemberFlags, PropertyDescriptor, PropertyError, Reflect, TypeDescriptor};
#[cfg(feature = "policy-config")]
pub use settings::PolicyError;
pub use settings::{BindingPolicy, BindingSettings, SettingsError};
pub use validate::{BindingValidator, RequiredValidator, ValidationError, ValidationResult};
pub use value::{Sequence, SharedList, Value, ValueType};

/// Everything needed to declare bindable types and bind them.
pub mod prelude {
    pub use crate::adapter::{BindingAdapter, UiBindingAdapter};
    pub use crate::binding::Binding;
    pub use crate::endpoint::{BindingSource, BindingTarget};
    pub use crate::error::BindingError;
    pub use crate::group::BindingGroup;
    pub use crate::listener::{
        ListenerHandle, NotifyPropertyChanged, PropertyChangeSupport, PropertyChangedListener,
    };
    pub use crate::mode::{BindingMode, BindingResult, UpdateSourceTrigger};
    pub use crate::observable::ObservableList;
    pub use crate::property::{Reflect, TypeDescriptor};
    pub use crate::settings::BindingSettings;
    pub use crate::value::{SharedList, Value, ValueType};
}
