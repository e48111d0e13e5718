#![forbid(unsafe_code)]

//! Binding endpoints.
//!
//! A source must both describe its properties ([`Reflect`]) and report their
//! changes ([`NotifyPropertyChanged`]). A target either does the same or is a
//! foreign object reached through an adapter registered for its concrete
//! type.

use std::any::{Any, TypeId};
use std::fmt;
use std::rc::Rc;

use crate::listener::NotifyPropertyChanged;
use crate::property::Reflect;

/// Anything that can be the source of a binding.
pub trait BindingSource: Reflect + NotifyPropertyChanged {}

impl<T: Reflect + NotifyPropertyChanged> BindingSource for T {}

/// The target object of a binding.
#[derive(Clone)]
pub enum BindingTarget {
    /// Notifies by itself and is accessed through its accessor table.
    Notifying(Rc<dyn BindingSource>),
    /// Any other object; bind requires an adapter for its concrete type.
    Foreign {
        object: Rc<dyn Any>,
        type_name: &'static str,
    },
}

impl BindingTarget {
    pub fn notifying<T: BindingSource>(target: Rc<T>) -> Self {
        Self::Notifying(target)
    }

    pub fn foreign<T: Any>(target: Rc<T>) -> Self {
        Self::Foreign {
            object: target,
            type_name: std::any::type_name::<T>(),
        }
    }

    /// The target object itself, for accessors and adapters.
    #[must_use]
    pub fn as_any(&self) -> &dyn Any {
        match self {
            Self::Notifying(target) => target.as_any(),
            Self::Foreign { object, .. } => &**object,
        }
    }

    /// Concrete runtime type of the target object.
    #[must_use]
    pub fn concrete_type(&self) -> TypeId {
        self.as_any().type_id()
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Notifying(target) => target.type_descriptor().name(),
            Self::Foreign { type_name, .. } => type_name,
        }
    }

    /// Whether both handles point at the same object.
    #[must_use]
    pub fn same_object(&self, other: &Self) -> bool {
        std::ptr::addr_eq(self.as_any(), other.as_any())
    }
}

impl fmt::Debug for BindingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Notifying(_) => "Notifying",
            Self::Foreign { .. } => "Foreign",
        };
        f.debug_struct("BindingTarget")
            .field("kind", &kind)
            .field("type_name", &self.type_name())
            .finish()
    }
}
