#![forbid(unsafe_code)]

//! Property accessor tables and the name-convention resolver.
//!
//! A bindable type describes itself once with a [`TypeDescriptor`]: a table of
//! members, each with a method-style name (`getText`, `isEnabled`,
//! `setText`), visibility flags, a declared [`ValueType`] and a typed accessor
//! closure. [`resolve`] is a pure lookup from `(descriptor, property name)` to
//! a [`PropertyDescriptor`] holding the read and write entry points.
//!
//! Property names are lower camel case. For property `readOnly` the resolver
//! looks for `getReadOnly`, `isReadOnly` and `setReadOnly` among the public,
//! non-static members.
//!
//! # Failure Modes
//!
//! | Failure | Cause |
//! |---------|-------|
//! | `InvalidName` | empty name, or name not starting lowercase |
//! | `NotFound` | no getter and no setter |
//! | `AmbiguousGetter` | both `get…` and `is…` present |
//! | `TypeMismatch` | getter and setter declare different types |
//! | `InvalidIsGetter` | an `is…` getter not declared as `Bool` |
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use tether_core::property::{resolve, TypeDescriptor};
//! use tether_core::value::{Value, ValueType};
//!
//! struct Counter {
//!     n: Cell<i64>,
//! }
//!
//! let descriptor = TypeDescriptor::builder::<Counter>("Counter")
//!     .getter("getN", ValueType::Int, |c| Value::Int(c.n.get()))
//!     .setter("setN", ValueType::Int, |c, v| c.n.set(v.as_int().unwrap_or(0)))
//!     .build();
//!
//! let n = resolve(&descriptor, "n").unwrap();
//! let counter = Counter { n: Cell::new(1) };
//! n.set(&counter, Value::Int(7)).unwrap();
//! assert_eq!(n.get(&counter).unwrap(), Value::Int(7));
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use bitflags::bitflags;

use crate::value::{Value, ValueType};

bitflags! {
    /// Visibility and binding flags of a descriptor member.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct MemberFlags: u8 {
        const PUBLIC = 1 << 0;
        const STATIC = 1 << 1;
    }
}

type Getter = Rc<dyn Fn(&dyn Any) -> Option<Value>>;
type Setter = Rc<dyn Fn(&dyn Any, Value) -> bool>;

#[derive(Clone)]
enum Access {
    Get(Getter),
    Set(Setter),
}

/// One entry of a [`TypeDescriptor`].
#[derive(Clone)]
pub struct Member {
    name: String,
    flags: MemberFlags,
    value_type: ValueType,
    access: Access,
}

impl Member {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn flags(&self) -> MemberFlags {
        self.flags
    }

    #[must_use]
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    #[must_use]
    pub fn is_setter(&self) -> bool {
        matches!(self.access, Access::Set(_))
    }

    fn is_bindable(&self) -> bool {
        self.flags.contains(MemberFlags::PUBLIC) && !self.flags.contains(MemberFlags::STATIC)
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("value_type", &self.value_type)
            .field("setter", &self.is_setter())
            .finish()
    }
}

/// Accessor table for one concrete type.
///
/// Build it once per type (for example in a `thread_local!`) and hand out
/// `Rc` clones from [`Reflect::type_descriptor`].
pub struct TypeDescriptor {
    name: &'static str,
    type_id: TypeId,
    members: Vec<Member>,
}

impl TypeDescriptor {
    #[must_use]
    pub fn builder<T: 'static>(name: &'static str) -> TypeDescriptorBuilder<T> {
        TypeDescriptorBuilder {
            name,
            members: Vec::new(),
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[must_use]
    pub fn members(&self) -> &[Member] {
        &self.members
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("members", &self.members)
            .finish()
    }
}

/// Typed builder for a [`TypeDescriptor`].
///
/// Members added through [`getter`](Self::getter) and
/// [`setter`](Self::setter) are public instance members; use
/// [`flags`](Self::flags) to change the most recently added one.
pub struct TypeDescriptorBuilder<T> {
    name: &'static str,
    members: Vec<Member>,
    _marker: PhantomData<fn(&T)>,
}

impl<T: 'static> TypeDescriptorBuilder<T> {
    /// Add a reading member (`getX` or `isX`).
    #[must_use]
    pub fn getter(
        mut self,
        name: &str,
        value_type: ValueType,
        read: impl Fn(&T) -> Value + 'static,
    ) -> Self {
        let getter: Getter = Rc::new(move |object: &dyn Any| object.downcast_ref::<T>().map(&read));
        self.members.push(Member {
            name: name.to_owned(),
            flags: MemberFlags::PUBLIC,
            value_type,
            access: Access::Get(getter),
        });
        self
    }

    /// Add a writing member (`setX`).
    #[must_use]
    pub fn setter(
        mut self,
        name: &str,
        value_type: ValueType,
        write: impl Fn(&T, Value) + 'static,
    ) -> Self {
        let setter: Setter = Rc::new(move |object: &dyn Any, value| match object.downcast_ref::<T>() {
            Some(object) => {
                write(object, value);
                true
            }
            None => false,
        });
        self.members.push(Member {
            name: name.to_owned(),
            flags: MemberFlags::PUBLIC,
            value_type,
            access: Access::Set(setter),
        });
        self
    }

    /// Override the flags of the member added last.
    #[must_use]
    pub fn flags(mut self, flags: MemberFlags) -> Self {
        if let Some(member) = self.members.last_mut() {
            member.flags = flags;
        }
        self
    }

    #[must_use]
    pub fn build(self) -> TypeDescriptor {
        TypeDescriptor {
            name: self.name,
            type_id: TypeId::of::<T>(),
            members: self.members,
        }
    }
}

/// Objects that expose an accessor table.
pub trait Reflect: 'static {
    fn type_descriptor(&self) -> Rc<TypeDescriptor>;

    fn as_any(&self) -> &dyn Any;
}

/// Errors from property resolution and access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyError {
    /// The property name is empty or does not start with a lowercase letter.
    InvalidName(String),
    NotFound { owner: &'static str, property: String },
    /// Both a `get…` and an `is…` getter exist.
    AmbiguousGetter { owner: &'static str, property: String },
    /// Getter and setter disagree on the value type.
    TypeMismatch {
        owner: &'static str,
        property: String,
        getter: ValueType,
        setter: ValueType,
    },
    /// An `is…` getter not declared as `Bool`.
    InvalidIsGetter {
        owner: &'static str,
        property: String,
        found: ValueType,
    },
    NotReadable { owner: &'static str, property: String },
    NotWritable { owner: &'static str, property: String },
    /// The object passed to an accessor is not of the descriptor's type.
    WrongReceiver { owner: &'static str, property: String },
}

impl fmt::Display for PropertyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidName(name) if name.is_empty() => write!(f, "property name is empty"),
            Self::InvalidName(name) => {
                write!(f, "property name '{name}' must start with a lowercase letter")
            }
            Self::NotFound { owner, property } => {
                write!(f, "property '{property}' not found on {owner}")
            }
            Self::AmbiguousGetter { owner, property } => write!(
                f,
                "ambiguous getter for {owner}.{property}: get- and is-forms are both available"
            ),
            Self::TypeMismatch {
                owner,
                property,
                getter,
                setter,
            } => write!(
                f,
                "type mismatch on {owner}.{property}: getter returns {getter}, setter takes {setter}"
            ),
            Self::InvalidIsGetter {
                owner,
                property,
                found,
            } => write!(
                f,
                "is-getter for {owner}.{property} must return bool, found {found}"
            ),
            Self::NotReadable { owner, property } => {
                write!(f, "property {owner}.{property} has no getter")
            }
            Self::NotWritable { owner, property } => {
                write!(f, "property {owner}.{property} has no setter")
            }
            Self::WrongReceiver { owner, property } => {
                write!(f, "object is not a {owner} (accessing '{property}')")
            }
        }
    }
}

impl std::error::Error for PropertyError {}

/// Resolved read/write entry points of one property.
#[derive(Clone)]
pub struct PropertyDescriptor {
    owner: &'static str,
    name: String,
    value_type: ValueType,
    getter: Option<Getter>,
    setter: Option<Setter>,
}

impl PropertyDescriptor {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn owner(&self) -> &'static str {
        self.owner
    }

    #[must_use]
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    #[must_use]
    pub fn is_readable(&self) -> bool {
        self.getter.is_some()
    }

    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    /// Read the property from `object`.
    ///
    /// # Errors
    ///
    /// [`PropertyError::NotReadable`] when there is no getter,
    /// [`PropertyError::WrongReceiver`] when `object` has another type.
    pub fn get(&self, object: &dyn Any) -> Result<Value, PropertyError> {
        let getter = self.getter.as_ref().ok_or_else(|| PropertyError::NotReadable {
            owner: self.owner,
            property: self.name.clone(),
        })?;
        getter(object).ok_or_else(|| self.wrong_receiver())
    }

    /// Write `value` into `object`.
    ///
    /// # Errors
    ///
    /// [`PropertyError::NotWritable`] when there is no setter,
    /// [`PropertyError::WrongReceiver`] when `object` has another type.
    pub fn set(&self, object: &dyn Any, value: Value) -> Result<(), PropertyError> {
        let setter = self.setter.as_ref().ok_or_else(|| PropertyError::NotWritable {
            owner: self.owner,
            property: self.name.clone(),
        })?;
        if setter(object, value) {
            Ok(())
        } else {
            Err(self.wrong_receiver())
        }
    }

    fn wrong_receiver(&self) -> PropertyError {
        PropertyError::WrongReceiver {
            owner: self.owner,
            property: self.name.clone(),
        }
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .field("readable", &self.is_readable())
            .field("writable", &self.is_writable())
            .finish()
    }
}

/// Resolve `name` against the accessor table of `descriptor`.
///
/// Pure: no caching, no side effects.
///
/// # Errors
///
/// See the module-level failure table.
pub fn resolve(descriptor: &TypeDescriptor, name: &str) -> Result<PropertyDescriptor, PropertyError> {
    let mut chars = name.chars();
    let suffix = match chars.next() {
        Some(first) if first.is_lowercase() => {
            let mut suffix: String = first.to_uppercase().collect();
            suffix.push_str(chars.as_str());
            suffix
        }
        _ => return Err(PropertyError::InvalidName(name.to_owned())),
    };
    let get_name = format!("get{suffix}");
    let is_name = format!("is{suffix}");
    let set_name = format!("set{suffix}");

    let owner = descriptor.name;
    let property = || name.to_owned();
    let find = |wanted: &str, setter: bool| {
        descriptor
            .members
            .iter()
            .find(|m| m.is_bindable() && m.is_setter() == setter && m.name == wanted)
    };

    let get_form = find(&get_name, false);
    let is_form = find(&is_name, false);
    let set_form = find(&set_name, true);

    if let Some(is_form) = is_form
        && is_form.value_type != ValueType::Bool
    {
        return Err(PropertyError::InvalidIsGetter {
            owner,
            property: property(),
            found: is_form.value_type,
        });
    }
    if get_form.is_some() && is_form.is_some() {
        return Err(PropertyError::AmbiguousGetter {
            owner,
            property: property(),
        });
    }

    let getter_member = get_form.or(is_form);
    let value_type = match (getter_member, set_form) {
        (None, None) => {
            return Err(PropertyError::NotFound {
                owner,
                property: property(),
            });
        }
        (Some(g), Some(s)) if g.value_type != s.value_type => {
            return Err(PropertyError::TypeMismatch {
                owner,
                property: property(),
                getter: g.value_type,
                setter: s.value_type,
            });
        }
        (Some(g), _) => g.value_type,
        (None, Some(s)) => s.value_type,
    };

    let getter = getter_member.and_then(|m| match &m.access {
        Access::Get(g) => Some(Rc::clone(g)),
        Access::Set(_) => None,
    });
    let setter = set_form.and_then(|m| match &m.access {
        Access::Set(s) => Some(Rc::clone(s)),
        Access::Get(_) => None,
    });

    Ok(PropertyDescriptor {
        owner,
        name: name.to_owned(),
        value_type,
        getter,
        setter,
    })
}
