#![forbid(unsafe_code)]

//! Dynamic values that cross the source/target boundary.
//!
//! Properties are read and written as [`Value`]s so that a single engine can
//! bind arbitrary types. Each property declares a [`ValueType`]; the engine
//! compares declared types at bind time to decide whether a converter is
//! required and whether a property takes part in a collection relay.
//!
//! List values are handles: cloning a [`Value::List`] or
//! [`Value::ObservableList`] shares the underlying storage, and two list
//! values compare equal only when they share it.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::observable::ObservableList;

/// Declared type of a bindable property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    Bool,
    Int,
    Float,
    Text,
    /// A plain shared sequence with no change notifications.
    List,
    /// A sequence that emits [`ListDelta`](crate::observable::ListDelta)s.
    ObservableList,
}

impl ValueType {
    /// Whether values of this type can be the destination of a relay.
    #[must_use]
    pub const fn is_sequence(self) -> bool {
        matches!(self, Self::List | Self::ObservableList)
    }

    /// Whether values of this type emit granular change notifications.
    #[must_use]
    pub const fn is_observable(self) -> bool {
        matches!(self, Self::ObservableList)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Text => "text",
            Self::List => "list",
            Self::ObservableList => "observable-list",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A property value.
///
/// `Null` stands for "no value"; it is what the fail-open policy writes into a
/// source when conversion or validation rejects a target value.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(SharedList),
    ObservableList(ObservableList),
}

impl Value {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Runtime type of this value, or `None` for `Null`.
    #[must_use]
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Self::Null => None,
            Self::Bool(_) => Some(ValueType::Bool),
            Self::Int(_) => Some(ValueType::Int),
            Self::Float(_) => Some(ValueType::Float),
            Self::Text(_) => Some(ValueType::Text),
            Self::List(_) => Some(ValueType::List),
            Self::ObservableList(_) => Some(ValueType::ObservableList),
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(x) => Some(*x),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_observable_list(&self) -> Option<&ObservableList> {
        match self {
            Self::ObservableList(list) => Some(list),
            _ => None,
        }
    }

    /// View this value as a relay destination, if it is a sequence.
    #[must_use]
    pub fn into_sequence(self) -> Option<Sequence> {
        match self {
            Self::List(list) => Some(Sequence::Plain(list)),
            Self::ObservableList(list) => Some(Sequence::Observable(list)),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::List(a), Self::List(b)) => a.ptr_eq(b),
            (Self::ObservableList(a), Self::ObservableList(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::List(list) => write!(f, "list[{}]", list.len()),
            Self::ObservableList(list) => write!(f, "observable-list[{}]", list.len()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<SharedList> for Value {
    fn from(value: SharedList) -> Self {
        Self::List(value)
    }
}

impl From<ObservableList> for Value {
    fn from(value: ObservableList) -> Self {
        Self::ObservableList(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

// ---------------------------------------------------------------------------
// SharedList: plain, non-notifying sequence
// ---------------------------------------------------------------------------

/// A shared sequence of values with no change notifications.
///
/// This is the "plain list" a collection relay may write into when the other
/// side of a binding is an [`ObservableList`].
#[derive(Clone, Default)]
pub struct SharedList {
    items: Rc<RefCell<Vec<Value>>>,
}

impl SharedList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_vec(items: Vec<Value>) -> Self {
        Self {
            items: Rc::new(RefCell::new(items)),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<Value> {
        self.items.borrow().get(index).cloned()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<Value> {
        self.items.borrow().clone()
    }

    pub fn push(&self, value: impl Into<Value>) {
        self.items.borrow_mut().push(value.into());
    }

    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&self, index: usize, value: impl Into<Value>) {
        self.items.borrow_mut().insert(index, value.into());
    }

    /// Replace the element at `index`, returning the old one.
    pub fn set(&self, index: usize, value: impl Into<Value>) -> Option<Value> {
        let mut items = self.items.borrow_mut();
        let slot = items.get_mut(index)?;
        Some(std::mem::replace(slot, value.into()))
    }

    pub fn remove(&self, index: usize) -> Option<Value> {
        let mut items = self.items.borrow_mut();
        (index < items.len()).then(|| items.remove(index))
    }

    /// Remove the first element equal to `value`.
    pub fn remove_item(&self, value: &Value) -> bool {
        let mut items = self.items.borrow_mut();
        match items.iter().position(|item| item == value) {
            Some(index) => {
                items.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn extend(&self, values: impl IntoIterator<Item = Value>) {
        self.items.borrow_mut().extend(values);
    }

    pub fn clear(&self) {
        self.items.borrow_mut().clear();
    }

    /// Whether both handles share the same storage.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.items, &other.items)
    }
}

impl fmt::Debug for SharedList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.borrow().iter()).finish()
    }
}

// ---------------------------------------------------------------------------
// Sequence: relay destination
// ---------------------------------------------------------------------------

/// A mutable destination for collection synchronization.
#[derive(Clone, Debug)]
pub enum Sequence {
    Plain(SharedList),
    Observable(ObservableList),
}

impl Sequence {
    fn len(&self) -> usize {
        match self {
            Self::Plain(list) => list.len(),
            Self::Observable(list) => list.len(),
        }
    }

    /// Whether this is `list` itself rather than a separate collection.
    #[must_use]
    pub fn is_same_list(&self, list: &ObservableList) -> bool {
        matches!(self, Self::Observable(own) if own.ptr_eq(list))
    }

    /// Insert at `index`, clamped to the current length.
    pub fn insert(&self, index: usize, value: Value) {
        let index = index.min(self.len());
        match self {
            Self::Plain(list) => list.insert(index, value),
            Self::Observable(list) => list.insert(index, value),
        }
    }

    /// Overwrite `index`; out-of-range writes are ignored.
    pub fn set(&self, index: usize, value: Value) {
        match self {
            Self::Plain(list) => {
                list.set(index, value);
            }
            Self::Observable(list) => {
                list.set(index, value);
            }
        }
    }

    pub fn remove_item(&self, value: &Value) -> bool {
        match self {
            Self::Plain(list) => list.remove_item(value),
            Self::Observable(list) => list.remove_item(value),
        }
    }

    pub fn clear(&self) {
        match self {
            Self::Plain(list) => list.clear(),
            Self::Observable(list) => list.clear(),
        }
    }

    pub fn extend(&self, values: Vec<Value>) {
        match self {
            Self::Plain(list) => list.extend(values),
            Self::Observable(list) => list.extend(values),
        }
    }

    /// Replace the whole contents with `values`.
    pub fn replace_all(&self, values: Vec<Value>) {
        self.clear();
        self.extend(values);
    }
}
