#![forbid(unsafe_code)]

//! Observable list: a shared sequence that reports granular changes.
//!
//! Every mutation emits exactly one [`ListDelta`] to every subscriber after the
//! mutation has been applied, so subscribers always observe the post-change
//! contents. There are only three delta shapes:
//!
//! | Delta | Emitted by |
//! |-------|------------|
//! | `Added { index, count }` | `push`, `insert`, `extend`, `insert_all` |
//! | `Removed { index, elements }` | `remove`, `remove_item`, `clear` |
//! | `Replaced { index, old }` | `set` |
//!
//! Mutations that change nothing (clearing an empty list, extending with an
//! empty iterator, out-of-range `set`/`remove`) emit nothing.
//!
//! # Architecture
//!
//! `ObservableList` uses `Rc<..>` with interior `RefCell`s for single-threaded
//! shared ownership. Borrows are released before subscribers run, so a
//! subscriber may read the list (or mutate another list) freely.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::listener::ListenerHandle;
use crate::value::Value;

/// One change to an [`ObservableList`].
#[derive(Clone, Debug, PartialEq)]
pub enum ListDelta {
    /// `count` elements were inserted starting at `index`.
    Added { index: usize, count: usize },
    /// `elements` were removed; the first of them used to live at `index`.
    Removed { index: usize, elements: Vec<Value> },
    /// The element at `index` was overwritten; `old` is the previous value.
    Replaced { index: usize, old: Value },
}

type DeltaListener = Rc<dyn Fn(&ObservableList, &ListDelta)>;

struct Inner {
    items: RefCell<Vec<Value>>,
    listeners: RefCell<Vec<(ListenerHandle, DeltaListener)>>,
}

/// A shared, change-reporting list of [`Value`]s.
///
/// Cloning yields another handle to the same list.
#[derive(Clone)]
pub struct ObservableList {
    inner: Rc<Inner>,
}

impl Default for ObservableList {
    fn default() -> Self {
        Self::new()
    }
}

impl ObservableList {
    #[must_use]
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    #[must_use]
    pub fn from_vec(items: Vec<Value>) -> Self {
        Self {
            inner: Rc::new(Inner {
                items: RefCell::new(items),
                listeners: RefCell::new(Vec::new()),
            }),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.items.borrow().is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<Value> {
        self.inner.items.borrow().get(index).cloned()
    }

    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        self.inner.items.borrow().contains(value)
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<Value> {
        self.inner.items.borrow().clone()
    }

    pub fn push(&self, value: impl Into<Value>) {
        let index = self.len();
        self.insert(index, value);
    }

    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&self, index: usize, value: impl Into<Value>) {
        self.inner.items.borrow_mut().insert(index, value.into());
        self.notify(&ListDelta::Added { index, count: 1 });
    }

    /// Append every value, emitting a single `Added` delta.
    pub fn extend(&self, values: impl IntoIterator<Item = Value>) {
        let index = self.len();
        self.insert_all(index, values);
    }

    /// Insert every value at `index`, emitting a single `Added` delta.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert_all(&self, index: usize, values: impl IntoIterator<Item = Value>) {
        let values: Vec<Value> = values.into_iter().collect();
        let count = values.len();
        if count == 0 {
            return;
        }
        self.inner
            .items
            .borrow_mut()
            .splice(index..index, values);
        self.notify(&ListDelta::Added { index, count });
    }

    /// Overwrite the element at `index`, returning the old value.
    pub fn set(&self, index: usize, value: impl Into<Value>) -> Option<Value> {
        let old = {
            let mut items = self.inner.items.borrow_mut();
            let slot = items.get_mut(index)?;
            std::mem::replace(slot, value.into())
        };
        self.notify(&ListDelta::Replaced {
            index,
            old: old.clone(),
        });
        Some(old)
    }

    pub fn remove(&self, index: usize) -> Option<Value> {
        let removed = {
            let mut items = self.inner.items.borrow_mut();
            if index >= items.len() {
                return None;
            }
            items.remove(index)
        };
        self.notify(&ListDelta::Removed {
            index,
            elements: vec![removed.clone()],
        });
        Some(removed)
    }

    /// Remove the first element equal to `value`.
    pub fn remove_item(&self, value: &Value) -> bool {
        let position = self.inner.items.borrow().iter().position(|v| v == value);
        match position {
            Some(index) => self.remove(index).is_some(),
            None => false,
        }
    }

    pub fn clear(&self) {
        let elements = std::mem::take(&mut *self.inner.items.borrow_mut());
        if elements.is_empty() {
            return;
        }
        self.notify(&ListDelta::Removed { index: 0, elements });
    }

    /// Register a delta listener.
    pub fn subscribe(&self, listener: impl Fn(&ObservableList, &ListDelta) + 'static) -> ListenerHandle {
        let handle = ListenerHandle::next();
        self.inner
            .listeners
            .borrow_mut()
            .push((handle, Rc::new(listener)));
        handle
    }

    /// Remove a delta listener. Returns `false` for unknown handles.
    pub fn unsubscribe(&self, handle: ListenerHandle) -> bool {
        let mut listeners = self.inner.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(h, _)| *h != handle);
        listeners.len() != before
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Whether both handles refer to the same list.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn notify(&self, delta: &ListDelta) {
        let snapshot: Vec<DeltaListener> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        for listener in snapshot {
            listener(self, delta);
        }
    }
}

impl fmt::Debug for ObservableList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableList")
            .field("items", &*self.inner.items.borrow())
            .field("listener_count", &self.listener_count())
            .finish()
    }
}
