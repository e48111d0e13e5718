#![forbid(unsafe_code)]

//! The change notification contract.
//!
//! An object that wants to be a binding source implements
//! [`NotifyPropertyChanged`]: it accepts property-changed listeners and calls
//! them with the name of each property that changes. Subscriptions are
//! identified by an opaque [`ListenerHandle`] rather than by listener
//! identity.
//!
//! [`PropertyChangeSupport`] is a ready-made registry that implementors can
//! embed and delegate to.
//!
//! # Invariants
//!
//! 1. Every handle returned by a subscribe call is unique for the lifetime of
//!    the process.
//! 2. Listeners are notified in registration order.
//! 3. The listener list is snapshotted before dispatch: listeners added
//!    during a notification do not see it, and listeners removed during a
//!    notification still see it once.
//! 4. Removing an unknown handle is a no-op.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

/// Opaque token identifying one listener registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerHandle(u64);

impl ListenerHandle {
    /// Allocate a fresh, never-before-seen handle.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Callback invoked with the name of the property that changed.
pub type PropertyChangedListener = Rc<dyn Fn(&str)>;

/// Capability required of a binding source (and of a target that is not
/// accessed through an adapter).
///
/// Notifications must be delivered synchronously on the thread that mutated
/// the object.
pub trait NotifyPropertyChanged {
    fn add_property_changed_listener(&self, listener: PropertyChangedListener) -> ListenerHandle;

    fn remove_property_changed_listener(&self, handle: ListenerHandle);
}

/// Embeddable listener registry implementing [`NotifyPropertyChanged`].
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use tether_core::listener::{NotifyPropertyChanged, PropertyChangeSupport};
///
/// let support = PropertyChangeSupport::new();
/// let hits = Rc::new(Cell::new(0));
/// let h = Rc::clone(&hits);
/// let handle = support.add_property_changed_listener(Rc::new(move |name| {
///     if name == "title" {
///         h.set(h.get() + 1);
///     }
/// }));
///
/// support.raise("title");
/// support.remove_property_changed_listener(handle);
/// support.raise("title");
/// assert_eq!(hits.get(), 1);
/// ```
#[derive(Default)]
pub struct PropertyChangeSupport {
    listeners: RefCell<Vec<(ListenerHandle, PropertyChangedListener)>>,
}

impl PropertyChangeSupport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notify every registered listener that `property` changed.
    pub fn raise(&self, property: &str) {
        let snapshot: Vec<PropertyChangedListener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in snapshot {
            listener(property);
        }
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }
}

impl NotifyPropertyChanged for PropertyChangeSupport {
    fn add_property_changed_listener(&self, listener: PropertyChangedListener) -> ListenerHandle {
        let handle = ListenerHandle::next();
        self.listeners.borrow_mut().push((handle, listener));
        handle
    }

    fn remove_property_changed_listener(&self, handle: ListenerHandle) {
        self.listeners.borrow_mut().retain(|(h, _)| *h != handle);
    }
}

impl fmt::Debug for PropertyChangeSupport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyChangeSupport")
            .field("listener_count", &self.listener_count())
            .finish()
    }
}
