#![forbid(unsafe_code)]

//! Echo suppression and collection relays.
//!
//! A binding owns two echo flags, one per direction. While a propagation
//! writes into one side, the flag for that side is raised so the change
//! notification it provokes is not fed back the other way.
//!
//! A [`Relay`] forwards [`ListDelta`]s from an observable list into a
//! destination [`Sequence`] after the initial bulk copy. Each relay carries a
//! ban flag that is raised before it is detached, so a relay that is being
//! replaced can never write into a stale destination.
//!
//! # Invariants
//!
//! 1. An [`EchoGuard`] restores the flag's previous value on drop, so nested
//!    propagations do not clear a flag an outer one still relies on.
//! 2. A banned relay never touches its destination again.
//! 3. A relay does nothing while its suppressing flag is raised, and raises
//!    its own flag for the duration of each forwarded delta.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::listener::ListenerHandle;
use crate::observable::{ListDelta, ObservableList};
use crate::value::Sequence;

/// Shared reentrancy flag.
#[derive(Clone, Default)]
pub(crate) struct EchoFlag(Rc<Cell<bool>>);

impl EchoFlag {
    pub(crate) fn is_raised(&self) -> bool {
        self.0.get()
    }

    /// Raise the flag until the returned guard drops.
    pub(crate) fn raise(&self) -> EchoGuard {
        let previous = self.0.replace(true);
        EchoGuard {
            flag: Rc::clone(&self.0),
            previous,
        }
    }
}

impl fmt::Debug for EchoFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EchoFlag").field(&self.0.get()).finish()
    }
}

pub(crate) struct EchoGuard {
    flag: Rc<Cell<bool>>,
    previous: bool,
}

impl Drop for EchoGuard {
    fn drop(&mut self) {
        self.flag.set(self.previous);
    }
}

/// A live delta subscription from `list` into a destination sequence.
pub(crate) struct Relay {
    list: ObservableList,
    handle: ListenerHandle,
    banned: Rc<Cell<bool>>,
}

impl Relay {
    /// Subscribe to `list`, forwarding every delta into `destination`.
    ///
    /// Deltas are dropped while `suppressed_by` is raised; `raises` is held
    /// up while a delta is applied.
    pub(crate) fn attach(
        list: &ObservableList,
        destination: Sequence,
        suppressed_by: EchoFlag,
        raises: EchoFlag,
    ) -> Self {
        let banned = Rc::new(Cell::new(false));
        let ban = Rc::clone(&banned);
        let handle = list.subscribe(move |list, delta| {
            if ban.get() || suppressed_by.is_raised() {
                return;
            }
            let _guard = raises.raise();
            tracing::trace!(?delta, "relaying list delta");
            apply_delta(list, delta, &destination);
        });
        Self {
            list: list.clone(),
            handle,
            banned,
        }
    }

    /// Ban, then unsubscribe.
    pub(crate) fn detach(self) {
        self.banned.set(true);
        self.list.unsubscribe(self.handle);
    }
}

impl fmt::Debug for Relay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relay")
            .field("handle", &self.handle)
            .field("banned", &self.banned.get())
            .finish()
    }
}

/// Mirror one delta of `list` into `destination`.
///
/// Additions are inserted at the same index (clamped to the destination
/// length), removals remove each element by value, replacements overwrite the
/// same index with the element now in `list`.
pub(crate) fn apply_delta(list: &ObservableList, delta: &ListDelta, destination: &Sequence) {
    match delta {
        ListDelta::Added { index, count } => {
            for offset in 0..*count {
                if let Some(value) = list.get(index + offset) {
                    destination.insert(index + offset, value);
                }
            }
        }
        ListDelta::Removed { elements, .. } => {
            for element in elements {
                destination.remove_item(element);
            }
        }
        ListDelta::Replaced { index, .. } => {
            if let Some(value) = list.get(*index) {
                destination.set(*index, value);
            }
        }
    }
}
