#![forbid(unsafe_code)]

//! The binding engine.
//!
//! A [`Binding`] keeps one property of a target object in sync with one
//! property of a source object. It is created unbound; [`Binding::bind`]
//! resolves the effective mode and the target's [`Capability`], checks that
//! every accessor the mode needs exists, wires listeners and performs the
//! initial flush.
//!
//! # Usage
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use tether_core::prelude::*;
//!
//! struct Counter {
//!     n: Cell<i64>,
//!     changes: PropertyChangeSupport,
//! }
//!
//! impl Counter {
//!     fn set_n(&self, n: i64) {
//!         self.n.set(n);
//!         self.changes.raise("n");
//!     }
//! }
//!
//! impl Reflect for Counter {
//!     fn type_descriptor(&self) -> Rc<TypeDescriptor> {
//!         Rc::new(
//!             TypeDescriptor::builder::<Counter>("Counter")
//!                 .getter("getN", ValueType::Int, |c| Value::Int(c.n.get()))
//!                 .setter("setN", ValueType::Int, |c, v| c.set_n(v.as_int().unwrap_or(0)))
//!                 .build(),
//!         )
//!     }
//!
//!     fn as_any(&self) -> &dyn std::any::Any {
//!         self
//!     }
//! }
//!
//! impl NotifyPropertyChanged for Counter {
//!     fn add_property_changed_listener(&self, l: PropertyChangedListener) -> ListenerHandle {
//!         self.changes.add_property_changed_listener(l)
//!     }
//!
//!     fn remove_property_changed_listener(&self, h: ListenerHandle) {
//!         self.changes.remove_property_changed_listener(h)
//!     }
//! }
//!
//! let counter = || Rc::new(Counter { n: Cell::new(0), changes: PropertyChangeSupport::new() });
//! let (source, target) = (counter(), counter());
//! source.set_n(4);
//!
//! let binding = Binding::new(BindingTarget::notifying(target.clone()), "n", source.clone(), "n")?;
//! binding.bind()?;
//! assert_eq!(target.n.get(), 4);
//!
//! target.set_n(9);
//! assert_eq!(source.n.get(), 9);
//! # Ok::<(), BindingError>(())
//! ```
//!
//! # Invariants
//!
//! 1. `effective_mode()` is never `Default` while bound.
//! 2. Exactly one capability is active per bound binding and it does not
//!    change until unbind.
//! 3. `unbind()` removes exactly the listeners `bind()` registered and is
//!    idempotent.
//! 4. During a propagation the echo flag of the side being written stays
//!    raised until the whole operation (including nested notifications) has
//!    returned, so at most one wave per direction is live.
//! 5. Configuration (mode, trigger, validator, result listener, settings)
//!    survives unbind and is reused by the next bind.
//!
//! # Failure Modes
//!
//! | Failure | Surfaces as |
//! |---------|-------------|
//! | unknown/ambiguous/mismatched property | `bind()` → `BindingError::Property` |
//! | non-notifying target without adapter | `bind()` → `AdapterNotFound` |
//! | differing types and no converter | `bind()` → `ConverterNotFound` |
//! | accessor missing for the mode | `bind()` → `MissingAccessor` |
//! | update in a forbidding mode | `update_*()` → `BindingError::Mode` |
//! | conversion / validation rejects a target value | `BindingResult` to the result listener, then fail-open |
//! | source value cannot be converted for the target | silently skipped |
//! | listener-triggered update fails | logged with `warn!` |
//!
//! # Threading
//!
//! Bindings are single-threaded (`!Send`): the caller confines a binding, its
//! source and its target to one thread, typically the UI thread.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use crate::adapter::{BindingAdapter, Capability, FocusLostListener};
use crate::convert::BindingConverter;
use crate::endpoint::{BindingSource, BindingTarget};
use crate::error::{Accessor, BindingError, Side};
use crate::listener::{ListenerHandle, PropertyChangedListener};
use crate::mode::{BindingMode, BindingResult, ResultListener, UpdateSourceTrigger};
use crate::observable::ObservableList;
use crate::property::{PropertyDescriptor, resolve};
use crate::relay::{EchoFlag, Relay};
use crate::settings::BindingSettings;
use crate::validate::BindingValidator;
use crate::value::{Sequence, Value};

// ---------------------------------------------------------------------------
// Configuration and bound state
// ---------------------------------------------------------------------------

struct Config {
    target: BindingTarget,
    target_property: String,
    source: Rc<dyn BindingSource>,
    source_property: String,
    mode: BindingMode,
    update_trigger: UpdateSourceTrigger,
    settings: Rc<BindingSettings>,
    validator: Option<Rc<dyn BindingValidator>>,
    result_listener: Option<ResultListener>,
    update_source_if_binding_fails: bool,
}

/// How the target property is read and written.
#[derive(Clone)]
enum TargetAccess {
    Direct(PropertyDescriptor),
    Adapted {
        adapter: Rc<dyn BindingAdapter>,
        property: String,
    },
}

/// Everything a propagation needs, fixed at bind time.
#[derive(Clone)]
struct Wiring {
    mode: BindingMode,
    source: Rc<dyn BindingSource>,
    source_property: PropertyDescriptor,
    target: BindingTarget,
    target_access: TargetAccess,
    converter: Option<Rc<dyn BindingConverter>>,
    source_is_observable: bool,
    target_is_observable: bool,
}

impl Wiring {
    fn read_source(&self) -> Result<Value, BindingError> {
        self.source_property
            .get(self.source.as_any())
            .map_err(BindingError::source_property)
    }

    fn write_source(&self, value: Value) -> Result<(), BindingError> {
        self.source_property
            .set(self.source.as_any(), value)
            .map_err(BindingError::source_property)
    }

    fn read_target(&self) -> Result<Value, BindingError> {
        let target = self.target.as_any();
        match &self.target_access {
            TargetAccess::Direct(property) => {
                property.get(target).map_err(BindingError::target_property)
            }
            TargetAccess::Adapted { adapter, property } => Ok(adapter.get_value(target, property)?),
        }
    }

    fn write_target(&self, value: Value) -> Result<(), BindingError> {
        let target = self.target.as_any();
        match &self.target_access {
            TargetAccess::Direct(property) => property
                .set(target, value)
                .map_err(BindingError::target_property),
            TargetAccess::Adapted { adapter, property } => {
                Ok(adapter.set_value(target, property, value)?)
            }
        }
    }
}

/// A listener registration to undo on unbind.
#[derive(Clone, Copy, Debug)]
enum Subscription {
    Source(ListenerHandle),
    Target(ListenerHandle),
    AdapterChange(ListenerHandle),
    FocusLost(ListenerHandle),
}

struct Bound {
    wiring: Wiring,
    capability: Capability,
    adapter: Option<Rc<dyn BindingAdapter>>,
    trigger: UpdateSourceTrigger,
    subscriptions: Vec<Subscription>,
    /// Relay from the source collection into the target.
    source_relay: Option<Relay>,
    /// Relay from the target collection into the source.
    target_relay: Option<Relay>,
}

struct BindingCore {
    config: RefCell<Config>,
    bound: RefCell<Option<Bound>>,
    /// Raised while the engine writes the source.
    ignoring_source_echo: EchoFlag,
    /// Raised while the engine writes the target.
    ignoring_target_echo: EchoFlag,
    /// Bumped by every unbind. Listeners remember the value they were wired
    /// under and go quiet once it moves on, even if a dispatch snapshot still
    /// reaches them.
    generation: Cell<u64>,
}

// ---------------------------------------------------------------------------
// Binding
// ---------------------------------------------------------------------------

/// Synchronizes one target property with one source property.
///
/// Dropping a `Binding` unbinds it.
pub struct Binding {
    core: Rc<BindingCore>,
}

impl Binding {
    /// Create an unbound binding with `BindingMode::Default`,
    /// `UpdateSourceTrigger::Default` and a fresh
    /// [`BindingSettings::with_defaults`].
    ///
    /// # Errors
    ///
    /// [`BindingError::Argument`] if either property name is empty.
    pub fn new(
        target: BindingTarget,
        target_property: impl Into<String>,
        source: Rc<dyn BindingSource>,
        source_property: impl Into<String>,
    ) -> Result<Self, BindingError> {
        let target_property = target_property.into();
        let source_property = source_property.into();
        if target_property.is_empty() {
            return Err(BindingError::Argument("target property"));
        }
        if source_property.is_empty() {
            return Err(BindingError::Argument("source property"));
        }
        let settings = Rc::new(BindingSettings::with_defaults());
        let update_source_if_binding_fails = settings.policy().update_source_if_binding_fails;
        Ok(Self {
            core: Rc::new(BindingCore {
                config: RefCell::new(Config {
                    target,
                    target_property,
                    source,
                    source_property,
                    mode: BindingMode::Default,
                    update_trigger: UpdateSourceTrigger::Default,
                    settings,
                    validator: None,
                    result_listener: None,
                    update_source_if_binding_fails,
                }),
                bound: RefCell::new(None),
                ignoring_source_echo: EchoFlag::default(),
                ignoring_target_echo: EchoFlag::default(),
                generation: Cell::new(0),
            }),
        })
    }

    /// Declared mode, resolved on the next bind.
    #[must_use]
    pub fn with_mode(self, mode: BindingMode) -> Self {
        self.core.config.borrow_mut().mode = mode;
        self
    }

    /// Declared update trigger; only UI adapters honour it.
    #[must_use]
    pub fn with_update_trigger(self, trigger: UpdateSourceTrigger) -> Self {
        self.core.config.borrow_mut().update_trigger = trigger;
        self
    }

    /// Use shared `settings` and adopt their policy.
    #[must_use]
    pub fn with_settings(self, settings: Rc<BindingSettings>) -> Self {
        {
            let mut config = self.core.config.borrow_mut();
            config.update_source_if_binding_fails = settings.policy().update_source_if_binding_fails;
            config.settings = settings;
        }
        self
    }

    pub fn set_validator(&self, validator: Option<Rc<dyn BindingValidator>>) {
        self.core.config.borrow_mut().validator = validator;
    }

    pub fn set_result_listener(&self, listener: Option<ResultListener>) {
        self.core.config.borrow_mut().result_listener = listener;
    }

    /// Fail-open policy: write `Null` into the source when conversion or
    /// validation rejects a target value.
    pub fn set_update_source_if_binding_fails(&self, enabled: bool) {
        self.core.config.borrow_mut().update_source_if_binding_fails = enabled;
    }

    #[must_use]
    pub fn update_source_if_binding_fails(&self) -> bool {
        self.core.config.borrow().update_source_if_binding_fails
    }

    #[must_use]
    pub fn mode(&self) -> BindingMode {
        self.core.config.borrow().mode
    }

    #[must_use]
    pub fn update_trigger(&self) -> UpdateSourceTrigger {
        self.core.config.borrow().update_trigger
    }

    #[must_use]
    pub fn source(&self) -> Rc<dyn BindingSource> {
        Rc::clone(&self.core.config.borrow().source)
    }

    #[must_use]
    pub fn target(&self) -> BindingTarget {
        self.core.config.borrow().target.clone()
    }

    #[must_use]
    pub fn source_property(&self) -> String {
        self.core.config.borrow().source_property.clone()
    }

    #[must_use]
    pub fn target_property(&self) -> String {
        self.core.config.borrow().target_property.clone()
    }

    #[must_use]
    pub fn settings(&self) -> Rc<BindingSettings> {
        Rc::clone(&self.core.config.borrow().settings)
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.core.bound.borrow().is_some()
    }

    /// Resolved mode while bound.
    #[must_use]
    pub fn effective_mode(&self) -> Option<BindingMode> {
        self.core.bound.borrow().as_ref().map(|b| b.wiring.mode)
    }

    /// Resolved capability while bound.
    #[must_use]
    pub fn capability(&self) -> Option<Capability> {
        self.core.bound.borrow().as_ref().map(|b| b.capability)
    }

    /// Resolved update trigger while bound. Targets without a UI adapter
    /// always report `PropertyChanged`.
    #[must_use]
    pub fn effective_update_trigger(&self) -> Option<UpdateSourceTrigger> {
        self.core.bound.borrow().as_ref().map(|b| b.trigger)
    }

    /// Connect source and target. A no-op when already bound.
    ///
    /// # Errors
    ///
    /// Any configuration error; the binding stays unbound.
    pub fn bind(&self) -> Result<(), BindingError> {
        self.core.bind()
    }

    /// Disconnect source and target. Idempotent.
    pub fn unbind(&self) {
        self.core.unbind();
    }

    /// Push the source value into the target.
    ///
    /// # Errors
    ///
    /// [`BindingError::NotBound`], [`BindingError::Mode`] outside
    /// OneTime/OneWay/TwoWay, or an accessor failure.
    pub fn update_target(&self) -> Result<(), BindingError> {
        self.core.update_target()
    }

    /// Push the target value into the source.
    ///
    /// # Errors
    ///
    /// [`BindingError::NotBound`], [`BindingError::Mode`] outside
    /// OneWayToSource/TwoWay, or an accessor failure.
    pub fn update_source(&self) -> Result<(), BindingError> {
        self.core.update_source()
    }

    /// Replace the source, rebinding if bound.
    ///
    /// # Errors
    ///
    /// Any error from the rebind.
    pub fn set_source(&self, source: Rc<dyn BindingSource>) -> Result<(), BindingError> {
        let was_bound = self.is_bound();
        self.core.unbind();
        self.core.config.borrow_mut().source = source;
        if was_bound { self.core.bind() } else { Ok(()) }
    }

    /// Replace the target, rebinding if bound.
    ///
    /// # Errors
    ///
    /// Any error from the rebind.
    pub fn set_target(&self, target: BindingTarget) -> Result<(), BindingError> {
        let was_bound = self.is_bound();
        self.core.unbind();
        self.core.config.borrow_mut().target = target;
        if was_bound { self.core.bind() } else { Ok(()) }
    }
}

impl Drop for Binding {
    fn drop(&mut self) {
        self.core.unbind();
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let config = self.core.config.borrow();
        f.debug_struct("Binding")
            .field("target", &config.target)
            .field("target_property", &config.target_property)
            .field("source_property", &config.source_property)
            .field("mode", &config.mode)
            .field("effective_mode", &self.effective_mode())
            .field("capability", &self.capability())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

impl BindingCore {
    fn bind(self: &Rc<Self>) -> Result<(), BindingError> {
        if self.bound.borrow().is_some() {
            return Ok(());
        }
        let (bound, trigger) = self.prepare()?;
        let mode = bound.wiring.mode;
        debug!(
            source = bound.wiring.source_property.owner(),
            source_property = bound.wiring.source_property.name(),
            target = bound.wiring.target.type_name(),
            capability = ?bound.capability,
            %mode,
            %trigger,
            "binding"
        );
        *self.bound.borrow_mut() = Some(bound);

        if let Err(err) = self.wire(mode, trigger) {
            self.unbind();
            return Err(err);
        }

        if let Err(err) = self.initial_flush(mode) {
            self.unbind();
            return Err(err);
        }
        Ok(())
    }

    fn initial_flush(&self, mode: BindingMode) -> Result<(), BindingError> {
        if mode.updates_target() {
            self.update_target()?;
        }
        if mode.updates_source() {
            self.update_source()?;
        }
        Ok(())
    }

    /// Capability, mode, properties, converter, accessor and trigger
    /// resolution: everything short of side effects.
    fn prepare(&self) -> Result<(Bound, UpdateSourceTrigger), BindingError> {
        let config = self.config.borrow();

        // Capability
        let (capability, adapter) = match &config.target {
            BindingTarget::Notifying(_) => (Capability::DirectNotifying, None),
            BindingTarget::Foreign { type_name, .. } => {
                let adapter = config
                    .settings
                    .adapter_for(config.target.concrete_type())
                    .ok_or(BindingError::AdapterNotFound { target: *type_name })?;
                (Capability::of(&*adapter), Some(adapter))
            }
        };

        // Mode
        let mode = match (config.mode, &adapter) {
            (BindingMode::Default, Some(adapter)) if capability == Capability::AdaptedUi => {
                match adapter.default_mode() {
                    BindingMode::Default => BindingMode::TwoWay,
                    mode => mode,
                }
            }
            (BindingMode::Default, _) => BindingMode::TwoWay,
            (mode, _) => mode,
        };
        let reads = mode.updates_target();
        let writes = mode.updates_source();

        // Properties
        let source_property = resolve(&config.source.type_descriptor(), &config.source_property)
            .map_err(BindingError::source_property)?;
        let (target_access, target_type) = match (&config.target, &adapter) {
            (_, Some(adapter)) => {
                let value_type = adapter
                    .target_property_type(&config.target_property)
                    .ok_or_else(|| BindingError::UnknownAdapterProperty {
                        adapter: adapter.target_type_name(),
                        property: config.target_property.clone(),
                    })?;
                let access = TargetAccess::Adapted {
                    adapter: Rc::clone(adapter),
                    property: config.target_property.clone(),
                };
                (access, value_type)
            }
            (BindingTarget::Notifying(target), None) => {
                let property = resolve(&target.type_descriptor(), &config.target_property)
                    .map_err(BindingError::target_property)?;
                let value_type = property.value_type();
                (TargetAccess::Direct(property), value_type)
            }
            (BindingTarget::Foreign { type_name, .. }, None) => {
                return Err(BindingError::AdapterNotFound { target: *type_name });
            }
        };
        let source_type = source_property.value_type();
        let source_is_observable = source_type.is_observable();
        let target_is_observable = target_type.is_observable();

        // Collections
        if reads && source_is_observable && !target_type.is_sequence() {
            return Err(BindingError::NotASequence { side: Side::Target });
        }
        if writes && target_is_observable && !source_type.is_sequence() {
            return Err(BindingError::NotASequence { side: Side::Source });
        }

        // Converter
        let needs_converter = target_type != source_type
            && ((reads && !source_is_observable) || (writes && !target_is_observable));
        let converter = if needs_converter {
            Some(
                config
                    .settings
                    .converter_for(target_type, source_type)
                    .ok_or(BindingError::ConverterNotFound {
                        from: target_type,
                        to: source_type,
                    })?,
            )
        } else {
            None
        };

        // Accessors
        let direct_target = match &target_access {
            TargetAccess::Direct(property) => Some(property),
            TargetAccess::Adapted { .. } => None,
        };
        if reads {
            if !source_property.is_readable() {
                return Err(BindingError::MissingAccessor(Accessor::SourceGetter));
            }
            if let Some(target) = direct_target {
                if source_is_observable && !target.is_readable() {
                    return Err(BindingError::MissingAccessor(Accessor::TargetGetter));
                }
                if !source_is_observable && !target.is_writable() {
                    return Err(BindingError::MissingAccessor(Accessor::TargetSetter));
                }
            }
        }
        if writes {
            if let Some(target) = direct_target
                && !target.is_readable()
            {
                return Err(BindingError::MissingAccessor(Accessor::TargetGetter));
            }
            if target_is_observable && !source_property.is_readable() {
                return Err(BindingError::MissingAccessor(Accessor::SourceGetter));
            }
            if !target_is_observable && !source_property.is_writable() {
                return Err(BindingError::MissingAccessor(Accessor::SourceSetter));
            }
        }

        // Trigger
        let trigger = match adapter.as_ref().and_then(|a| a.as_ui()) {
            Some(ui) if writes => match config.update_trigger {
                UpdateSourceTrigger::Default => match ui.default_update_trigger() {
                    UpdateSourceTrigger::Default => {
                        return Err(BindingError::InvalidAdapterTrigger {
                            adapter: ui.target_type_name(),
                        });
                    }
                    trigger => trigger,
                },
                trigger => trigger,
            },
            _ => UpdateSourceTrigger::PropertyChanged,
        };

        let wiring = Wiring {
            mode,
            source: Rc::clone(&config.source),
            source_property,
            target: config.target.clone(),
            target_access,
            converter,
            source_is_observable,
            target_is_observable,
        };
        let bound = Bound {
            wiring,
            capability,
            adapter,
            trigger,
            subscriptions: Vec::new(),
            source_relay: None,
            target_relay: None,
        };
        Ok((bound, trigger))
    }

    /// Register the listeners the effective mode and trigger call for.
    fn wire(self: &Rc<Self>, mode: BindingMode, trigger: UpdateSourceTrigger) -> Result<(), BindingError> {
        let (wiring, capability, adapter) = {
            let bound = self.bound.borrow();
            let Some(bound) = bound.as_ref() else {
                return Ok(());
            };
            (bound.wiring.clone(), bound.capability, bound.adapter.clone())
        };
        let (source_property, target_property) = {
            let config = self.config.borrow();
            (config.source_property.clone(), config.target_property.clone())
        };

        if mode.listens_to_source() {
            let handle = wiring
                .source
                .add_property_changed_listener(self.source_listener(source_property));
            self.record(Subscription::Source(handle));
        }

        if !mode.updates_source() {
            return Ok(());
        }
        let wants_changes =
            capability != Capability::AdaptedUi || trigger == UpdateSourceTrigger::PropertyChanged;
        match (&wiring.target, &adapter) {
            (BindingTarget::Notifying(target), None) if wants_changes => {
                let handle = target.add_property_changed_listener(self.target_listener(target_property));
                self.record(Subscription::Target(handle));
            }
            (target, Some(adapter)) if wants_changes => {
                let handle =
                    adapter.add_change_listener(target.as_any(), self.target_listener(target_property))?;
                self.record(Subscription::AdapterChange(handle));
            }
            (target, Some(adapter)) if trigger == UpdateSourceTrigger::LostFocus => {
                if let Some(ui) = adapter.as_ui() {
                    let handle = ui.add_focus_lost_listener(target.as_any(), self.focus_lost_listener())?;
                    self.record(Subscription::FocusLost(handle));
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn record(&self, subscription: Subscription) {
        if let Some(bound) = self.bound.borrow_mut().as_mut() {
            bound.subscriptions.push(subscription);
        }
    }

    /// The live core behind a listener wired under `generation`, if any.
    fn current(core: &Weak<Self>, generation: u64) -> Option<Rc<Self>> {
        core.upgrade().filter(|core| core.generation.get() == generation)
    }

    fn source_listener(self: &Rc<Self>, property: String) -> PropertyChangedListener {
        let core: Weak<Self> = Rc::downgrade(self);
        let generation = self.generation.get();
        Rc::new(move |name: &str| {
            if name != property {
                return;
            }
            let Some(core) = Self::current(&core, generation) else {
                return;
            };
            if core.ignoring_source_echo.is_raised() {
                return;
            }
            if let Err(err) = core.update_target() {
                warn!(%err, property = %property, "source change not propagated");
            }
        })
    }

    fn target_listener(self: &Rc<Self>, property: String) -> PropertyChangedListener {
        let core: Weak<Self> = Rc::downgrade(self);
        let generation = self.generation.get();
        Rc::new(move |name: &str| {
            if name != property {
                return;
            }
            let Some(core) = Self::current(&core, generation) else {
                return;
            };
            if core.ignoring_target_echo.is_raised() {
                return;
            }
            if let Err(err) = core.update_source() {
                warn!(%err, property = %property, "target change not propagated");
            }
        })
    }

    fn focus_lost_listener(self: &Rc<Self>) -> FocusLostListener {
        let core: Weak<Self> = Rc::downgrade(self);
        let generation = self.generation.get();
        Rc::new(move || {
            let Some(core) = Self::current(&core, generation) else {
                return;
            };
            if core.ignoring_target_echo.is_raised() {
                return;
            }
            if let Err(err) = core.update_source() {
                warn!(%err, "focus-loss update not propagated");
            }
        })
    }

    fn unbind(&self) {
        let Some(bound) = self.bound.borrow_mut().take() else {
            return;
        };
        self.generation.set(self.generation.get().wrapping_add(1));
        let source = &bound.wiring.source;
        let target = &bound.wiring.target;
        for subscription in &bound.subscriptions {
            let removed = match (*subscription, target, &bound.adapter) {
                (Subscription::Source(handle), _, _) => {
                    source.remove_property_changed_listener(handle);
                    Ok(())
                }
                (Subscription::Target(handle), BindingTarget::Notifying(target), _) => {
                    target.remove_property_changed_listener(handle);
                    Ok(())
                }
                (Subscription::AdapterChange(handle), target, Some(adapter)) => {
                    adapter.remove_change_listener(target.as_any(), handle)
                }
                (Subscription::FocusLost(handle), target, Some(adapter)) => match adapter.as_ui() {
                    Some(ui) => ui.remove_focus_lost_listener(target.as_any(), handle),
                    None => Ok(()),
                },
                _ => Ok(()),
            };
            if let Err(err) = removed {
                warn!(%err, ?subscription, "listener removal failed");
            }
        }
        if let Some(relay) = bound.source_relay {
            relay.detach();
        }
        if let Some(relay) = bound.target_relay {
            relay.detach();
        }
        debug!(
            source_property = bound.wiring.source_property.name(),
            target = target.type_name(),
            "unbound"
        );
    }

    fn wiring(&self, operation: &'static str) -> Result<Wiring, BindingError> {
        self.bound
            .borrow()
            .as_ref()
            .map(|bound| bound.wiring.clone())
            .ok_or(BindingError::NotBound { operation })
    }

    fn report(&self, result: &BindingResult) {
        let listener = self.config.borrow().result_listener.clone();
        if let Some(listener) = listener {
            listener(result);
        }
    }

    fn update_target(&self) -> Result<(), BindingError> {
        let wiring = self.wiring("update target")?;
        if !wiring.mode.updates_target() {
            return Err(BindingError::Mode {
                operation: "update target",
                mode: wiring.mode,
            });
        }
        let _guard = self.ignoring_target_echo.raise();
        let value = wiring.read_source()?;
        if wiring.source_is_observable {
            return self.flush_into_target(&wiring, value);
        }
        let value = match &wiring.converter {
            Some(converter) => match converter.convert_back(value) {
                Ok(converted) => converted,
                Err(err) => {
                    trace!(reason = err.reason(), "source value not convertible, target left as is");
                    return Ok(());
                }
            },
            None => value,
        };
        trace!(%value, "updating target");
        wiring.write_target(value)?;
        self.report(&BindingResult::Success);
        Ok(())
    }

    fn update_source(&self) -> Result<(), BindingError> {
        let wiring = self.wiring("update source")?;
        if !wiring.mode.updates_source() {
            return Err(BindingError::Mode {
                operation: "update source",
                mode: wiring.mode,
            });
        }
        let _guard = self.ignoring_source_echo.raise();
        let value = wiring.read_target()?;
        if wiring.target_is_observable {
            return self.flush_into_source(&wiring, value);
        }

        let (validator, fail_open) = {
            let config = self.config.borrow();
            (config.validator.clone(), config.update_source_if_binding_fails)
        };
        let value = match &wiring.converter {
            Some(converter) => match converter.convert(value) {
                Ok(converted) => converted,
                Err(err) => {
                    trace!(reason = err.reason(), "target value not convertible");
                    self.report(&BindingResult::ConversionFailed(err.reason().to_owned()));
                    return Self::fail_open(&wiring, fail_open);
                }
            },
            None => value,
        };
        if let Some(validator) = validator
            && let Err(err) = validator.validate(&value)
        {
            trace!(message = err.message(), "target value rejected");
            self.report(&BindingResult::ValidationFailed(err.message().to_owned()));
            return Self::fail_open(&wiring, fail_open);
        }
        trace!(%value, "updating source");
        wiring.write_source(value)?;
        self.report(&BindingResult::Success);
        Ok(())
    }

    fn fail_open(wiring: &Wiring, enabled: bool) -> Result<(), BindingError> {
        if enabled {
            wiring.write_source(Value::Null)
        } else {
            Ok(())
        }
    }

    /// Copy the source collection into the target sequence and relay further
    /// source deltas into it.
    fn flush_into_target(&self, wiring: &Wiring, value: Value) -> Result<(), BindingError> {
        self.detach_relay(Side::Source);

        let Some(destination) = sequence_of(wiring.read_target()?, Side::Target)? else {
            warn!(
                target = wiring.target.type_name(),
                "target sequence is null, collection sync skipped"
            );
            return Ok(());
        };
        let Some(list) = observable_of(value, Side::Source)? else {
            destination.clear();
            return Ok(());
        };
        if destination.is_same_list(&list) {
            trace!("source and target share one collection, nothing to relay");
            self.detach_relay(Side::Target);
            return Ok(());
        }
        trace!(len = list.len(), "copying source collection into target");
        destination.replace_all(list.to_vec());
        let relay = Relay::attach(
            &list,
            destination.clone(),
            self.ignoring_source_echo.clone(),
            self.ignoring_target_echo.clone(),
        );
        self.store_relay(relay, Side::Source);
        if let Sequence::Observable(target_list) = &destination {
            self.repoint_relay(wiring, Side::Target, target_list, &list);
        }
        Ok(())
    }

    /// Copy the target collection into the source sequence and relay further
    /// target deltas into it.
    fn flush_into_source(&self, wiring: &Wiring, value: Value) -> Result<(), BindingError> {
        self.detach_relay(Side::Target);

        let Some(destination) = sequence_of(wiring.read_source()?, Side::Source)? else {
            warn!(
                source = wiring.source_property.owner(),
                "source sequence is null, collection sync skipped"
            );
            return Ok(());
        };
        let Some(list) = observable_of(value, Side::Target)? else {
            destination.clear();
            return Ok(());
        };
        if destination.is_same_list(&list) {
            trace!("target and source share one collection, nothing to relay");
            self.detach_relay(Side::Source);
            return Ok(());
        }
        trace!(len = list.len(), "copying target collection into source");
        destination.replace_all(list.to_vec());
        let relay = Relay::attach(
            &list,
            destination.clone(),
            self.ignoring_target_echo.clone(),
            self.ignoring_source_echo.clone(),
        );
        self.store_relay(relay, Side::Target);
        if let Sequence::Observable(source_list) = &destination {
            self.repoint_relay(wiring, Side::Source, source_list, &list);
        }
        Ok(())
    }

    /// Aim the existing relay out of `from` at `destination`.
    ///
    /// After one side's collection is replaced and copied over, the relay
    /// running the other way would still feed the old collection, or be
    /// missing if the two sides shared one collection before. Only TwoWay
    /// relays in both directions.
    fn repoint_relay(
        &self,
        wiring: &Wiring,
        from: Side,
        list: &ObservableList,
        destination: &ObservableList,
    ) {
        if !matches!(wiring.mode, BindingMode::TwoWay) {
            return;
        }
        let (suppressed_by, raises) = match from {
            Side::Source => (self.ignoring_source_echo.clone(), self.ignoring_target_echo.clone()),
            Side::Target => (self.ignoring_target_echo.clone(), self.ignoring_source_echo.clone()),
        };
        let relay = Relay::attach(list, Sequence::Observable(destination.clone()), suppressed_by, raises);
        self.store_relay(relay, from);
    }

    /// Detach the relay running out of `from`, if any.
    fn detach_relay(&self, from: Side) {
        let previous = self.bound.borrow_mut().as_mut().and_then(|bound| match from {
            Side::Source => bound.source_relay.take(),
            Side::Target => bound.target_relay.take(),
        });
        if let Some(relay) = previous {
            relay.detach();
        }
    }

    /// Keep `relay` (relaying from `from`) on the bound state, or detach it
    /// if the binding was unbound meanwhile.
    fn store_relay(&self, relay: Relay, from: Side) {
        let stale = match self.bound.borrow_mut().as_mut() {
            Some(bound) => match from {
                Side::Source => bound.source_relay.replace(relay),
                Side::Target => bound.target_relay.replace(relay),
            },
            None => Some(relay),
        };
        if let Some(stale) = stale {
            stale.detach();
        }
    }
}

/// The relay destination held by `value`, `None` for `Null`.
fn sequence_of(value: Value, side: Side) -> Result<Option<Sequence>, BindingError> {
    if value.is_null() {
        return Ok(None);
    }
    value
        .into_sequence()
        .map(Some)
        .ok_or(BindingError::NotASequence { side })
}

/// The observable list held by `value`, `None` for `Null`.
fn observable_of(value: Value, side: Side) -> Result<Option<ObservableList>, BindingError> {
    match value {
        Value::Null => Ok(None),
        Value::ObservableList(list) => Ok(Some(list)),
        _ => Err(BindingError::NotASequence { side }),
    }
}
