#![forbid(unsafe_code)]

//! Several bindings sharing one source.
//!
//! A [`BindingGroup`] stores binding prototypes (target, properties, mode,
//! trigger) and materializes them into [`Binding`]s on [`bind`]. Changing the
//! source of a bound group rebinds every member.
//!
//! [`bind`]: BindingGroup::bind

use std::fmt;
use std::rc::Rc;

use crate::binding::Binding;
use crate::endpoint::{BindingSource, BindingTarget};
use crate::error::BindingError;
use crate::mode::{BindingMode, UpdateSourceTrigger};
use crate::settings::BindingSettings;

struct Prototype {
    target: BindingTarget,
    target_property: String,
    source_property: String,
    mode: BindingMode,
    update_trigger: UpdateSourceTrigger,
}

#[derive(Default)]
pub struct BindingGroup {
    source: Option<Rc<dyn BindingSource>>,
    settings: Option<Rc<BindingSettings>>,
    prototypes: Vec<Prototype>,
    bindings: Vec<Binding>,
    bound: bool,
}

impl BindingGroup {
    /// An empty group with no source yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_source(source: Rc<dyn BindingSource>) -> Self {
        Self {
            source: Some(source),
            ..Self::default()
        }
    }

    /// Add a prototype with `BindingMode::Default` and the default trigger.
    pub fn add(&mut self, target: BindingTarget, target_property: &str, source_property: &str) {
        self.add_with(
            target,
            target_property,
            source_property,
            BindingMode::Default,
            UpdateSourceTrigger::Default,
        );
    }

    pub fn add_with(
        &mut self,
        target: BindingTarget,
        target_property: &str,
        source_property: &str,
        mode: BindingMode,
        update_trigger: UpdateSourceTrigger,
    ) {
        self.prototypes.push(Prototype {
            target,
            target_property: target_property.to_owned(),
            source_property: source_property.to_owned(),
            mode,
            update_trigger,
        });
    }

    #[must_use]
    pub fn source(&self) -> Option<Rc<dyn BindingSource>> {
        self.source.clone()
    }

    #[must_use]
    pub fn settings(&self) -> Option<Rc<BindingSettings>> {
        self.settings.clone()
    }

    /// Settings used by every binding the group creates.
    ///
    /// # Errors
    ///
    /// [`BindingError::GroupBound`] while the group is bound.
    pub fn set_settings(&mut self, settings: Rc<BindingSettings>) -> Result<(), BindingError> {
        if self.is_bound() {
            return Err(BindingError::GroupBound);
        }
        self.settings = Some(settings);
        Ok(())
    }

    /// Create and bind one binding per prototype. A no-op when bound.
    ///
    /// # Errors
    ///
    /// [`BindingError::GroupWithoutSource`], or the first binding error; in
    /// that case every binding created so far is unbound again.
    pub fn bind(&mut self) -> Result<(), BindingError> {
        if self.is_bound() {
            return Ok(());
        }
        let source = self.source.clone().ok_or(BindingError::GroupWithoutSource)?;
        let mut bindings = Vec::with_capacity(self.prototypes.len());
        for proto in &self.prototypes {
            let mut binding = Binding::new(
                proto.target.clone(),
                proto.target_property.as_str(),
                Rc::clone(&source),
                proto.source_property.as_str(),
            )?
            .with_mode(proto.mode)
            .with_update_trigger(proto.update_trigger);
            if let Some(settings) = &self.settings {
                binding = binding.with_settings(Rc::clone(settings));
            }
            binding.bind()?;
            bindings.push(binding);
        }
        tracing::debug!(count = bindings.len(), "binding group bound");
        self.bindings = bindings;
        self.bound = true;
        Ok(())
    }

    /// Unbind and drop every binding. Idempotent.
    pub fn unbind(&mut self) {
        if !self.bound {
            return;
        }
        for binding in self.bindings.drain(..) {
            binding.unbind();
        }
        self.bound = false;
        tracing::debug!("binding group unbound");
    }

    /// Replace the source, rebinding every member if bound.
    ///
    /// # Errors
    ///
    /// Any error from the rebind.
    pub fn set_source(&mut self, source: Rc<dyn BindingSource>) -> Result<(), BindingError> {
        let was_bound = self.is_bound();
        self.unbind();
        self.source = Some(source);
        if was_bound { self.bind() } else { Ok(()) }
    }

    /// Whether [`bind`](Self::bind) succeeded and no unbind followed.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Number of prototypes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.prototypes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prototypes.is_empty()
    }

    /// Live bindings, in prototype order.
    #[must_use]
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }
}

impl fmt::Debug for BindingGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingGroup")
            .field("has_source", &self.source.is_some())
            .field("prototype_count", &self.prototypes.len())
            .field("bound", &self.is_bound())
            .finish()
    }
}
