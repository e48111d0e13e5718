//! Bindable fixtures shared by the integration tests.

#![allow(dead_code)]

use std::any::{Any, TypeId};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tether_core::adapter::{AdapterError, BindingAdapter, FocusLostListener, UiBindingAdapter};
use tether_core::listener::{
    ListenerHandle, NotifyPropertyChanged, PropertyChangeSupport, PropertyChangedListener,
};
use tether_core::mode::{BindingMode, UpdateSourceTrigger};
use tether_core::property::{Reflect, TypeDescriptor};
use tether_core::value::{SharedList, Value, ValueType};

/// Route `tracing` output to the test writer. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

macro_rules! notifying {
    ($ty:ty) => {
        impl NotifyPropertyChanged for $ty {
            fn add_property_changed_listener(&self, listener: PropertyChangedListener) -> ListenerHandle {
                self.changes.add_property_changed_listener(listener)
            }

            fn remove_property_changed_listener(&self, handle: ListenerHandle) {
                self.changes.remove_property_changed_listener(handle);
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Source: an integer model with a few oddly shaped properties
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct Source {
    i: Cell<Option<i64>>,
    name: RefCell<Option<String>>,
    ratio: Cell<f64>,
    secret: RefCell<Option<String>>,
    changes: PropertyChangeSupport,
}

thread_local! {
    static SOURCE_TYPE: Rc<TypeDescriptor> = Rc::new(
        TypeDescriptor::builder::<Source>("Source")
            .getter("getI", ValueType::Int, |s| Value::from(s.i.get()))
            .setter("setI", ValueType::Int, |s, v| s.set_i(v.as_int()))
            .getter("getName", ValueType::Text, |s| Value::from(s.name.borrow().clone()))
            .setter("setName", ValueType::Text, |s, v| {
                s.set_name(v.as_text().map(str::to_owned));
            })
            .getter("getRatio", ValueType::Float, |s| Value::Float(s.ratio.get()))
            .setter("setRatio", ValueType::Float, |s, v| s.ratio.set(v.as_float().unwrap_or(0.0)))
            .getter("getTotal", ValueType::Int, |s| Value::Int(s.i.get().unwrap_or(0) * 2))
            .setter("setSecret", ValueType::Text, |s, v| {
                *s.secret.borrow_mut() = v.as_text().map(str::to_owned);
            })
            .build()
    );
}

impl Source {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn i(&self) -> Option<i64> {
        self.i.get()
    }

    pub fn set_i(&self, i: Option<i64>) {
        self.i.set(i);
        self.changes.raise("i");
    }

    pub fn name(&self) -> Option<String> {
        self.name.borrow().clone()
    }

    pub fn set_name(&self, name: Option<String>) {
        *self.name.borrow_mut() = name;
        self.changes.raise("name");
    }

    pub fn listener_count(&self) -> usize {
        self.changes.listener_count()
    }
}

impl Reflect for Source {
    fn type_descriptor(&self) -> Rc<TypeDescriptor> {
        SOURCE_TYPE.with(Rc::clone)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

notifying!(Source);

// ---------------------------------------------------------------------------
// Target: a text holder that notifies
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct Target {
    text: RefCell<Option<String>>,
    writes: Cell<usize>,
    changes: PropertyChangeSupport,
}

thread_local! {
    static TARGET_TYPE: Rc<TypeDescriptor> = Rc::new(
        TypeDescriptor::builder::<Target>("Target")
            .getter("getText", ValueType::Text, |t| Value::from(t.text()))
            .setter("setText", ValueType::Text, |t, v| t.set_text(v.as_text()))
            .getter("getLength", ValueType::Int, |t| {
                Value::Int(t.text().map_or(0, |s| s.len() as i64))
            })
            .build()
    );
}

impl Target {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn text(&self) -> Option<String> {
        self.text.borrow().clone()
    }

    pub fn set_text(&self, text: Option<&str>) {
        *self.text.borrow_mut() = text.map(str::to_owned);
        self.writes.set(self.writes.get() + 1);
        self.changes.raise("text");
    }

    /// Number of `set_text` calls so far.
    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    pub fn listener_count(&self) -> usize {
        self.changes.listener_count()
    }
}

impl Reflect for Target {
    fn type_descriptor(&self) -> Rc<TypeDescriptor> {
        TARGET_TYPE.with(Rc::clone)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

notifying!(Target);

// ---------------------------------------------------------------------------
// Basket: an observable-list-valued property
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct Basket {
    items: RefCell<Value>,
    changes: PropertyChangeSupport,
}

thread_local! {
    static BASKET_TYPE: Rc<TypeDescriptor> = Rc::new(
        TypeDescriptor::builder::<Basket>("Basket")
            .getter("getItems", ValueType::ObservableList, |b| b.items.borrow().clone())
            .setter("setItems", ValueType::ObservableList, |b, v| b.replace(v))
            .build()
    );
}

impl Basket {
    pub fn with(list: tether_core::ObservableList) -> Rc<Self> {
        Rc::new(Self {
            items: RefCell::new(Value::ObservableList(list)),
            changes: PropertyChangeSupport::new(),
        })
    }

    pub fn empty() -> Rc<Self> {
        Self::with(tether_core::ObservableList::new())
    }

    /// A basket whose list property is `Null`.
    pub fn without_list() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn list(&self) -> tether_core::ObservableList {
        self.items
            .borrow()
            .as_observable_list()
            .cloned()
            .expect("basket has a list")
    }

    pub fn replace(&self, items: Value) {
        *self.items.borrow_mut() = items;
        self.changes.raise("items");
    }
}

impl Reflect for Basket {
    fn type_descriptor(&self) -> Rc<TypeDescriptor> {
        BASKET_TYPE.with(Rc::clone)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

notifying!(Basket);

// ---------------------------------------------------------------------------
// Shelf: a plain list property
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct Shelf {
    items: SharedList,
    changes: PropertyChangeSupport,
}

thread_local! {
    static SHELF_TYPE: Rc<TypeDescriptor> = Rc::new(
        TypeDescriptor::builder::<Shelf>("Shelf")
            .getter("getItems", ValueType::List, |s| Value::List(s.items.clone()))
            .build()
    );
}

impl Shelf {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn items(&self) -> Vec<Value> {
        self.items.to_vec()
    }
}

impl Reflect for Shelf {
    fn type_descriptor(&self) -> Rc<TypeDescriptor> {
        SHELF_TYPE.with(Rc::clone)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

notifying!(Shelf);

// ---------------------------------------------------------------------------
// TextField: a foreign widget reached through a UI adapter
// ---------------------------------------------------------------------------

type Listeners<L> = RefCell<Vec<(ListenerHandle, L)>>;

/// A widget that knows nothing about bindings.
#[derive(Default)]
pub struct TextField {
    text: RefCell<String>,
    change_listeners: Listeners<PropertyChangedListener>,
    focus_listeners: Listeners<FocusLostListener>,
}

impl TextField {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn text(&self) -> String {
        self.text.borrow().clone()
    }

    /// Simulate the user typing: replace the text and fire change events.
    pub fn type_text(&self, text: &str) {
        *self.text.borrow_mut() = text.to_owned();
        let listeners: Vec<_> = self
            .change_listeners
            .borrow()
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        for listener in listeners {
            listener("text");
        }
    }

    /// Simulate focus leaving the widget.
    pub fn blur(&self) {
        let listeners: Vec<_> = self
            .focus_listeners
            .borrow()
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        for listener in listeners {
            listener();
        }
    }

    pub fn change_listener_count(&self) -> usize {
        self.change_listeners.borrow().len()
    }

    pub fn focus_listener_count(&self) -> usize {
        self.focus_listeners.borrow().len()
    }
}

pub struct TextFieldAdapter {
    pub default_mode: BindingMode,
    pub default_trigger: UpdateSourceTrigger,
}

impl Default for TextFieldAdapter {
    fn default() -> Self {
        Self {
            default_mode: BindingMode::TwoWay,
            default_trigger: UpdateSourceTrigger::LostFocus,
        }
    }
}

fn field(target: &dyn Any) -> Result<&TextField, AdapterError> {
    target
        .downcast_ref::<TextField>()
        .ok_or(AdapterError::WrongTarget { adapter: "TextField" })
}

fn known(property: &str) -> Result<(), AdapterError> {
    if property == "text" {
        Ok(())
    } else {
        Err(AdapterError::UnknownProperty {
            adapter: "TextField",
            property: property.to_owned(),
        })
    }
}

impl BindingAdapter for TextFieldAdapter {
    fn target_type(&self) -> TypeId {
        TypeId::of::<TextField>()
    }

    fn target_type_name(&self) -> &'static str {
        "TextField"
    }

    fn target_property_type(&self, property: &str) -> Option<ValueType> {
        (property == "text").then_some(ValueType::Text)
    }

    fn get_value(&self, target: &dyn Any, property: &str) -> Result<Value, AdapterError> {
        known(property)?;
        Ok(Value::Text(field(target)?.text()))
    }

    fn set_value(&self, target: &dyn Any, property: &str, value: Value) -> Result<(), AdapterError> {
        known(property)?;
        let text = value.as_text().unwrap_or_default();
        field(target)?.type_text(text);
        Ok(())
    }

    fn add_change_listener(
        &self,
        target: &dyn Any,
        listener: PropertyChangedListener,
    ) -> Result<ListenerHandle, AdapterError> {
        let handle = ListenerHandle::next();
        field(target)?.change_listeners.borrow_mut().push((handle, listener));
        Ok(handle)
    }

    fn remove_change_listener(&self, target: &dyn Any, handle: ListenerHandle) -> Result<(), AdapterError> {
        field(target)?
            .change_listeners
            .borrow_mut()
            .retain(|(h, _)| *h != handle);
        Ok(())
    }

    fn default_mode(&self) -> BindingMode {
        self.default_mode
    }

    fn as_ui(&self) -> Option<&dyn UiBindingAdapter> {
        Some(self)
    }
}

impl UiBindingAdapter for TextFieldAdapter {
    fn default_update_trigger(&self) -> UpdateSourceTrigger {
        self.default_trigger
    }

    fn add_focus_lost_listener(
        &self,
        target: &dyn Any,
        listener: FocusLostListener,
    ) -> Result<ListenerHandle, AdapterError> {
        let handle = ListenerHandle::next();
        field(target)?.focus_listeners.borrow_mut().push((handle, listener));
        Ok(handle)
    }

    fn remove_focus_lost_listener(&self, target: &dyn Any, handle: ListenerHandle) -> Result<(), AdapterError> {
        field(target)?
            .focus_listeners
            .borrow_mut()
            .retain(|(h, _)| *h != handle);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Label: a foreign display-only object with a plain adapter
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct Label {
    caption: RefCell<String>,
    listeners: Listeners<PropertyChangedListener>,
}

impl Label {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn caption(&self) -> String {
        self.caption.borrow().clone()
    }

    pub fn set_caption(&self, caption: &str) {
        *self.caption.borrow_mut() = caption.to_owned();
        let listeners: Vec<_> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        for listener in listeners {
            listener("caption");
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

pub struct LabelAdapter;

fn label(target: &dyn Any) -> Result<&Label, AdapterError> {
    target
        .downcast_ref::<Label>()
        .ok_or(AdapterError::WrongTarget { adapter: "Label" })
}

impl BindingAdapter for LabelAdapter {
    fn target_type(&self) -> TypeId {
        TypeId::of::<Label>()
    }

    fn target_type_name(&self) -> &'static str {
        "Label"
    }

    fn target_property_type(&self, property: &str) -> Option<ValueType> {
        (property == "caption").then_some(ValueType::Text)
    }

    fn get_value(&self, target: &dyn Any, _property: &str) -> Result<Value, AdapterError> {
        Ok(Value::Text(label(target)?.caption()))
    }

    fn set_value(&self, target: &dyn Any, _property: &str, value: Value) -> Result<(), AdapterError> {
        label(target)?.set_caption(value.as_text().unwrap_or_default());
        Ok(())
    }

    fn add_change_listener(
        &self,
        target: &dyn Any,
        listener: PropertyChangedListener,
    ) -> Result<ListenerHandle, AdapterError> {
        let handle = ListenerHandle::next();
        label(target)?.listeners.borrow_mut().push((handle, listener));
        Ok(handle)
    }

    fn remove_change_listener(&self, target: &dyn Any, handle: ListenerHandle) -> Result<(), AdapterError> {
        label(target)?.listeners.borrow_mut().retain(|(h, _)| *h != handle);
        Ok(())
    }

    fn default_mode(&self) -> BindingMode {
        BindingMode::OneWay
    }
}
