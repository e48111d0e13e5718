#![no_main]

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tether_core::prelude::*;

#[derive(Default)]
struct Holder {
    items: RefCell<Value>,
    changes: PropertyChangeSupport,
}

thread_local! {
    static HOLDER: Rc<TypeDescriptor> = Rc::new(
        TypeDescriptor::builder::<Holder>("Holder")
            .getter("getItems", ValueType::ObservableList, |h| h.items.borrow().clone())
            .setter("setItems", ValueType::ObservableList, |h, v| {
                *h.items.borrow_mut() = v;
                h.changes.raise("items");
            })
            .build()
    );
}

impl Reflect for Holder {
    fn type_descriptor(&self) -> Rc<TypeDescriptor> {
        HOLDER.with(Rc::clone)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl NotifyPropertyChanged for Holder {
    fn add_property_changed_listener(&self, listener: PropertyChangedListener) -> ListenerHandle {
        self.changes.add_property_changed_listener(listener)
    }

    fn remove_property_changed_listener(&self, handle: ListenerHandle) {
        self.changes.remove_property_changed_listener(handle);
    }
}

#[derive(Arbitrary, Debug)]
enum Edit {
    Push,
    Insert(u8),
    Remove(u8),
    Set(u8),
    Clear,
    ReplaceSourceList,
}

#[derive(Arbitrary, Debug)]
struct Step {
    on_source: bool,
    edit: Edit,
}

fn holder(list: ObservableList) -> Rc<Holder> {
    let holder = Holder::default();
    *holder.items.borrow_mut() = Value::from(list);
    Rc::new(holder)
}

fn list_of(holder: &Holder) -> ObservableList {
    holder
        .items
        .borrow()
        .as_observable_list()
        .cloned()
        .expect("holder keeps a list")
}

fuzz_target!(|steps: Vec<Step>| {
    let source = holder(ObservableList::new());
    let target = holder(ObservableList::new());
    let binding = Binding::new(
        BindingTarget::notifying(Rc::clone(&target)),
        "items",
        source.clone(),
        "items",
    )
    .expect("non-empty names")
    .with_mode(BindingMode::TwoWay);
    binding.bind().expect("bindable");

    // Fresh values keep remove-by-value unambiguous.
    let mut next = 0i64;
    for step in steps.iter().take(256) {
        next += 1;
        let list = if step.on_source { list_of(&source) } else { list_of(&target) };
        let len = list.len();
        match step.edit {
            Edit::Push => list.push(next),
            Edit::Insert(at) => list.insert(usize::from(at) % (len + 1), next),
            Edit::Remove(at) if len > 0 => {
                list.remove(usize::from(at) % len);
            }
            Edit::Set(at) if len > 0 => {
                list.set(usize::from(at) % len, next);
            }
            Edit::Clear => list.clear(),
            Edit::ReplaceSourceList => {
                source.items.replace(Value::from(ObservableList::from_vec(vec![Value::Int(next)])));
                source.changes.raise("items");
            }
            Edit::Remove(_) | Edit::Set(_) => {}
        }
        assert_eq!(list_of(&source).to_vec(), list_of(&target).to_vec());
    }
});
