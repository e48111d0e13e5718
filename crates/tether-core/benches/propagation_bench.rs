//! Benchmarks for binding propagation.
//!
//! Run with: `cargo bench --package tether-core --bench propagation_bench`
//!
//! # Performance Baselines
//!
//! These benchmarks establish baselines for:
//! - Property resolution against an accessor table
//! - Scalar propagation through a converter, one way and both ways
//! - Collection relays between observable lists
//! - Bind/unbind cycles

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::hint::black_box;
use std::rc::Rc;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use tether_core::prelude::*;
use tether_core::property::resolve;

// ============================================================================
// Fixtures
// ============================================================================

#[derive(Default)]
struct Model {
    count: Cell<Option<i64>>,
    items: RefCell<Value>,
    changes: PropertyChangeSupport,
}

impl Model {
    fn set_count(&self, count: Option<i64>) {
        self.count.set(count);
        self.changes.raise("count");
    }
}

#[derive(Default)]
struct View {
    label: RefCell<Option<String>>,
    changes: PropertyChangeSupport,
}

impl View {
    fn set_label(&self, label: Option<&str>) {
        *self.label.borrow_mut() = label.map(str::to_owned);
        self.changes.raise("label");
    }
}

thread_local! {
    static MODEL: Rc<TypeDescriptor> = Rc::new(
        TypeDescriptor::builder::<Model>("Model")
            .getter("getCount", ValueType::Int, |m| Value::from(m.count.get()))
            .setter("setCount", ValueType::Int, |m, v| m.set_count(v.as_int()))
            .getter("getItems", ValueType::ObservableList, |m| m.items.borrow().clone())
            .setter("setItems", ValueType::ObservableList, |m, v| *m.items.borrow_mut() = v)
            .getter("isEnabled", ValueType::Bool, |_| Value::Bool(true))
            .getter("getTitle", ValueType::Text, |_| Value::Null)
            .build()
    );
    static VIEW: Rc<TypeDescriptor> = Rc::new(
        TypeDescriptor::builder::<View>("View")
            .getter("getLabel", ValueType::Text, |v| Value::from(v.label.borrow().clone()))
            .setter("setLabel", ValueType::Text, |v, value| v.set_label(value.as_text()))
            .build()
    );
}

impl Reflect for Model {
    fn type_descriptor(&self) -> Rc<TypeDescriptor> {
        MODEL.with(Rc::clone)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl NotifyPropertyChanged for Model {
    fn add_property_changed_listener(&self, listener: PropertyChangedListener) -> ListenerHandle {
        self.changes.add_property_changed_listener(listener)
    }

    fn remove_property_changed_listener(&self, handle: ListenerHandle) {
        self.changes.remove_property_changed_listener(handle);
    }
}

impl Reflect for View {
    fn type_descriptor(&self) -> Rc<TypeDescriptor> {
        VIEW.with(Rc::clone)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl NotifyPropertyChanged for View {
    fn add_property_changed_listener(&self, listener: PropertyChangedListener) -> ListenerHandle {
        self.changes.add_property_changed_listener(listener)
    }

    fn remove_property_changed_listener(&self, handle: ListenerHandle) {
        self.changes.remove_property_changed_listener(handle);
    }
}

fn label_binding(model: &Rc<Model>, view: &Rc<View>, mode: BindingMode) -> Binding {
    let binding = Binding::new(
        BindingTarget::notifying(Rc::clone(view)),
        "label",
        model.clone(),
        "count",
    )
    .expect("non-empty names")
    .with_mode(mode);
    binding.bind().expect("bindable");
    binding
}

// ============================================================================
// Property Resolution
// ============================================================================

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("property/resolve");
    let descriptor = MODEL.with(Rc::clone);

    for name in ["count", "enabled", "title", "missing"] {
        group.bench_with_input(BenchmarkId::from_parameter(name), &name, |b, name| {
            b.iter(|| black_box(resolve(&descriptor, black_box(name)).is_ok()));
        });
    }

    group.finish();
}

// ============================================================================
// Scalar Propagation
// ============================================================================

fn bench_scalar(c: &mut Criterion) {
    let mut group = c.benchmark_group("binding/scalar");
    group.throughput(Throughput::Elements(1));

    for mode in [BindingMode::OneWay, BindingMode::TwoWay] {
        let model = Rc::new(Model::default());
        let view = Rc::new(View::default());
        let _binding = label_binding(&model, &view, mode);
        let mut n = 0i64;
        group.bench_function(BenchmarkId::new("source_change", mode), |b| {
            b.iter(|| {
                n += 1;
                model.set_count(Some(black_box(n)));
            });
        });
    }

    let model = Rc::new(Model::default());
    let view = Rc::new(View::default());
    let _binding = label_binding(&model, &view, BindingMode::TwoWay);
    group.bench_function("target_change", |b| {
        b.iter(|| view.set_label(Some(black_box("1234"))));
    });

    group.finish();
}

// ============================================================================
// Collection Relays
// ============================================================================

fn bench_relay(c: &mut Criterion) {
    let mut group = c.benchmark_group("binding/relay");

    for size in [16usize, 256, 4096] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("initial_copy", size), &size, |b, &size| {
            let items: Vec<Value> = (0..size as i64).map(Value::Int).collect();
            b.iter(|| {
                let source = Rc::new(Model::default());
                *source.items.borrow_mut() = Value::from(ObservableList::from_vec(items.clone()));
                let target = Rc::new(Model::default());
                *target.items.borrow_mut() = Value::from(ObservableList::new());
                let binding = Binding::new(
                    BindingTarget::notifying(Rc::clone(&target)),
                    "items",
                    source.clone(),
                    "items",
                )
                .expect("non-empty names")
                .with_mode(BindingMode::OneWay);
                binding.bind().expect("bindable");
                black_box(binding);
            });
        });
    }

    group.throughput(Throughput::Elements(1));
    let list = ObservableList::new();
    let source = Rc::new(Model::default());
    *source.items.borrow_mut() = Value::from(list.clone());
    let target = Rc::new(Model::default());
    *target.items.borrow_mut() = Value::from(ObservableList::new());
    let binding = Binding::new(
        BindingTarget::notifying(Rc::clone(&target)),
        "items",
        source.clone(),
        "items",
    )
    .expect("non-empty names")
    .with_mode(BindingMode::TwoWay);
    binding.bind().expect("bindable");
    group.bench_function("push_two_way", |b| {
        b.iter(|| {
            list.push(black_box(1));
            if list.len() > 1024 {
                list.clear();
            }
        });
    });

    group.finish();
}

// ============================================================================
// Bind / Unbind
// ============================================================================

fn bench_bind_cycle(c: &mut Criterion) {
    let model = Rc::new(Model::default());
    let view = Rc::new(View::default());
    let binding = Binding::new(
        BindingTarget::notifying(Rc::clone(&view)),
        "label",
        model.clone(),
        "count",
    )
    .expect("non-empty names")
    .with_mode(BindingMode::TwoWay);

    c.bench_function("binding/bind_unbind", |b| {
        b.iter(|| {
            binding.bind().expect("bindable");
            binding.unbind();
        });
    });
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(
    benches,
    bench_resolve,
    bench_scalar,
    bench_relay,
    bench_bind_cycle,
);

criterion_main!(benches);
