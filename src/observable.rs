//! Binding sources: property access, change notification and the bindable [`Model`].

use crate::{
	event::{Event, EventDispatcher, Listener},
	value::{same_value, Value},
};
use core::{any::type_name, cell::RefCell};
use indexmap::IndexMap;
use std::rc::Rc;
use tracing::trace;

/// Emitted after any bindable property changed.
pub const CHANGE: &str = "change";

/// The property-scoped change notification type, `change:<property>`.
#[must_use]
pub fn change_event(property: &str) -> String {
	format!("{}:{}", CHANGE, property)
}

/// Property access on an object that bindings can read from and write to.
pub trait Bindable {
	fn get(&self, key: &str) -> Value;
	fn set(&self, key: &str, value: Value);
	fn has_property(&self, key: &str) -> bool;

	/// The change-notification capability, if this object has it.
	fn as_observable(&self) -> Option<&dyn Observable> {
		None
	}

	fn describe(&self) -> String {
		type_name::<Self>().to_owned()
	}
}

/// Change notification: `change:<property>` and `change` events with `{property, value}` payloads.
pub trait Observable {
	fn add_change_listener(&self, kind: &str, listener: &Listener);
	fn remove_change_listener(&self, kind: &str, listener: &Listener);

	/// Makes `key` emit change notifications. No-op if it already does.
	fn make_bindable(&self, key: &str);

	fn is_bindable(&self, key: &str) -> bool;
}

/// Custom setter logic: receives the current and the assigned value, returns the value to store.
pub type Setter = Rc<dyn Fn(&Value, Value) -> Value>;

#[derive(Clone)]
enum Accessor {
	Data,
	Bindable,
	Custom(Setter),
}

#[derive(Clone)]
struct Property {
	value: Value,
	enumerable: bool,
	accessor: Accessor,
}

fn default_enumerable(key: &str) -> bool {
	!key.starts_with('_')
}

/// An ordered, observable property bag.
///
/// Properties are either plain data slots, which change silently, or bindable accessors,
/// which emit `change:<property>` and then `change` whenever the stored value actually changes
/// (compared with [`same_value`]).
#[derive(Default)]
pub struct Model {
	properties: RefCell<IndexMap<String, Property>>,
	dispatcher: EventDispatcher,
}
impl Model {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a model whose declared properties are all bindable and initially `undefined`.
	#[must_use]
	pub fn from_manifest(manifest: &[&str]) -> Self {
		let model = Self::new();
		for key in manifest {
			model.define(key, Value::Undefined);
		}
		model
	}

	/// Fluent [`Model::define`].
	#[must_use]
	pub fn with(self, key: &str, value: impl Into<Value>) -> Self {
		self.define(key, value.into());
		self
	}

	#[must_use]
	pub fn dispatcher(&self) -> &EventDispatcher {
		&self.dispatcher
	}

	/// Defines a bindable accessor. No-op if `key` is one already.
	pub fn define(&self, key: &str, initial: Value) {
		self.define_with_enumerable(key, initial, default_enumerable(key))
	}

	pub fn define_with_enumerable(&self, key: &str, initial: Value, enumerable: bool) {
		let mut properties = self.properties.borrow_mut();
		match properties.get_mut(key) {
			Some(Property { accessor: Accessor::Bindable, .. }) | Some(Property { accessor: Accessor::Custom(_), .. }) => (),
			Some(property) => {
				property.accessor = Accessor::Bindable;
				property.enumerable = enumerable;
				if !initial.is_undefined() {
					property.value = initial;
				}
			}
			None => {
				properties.insert(
					key.to_owned(),
					Property {
						value: initial,
						enumerable,
						accessor: Accessor::Bindable,
					},
				);
			}
		}
	}

	/// Defines a bindable accessor around custom setter logic; the change notification is appended to it.
	pub fn define_with_setter(&self, key: &str, initial: Value, setter: impl Fn(&Value, Value) -> Value + 'static) {
		let mut properties = self.properties.borrow_mut();
		let property = properties.entry(key.to_owned()).or_insert_with(|| Property {
			value: Value::Undefined,
			enumerable: default_enumerable(key),
			accessor: Accessor::Data,
		});
		if let Accessor::Bindable | Accessor::Custom(_) = property.accessor {
			return;
		}
		if !initial.is_undefined() {
			property.value = initial;
		}
		property.accessor = Accessor::Custom(Rc::new(setter));
	}

	/// Stores a plain data property. Assigning to it later does not notify.
	pub fn insert(&self, key: &str, value: Value) {
		let mut properties = self.properties.borrow_mut();
		match properties.get_mut(key) {
			Some(property) => property.value = value,
			None => {
				properties.insert(
					key.to_owned(),
					Property {
						value,
						enumerable: default_enumerable(key),
						accessor: Accessor::Data,
					},
				);
			}
		}
	}

	/// Makes every data property bindable, except functions.
	pub fn make_all_bindable(&self) {
		let keys: Vec<String> = self.properties.borrow().keys().cloned().collect();
		for key in keys {
			self.make_bindable_inner(&key);
		}
	}

	fn make_bindable_inner(&self, key: &str) {
		let mut properties = self.properties.borrow_mut();
		match properties.get_mut(key) {
			Some(property) => {
				if matches!(property.accessor, Accessor::Data) && !matches!(property.value, Value::Function(_)) {
					trace!(key, "Made property bindable.");
					property.accessor = Accessor::Bindable;
				}
			}
			None => {
				properties.insert(
					key.to_owned(),
					Property {
						value: Value::Undefined,
						enumerable: default_enumerable(key),
						accessor: Accessor::Bindable,
					},
				);
			}
		}
	}

	/// Enumerable property names, in definition order.
	#[must_use]
	pub fn keys(&self) -> Vec<String> {
		self.properties.borrow().iter().filter(|(_, p)| p.enumerable).map(|(k, _)| k.clone()).collect()
	}

	/// Emits change notifications for `key` with its current value, whether or not it changed.
	pub fn dispatch_change(&self, key: &str) {
		let value = self.get(key);
		self.dispatcher.dispatch(&Event::change(change_event(key), key, value.clone()));
		self.dispatcher.dispatch(&Event::change(CHANGE, key, value));
	}
}

impl Bindable for Model {
	fn get(&self, key: &str) -> Value {
		self.properties.borrow().get(key).map_or(Value::Undefined, |p| p.value.clone())
	}

	fn set(&self, key: &str, value: Value) {
		let (accessor, current) = match self.properties.borrow().get(key) {
			Some(property) => (property.accessor.clone(), property.value.clone()),
			None => (Accessor::Data, Value::Undefined),
		};

		let (value, notify) = match accessor {
			Accessor::Data => (value, false),
			Accessor::Bindable => (value, true),
			// Called without holding the borrow, so custom logic may read the model.
			Accessor::Custom(setter) => (setter(&current, value), true),
		};

		if notify && same_value(&current, &value) {
			return;
		}

		{
			let mut properties = self.properties.borrow_mut();
			match properties.get_mut(key) {
				Some(property) => property.value = value,
				None => {
					properties.insert(
						key.to_owned(),
						Property {
							value,
							enumerable: default_enumerable(key),
							accessor: Accessor::Data,
						},
					);
				}
			}
		}

		if notify {
			self.dispatch_change(key);
		}
	}

	fn has_property(&self, key: &str) -> bool {
		self.properties.borrow().contains_key(key)
	}

	fn as_observable(&self) -> Option<&dyn Observable> {
		Some(self)
	}

	fn describe(&self) -> String {
		"Model".to_owned()
	}
}

impl Observable for Model {
	fn add_change_listener(&self, kind: &str, listener: &Listener) {
		self.dispatcher.add_listener(kind, listener, None, 0, false)
	}

	fn remove_change_listener(&self, kind: &str, listener: &Listener) {
		self.dispatcher.remove_listener(Some(kind), Some(listener), None)
	}

	fn make_bindable(&self, key: &str) {
		self.make_bindable_inner(key)
	}

	fn is_bindable(&self, key: &str) -> bool {
		matches!(
			self.properties.borrow().get(key),
			Some(Property {
				accessor: Accessor::Bindable | Accessor::Custom(_),
				..
			})
		)
	}
}

/// A source without change notification. Bindings to it are written once.
#[derive(Default)]
pub struct PlainObject {
	properties: RefCell<IndexMap<String, Value>>,
}
impl PlainObject {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with(self, key: &str, value: impl Into<Value>) -> Self {
		self.set(key, value.into());
		self
	}
}
impl Bindable for PlainObject {
	fn get(&self, key: &str) -> Value {
		self.properties.borrow().get(key).cloned().unwrap_or_default()
	}

	fn set(&self, key: &str, value: Value) {
		self.properties.borrow_mut().insert(key.to_owned(), value);
	}

	fn has_property(&self, key: &str) -> bool {
		self.properties.borrow().contains_key(key)
	}

	fn describe(&self) -> String {
		"PlainObject".to_owned()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use core::cell::Cell;

	fn counter(model: &Model, kind: &str) -> Rc<Cell<usize>> {
		let count = Rc::new(Cell::new(0));
		let listener = {
			let count = Rc::clone(&count);
			Listener::new(move |_| count.set(count.get() + 1))
		};
		model.add_change_listener(kind, &listener);
		count
	}

	#[test]
	fn changes_notify_once() {
		let model = Model::new().with("name", "a");
		let scoped = counter(&model, "change:name");
		let generic = counter(&model, CHANGE);

		model.set("name", "b".into());
		model.set("name", "b".into());
		assert_eq!((scoped.get(), generic.get()), (1, 1));
	}

	#[test]
	fn nan_is_not_a_change() {
		let model = Model::new().with("n", f64::NAN);
		let count = counter(&model, "change:n");
		model.set("n", f64::NAN.into());
		assert_eq!(count.get(), 0);
		model.set("n", (-0.0).into());
		model.set("n", 0.0.into());
		assert_eq!(count.get(), 2);
	}

	#[test]
	fn payload_carries_property_and_value() {
		let model = Model::new().with("x", 1);
		let seen = Rc::new(RefCell::new(None));
		let listener = {
			let seen = Rc::clone(&seen);
			Listener::new(move |event| *seen.borrow_mut() = Some((event.property().map(str::to_owned), event.value().clone())))
		};
		model.add_change_listener(CHANGE, &listener);
		model.set("x", 2.into());
		let (property, value) = seen.borrow_mut().take().unwrap();
		assert_eq!(property.as_deref(), Some("x"));
		assert_eq!(value.as_number(), Some(2.0));
	}

	#[test]
	fn define_is_idempotent() {
		let model = Model::new().with("x", 1);
		model.define("x", 5.into());
		assert_eq!(model.get("x").as_number(), Some(1.0));
	}

	#[test]
	fn data_properties_change_silently_until_made_bindable() {
		let model = Model::new();
		model.insert("x", 1.into());
		let count = counter(&model, "change:x");
		model.set("x", 2.into());
		assert_eq!(count.get(), 0);
		assert!(!model.is_bindable("x"));

		model.make_bindable("x");
		model.set("x", 3.into());
		assert_eq!(count.get(), 1);
	}

	#[test]
	fn functions_stay_data() {
		let model = Model::new();
		model.insert("f", crate::value::Function::unary(Value::clone).into());
		model.make_all_bindable();
		assert!(!model.is_bindable("f"));
	}

	#[test]
	fn custom_setter_is_wrapped() {
		let model = Model::new();
		model.define_with_setter("n", 0.into(), |_, value| Value::Number(value.as_number().unwrap_or(0.0).min(10.0)));
		let count = counter(&model, "change:n");
		model.set("n", 50.into());
		assert_eq!(model.get("n").as_number(), Some(10.0));
		model.set("n", 99.into());
		assert_eq!(count.get(), 1);
	}

	#[test]
	fn underscore_properties_are_hidden() {
		let model = Model::new().with("visible", 1).with("_hidden", 2);
		model.define_with_enumerable("_shown", 3.into(), true);
		assert_eq!(model.keys(), vec!["visible".to_owned(), "_shown".to_owned()]);
	}

	#[test]
	fn manifest() {
		let model = Model::from_manifest(&["a", "b"]);
		assert!(model.is_bindable("a") && model.is_bindable("b"));
		assert!(model.get("a").is_undefined());
	}
}
