//! The event-emission capability shared by observable sources, views and DOM nodes.

use crate::value::Value;
use core::{
	cell::{Cell, RefCell},
	fmt::{self, Debug, Formatter},
};
use hashbrown::HashMap;
use std::rc::Rc;
use tracing::trace;

/// Listener type that receives every event.
pub const ALL: &str = "all";

#[derive(Debug, Clone)]
pub struct Event {
	kind: String,
	property: Option<String>,
	value: Value,
	immediate_propagation_stopped: Cell<bool>,
}
impl Event {
	#[must_use]
	pub fn new(kind: impl Into<String>) -> Self {
		Self {
			kind: kind.into(),
			property: None,
			value: Value::Undefined,
			immediate_propagation_stopped: Cell::new(false),
		}
	}

	/// A `change` or `change:<property>` notification payload.
	#[must_use]
	pub fn change(kind: impl Into<String>, property: &str, value: Value) -> Self {
		Self {
			property: Some(property.to_owned()),
			value,
			..Self::new(kind)
		}
	}

	#[must_use]
	pub fn with_value(mut self, value: Value) -> Self {
		self.value = value;
		self
	}

	#[must_use]
	pub fn kind(&self) -> &str {
		&self.kind
	}

	#[must_use]
	pub fn property(&self) -> Option<&str> {
		self.property.as_deref()
	}

	#[must_use]
	pub fn value(&self) -> &Value {
		&self.value
	}

	pub fn stop_immediate_propagation(&self) {
		self.immediate_propagation_stopped.set(true)
	}

	#[must_use]
	pub fn immediate_propagation_stopped(&self) -> bool {
		self.immediate_propagation_stopped.get()
	}
}

/// A shared event handler, identified by reference.
#[derive(Clone)]
pub struct Listener(Rc<dyn Fn(&Event)>);
impl Listener {
	pub fn new(handler: impl Fn(&Event) + 'static) -> Self {
		Self(Rc::new(handler))
	}

	pub fn call(&self, event: &Event) {
		(self.0)(event)
	}
}
impl PartialEq for Listener {
	fn eq(&self, other: &Self) -> bool {
		Rc::as_ptr(&self.0).cast::<()>() == Rc::as_ptr(&other.0).cast::<()>()
	}
}
impl Eq for Listener {}
impl Debug for Listener {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "Listener({:p})", Rc::as_ptr(&self.0).cast::<()>())
	}
}

/// Opaque identity of the object a listener was registered on behalf of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Scope(usize);
impl Scope {
	#[must_use]
	pub fn of<T: ?Sized>(target: &T) -> Self {
		Self(target as *const T as *const () as usize)
	}
}

#[derive(Debug, Clone)]
struct Registration {
	listener: Listener,
	scope: Option<Scope>,
	priority: i32,
	once: bool,
}

fn normalize(kind: &str) -> &str {
	if kind == "*" {
		ALL
	} else {
		kind
	}
}

#[derive(Debug, Default)]
pub struct EventDispatcher {
	queues: RefCell<HashMap<String, Vec<Registration>>>,
}
impl EventDispatcher {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `listener` for each space-separated type in `kinds`.
	///
	/// Higher priorities run first. An identical type/listener/scope registration is not added twice.
	pub fn add_listener(&self, kinds: &str, listener: &Listener, scope: Option<Scope>, priority: i32, once: bool) {
		let mut queues = self.queues.borrow_mut();
		for kind in kinds.split_whitespace().map(normalize) {
			let queue = queues.entry(kind.to_owned()).or_insert_with(Vec::new);
			if queue.iter().any(|r| &r.listener == listener && r.scope == scope) {
				trace!(kind, "Listener already registered.");
				continue;
			}
			queue.push(Registration {
				listener: listener.clone(),
				scope,
				priority,
				once,
			});
			// Stable, so equal priorities keep registration order.
			queue.sort_by(|a, b| b.priority.cmp(&a.priority));
		}
	}

	/// Removes matching registrations. `None` matches anything; `remove_listener(None, None, None)` removes all.
	pub fn remove_listener(&self, kinds: Option<&str>, listener: Option<&Listener>, scope: Option<Scope>) {
		let mut queues = self.queues.borrow_mut();
		let matches = |r: &Registration| listener.map_or(true, |l| &r.listener == l) && scope.map_or(true, |s| r.scope == Some(s));
		match kinds {
			Some(kinds) => {
				for kind in kinds.split_whitespace().map(normalize) {
					if let Some(queue) = queues.get_mut(kind) {
						queue.retain(|r| !matches(r));
						if queue.is_empty() {
							queues.remove(kind);
						}
					}
				}
			}
			None => {
				queues.retain(|_, queue| {
					queue.retain(|r| !matches(r));
					!queue.is_empty()
				});
			}
		}
	}

	#[must_use]
	pub fn has_listener(&self, kind: &str, listener: Option<&Listener>, scope: Option<Scope>) -> bool {
		self.queues.borrow().get(normalize(kind)).map_or(false, |queue| {
			queue
				.iter()
				.any(|r| listener.map_or(true, |l| &r.listener == l) && scope.map_or(true, |s| r.scope == Some(s)))
		})
	}

	#[must_use]
	pub fn listener_count(&self, kind: &str) -> usize {
		self.queues.borrow().get(normalize(kind)).map_or(0, Vec::len)
	}

	/// Calls the listeners registered for the event's type, then those registered for [`ALL`].
	///
	/// Listeners are snapshotted first, so they may freely (un)register during dispatch.
	pub fn dispatch(&self, event: &Event) {
		let snapshot: Vec<(String, Registration)> = {
			let queues = self.queues.borrow();
			let typed = queues.get(event.kind()).into_iter().flatten().map(|r| (event.kind().to_owned(), r.clone()));
			let all = queues
				.get(ALL)
				.filter(|_| event.kind() != ALL)
				.into_iter()
				.flatten()
				.map(|r| (ALL.to_owned(), r.clone()));
			typed.chain(all).collect()
		};

		for (kind, registration) in snapshot {
			if registration.once {
				self.remove_listener(Some(&kind), Some(&registration.listener), registration.scope);
			}
			registration.listener.call(event);
			if event.immediate_propagation_stopped() {
				break;
			}
		}
	}
}
