//! Named component classes that `apply_views` and `cb-repeat` instantiate by name.

use crate::{
	context::Context,
	dom::Node,
	error::Error,
	view::{Glimpse, View, ViewOptions},
};
use core::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
};
use indexmap::IndexMap;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
	View,
	Glimpse,
}
impl ViewKind {
	/// The attribute that names a class explicitly, e.g. `cb-view="MyView"`.
	#[must_use]
	pub fn attribute(self) -> &'static str {
		match self {
			ViewKind::View => "cb-view",
			ViewKind::Glimpse => "cb-glimpse",
		}
	}

	/// The class every instance's element carries.
	#[must_use]
	pub fn class_name(self) -> &'static str {
		match self {
			ViewKind::View => "cb-view",
			ViewKind::Glimpse => "cb-glimpse",
		}
	}
}

/// A registered class: its kind and a prototype producing fresh construction options.
#[derive(Clone)]
pub struct ComponentClass {
	kind: ViewKind,
	prototype: Rc<dyn Fn() -> ViewOptions>,
}
impl Debug for ComponentClass {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("ComponentClass").field("kind", &self.kind).finish_non_exhaustive()
	}
}
impl ComponentClass {
	#[must_use]
	pub fn kind(&self) -> ViewKind {
		self.kind
	}

	/// Fresh options from the prototype.
	#[must_use]
	pub fn options(&self) -> ViewOptions {
		(self.prototype)()
	}

	/// Creates an instance on `el`. The instance stays reachable through `el`'s expando.
	///
	/// # Errors
	///
	/// Iff `el` isn't an element.
	pub fn instantiate(&self, el: &Node, context: &Context) -> Result<(), Error> {
		match self.kind {
			ViewKind::View => View::new(self.options().el(el).context(context)).map(drop),
			ViewKind::Glimpse => Glimpse::new(el, context).map(drop),
		}
	}
}

/// Class name → component class, in registration order.
#[derive(Clone, Default)]
pub struct Namespace(Rc<RefCell<IndexMap<String, ComponentClass>>>);
impl Debug for Namespace {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_set().entries(self.0.borrow().keys()).finish()
	}
}
impl Namespace {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a view class. `MyView` matches `<my-view>` and `cb-view="MyView"`.
	pub fn register_view(&self, name: &str, prototype: impl Fn() -> ViewOptions + 'static) {
		self.register(name, ViewKind::View, Rc::new(prototype))
	}

	pub fn register_glimpse(&self, name: &str) {
		self.register(name, ViewKind::Glimpse, Rc::new(ViewOptions::new))
	}

	fn register(&self, name: &str, kind: ViewKind, prototype: Rc<dyn Fn() -> ViewOptions>) {
		self.0.borrow_mut().insert(name.to_owned(), ComponentClass { kind, prototype });
	}

	#[must_use]
	pub fn get_class(&self, name: &str) -> Option<ComponentClass> {
		self.0.borrow().get(name).cloned()
	}

	#[must_use]
	pub fn classes(&self) -> Vec<(String, ComponentClass)> {
		self.0.borrow().iter().map(|(name, class)| (name.clone(), class.clone())).collect()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.borrow().is_empty()
	}
}
