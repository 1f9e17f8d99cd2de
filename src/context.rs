//! The registries and collaborators a binding pass runs against.

use crate::{
	binding::BindingEngine,
	namespace::Namespace,
	scheduler::Scheduler,
	template::{TemplateCache, TemplateLoader},
};
use core::fmt::{self, Debug, Formatter};
use std::rc::Rc;

struct ContextInner {
	engine: BindingEngine,
	scheduler: Scheduler,
	templates: TemplateCache,
	namespace: Namespace,
	loader: Option<Rc<dyn TemplateLoader>>,
}

/// A shared handle to one binding engine, scheduler, template cache, namespace and template loader.
///
/// Views remember the context they were created with.
#[derive(Clone)]
pub struct Context(Rc<ContextInner>);
impl Debug for Context {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Context")
			.field("engine", &self.0.engine)
			.field("scheduler", &self.0.scheduler)
			.field("templates", &self.0.templates.len())
			.field("namespace", &self.0.namespace)
			.field("loader", &self.0.loader.is_some())
			.finish()
	}
}
impl Default for Context {
	fn default() -> Self {
		Self::builder().build()
	}
}

thread_local! {
	static GLOBAL: Context = Context::default();
}

impl Context {
	#[must_use]
	pub fn builder() -> ContextBuilder {
		ContextBuilder::default()
	}

	/// A fresh context with default settings.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// The lazily created default context of the current thread.
	#[must_use]
	pub fn global() -> Self {
		GLOBAL.with(Context::clone)
	}

	#[must_use]
	pub fn engine(&self) -> &BindingEngine {
		&self.0.engine
	}

	#[must_use]
	pub fn scheduler(&self) -> &Scheduler {
		&self.0.scheduler
	}

	#[must_use]
	pub fn templates(&self) -> &TemplateCache {
		&self.0.templates
	}

	#[must_use]
	pub fn namespace(&self) -> &Namespace {
		&self.0.namespace
	}

	#[must_use]
	pub fn template_loader(&self) -> Option<&Rc<dyn TemplateLoader>> {
		self.0.loader.as_ref()
	}

	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

#[derive(Default)]
pub struct ContextBuilder {
	remove_attribute_after_binding: Option<bool>,
	loader: Option<Rc<dyn TemplateLoader>>,
	namespace: Option<Namespace>,
	scheduler: Option<Scheduler>,
}
impl Debug for ContextBuilder {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("ContextBuilder")
			.field("remove_attribute_after_binding", &self.remove_attribute_after_binding)
			.field("loader", &self.loader.is_some())
			.field("namespace", &self.namespace)
			.field("scheduler", &self.scheduler)
			.finish()
	}
}
impl ContextBuilder {
	/// Defaults to `true`.
	#[must_use]
	pub fn remove_attribute_after_binding(mut self, remove: bool) -> Self {
		self.remove_attribute_after_binding = Some(remove);
		self
	}

	#[must_use]
	pub fn template_loader(mut self, loader: impl TemplateLoader + 'static) -> Self {
		self.loader = Some(Rc::new(loader));
		self
	}

	#[must_use]
	pub fn namespace(mut self, namespace: Namespace) -> Self {
		self.namespace = Some(namespace);
		self
	}

	/// Defaults to [`Scheduler::microtask`].
	#[must_use]
	pub fn scheduler(mut self, scheduler: Scheduler) -> Self {
		self.scheduler = Some(scheduler);
		self
	}

	#[must_use]
	pub fn build(self) -> Context {
		let engine = BindingEngine::new();
		if let Some(remove) = self.remove_attribute_after_binding {
			engine.set_remove_attribute_after_binding(remove);
		}
		Context(Rc::new(ContextInner {
			engine,
			scheduler: self.scheduler.unwrap_or_else(Scheduler::microtask),
			templates: TemplateCache::new(),
			namespace: self.namespace.unwrap_or_default(),
			loader: self.loader,
		}))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn global_is_shared_and_fresh_contexts_are_not() {
		assert!(Context::global().ptr_eq(&Context::global()));
		assert!(!Context::new().ptr_eq(&Context::new()));
	}

	#[test]
	fn builder() {
		let context = Context::builder().remove_attribute_after_binding(false).build();
		assert!(!context.engine().remove_attribute_after_binding());
		assert!(context.template_loader().is_none());
		assert!(context.namespace().is_empty());
		assert!(Context::new().engine().remove_attribute_after_binding());
	}
}
