//! Views: an element, its bindable properties, its template and the bindings between them.

use crate::{
	binding::{has_template_expression, parse_template, Binding, BINDINGS_EXPANDO},
	context::Context,
	dom::{Node, WeakNode},
	error::{Error, TemplateLoadError},
	event::{Event, Listener},
	observable::{Bindable, Model, Observable},
	value::Value,
};
use core::{
	any::Any,
	cell::{Cell, RefCell},
	fmt::{self, Debug, Formatter},
};
use std::rc::{Rc, Weak};
use tracing::{debug, instrument, trace, warn};

pub const BIND: &str = "bind";
pub const UNBIND: &str = "unbind";
pub const TEMPLATE_COMPLETE: &str = "templatecomplete";
pub const TEMPLATE_ERROR: &str = "templateerror";
pub const CREATION_COMPLETE: &str = "creationcomplete";
pub const DETACH: &str = "detach";
pub const REMOVE: &str = "remove";

const VIEW_EXPANDO: &str = "cbView";
const GLIMPSE_EXPANDO: &str = "cbGlimpse";
const CURRENT_STATE: &str = "currentState";

#[derive(Clone)]
pub enum Template {
	Html(String),
	/// Called with the view once its properties are set.
	Render(Rc<dyn Fn(&View) -> String>),
}
impl Debug for Template {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Template::Html(html) if cfg!(feature = "dangerous-logging") => f.debug_tuple("Html").field(html).finish(),
			Template::Html(html) => write!(f, "Html({} bytes)", html.len()),
			Template::Render(_) => f.write_str("Render"),
		}
	}
}

/// Construction options for [`View::new`].
pub struct ViewOptions {
	el: Option<Node>,
	tag_name: Option<String>,
	class_name: String,
	id: Option<String>,
	attributes: Vec<(String, String)>,
	style: Vec<(String, String)>,
	template: Option<Template>,
	template_url: Option<String>,
	template_cache_enabled: bool,
	auto_init_template: bool,
	properties: Vec<(String, Value)>,
	context: Option<Context>,
}
impl Default for ViewOptions {
	fn default() -> Self {
		Self {
			el: None,
			tag_name: None,
			class_name: String::new(),
			id: None,
			attributes: Vec::new(),
			style: Vec::new(),
			template: None,
			template_url: None,
			template_cache_enabled: true,
			auto_init_template: true,
			properties: Vec::new(),
			context: None,
		}
	}
}
impl Debug for ViewOptions {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("ViewOptions")
			.field("el", &self.el)
			.field("tag_name", &self.tag_name)
			.field("class_name", &self.class_name)
			.field("template", &self.template)
			.field("template_url", &self.template_url)
			.field("properties", &self.properties.iter().map(|(key, _)| key).collect::<Vec<_>>())
			.finish_non_exhaustive()
	}
}

impl ViewOptions {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// An existing element to manage. Takes precedence over [`ViewOptions::tag_name`].
	#[must_use]
	pub fn el(mut self, el: &Node) -> Self {
		self.el = Some(el.clone());
		self
	}

	/// Defaults to `div`.
	#[must_use]
	pub fn tag_name(mut self, tag_name: &str) -> Self {
		self.tag_name = Some(tag_name.to_owned());
		self
	}

	/// Appends to the classes added to the element.
	#[must_use]
	pub fn class_name(mut self, class_name: &str) -> Self {
		if !self.class_name.is_empty() {
			self.class_name.push(' ');
		}
		self.class_name.push_str(class_name);
		self
	}

	/// Only applied if the element has no `id` yet.
	#[must_use]
	pub fn id(mut self, id: &str) -> Self {
		self.id = Some(id.to_owned());
		self
	}

	#[must_use]
	pub fn attribute(mut self, name: &str, value: &str) -> Self {
		self.attributes.push((name.to_owned(), value.to_owned()));
		self
	}

	#[must_use]
	pub fn style(mut self, property: &str, value: &str) -> Self {
		self.style.push((property.to_owned(), value.to_owned()));
		self
	}

	#[must_use]
	pub fn template(mut self, template: &str) -> Self {
		self.template = Some(Template::Html(template.to_owned()));
		self
	}

	#[must_use]
	pub fn render(mut self, render: impl Fn(&View) -> String + 'static) -> Self {
		self.template = Some(Template::Render(Rc::new(render)));
		self
	}

	/// Loaded through the context's template loader. Takes precedence over inline templates.
	#[must_use]
	pub fn template_url(mut self, url: &str) -> Self {
		self.template_url = Some(url.to_owned());
		self
	}

	/// Defaults to `true`.
	#[must_use]
	pub fn template_cache_enabled(mut self, enabled: bool) -> Self {
		self.template_cache_enabled = enabled;
		self
	}

	/// Defaults to `true`. If `false`, call [`View::init_template`] yourself.
	#[must_use]
	pub fn auto_init_template(mut self, auto: bool) -> Self {
		self.auto_init_template = auto;
		self
	}

	/// Defines a bindable property.
	#[must_use]
	pub fn property(mut self, key: &str, value: impl Into<Value>) -> Self {
		self.properties.push((key.to_owned(), value.into()));
		self
	}

	/// Defaults to [`Context::global`].
	#[must_use]
	pub fn context(mut self, context: &Context) -> Self {
		self.context = Some(context.clone());
		self
	}
}

struct ViewInner {
	el: Node,
	model: Model,
	context: Context,
	template: Option<Template>,
	template_url: Option<String>,
	template_cache_enabled: bool,
	/// The element's markup before the template replaced it, moved into `[cb-content]` once.
	captured_content: RefCell<Option<String>>,
	bindings: RefCell<Option<Vec<Binding>>>,
	/// Text nodes that replaced `<cb-text>` placeholders, with their `cb-bind` values.
	text_bindings: RefCell<Vec<(Node, String)>>,
	initialized: Cell<bool>,
	removed: Cell<bool>,
}

impl Bindable for ViewInner {
	fn get(&self, key: &str) -> Value {
		match key {
			"el" => Value::Node(self.el.clone()),
			CURRENT_STATE => match self.model.get(key) {
				Value::Undefined => Value::String(String::new()),
				state => state,
			},
			_ => self.model.get(key),
		}
	}

	fn set(&self, key: &str, value: Value) {
		match key {
			"el" => warn!("The element of a view can't be replaced"),
			CURRENT_STATE => {
				let previous = self.get(CURRENT_STATE).to_display_string();
				let next = value.to_display_string();
				if previous == next {
					return;
				}
				if !previous.is_empty() {
					self.el.remove_class(&format!("cb-state-{}", previous));
				}
				if !next.is_empty() {
					self.el.add_class(&format!("cb-state-{}", next));
				}
				self.model.insert(CURRENT_STATE, Value::String(next));
				self.model.dispatch_change(CURRENT_STATE);
			}
			_ => self.model.set(key, value),
		}
	}

	fn has_property(&self, key: &str) -> bool {
		key == "el" || key == CURRENT_STATE || self.model.has_property(key)
	}

	fn as_observable(&self) -> Option<&dyn Observable> {
		Some(&self.model)
	}

	fn describe(&self) -> String {
		format!("View({:?})", self.el)
	}
}

/// A view: owns its element, binds the element's subtree to its own properties.
///
/// The element keeps its view alive (through the `cbView` expando) until [`View::remove`].
#[derive(Clone)]
pub struct View(Rc<ViewInner>);
impl Debug for View {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("View").field("el", &self.0.el).finish_non_exhaustive()
	}
}

fn is_view_boundary(element: &Node) -> bool {
	element.has_class("cb-view") || element.has_attribute("cb-view") || element.has_attribute("cb-app")
}

impl View {
	/// Creates a view on the given or a new element, then (unless disabled) renders its template and binds it.
	///
	/// # Errors
	///
	/// Iff the given `el` isn't an element, or a new one can't be created.
	#[instrument]
	pub fn new(options: ViewOptions) -> Result<Self, Error> {
		let el = match options.el {
			Some(el) if el.is_element() => el,
			Some(other) => return Err(Error::InvalidElement(format!("{:?}", other))),
			None => Node::element(options.tag_name.as_deref().unwrap_or("div"))?,
		};
		let context = options.context.unwrap_or_else(Context::global);
		let _batch = context.scheduler().batch();

		el.add_class("cb-view");
		el.add_class(&options.class_name);
		if let Some(id) = &options.id {
			if !el.has_attribute("id") {
				el.set_attribute("id", id);
			}
		}
		for (name, value) in &options.attributes {
			el.set_attribute(name, value);
		}
		for (property, value) in &options.style {
			el.set_style(property, Some(value.as_str()));
		}

		let model = Model::new();
		for (key, value) in options.properties {
			model.define(&key, value);
		}

		let view = View(Rc::new(ViewInner {
			captured_content: RefCell::new(Some(el.inner_html())),
			el,
			model,
			context,
			template: options.template,
			template_url: options.template_url,
			template_cache_enabled: options.template_cache_enabled,
			bindings: RefCell::default(),
			text_bindings: RefCell::default(),
			initialized: Cell::new(false),
			removed: Cell::new(false),
		}));
		view.0.el.set_expando(VIEW_EXPANDO, Rc::clone(&view.0) as Rc<dyn Any>);
		view.0.initialized.set(true);

		if options.auto_init_template {
			view.init_template();
		}
		Ok(view)
	}

	/// The view attached to `el`, if any.
	#[must_use]
	pub fn of(el: &Node) -> Option<Self> {
		el.expando(VIEW_EXPANDO)?.downcast::<ViewInner>().ok().map(View)
	}

	#[must_use]
	pub fn el(&self) -> Node {
		self.0.el.clone()
	}

	#[must_use]
	pub fn context(&self) -> Context {
		self.0.context.clone()
	}

	/// This view as a binding source.
	#[must_use]
	pub fn as_source(&self) -> Rc<dyn Bindable> {
		Rc::clone(&self.0) as Rc<dyn Bindable>
	}

	#[must_use]
	pub fn get(&self, key: &str) -> Value {
		self.0.get(key)
	}

	pub fn set(&self, key: &str, value: impl Into<Value>) {
		self.0.set(key, value.into())
	}

	/// Defines a bindable property after construction.
	pub fn define(&self, key: &str, value: impl Into<Value>) {
		self.0.model.define(key, value.into())
	}

	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	#[must_use]
	pub fn initialized(&self) -> bool {
		self.0.initialized.get()
	}

	#[must_use]
	pub fn has_template(&self) -> bool {
		self.0.template.is_some() || self.0.template_url.is_some()
	}

	/// Elements below this view's element, in document order. Unless `deep`, nested views (elements with class
	/// `cb-view` or attribute `cb-view`/`cb-app`) and their subtrees are left out.
	#[must_use]
	pub fn elements(&self, deep: bool) -> Vec<Node> {
		if deep {
			self.0.el.descendant_elements()
		} else {
			self.0
				.el
				.descendant_elements_pruned(is_view_boundary)
				.into_iter()
				.filter(|element| !is_view_boundary(element))
				.collect()
		}
	}

	/// The first `[cb-content]` element of this view.
	#[must_use]
	pub fn content(&self) -> Option<Node> {
		self.elements(false).into_iter().find(|element| element.has_attribute("cb-content"))
	}

	#[must_use]
	pub fn has_content(&self) -> bool {
		self.content().is_some()
	}

	/// Where child views go: the content element, or else the view's element.
	#[must_use]
	pub fn body(&self) -> Node {
		self.content().unwrap_or_else(|| self.el())
	}

	/// The nearest view above this one in the tree.
	#[must_use]
	pub fn parent(&self) -> Option<View> {
		if !self.initialized() {
			return None;
		}
		self.0.el.parent()?.closest(|element| element.has_class("cb-view")).as_ref().and_then(View::of)
	}

	#[must_use]
	pub fn current_state(&self) -> String {
		self.get(CURRENT_STATE).to_display_string()
	}

	/// Swaps the element's `cb-state-<state>` class and notifies `currentState` listeners.
	pub fn set_current_state(&self, state: &str) {
		self.0.set(CURRENT_STATE, Value::String(state.to_owned()))
	}

	/// Renders the template (URL, inline or `{{…}}` expressions in the existing markup), then binds.
	#[instrument]
	pub fn init_template(&self) {
		let _batch = self.0.context.scheduler().batch();
		if self.0.template_url.is_some() {
			self.load_template(None);
			return;
		}

		match &self.0.template {
			Some(Template::Html(html)) => self.0.el.set_inner_html(&parse_template(html)),
			Some(Template::Render(render)) => {
				let html = render(self);
				self.0.el.set_inner_html(&parse_template(&html))
			}
			None => {
				if has_template_expression(&self.0.el.text_content()) {
					let html = self.0.el.inner_html();
					self.0.el.set_inner_html(&parse_template(&html))
				}
			}
		}
		self.init_view();
	}

	/// Loads `url` (or the configured template URL) into the body, through the template cache if enabled.
	///
	/// A failed load empties the body and dispatches `templateerror`. Either way the view is then initialised.
	#[instrument]
	pub fn load_template(&self, url: Option<&str>) {
		let url = match url.or_else(|| self.0.template_url.as_deref()) {
			Some(url) => url.to_owned(),
			None => {
				warn!("load_template called without a template URL");
				return;
			}
		};

		let _batch = self.0.context.scheduler().batch();
		if self.has_bindings() {
			self.unbind_view();
		}

		if self.0.template_cache_enabled {
			if let Some(cached) = self.0.context.templates().get(&url) {
				trace!("Template served from cache.");
				self.body().set_inner_html(&cached);
				self.init_view();
				return;
			}
		}

		match self.0.context.template_loader() {
			Some(loader) => {
				let weak: Weak<ViewInner> = Rc::downgrade(&self.0);
				let loaded_url = url.clone();
				loader.load(
					&url,
					Box::new(move |result| match weak.upgrade() {
						Some(inner) => View(inner).template_loaded(&loaded_url, result),
						None => debug!("View dropped before its template loaded."),
					}),
				);
			}
			None => self.template_loaded(&url, Err(TemplateLoadError::MissingLoader(url.clone()))),
		}
	}

	fn template_loaded(&self, url: &str, result: Result<String, TemplateLoadError>) {
		if self.0.removed.get() {
			debug!("View removed before its template loaded.");
			return;
		}
		let _batch = self.0.context.scheduler().batch();
		match result {
			Ok(template) => {
				let parsed = parse_template(&template);
				if self.0.template_cache_enabled {
					self.0.context.templates().insert(url, &parsed);
				}
				self.body().set_inner_html(&parsed);
			}
			Err(error) => {
				warn!("{}", error);
				self.body().set_inner_html("");
				self.dispatch_event(&Event::new(TEMPLATE_ERROR).with_value(Value::String(error.to_string())));
			}
		}
		self.init_view();
	}

	fn init_view(&self) {
		let captured = self.0.captured_content.borrow_mut().take();
		if self.has_template() {
			if let (Some(content), Some(captured)) = (self.content(), captured) {
				content.set_inner_html(&captured);
			}
		}

		self.dispatch_event(&Event::new(TEMPLATE_COMPLETE));
		self.bind_view();

		let weak = Rc::downgrade(&self.0);
		self.0.context.scheduler().defer(move || {
			if let Some(inner) = weak.upgrade() {
				if !inner.removed.get() {
					View(inner).dispatch_event(&Event::new(CREATION_COMPLETE));
				}
			}
		});
	}

	/// Binds the element's directive attributes to this view's properties, replacing earlier bindings.
	pub fn bind_view(&self) {
		if self.0.removed.get() {
			warn!("Can't bind a removed view");
			return;
		}
		self.0.context.engine().bind_view(self);
		self.dispatch_event(&Event::new(BIND));
	}

	pub fn unbind_view(&self) {
		self.0.context.engine().unbind_view(self);
		self.dispatch_event(&Event::new(UNBIND));
	}

	pub(crate) fn has_bindings(&self) -> bool {
		self.0.bindings.borrow().is_some()
	}

	pub(crate) fn set_bindings(&self, bindings: Vec<Binding>) {
		*self.0.bindings.borrow_mut() = Some(bindings);
	}

	pub(crate) fn take_bindings(&self) -> Option<Vec<Binding>> {
		self.0.bindings.borrow_mut().take()
	}

	pub(crate) fn set_text_bindings(&self, text_bindings: Vec<(Node, String)>) {
		*self.0.text_bindings.borrow_mut() = text_bindings;
	}

	pub(crate) fn take_text_bindings(&self) -> Vec<(Node, String)> {
		self.0.text_bindings.borrow_mut().drain(..).collect()
	}

	/// How many bindings the last binding pass recorded.
	#[must_use]
	pub fn binding_count(&self) -> usize {
		self.0.bindings.borrow().as_ref().map_or(0, Vec::len)
	}

	pub fn append_view(&self, view: &View) {
		self.body().append_child(&view.el())
	}

	pub fn prepend_view(&self, view: &View) {
		self.body().prepend_child(&view.el())
	}

	/// Takes the element out of its parent. Dispatches `detach` only if it had one.
	pub fn detach(&self) {
		if let Some(parent) = self.0.el.parent() {
			parent.remove_child(&self.0.el);
			self.dispatch_event(&Event::new(DETACH));
		}
	}

	/// Disposes of this view: dispatches `remove`, clears `data`, removes nested views innermost first,
	/// then unbinds, forgets the recorded directives, detaches and drops all listeners. Later calls do nothing.
	#[instrument]
	pub fn remove(&self) {
		if self.0.removed.replace(true) {
			return;
		}
		self.dispatch_event(&Event::new(REMOVE));

		if self.0.model.has_property("data") {
			self.0.model.set("data", Value::Undefined);
		}

		let mut children: Vec<Node> = self.elements(true).into_iter().filter(|element| element.has_class("cb-view")).collect();
		while let Some(child) = children.pop() {
			if let Some(view) = View::of(&child) {
				view.remove();
			}
		}

		self.unbind_view();
		for element in self.elements(false) {
			element.remove_expando(BINDINGS_EXPANDO);
		}
		self.0.el.remove_expando(BINDINGS_EXPANDO);
		self.0.text_bindings.borrow_mut().clear();
		self.detach();
		self.0.model.dispatcher().remove_listener(None, None, None);
		self.0.el.remove_expando(VIEW_EXPANDO);
	}

	#[must_use]
	pub fn removed(&self) -> bool {
		self.0.removed.get()
	}

	pub fn add_event_listener(&self, kinds: &str, listener: &Listener) {
		self.0.model.dispatcher().add_listener(kinds, listener, None, 0, false)
	}

	pub fn remove_event_listener(&self, kinds: &str, listener: &Listener) {
		self.0.model.dispatcher().remove_listener(Some(kinds), Some(listener), None)
	}

	pub fn dispatch_event(&self, event: &Event) {
		self.0.model.dispatcher().dispatch(event)
	}
}

struct GlimpseInner {
	el: WeakNode,
	context: Context,
}

/// A lightweight component: marks its element with `cb-glimpse`, has no template and no bindings of its own.
///
/// Lives as long as its element.
#[derive(Clone)]
pub struct Glimpse(Rc<GlimpseInner>);
impl Debug for Glimpse {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Glimpse").field("el", &self.0.el).finish_non_exhaustive()
	}
}
impl Glimpse {
	/// # Errors
	///
	/// Iff `el` isn't an element.
	pub fn new(el: &Node, context: &Context) -> Result<Self, Error> {
		if !el.is_element() {
			return Err(Error::InvalidElement(format!("{:?}", el)));
		}
		el.add_class("cb-glimpse");
		let glimpse = Glimpse(Rc::new(GlimpseInner {
			el: el.downgrade(),
			context: context.clone(),
		}));
		el.set_expando(GLIMPSE_EXPANDO, Rc::clone(&glimpse.0) as Rc<dyn Any>);
		Ok(glimpse)
	}

	#[must_use]
	pub fn of(el: &Node) -> Option<Self> {
		el.expando(GLIMPSE_EXPANDO)?.downcast::<GlimpseInner>().ok().map(Glimpse)
	}

	/// `None` once the element was dropped.
	#[must_use]
	pub fn el(&self) -> Option<Node> {
		self.0.el.upgrade()
	}

	#[must_use]
	pub fn context(&self) -> Context {
		self.0.context.clone()
	}
}
