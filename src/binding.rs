//! The attribute-driven binding pass over a view's subtree, binding descriptors and their teardown.

use crate::{
	adapter::{self, ElementKind, INPUT_EVENTS},
	context::Context,
	directive::{is_reserved_attribute, Directive, DirectiveRegistry, REPEAT},
	dom::{DomListener, Node},
	error::{Error, RegistrationError},
	event::Listener,
	namespace::ViewKind,
	observable::{change_event, Bindable},
	path,
	value::{coerce_input, same_value, Function, Value},
	view::{View, BIND},
};
use core::{
	any::Any,
	cell::Cell,
	fmt::{self, Debug, Formatter},
};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::rc::{Rc, Weak};
use tracing::{instrument, trace, trace_span, warn};

/// Directive attributes an element was bound with, for re-binding after they were removed.
pub(crate) const BINDINGS_EXPANDO: &str = "cbBindings";

static TEMPLATE_EXPRESSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{(.+?)\}\}").expect("valid template pattern"));

/// Where a [`Binding`]'s listener is registered.
#[derive(Clone)]
pub enum BindingTarget {
	/// A `change:<property>` listener on an observable source.
	Source { source: Weak<dyn Bindable>, kind: String, listener: Listener },
	/// A native event listener on an element.
	Element(Rc<DomListener>),
}

/// A teardown descriptor for one registration made while binding.
#[derive(Clone)]
pub struct Binding {
	target: BindingTarget,
}
impl Binding {
	#[must_use]
	pub fn on_source(source: &Rc<dyn Bindable>, kind: impl Into<String>, listener: Listener) -> Self {
		Self {
			target: BindingTarget::Source {
				source: Rc::downgrade(source),
				kind: kind.into(),
				listener,
			},
		}
	}

	#[must_use]
	pub fn on_element(listener: DomListener) -> Self {
		Self {
			target: BindingTarget::Element(Rc::new(listener)),
		}
	}

	#[must_use]
	pub fn target(&self) -> &BindingTarget {
		&self.target
	}

	/// The event type(s), space-separated.
	#[must_use]
	pub fn kind(&self) -> String {
		match &self.target {
			BindingTarget::Source { kind, .. } => kind.clone(),
			BindingTarget::Element(listener) => listener.kinds().join(" "),
		}
	}

	/// Unregisters the listener.
	///
	/// # Errors
	///
	/// Iff the source was dropped or lost its change-notification capability.
	pub fn remove(&self) -> Result<(), Error> {
		match &self.target {
			BindingTarget::Source { source, kind, listener } => {
				let source = source.upgrade().ok_or(Error::TargetDropped)?;
				let observable = source.as_observable().ok_or_else(|| Error::NotObservable(source.describe()))?;
				observable.remove_change_listener(kind, listener);
			}
			BindingTarget::Element(listener) => listener.remove(),
		}
		Ok(())
	}
}
impl Debug for Binding {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match &self.target {
			BindingTarget::Source { source, kind, .. } => {
				let source = source.upgrade().map_or_else(|| "dropped source".to_owned(), |source| source.describe());
				f.debug_struct("Binding").field("source", &source).field("kind", kind).finish()
			}
			BindingTarget::Element(listener) => f.debug_tuple("Binding").field(listener).finish(),
		}
	}
}

/// Context handed to directive handlers and custom bindings.
#[derive(Clone)]
pub struct BindOptions {
	/// The view whose pass created the binding.
	pub view: Option<View>,
	/// The bound property, the last segment of the path.
	pub property_name: String,
	pub context: Context,
}
impl Debug for BindOptions {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("BindOptions")
			.field("view", &self.view)
			.field("property_name", &self.property_name)
			.finish()
	}
}
impl BindOptions {
	#[must_use]
	pub fn new(context: &Context) -> Self {
		Self {
			view: None,
			property_name: String::new(),
			context: context.clone(),
		}
	}
}

/// `undefined` becomes `""`, anything else passes through.
#[must_use]
pub fn default_parse_function(value: &Value) -> Value {
	match value {
		Value::Undefined => Value::String(String::new()),
		other => other.clone(),
	}
}

fn default_parse() -> Function {
	Function::unary(default_parse_function)
}

/// Rewrites each `{{path}}` into `<cb-text cb-bind="path"></cb-text>`.
#[must_use]
pub fn parse_template(template: &str) -> String {
	TEMPLATE_EXPRESSION
		.replace_all(template, |captures: &Captures<'_>| {
			format!(r#"<cb-text cb-bind="{}"></cb-text>"#, captures[1].trim().replace('"', "&quot;"))
		})
		.into_owned()
}

/// Whether `text` contains a `{{path}}` expression.
#[must_use]
pub fn has_template_expression(text: &str) -> bool {
	TEMPLATE_EXPRESSION.is_match(text)
}

/// Assigns `value` to `source[property]` unless it's already the same, coercing numeric strings first.
pub(crate) fn set_coerced(source: &dyn Bindable, property: &str, value: Value) {
	let current = source.get(property);
	if same_value(&current, &value) {
		return;
	}
	let value = coerce_input(&current, value);
	source.set(property, value);
}

fn make_bindable(source: &Rc<dyn Bindable>, property: &str) {
	match source.as_observable() {
		Some(observable) => {
			if !observable.is_bindable(property) && !matches!(source.get(property), Value::Function(_)) {
				observable.make_bindable(property)
			}
		}
		None => warn!(
			"It will not be possible to detect changes to {:?} because {} is not observable",
			property,
			source.describe()
		),
	}
}

/// Splits `path[:param]`.
fn split_param(binding: &str) -> (&str, Option<&str>) {
	match binding.split_once(':') {
		Some((path, param)) => (path.trim(), Some(param.trim())),
		None => (binding.trim(), None),
	}
}

/// Owns the directive registry and performs binding passes.
pub struct BindingEngine {
	registry: DirectiveRegistry,
	remove_attribute_after_binding: Cell<bool>,
}
impl Debug for BindingEngine {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("BindingEngine")
			.field("remove_attribute_after_binding", &self.remove_attribute_after_binding.get())
			.finish_non_exhaustive()
	}
}
impl Default for BindingEngine {
	fn default() -> Self {
		Self::new()
	}
}

impl BindingEngine {
	#[must_use]
	pub fn new() -> Self {
		Self {
			registry: DirectiveRegistry::new(),
			remove_attribute_after_binding: Cell::new(true),
		}
	}

	#[must_use]
	pub fn registry(&self) -> &DirectiveRegistry {
		&self.registry
	}

	/// Whether processed directive attributes are removed from their elements. `cb-repeat` is always kept.
	#[must_use]
	pub fn remove_attribute_after_binding(&self) -> bool {
		self.remove_attribute_after_binding.get()
	}

	pub fn set_remove_attribute_after_binding(&self, remove: bool) {
		self.remove_attribute_after_binding.set(remove)
	}

	/// See [`DirectiveRegistry::register_attribute`].
	///
	/// # Errors
	///
	/// Iff `name` has no namespace or uses a reserved one.
	pub fn register_attribute(&self, name: &str, directive: Directive) -> Result<(), RegistrationError> {
		self.registry.register_attribute(name, directive)
	}

	#[must_use]
	pub fn attribute_exists(&self, attribute: &str) -> bool {
		self.registry.has(attribute)
	}

	/// Binds `source[property]` to `element` according to its [`ElementKind`](`crate::adapter::ElementKind`).
	///
	/// # Errors
	///
	/// Iff `element` isn't an element.
	#[instrument(skip(self, source, parse))]
	pub fn bind_element(&self, source: &Rc<dyn Bindable>, property: &str, element: &Node, parse: Option<&Function>) -> Result<Vec<Binding>, Error> {
		if !element.is_element() {
			return Err(Error::InvalidElement(format!("{:?}", element)));
		}
		make_bindable(source, property);
		let parse = parse.cloned().unwrap_or_else(default_parse);
		Ok(adapter::bind(source, property, element, &parse))
	}

	/// Binds `source[property]` to `element` through the directive (or native property) named by `attribute`.
	/// `cb-bind` also takes a text node, whose data then follows the property.
	///
	/// # Errors
	///
	/// Iff `element` isn't an element (or a text node for `cb-bind`).
	#[allow(clippy::too_many_arguments)]
	#[instrument(skip(self, source, parse, options))]
	pub fn bind_attribute(
		&self,
		source: &Rc<dyn Bindable>,
		property: &str,
		element: &Node,
		attribute: &str,
		parse: Option<&Function>,
		options: &BindOptions,
		param: Option<&str>,
	) -> Result<Vec<Binding>, Error> {
		if is_reserved_attribute(attribute) {
			return Ok(Vec::new());
		}
		if attribute == "cb-bind" && element.is_text() {
			make_bindable(source, property);
			let parse = parse.cloned().unwrap_or_else(default_parse);
			return Ok(adapter::bind_text(source, property, element, &parse).into_iter().collect());
		}
		if !element.is_element() {
			return Err(Error::InvalidElement(format!("{:?}", element)));
		}
		let (namespace, name) = match attribute.split_once('-') {
			Some(split) => split,
			None => return Ok(Vec::new()),
		};

		if attribute == "cb-bind" {
			let bindings = self.bind_element(source, property, element, parse)?;
			if self.remove_attribute_after_binding() {
				element.remove_attribute(attribute);
			}
			return Ok(bindings);
		}

		if !self.registry.get(attribute).map_or(false, |directive| directive.is_raw()) {
			make_bindable(source, property);
		}

		let bindings = match self.registry.dispatch(source, property, element, attribute, parse, options, param) {
			Some(bindings) => bindings,
			None if namespace == "cb" && !name.contains('-') && element.has_property(name) => self.bind_native(source, property, element, attribute, name, parse),
			None => {
				warn!("{} is not recognised or does not exist on specified element", attribute);
				Vec::new()
			}
		};

		if attribute != REPEAT && self.remove_attribute_after_binding() {
			element.remove_attribute(attribute);
		}
		Ok(bindings)
	}

	fn bind_native(&self, source: &Rc<dyn Bindable>, property: &str, element: &Node, attribute: &str, native: &str, parse: Option<&Function>) -> Vec<Binding> {
		if !native.starts_with("on") && element.is_method(native) {
			warn!("{} is not a recognised attribute, did you mean cb-on{}?", attribute, native);
			return Vec::new();
		}

		if let Some(kind) = native.strip_prefix("on") {
			let handler = match source.get(property) {
				Value::Function(handler) => handler,
				_ => {
					warn!("{} is not a function and cannot be bound to DOM events", property);
					return Vec::new();
				}
			};
			let listener = element.add_event_listener(kind, move |event| {
				handler.call(&[Value::String(event.type_())]);
			});
			return vec![Binding::on_element(listener)];
		}

		let mut bindings = Vec::new();
		let parse = parse.cloned().unwrap_or_else(default_parse);
		let update = {
			let weak_source = Rc::downgrade(source);
			let weak_element = element.downgrade();
			let property = property.to_owned();
			let native = native.to_owned();
			move || {
				if let (Some(source), Some(element)) = (weak_source.upgrade(), weak_element.upgrade()) {
					let value = parse.call(&[source.get(&property)]);
					let value = if element.is_boolean_property(&native) { Value::Bool(value.is_truthy()) } else { value };
					element.set_property(&native, &value);
				}
			}
		};
		update();

		if let Some(observable) = source.as_observable() {
			let kind = change_event(property);
			let listener = Listener::new(move |_| update());
			observable.add_change_listener(&kind, &listener);
			bindings.push(Binding::on_source(source, kind, listener));
		}

		let write_back = {
			let weak_source = Rc::downgrade(source);
			let weak_element = element.downgrade();
			let property = property.to_owned();
			let native = native.to_owned();
			element.add_event_listener(INPUT_EVENTS, move |_| {
				if let (Some(source), Some(element)) = (weak_source.upgrade(), weak_element.upgrade()) {
					if let Some(value) = element.property(&native) {
						set_coerced(&*source, &property, value);
					}
				}
			})
		};
		bindings.push(Binding::on_element(write_back));
		bindings
	}

	/// Applies a read-only directive that was given no value. Anything else is a warning.
	pub fn apply_attribute(&self, element: &Node, attribute: &str, options: &BindOptions) -> Vec<Binding> {
		match self.registry.apply(element, attribute, options) {
			Some(bindings) => {
				if attribute != REPEAT && self.remove_attribute_after_binding() {
					element.remove_attribute(attribute);
				}
				bindings
			}
			None => Vec::new(),
		}
	}

	/// Whether the binding pass processes `attribute` at all.
	fn is_directive_attribute(&self, attribute: &str) -> bool {
		match attribute.split_once('-') {
			Some((namespace, _)) => self.registry.is_registered_namespace(namespace) && !is_reserved_attribute(attribute),
			None => false,
		}
	}

	/// The directives to bind `element` with: its current directive attributes, after those recorded by earlier
	/// passes where the attributes were removed. Only `cb-repeat` if present.
	fn directive_attributes(&self, element: &Node) -> Vec<(String, String)> {
		let mut directives: Vec<(String, String)> = if self.remove_attribute_after_binding() {
			element
				.expando(BINDINGS_EXPANDO)
				.and_then(|recorded| recorded.downcast::<Vec<(String, String)>>().ok())
				.map(|recorded| recorded.as_ref().clone())
				.unwrap_or_default()
		} else {
			Vec::new()
		};
		for (attribute, value) in element.attributes() {
			if !self.is_directive_attribute(&attribute) {
				continue;
			}
			match directives.iter_mut().find(|(name, _)| *name == attribute) {
				Some(recorded) => recorded.1 = value,
				None => directives.push((attribute, value)),
			}
		}
		if let Some(repeat) = directives.iter().find(|(name, _)| name == REPEAT).cloned() {
			directives = vec![repeat];
		}
		directives
	}

	/// Binds every directive attribute within `view`'s own subtree (and on its element) to the view's properties.
	///
	/// Binding a bound view unbinds it first. Directives are remembered per element,
	/// and text nodes that replaced `<cb-text>` placeholders per view, so a later pass binds them again.
	#[instrument(skip(self))]
	pub fn bind_view(&self, view: &View) {
		let context = view.context();
		let _batch = context.scheduler().batch();
		if view.has_bindings() {
			self.unbind_view(view);
		}

		let options = BindOptions {
			view: Some(view.clone()),
			property_name: String::new(),
			context: context.clone(),
		};

		if !context.namespace().is_empty() {
			self.apply_views(&view.el(), &context, ViewKind::Glimpse);
			self.apply_views(&view.el(), &context, ViewKind::View);
		}

		let mut elements = view.elements(false);
		elements.push(view.el());

		// Repeat templates are stamped separately.
		let hosts: Vec<Node> = elements.iter().filter(|element| element.has_attribute(REPEAT)).cloned().collect();
		elements.retain(|element| !hosts.iter().any(|host| host != element && host.contains(element)));
		elements.sort_by_key(|element| !element.has_attribute(REPEAT));

		let source = view.as_source();
		let mut bindings = Vec::new();

		let mut text_bindings = view.take_text_bindings();
		text_bindings.retain(|(text, _)| view.el().contains(text));
		for (text, value) in &text_bindings {
			let _span = trace_span!("text").entered();
			bindings.extend(self.bind_attribute_value(&source, text, "cb-bind", value, &options));
		}

		for element in &elements {
			let directives = self.directive_attributes(element);
			if directives.is_empty() {
				continue;
			}

			let placeholder = if ElementKind::of(element) == ElementKind::TextNode {
				element.parent().map(|parent| (parent, element.next_sibling()))
			} else {
				None
			};

			for (attribute, value) in &directives {
				let _span = trace_span!("attribute", %attribute).entered();
				bindings.extend(self.bind_attribute_value(&source, element, attribute, value, &options));
			}

			// A replaced placeholder is gone for good, its text node is bound in its stead from now on.
			let replacement = placeholder
				.filter(|_| element.parent().is_none())
				.and_then(|(parent, next)| match next {
					Some(next) => next.previous_sibling(),
					None => parent.last_child(),
				})
				.filter(Node::is_text);
			match (replacement, directives.iter().find(|(name, _)| name == "cb-bind")) {
				(Some(text), Some((_, value))) => text_bindings.push((text, value.clone())),
				_ => element.set_expando(BINDINGS_EXPANDO, Rc::new(directives) as Rc<dyn Any>),
			}

			let element = element.downgrade();
			context.scheduler().defer(move || {
				if let Some(element) = element.upgrade() {
					element.dispatch_event(BIND);
				}
			});
		}

		trace!("Created {} binding(s).", bindings.len());
		view.set_text_bindings(text_bindings);
		view.set_bindings(bindings);
	}

	/// Splits `path[:param][, …][|parseFunction]` and binds each part.
	fn bind_attribute_value(&self, source: &Rc<dyn Bindable>, element: &Node, attribute: &str, value: &str, options: &BindOptions) -> Vec<Binding> {
		let (expression, parse_path) = match value.split_once('|') {
			Some((expression, parse_path)) => (expression, Some(parse_path.trim())),
			None => (value, None),
		};

		let parse = parse_path.filter(|path| !path.is_empty()).and_then(|parse_path| match path::evaluate(source, parse_path) {
			Ok(Value::Function(parse)) => Some(parse),
			Ok(_) => {
				warn!("Parse function {:?} of {} is not a function", parse_path, attribute);
				None
			}
			Err(error) => {
				warn!("Parse function {:?} of {} could not be resolved: {}", parse_path, attribute, error);
				None
			}
		});

		let parts: Vec<&str> = if self.registry.can_handle_multiple(attribute) {
			expression.split(',').collect()
		} else {
			vec![expression]
		};
		let raw = self.registry.get(attribute).map_or(false, |directive| directive.is_raw());

		let mut bindings = Vec::new();
		for part in parts {
			if part.trim().is_empty() {
				bindings.extend(self.apply_attribute(element, attribute, options));
				break;
			}
			let (path_expression, param) = split_param(part);

			let (owner, key) = if raw {
				(Rc::clone(source), path_expression.to_owned())
			} else {
				match path::resolve(source, path_expression) {
					Ok(resolved) => (resolved.owner, resolved.key),
					Err(error) => {
						if cfg!(feature = "dangerous-logging") {
							warn!("{} is not defined in this View ({}): {}", path_expression, attribute, error);
						} else {
							warn!("A property path of {} is not defined in this View: {}", attribute, error);
						}
						continue;
					}
				}
			};

			let options = BindOptions {
				property_name: key.clone(),
				..options.clone()
			};
			match self.bind_attribute(&owner, &key, element, attribute, parse.as_ref(), &options, param) {
				Ok(created) => bindings.extend(created),
				Err(error) => warn!("Failed to bind {}: {}", attribute, error),
			}
		}
		bindings
	}

	/// Removes every binding made by the last [`BindingEngine::bind_view`] of `view`.
	///
	/// Individual failures are logged and skipped.
	#[instrument(skip(self))]
	pub fn unbind_view(&self, view: &View) {
		let mut bindings = match view.take_bindings() {
			Some(bindings) => bindings,
			None => return,
		};
		while let Some(binding) = bindings.pop() {
			if let Err(error) = binding.remove() {
				trace!("Skipped binding removal: {}", error);
			}
		}
	}

	/// Instantiates namespace classes of `kind` on matching elements below `root`: elements whose tag is the
	/// kebab-cased class name or that carry `cb-view="ClassName"` (`cb-glimpse="…"`).
	///
	/// Elements already claimed by a class of that kind and anything inside a repeat template are skipped.
	#[instrument(skip(self, context))]
	pub fn apply_views(&self, root: &Node, context: &Context, kind: ViewKind) {
		for (class_name, class) in context.namespace().classes() {
			if class.kind() != kind {
				continue;
			}
			let tag_name = crate::directive::to_kebab_case(&class_name).to_ascii_uppercase();
			let matches = |element: &Node| {
				(element.tag_name() == tag_name || element.attribute(kind.attribute()).as_deref() == Some(class_name.as_str()))
					&& !element.has_class(kind.class_name())
					&& !element.has_attribute(REPEAT)
			};
			let elements: Vec<Node> = root.descendant_elements().into_iter().filter(|element| matches(element)).collect();

			for element in elements {
				// An earlier instantiation may have claimed or moved it.
				if !matches(&element) || element.closest(|e| e.has_attribute(REPEAT)).is_some() {
					continue;
				}
				trace!("Instantiating {} on {:?}.", class_name, element);
				if let Err(error) = class.instantiate(&element, context) {
					warn!("Could not instantiate {}: {}", class_name, error);
				}
			}
		}
	}

	/// Propagates changes of `source[name]` to `destination[destination_name]` (default: `name`),
	/// and back if `two_way` and the destination is observable.
	///
	/// # Errors
	///
	/// Iff `source` is not observable.
	pub fn bind_property(
		&self,
		source: &Rc<dyn Bindable>,
		name: &str,
		destination: &Rc<dyn Bindable>,
		destination_name: Option<&str>,
		two_way: bool,
	) -> Result<Vec<Binding>, Error> {
		let observable = source.as_observable().ok_or_else(|| Error::NotObservable(source.describe()))?;
		let destination_name = destination_name.unwrap_or(name).to_owned();
		make_bindable(source, name);

		let kind = change_event(name);
		let listener = {
			let destination = Rc::downgrade(destination);
			let destination_name = destination_name.clone();
			Listener::new(move |event| {
				if let Some(destination) = destination.upgrade() {
					if destination.as_observable().is_some() {
						set_coerced(&*destination, &destination_name, event.value().clone());
					} else {
						destination.set(&destination_name, event.value().clone());
					}
				}
			})
		};
		observable.add_change_listener(&kind, &listener);
		let mut bindings = vec![Binding::on_source(source, kind, listener)];

		if two_way && destination.as_observable().is_some() {
			bindings.extend(self.bind_property(destination, &destination_name, source, Some(name), false)?);
		}
		Ok(bindings)
	}

	/// Calls `setter` with the new value whenever `source[name]` changes.
	///
	/// # Errors
	///
	/// Iff `source` is not observable.
	pub fn bind_setter(&self, source: &Rc<dyn Bindable>, name: &str, setter: impl Fn(&Value) + 'static) -> Result<Vec<Binding>, Error> {
		let observable = source.as_observable().ok_or_else(|| Error::NotObservable(source.describe()))?;
		make_bindable(source, name);
		let kind = change_event(name);
		let listener = Listener::new(move |event| setter(event.value()));
		observable.add_change_listener(&kind, &listener);
		Ok(vec![Binding::on_source(source, kind, listener)])
	}
}
