//! Attribute directives: the registry of namespaced attribute handlers and the built-in `cb-*` set.

use crate::{
	binding::{BindOptions, Binding},
	dom::Node,
	error::RegistrationError,
	event::Listener,
	observable::{change_event, Bindable},
	value::{Function, Value},
	view::{View, ViewOptions},
};
use core::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
};
use indexmap::IndexMap;
use std::rc::Rc;
use tracing::{instrument, trace, warn};

/// Stamps one item view per list entry. Never removed from its host.
pub const REPEAT: &str = "cb-repeat";

const RESERVED_ATTRIBUTES: &[&str] = &["cb-app", "cb-view", "cb-glimpse", "cb-content"];
const RESERVED_NAMESPACES: &[&str] = &["cb", "data", "aria"];

/// Attributes that mark view boundaries and are never bindings.
#[must_use]
pub fn is_reserved_attribute(attribute: &str) -> bool {
	RESERVED_ATTRIBUTES.contains(&attribute)
}

/// `"cbShow"` → `"cb-show"`, `"MyWidget"` → `"my-widget"`.
#[must_use]
pub fn to_kebab_case(name: &str) -> String {
	let mut kebab = String::with_capacity(name.len() + 2);
	let mut previous: Option<char> = None;
	for c in name.chars() {
		if c.is_uppercase() && previous.map_or(false, |p| p.is_lowercase() || p.is_ascii_digit()) {
			kebab.push('-');
		}
		kebab.extend(c.to_lowercase());
		previous = Some(c);
	}
	kebab
}

/// `"font-size"` → `"fontSize"`.
#[must_use]
pub fn to_camel_case(name: &str) -> String {
	let mut camel = String::with_capacity(name.len());
	let mut upper = false;
	for c in name.chars() {
		match c {
			'-' | '_' => upper = !camel.is_empty(),
			c if upper => {
				camel.extend(c.to_uppercase());
				upper = false;
			}
			c => camel.push(c),
		}
	}
	camel
}

/// One invocation of a directive handler.
pub struct DirectiveCall<'a> {
	pub element: &'a Node,
	/// The parsed bound value, or for raw directives the literal expression.
	pub value: Value,
	pub param: Option<&'a str>,
	pub options: &'a BindOptions,
}

type Handler = Rc<dyn Fn(&DirectiveCall<'_>) -> Vec<Binding>>;

/// A directive handler and its flags.
#[derive(Clone)]
pub struct Directive {
	handler: Handler,
	read_only: bool,
	raw: bool,
	multiple: bool,
}
impl Debug for Directive {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Directive")
			.field("read_only", &self.read_only)
			.field("raw", &self.raw)
			.field("multiple", &self.multiple)
			.finish_non_exhaustive()
	}
}
impl Directive {
	pub fn new(handler: impl Fn(&DirectiveCall<'_>) -> Vec<Binding> + 'static) -> Self {
		Self {
			handler: Rc::new(handler),
			read_only: false,
			raw: false,
			multiple: false,
		}
	}

	/// The directive may be applied without a value.
	#[must_use]
	pub fn read_only(mut self, read_only: bool) -> Self {
		self.read_only = read_only;
		self
	}

	/// The handler receives the literal expression and isn't subscribed to changes.
	#[must_use]
	pub fn raw(mut self, raw: bool) -> Self {
		self.raw = raw;
		self
	}

	/// The attribute value may hold comma-separated bindings.
	#[must_use]
	pub fn multiple(mut self, multiple: bool) -> Self {
		self.multiple = multiple;
		self
	}

	#[must_use]
	pub fn is_read_only(&self) -> bool {
		self.read_only
	}

	#[must_use]
	pub fn is_raw(&self) -> bool {
		self.raw
	}

	#[must_use]
	pub fn is_multiple(&self) -> bool {
		self.multiple
	}

	pub fn call(&self, call: &DirectiveCall<'_>) -> Vec<Binding> {
		(self.handler)(call)
	}

	/// Calls the handler without a value.
	pub fn apply(&self, element: &Node, options: &BindOptions) -> Vec<Binding> {
		self.call(&DirectiveCall {
			element,
			value: Value::Undefined,
			param: None,
			options,
		})
	}
}

/// Attribute name → directive, for the built-in set and custom registrations.
pub struct DirectiveRegistry {
	built_in: IndexMap<String, Directive>,
	custom: RefCell<IndexMap<String, Directive>>,
	namespaces: RefCell<Vec<String>>,
}
impl Debug for DirectiveRegistry {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("DirectiveRegistry")
			.field("built_in", &self.built_in.keys().collect::<Vec<_>>())
			.field("custom", &self.custom.borrow().keys().cloned().collect::<Vec<_>>())
			.field("namespaces", &self.namespaces.borrow())
			.finish()
	}
}
impl Default for DirectiveRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl DirectiveRegistry {
	/// A registry holding only the built-in directives.
	#[must_use]
	pub fn new() -> Self {
		Self {
			built_in: built_ins(),
			custom: RefCell::default(),
			namespaces: RefCell::new(vec!["cb".to_owned()]),
		}
	}

	/// Registers a custom directive under a camel-cased (or kebab-cased) name whose first word is its namespace,
	/// e.g. `myFontName` for `my-font-name`.
	///
	/// # Errors
	///
	/// Iff `name` has a single word or its namespace is `cb`, `data` or `aria`.
	pub fn register_attribute(&self, name: &str, directive: Directive) -> Result<(), RegistrationError> {
		let attribute = to_kebab_case(name);
		let namespace = match attribute.split_once('-') {
			Some((namespace, rest)) if !namespace.is_empty() && !rest.is_empty() => namespace.to_owned(),
			_ => {
				let mut example = name.to_owned();
				if let Some(first) = example.get_mut(0..1) {
					first.make_ascii_uppercase();
				}
				return Err(RegistrationError::MissingNamespace(name.to_owned(), example));
			}
		};
		if RESERVED_NAMESPACES.contains(&namespace.as_str()) {
			return Err(RegistrationError::ReservedNamespace { namespace, name: name.to_owned() });
		}

		{
			let mut namespaces = self.namespaces.borrow_mut();
			if !namespaces.contains(&namespace) {
				namespaces.push(namespace);
			}
		}
		trace!(%attribute, "Registered custom directive.");
		self.custom.borrow_mut().insert(attribute, directive);
		Ok(())
	}

	/// Registers each directive in turn, stopping at the first failure.
	///
	/// # Errors
	///
	/// See [`DirectiveRegistry::register_attribute`].
	pub fn register_attributes<'a>(&self, directives: impl IntoIterator<Item = (&'a str, Directive)>) -> Result<(), RegistrationError> {
		directives.into_iter().try_for_each(|(name, directive)| self.register_attribute(name, directive))
	}

	/// Looks up the directive for a kebab-cased attribute name.
	#[must_use]
	pub fn get(&self, attribute: &str) -> Option<Directive> {
		self.built_in.get(attribute).cloned().or_else(|| self.custom.borrow().get(attribute).cloned())
	}

	#[must_use]
	pub fn has(&self, attribute: &str) -> bool {
		self.built_in.contains_key(attribute) || self.custom.borrow().contains_key(attribute)
	}

	#[must_use]
	pub fn is_registered_namespace(&self, namespace: &str) -> bool {
		self.namespaces.borrow().iter().any(|n| n == namespace)
	}

	#[must_use]
	pub fn can_handle_multiple(&self, attribute: &str) -> bool {
		self.get(attribute).map_or(false, |directive| directive.is_multiple())
	}

	/// Applies a read-only directive without a value. `None` (after a warning) if there is no such directive
	/// or it requires a value.
	pub fn apply(&self, element: &Node, attribute: &str, options: &BindOptions) -> Option<Vec<Binding>> {
		match self.get(attribute) {
			Some(directive) if directive.is_read_only() => Some(directive.apply(element, options)),
			Some(_) => {
				warn!("{} attribute cannot be used without a value", attribute);
				None
			}
			None => {
				warn!("{} attribute does not exist", attribute);
				None
			}
		}
	}

	/// Runs the directive for `attribute` against `source[property]`. `None` if there is no such directive.
	///
	/// Raw directives receive `property` as the literal expression, once.
	/// Others receive the parsed current value now and again on every `change:<property>`.
	#[allow(clippy::too_many_arguments)]
	#[instrument(skip(self, source, parse, options))]
	pub fn dispatch(
		&self,
		source: &Rc<dyn Bindable>,
		property: &str,
		element: &Node,
		attribute: &str,
		parse: Option<&Function>,
		options: &BindOptions,
		param: Option<&str>,
	) -> Option<Vec<Binding>> {
		let directive = self.get(attribute)?;

		if directive.is_raw() {
			return Some(directive.call(&DirectiveCall {
				element,
				value: Value::String(property.to_owned()),
				param,
				options,
			}));
		}

		let parse = parse.cloned();
		let parsed = move |value: Value| match &parse {
			Some(parse) => parse.call(&[value]),
			None => value,
		};

		let mut bindings = directive.call(&DirectiveCall {
			element,
			value: parsed(source.get(property)),
			param,
			options,
		});

		match source.as_observable() {
			Some(observable) => {
				let kind = change_event(property);
				let listener = {
					let element = element.downgrade();
					let param = param.map(str::to_owned);
					let options = options.clone();
					Listener::new(move |event| {
						if let Some(element) = element.upgrade() {
							directive.call(&DirectiveCall {
								element: &element,
								value: parsed(event.value().clone()),
								param: param.as_deref(),
								options: &options,
							});
						}
					})
				};
				observable.add_change_listener(&kind, &listener);
				bindings.push(Binding::on_source(source, kind, listener));
			}
			None => trace!("Source is not observable; {} applied once.", attribute),
		}
		Some(bindings)
	}
}

fn value_directive(apply: impl Fn(&DirectiveCall<'_>) + 'static) -> Directive {
	Directive::new(move |call| {
		apply(call);
		Vec::new()
	})
}

fn built_ins() -> IndexMap<String, Directive> {
	let mut directives = IndexMap::new();
	let mut add = |name: &str, directive: Directive| {
		directives.insert(name.to_owned(), directive);
	};

	add("cb-show", value_directive(|call| call.element.toggle_class("cb-hide", !call.value.is_truthy())));
	add("cb-hide", value_directive(|call| call.element.toggle_class("cb-hide", call.value.is_truthy())));
	add("cb-include", value_directive(|call| call.element.toggle_class("cb-exclude", !call.value.is_truthy())));
	add("cb-exclude", value_directive(|call| call.element.toggle_class("cb-exclude", call.value.is_truthy())));
	add("cb-html", value_directive(|call| call.element.set_inner_html(&call.value.to_display_string())));
	add("cb-text", value_directive(|call| call.element.set_text_content(&call.value.to_display_string())));

	add(
		"cb-class",
		value_directive(|call| match call.param {
			Some(class_name) if !class_name.is_empty() => call.element.toggle_class(class_name, call.value.is_truthy()),
			_ => warn!("cb-class attributes must specify one or more CSS classes in the format cb-class=\"myProperty:class-name\""),
		})
		.multiple(true),
	);

	add(
		"cb-style",
		value_directive(|call| match call.param {
			Some(property) if !property.is_empty() => {
				let text = call.value.to_display_string();
				let value = if call.value.is_nullish() || text.is_empty() { None } else { Some(text.as_str()) };
				call.element.set_style(&to_kebab_case(property), value)
			}
			_ => warn!("cb-style attributes must specify one or more styles in the format cb-style=\"myProperty:style-name\""),
		})
		.multiple(true),
	);

	add(REPEAT, value_directive(repeat));

	directives
}

/// Per-host state of `cb-repeat`, kept in the host's expando.
struct RepeatState {
	template: Node,
	stamps: RefCell<Vec<View>>,
}

const REPEAT_STATE: &str = "cbRepeat";

fn repeat(call: &DirectiveCall<'_>) {
	let host = call.element;
	let state = match host.expando(REPEAT_STATE).and_then(|state| state.downcast::<RepeatState>().ok()) {
		Some(state) => state,
		None => {
			let template = match host.clone_node(true) {
				Ok(template) => template,
				Err(error) => {
					warn!("Could not capture the cb-repeat template: {}", error);
					return;
				}
			};
			template.remove_attribute(REPEAT);
			host.add_class("cb-exclude");
			let state = Rc::new(RepeatState {
				template,
				stamps: RefCell::default(),
			});
			host.set_expando(REPEAT_STATE, Rc::clone(&state) as Rc<dyn core::any::Any>);
			state
		}
	};

	let previous: Vec<View> = state.stamps.borrow_mut().drain(..).collect();
	for stamp in previous {
		stamp.remove();
	}

	let items = match call.value.as_list() {
		Some(items) => items.to_vec(),
		None => {
			if !call.value.is_nullish() {
				warn!("cb-repeat expects a list; rendering nothing");
			}
			return;
		}
	};

	let parent = match host.parent() {
		Some(parent) => parent,
		None => {
			warn!("cb-repeat host must be attached to stamp its items");
			return;
		}
	};

	let context = &call.options.context;
	let class = call.param.filter(|name| !name.is_empty()).and_then(|name| {
		let class = context.namespace().get_class(name);
		if class.is_none() {
			warn!("cb-repeat item class {:?} is not registered; using a plain view", name);
		}
		class
	});

	let mut stamps = Vec::with_capacity(items.len());
	for (index, item) in items.into_iter().enumerate() {
		let options = class.as_ref().map_or_else(ViewOptions::new, |class| class.options());
		let el = match state.template.clone_node(true) {
			Ok(el) => el,
			Err(error) => {
				warn!("Could not create cb-repeat item {}: {}", index, error);
				continue;
			}
		};
		#[allow(clippy::cast_precision_loss)]
		let options = options
			.el(&el)
			.class_name("cb-repeat")
			.property("data", item)
			.property("index", index as f64)
			.context(context);
		match View::new(options) {
			Ok(stamp) => {
				parent.insert_before(&stamp.el(), Some(host));
				stamps.push(stamp);
			}
			Err(error) => warn!("Could not create cb-repeat item {}: {}", index, error),
		}
	}
	trace!("Stamped {} cb-repeat item(s).", stamps.len());
	*state.stamps.borrow_mut() = stamps;
}
