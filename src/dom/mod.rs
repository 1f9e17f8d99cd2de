//! Handles to browser DOM nodes: tree and attribute access, form-control state, native properties,
//! event listeners and expando storage.
//!
//! Expando values live in a thread-local side table, keyed by an id stamped onto the node.
//! They stay there until removed.

use crate::{error::Error, load, value::Value};
use core::{
	any::Any,
	cell::{Cell, RefCell},
	fmt::{self, Debug, Formatter},
};
use hashbrown::HashMap;
use js_sys::{Object, Reflect, WeakRef};
use std::rc::Rc;
use tracing::{error, trace};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{
	CharacterData, Comment, CssStyleDeclaration, Document, Element, EventTarget, HtmlButtonElement, HtmlElement, HtmlInputElement, HtmlOptionElement,
	HtmlSelectElement, HtmlTextAreaElement, Node as wNode, Text,
};

/// The JavaScript property holding a node's side table id.
const EXPANDO_ID: &str = "__cobindExpando";

type Expandos = HashMap<&'static str, Rc<dyn Any>>;

thread_local! {
	static DOCUMENT: Option<Document> = web_sys::window().and_then(|window| window.document());
	static EXPANDOS: RefCell<HashMap<u32, Expandos>> = RefCell::default();
	static NEXT_EXPANDO_ID: Cell<u32> = Cell::new(1);
}

fn document() -> Result<Document, Error> {
	DOCUMENT.with(Clone::clone).ok_or(Error::NoDocument)
}

fn describe_js(value: &JsValue) -> String {
	value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

/// Native property values as bindable values. `None` for functions and other objects, except nodes.
fn from_js(value: &JsValue) -> Option<Value> {
	Some(if value.is_undefined() {
		Value::Undefined
	} else if value.is_null() {
		Value::Null
	} else if let Some(b) = value.as_bool() {
		Value::Bool(b)
	} else if let Some(n) = value.as_f64() {
		Value::Number(n)
	} else if let Some(s) = value.as_string() {
		Value::String(s)
	} else if let Some(node) = value.dyn_ref::<wNode>() {
		Value::Node(Node(node.clone()))
	} else {
		return None;
	})
}

fn to_js(value: &Value) -> JsValue {
	match value {
		Value::Undefined => JsValue::UNDEFINED,
		Value::Null => JsValue::NULL,
		Value::Bool(b) => JsValue::from_bool(*b),
		Value::Number(n) => JsValue::from_f64(*n),
		Value::Node(node) => node.0.clone().into(),
		other => JsValue::from_str(&other.to_display_string()),
	}
}

/// A handle to a live DOM node. Equality is node identity.
#[derive(Clone, PartialEq, Eq)]
pub struct Node(wNode);

impl From<wNode> for Node {
	fn from(node: wNode) -> Self {
		Self(node)
	}
}
impl From<Element> for Node {
	fn from(element: Element) -> Self {
		Self(element.into())
	}
}
impl AsRef<wNode> for Node {
	fn as_ref(&self) -> &wNode {
		&self.0
	}
}

/// A [`Node`] handle that doesn't keep its node alive, for listeners that outlive their element.
#[derive(Clone)]
pub struct WeakNode(WeakRef);
impl WeakNode {
	#[must_use]
	pub fn upgrade(&self) -> Option<Node> {
		self.0.deref().and_then(|object| object.dyn_into::<wNode>().ok()).map(Node)
	}
}
impl Debug for WeakNode {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self.upgrade() {
			Some(node) => f.debug_tuple("WeakNode").field(&node).finish(),
			None => f.write_str("WeakNode(collected)"),
		}
	}
}

impl Debug for Node {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		if let Some(element) = self.as_element() {
			write!(f, "<{}", element.tag_name().to_ascii_lowercase())?;
			for (name, value) in self.attributes() {
				if cfg!(feature = "dangerous-logging") || name == "id" || name == "class" {
					write!(f, " {}={:?}", name, value)?;
				} else {
					write!(f, " {}", name)?;
				}
			}
			f.write_str(">")
		} else if let Some(data) = self.0.dyn_ref::<CharacterData>() {
			let name = if self.is_text() { "Text" } else { "Comment" };
			if cfg!(feature = "dangerous-logging") {
				f.debug_tuple(name).field(&data.data()).finish()
			} else {
				write!(f, "{}({} bytes)", name, data.data().len())
			}
		} else {
			f.write_str(&self.0.node_name())
		}
	}
}

impl Node {
	/// Creates a detached element in the current document.
	///
	/// # Errors
	///
	/// Iff there is no document or `tag_name` isn't a valid element name.
	pub fn element(tag_name: &str) -> Result<Self, Error> {
		document()?
			.create_element(tag_name)
			.map(Node::from)
			.map_err(|error| Error::Dom(describe_js(&error)))
	}

	/// # Errors
	///
	/// Iff there is no document.
	pub fn text(data: &str) -> Result<Self, Error> {
		Ok(Self(document()?.create_text_node(data).into()))
	}

	/// # Errors
	///
	/// Iff there is no document.
	pub fn comment(data: &str) -> Result<Self, Error> {
		Ok(Self(document()?.create_comment(data).into()))
	}

	#[must_use]
	pub fn downgrade(&self) -> WeakNode {
		let object: &Object = self.0.as_ref();
		WeakNode(WeakRef::new(object))
	}

	#[must_use]
	pub fn as_element(&self) -> Option<&Element> {
		self.0.dyn_ref()
	}

	fn as_html_element(&self) -> Option<&HtmlElement> {
		self.0.dyn_ref()
	}

	#[must_use]
	pub fn is_element(&self) -> bool {
		self.as_element().is_some()
	}

	#[must_use]
	pub fn is_text(&self) -> bool {
		self.0.dyn_ref::<Text>().is_some()
	}

	#[must_use]
	pub fn is_comment(&self) -> bool {
		self.0.dyn_ref::<Comment>().is_some()
	}

	/// `nodeName`: the tag name, `#text` or `#comment`.
	#[must_use]
	pub fn node_name(&self) -> String {
		self.0.node_name()
	}

	/// The tag name (upper-case for HTML elements), or `""` for other nodes.
	#[must_use]
	pub fn tag_name(&self) -> String {
		self.as_element().map(Element::tag_name).unwrap_or_default()
	}

	// Tree.

	#[must_use]
	pub fn parent(&self) -> Option<Node> {
		self.0.parent_node().map(Node)
	}

	#[must_use]
	pub fn children(&self) -> Vec<Node> {
		load::load_child_nodes(&self.0.child_nodes())
	}

	#[must_use]
	pub fn child_elements(&self) -> Vec<Node> {
		self.children().into_iter().filter(Node::is_element).collect()
	}

	#[must_use]
	pub fn first_child(&self) -> Option<Node> {
		self.0.first_child().map(Node)
	}

	#[must_use]
	pub fn last_child(&self) -> Option<Node> {
		self.0.last_child().map(Node)
	}

	#[must_use]
	pub fn next_sibling(&self) -> Option<Node> {
		self.0.next_sibling().map(Node)
	}

	#[must_use]
	pub fn previous_sibling(&self) -> Option<Node> {
		self.0.previous_sibling().map(Node)
	}

	/// The topmost ancestor, or `self`.
	#[must_use]
	pub fn root(&self) -> Node {
		Node(self.0.get_root_node())
	}

	/// Whether `other` is `self` or one of its descendants.
	#[must_use]
	pub fn contains(&self, other: &Node) -> bool {
		self.0.contains(Some(&other.0))
	}

	pub fn append_child(&self, child: &Node) {
		if let Err(error) = self.0.append_child(&child.0) {
			error!(parent = ?self, child = ?child, "Failed to append child: {}", describe_js(&error));
		}
	}

	/// Inserts `child` before `reference`, or appends it if `reference` isn't a child of `self`.
	pub fn insert_before(&self, child: &Node, reference: Option<&Node>) {
		let reference = reference.filter(|reference| reference.parent().as_ref() == Some(self));
		if let Err(error) = self.0.insert_before(&child.0, reference.map(|reference| &reference.0)) {
			error!(parent = ?self, child = ?child, "Failed to insert child: {}", describe_js(&error));
		}
	}

	pub fn prepend_child(&self, child: &Node) {
		let first = self.first_child();
		self.insert_before(child, first.as_ref());
	}

	/// Returns whether `child` was a child of `self`.
	pub fn remove_child(&self, child: &Node) -> bool {
		child.parent().as_ref() == Some(self) && self.0.remove_child(&child.0).is_ok()
	}

	/// Detaches `self` from its parent, if any.
	pub fn remove(&self) {
		if let Some(parent) = self.parent() {
			parent.remove_child(self);
		}
	}

	/// Puts `replacement` where `self` is. Returns `false` (and does nothing) if `self` is detached.
	pub fn replace_with(&self, replacement: &Node) -> bool {
		match self.parent() {
			Some(parent) => match parent.0.replace_child(&replacement.0, &self.0) {
				Ok(_) => true,
				Err(error) => {
					error!(parent = ?parent, "Failed to replace child: {}", describe_js(&error));
					false
				}
			},
			None => false,
		}
	}

	/// All descendants in document order, excluding `self`.
	#[must_use]
	pub fn descendants(&self) -> Vec<Node> {
		let mut nodes = Vec::new();
		let mut stack: Vec<Node> = self.children().into_iter().rev().collect();
		while let Some(node) = stack.pop() {
			stack.extend(node.children().into_iter().rev());
			nodes.push(node);
		}
		nodes
	}

	/// Descendant elements in document order, excluding `self`.
	#[must_use]
	pub fn descendant_elements(&self) -> Vec<Node> {
		self.descendants().into_iter().filter(Node::is_element).collect()
	}

	/// Like [`Node::descendant_elements`], but the subtrees of elements matching `prune` are skipped.
	/// Matching elements themselves are still listed.
	#[must_use]
	pub fn descendant_elements_pruned(&self, prune: impl Fn(&Node) -> bool) -> Vec<Node> {
		let mut nodes = Vec::new();
		let mut stack: Vec<Node> = self.child_elements().into_iter().rev().collect();
		while let Some(node) = stack.pop() {
			if !prune(&node) {
				stack.extend(node.child_elements().into_iter().rev());
			}
			nodes.push(node);
		}
		nodes
	}

	/// The nearest inclusive ancestor matching `predicate`.
	#[must_use]
	pub fn closest(&self, predicate: impl Fn(&Node) -> bool) -> Option<Node> {
		let mut current = Some(self.clone());
		while let Some(node) = current {
			if predicate(&node) {
				return Some(node);
			}
			current = node.parent();
		}
		None
	}

	/// `cloneNode`. Listeners and expando storage are not copied.
	///
	/// # Errors
	///
	/// Iff the browser refuses to clone this kind of node.
	pub fn clone_node(&self, deep: bool) -> Result<Node, Error> {
		self.0
			.clone_node_with_deep(deep)
			.map(Node)
			.map_err(|error| Error::Dom(describe_js(&error)))
	}

	// Attributes.

	#[must_use]
	pub fn attribute(&self, name: &str) -> Option<String> {
		self.as_element()?.get_attribute(name)
	}

	#[must_use]
	pub fn has_attribute(&self, name: &str) -> bool {
		self.as_element().map_or(false, |element| element.has_attribute(name))
	}

	pub fn set_attribute(&self, name: &str, value: &str) {
		if let Some(element) = self.as_element() {
			if let Err(error) = element.set_attribute(name, value) {
				error!(element = ?self, "Failed to set attribute {:?}: {}", name, describe_js(&error));
			}
		}
	}

	/// Returns whether the attribute was present.
	pub fn remove_attribute(&self, name: &str) -> bool {
		match self.as_element() {
			Some(element) if element.has_attribute(name) => element.remove_attribute(name).is_ok(),
			_ => false,
		}
	}

	/// Attributes in source order.
	#[must_use]
	pub fn attributes(&self) -> Vec<(String, String)> {
		self.as_element()
			.map_or_else(Vec::new, |element| load::load_attributes(&element.attributes()))
	}

	#[must_use]
	pub fn attribute_names(&self) -> Vec<String> {
		self.attributes().into_iter().map(|(name, _)| name).collect()
	}

	// Classes.

	#[must_use]
	pub fn class_list(&self) -> Vec<String> {
		self.as_element().map_or_else(Vec::new, |element| {
			let classes = element.class_list();
			(0..classes.length()).filter_map(|i| classes.item(i)).collect()
		})
	}

	#[must_use]
	pub fn has_class(&self, name: &str) -> bool {
		self.as_element().map_or(false, |element| element.class_list().contains(name))
	}

	/// Adds each whitespace-separated class in `names`.
	pub fn add_class(&self, names: &str) {
		if let Some(element) = self.as_element() {
			let classes = element.class_list();
			for name in names.split_whitespace() {
				if let Err(error) = classes.add_1(name) {
					error!(element = ?self, "Failed to add class {:?}: {}", name, describe_js(&error));
				}
			}
		}
	}

	pub fn remove_class(&self, names: &str) {
		if let Some(element) = self.as_element() {
			let classes = element.class_list();
			for name in names.split_whitespace() {
				if let Err(error) = classes.remove_1(name) {
					error!(element = ?self, "Failed to remove class {:?}: {}", name, describe_js(&error));
				}
			}
		}
	}

	pub fn toggle_class(&self, names: &str, force: bool) {
		if force {
			self.add_class(names)
		} else {
			self.remove_class(names)
		}
	}

	// Inline style.

	fn style_declaration(&self) -> Option<CssStyleDeclaration> {
		let element = self.as_element()?;
		Reflect::get(element.as_ref(), &JsValue::from_str("style")).ok()?.dyn_into().ok()
	}

	/// An inline style value by (kebab-case) property name.
	#[must_use]
	pub fn style(&self, property: &str) -> Option<String> {
		self.style_declaration()?
			.get_property_value(property)
			.ok()
			.filter(|value| !value.is_empty())
	}

	/// Sets an inline style property. `None` or an empty value removes it, and with it an empty `style` attribute.
	pub fn set_style(&self, property: &str, value: Option<&str>) {
		let declaration = match self.style_declaration() {
			Some(declaration) => declaration,
			None => {
				error!(element = ?self, "Only styled elements have inline styles.");
				return;
			}
		};
		let result = match value.filter(|value| !value.is_empty()) {
			Some(value) => declaration.set_property(property, value),
			None => declaration.remove_property(property).map(drop),
		};
		if let Err(error) = result {
			error!(element = ?self, "Failed to set style {:?}: {}", property, describe_js(&error));
		}
		if declaration.length() == 0 {
			self.remove_attribute("style");
		}
	}

	// Content.

	/// Character data of text and comment nodes, `""` for elements.
	#[must_use]
	pub fn data(&self) -> String {
		self.0.dyn_ref::<CharacterData>().map(CharacterData::data).unwrap_or_default()
	}

	pub fn set_data(&self, value: &str) {
		if let Some(data) = self.0.dyn_ref::<CharacterData>() {
			data.set_data(value)
		}
	}

	#[must_use]
	pub fn text_content(&self) -> String {
		self.0.text_content().unwrap_or_default()
	}

	/// Replaces all children with a single text node (none if `text` is empty).
	pub fn set_text_content(&self, text: &str) {
		self.0.set_text_content(Some(text))
	}

	#[must_use]
	pub fn inner_html(&self) -> String {
		self.as_element().map(Element::inner_html).unwrap_or_default()
	}

	/// Replaces all children with the parsed `markup`.
	pub fn set_inner_html(&self, markup: &str) {
		if let Some(element) = self.as_element() {
			element.set_inner_html(markup)
		}
	}

	#[must_use]
	pub fn outer_html(&self) -> String {
		self.as_element().map(Element::outer_html).unwrap_or_default()
	}

	// Form controls.

	/// `type`, lower-cased, with the element's default.
	#[must_use]
	pub fn input_type(&self) -> String {
		if let Some(input) = self.0.dyn_ref::<HtmlInputElement>() {
			input.type_()
		} else if let Some(select) = self.0.dyn_ref::<HtmlSelectElement>() {
			select.type_()
		} else if let Some(textarea) = self.0.dyn_ref::<HtmlTextAreaElement>() {
			textarea.type_()
		} else if let Some(button) = self.0.dyn_ref::<HtmlButtonElement>() {
			button.type_()
		} else {
			self.attribute("type").unwrap_or_default().to_ascii_lowercase()
		}
	}

	/// The current value of a form control, the `value` attribute of other elements,
	/// or the data of text and comment nodes.
	#[must_use]
	pub fn value(&self) -> String {
		if let Some(input) = self.0.dyn_ref::<HtmlInputElement>() {
			input.value()
		} else if let Some(select) = self.0.dyn_ref::<HtmlSelectElement>() {
			select.value()
		} else if let Some(textarea) = self.0.dyn_ref::<HtmlTextAreaElement>() {
			textarea.value()
		} else if let Some(option) = self.0.dyn_ref::<HtmlOptionElement>() {
			option.value()
		} else if let Some(button) = self.0.dyn_ref::<HtmlButtonElement>() {
			button.value()
		} else if self.is_element() {
			self.attribute("value").unwrap_or_default()
		} else {
			self.data()
		}
	}

	/// Assigns a form control's value. A `<select>` takes `""` if no option has the value.
	pub fn set_value(&self, value: &str) {
		if let Some(input) = self.0.dyn_ref::<HtmlInputElement>() {
			input.set_value(value)
		} else if let Some(select) = self.0.dyn_ref::<HtmlSelectElement>() {
			select.set_value(value)
		} else if let Some(textarea) = self.0.dyn_ref::<HtmlTextAreaElement>() {
			textarea.set_value(value)
		} else if let Some(option) = self.0.dyn_ref::<HtmlOptionElement>() {
			option.set_value(value)
		} else if let Some(button) = self.0.dyn_ref::<HtmlButtonElement>() {
			button.set_value(value)
		} else if self.is_element() {
			self.set_attribute("value", value)
		} else {
			self.set_data(value)
		}
	}

	#[must_use]
	pub fn checked(&self) -> bool {
		self.0.dyn_ref::<HtmlInputElement>().map_or(false, HtmlInputElement::checked)
	}

	/// Checking a radio button unchecks the other radios of its group.
	pub fn set_checked(&self, checked: bool) {
		match self.0.dyn_ref::<HtmlInputElement>() {
			Some(input) => input.set_checked(checked),
			None => trace!(element = ?self, "Only inputs can be checked."),
		}
	}

	// Native properties.

	fn native(&self, name: &str) -> Option<JsValue> {
		self.as_element()?;
		Reflect::get(self.0.as_ref(), &JsValue::from_str(name)).ok()
	}

	/// Whether `name` is a property of this element (`name in element`).
	#[must_use]
	pub fn has_property(&self, name: &str) -> bool {
		self.is_element() && Reflect::has(self.0.as_ref(), &JsValue::from_str(name)).unwrap_or(false)
	}

	#[must_use]
	pub fn is_boolean_property(&self, name: &str) -> bool {
		self.native(name).map_or(false, |value| value.as_bool().is_some())
	}

	#[must_use]
	pub fn is_method(&self, name: &str) -> bool {
		self.native(name).map_or(false, |value| value.is_function())
	}

	/// An `on<event>` handler slot of this element.
	#[must_use]
	pub fn is_event_handler(&self, name: &str) -> bool {
		name.starts_with("on") && self.has_property(name)
	}

	/// Reads a native data property. Methods and object-valued properties other than nodes aren't readable.
	#[must_use]
	pub fn property(&self, name: &str) -> Option<Value> {
		self.native(name).filter(|value| !value.is_function()).as_ref().and_then(from_js)
	}

	/// Writes a native data property. Returns `false` if `name` isn't a writable one.
	pub fn set_property(&self, name: &str, value: &Value) -> bool {
		if !self.has_property(name) || self.is_method(name) {
			return false;
		}
		match Reflect::set(self.0.as_ref(), &JsValue::from_str(name), &to_js(value)) {
			Ok(written) => written,
			Err(error) => {
				error!(element = ?self, "Failed to set property {:?}: {}", name, describe_js(&error));
				false
			}
		}
	}

	// Events.

	/// Listens for each of the space-separated event `kinds` until [`DomListener::remove`] is called.
	pub fn add_event_listener(&self, kinds: &str, handler: impl Fn(&web_sys::Event) + 'static) -> DomListener {
		let closure = Closure::wrap(Box::new(move |event: web_sys::Event| handler(&event)) as Box<dyn Fn(web_sys::Event)>);
		let target: &EventTarget = self.0.as_ref();
		let kinds: Vec<String> = kinds.split_whitespace().map(str::to_owned).collect();
		for kind in &kinds {
			if let Err(error) = target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref()) {
				error!("Failed to add event listener {:?}: {}", kind, describe_js(&error));
			}
		}
		DomListener {
			target: target.clone(),
			kinds,
			closure: RefCell::new(Some(closure)),
		}
	}

	/// Dispatches a plain, non-bubbling event of type `kind` at this node.
	pub fn dispatch_event(&self, kind: &str) {
		let result = web_sys::Event::new(kind).and_then(|event| self.0.dispatch_event(&event));
		if let Err(error) = result {
			error!("Failed to dispatch {:?}: {}", kind, describe_js(&error));
		}
	}

	/// Activates the element as a click would: checkboxes toggle, radios check, and the browser fires
	/// `click` (and for a changed checked state `input` and `change`).
	pub fn click(&self) {
		match self.as_html_element() {
			Some(element) => element.click(),
			None => self.dispatch_event("click"),
		}
	}

	/// Enters `value` as a user would: assigns it, then fires `input` and `change`.
	pub fn input_value(&self, value: &str) {
		self.set_value(value);
		self.dispatch_event("input");
		self.dispatch_event("change");
	}

	// Expando storage.

	#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
	fn expando_id(&self) -> Option<u32> {
		Reflect::get(self.0.as_ref(), &JsValue::from_str(EXPANDO_ID)).ok()?.as_f64().map(|id| id as u32)
	}

	pub fn set_expando(&self, key: &'static str, value: Rc<dyn Any>) {
		let id = match self.expando_id() {
			Some(id) => id,
			None => {
				let id = NEXT_EXPANDO_ID.with(|next| next.replace(next.get() + 1));
				if let Err(error) = Reflect::set(self.0.as_ref(), &JsValue::from_str(EXPANDO_ID), &JsValue::from(id)) {
					error!(node = ?self, "Failed to attach expando storage: {}", describe_js(&error));
					return;
				}
				id
			}
		};
		// The previous value is dropped outside the borrow, since values may hold handles to this node.
		let previous = EXPANDOS.with(|expandos| expandos.borrow_mut().entry(id).or_default().insert(key, value));
		drop(previous);
	}

	#[must_use]
	pub fn expando(&self, key: &str) -> Option<Rc<dyn Any>> {
		let id = self.expando_id()?;
		EXPANDOS.with(|expandos| expandos.borrow().get(&id)?.get(key).cloned())
	}

	pub fn remove_expando(&self, key: &str) -> Option<Rc<dyn Any>> {
		let id = self.expando_id()?;
		EXPANDOS.with(|expandos| {
			let mut expandos = expandos.borrow_mut();
			let entry = expandos.get_mut(&id)?;
			let removed = entry.remove(key);
			if entry.is_empty() {
				expandos.remove(&id);
			}
			removed
		})
	}

	pub fn clear_expando(&self) {
		if let Some(id) = self.expando_id() {
			let values = EXPANDOS.with(|expandos| expandos.borrow_mut().remove(&id));
			drop(values);
		}
	}
}

/// A native event listener registration.
///
/// [`DomListener::remove`] unregisters it. Dropped unremoved, the listener stays attached for the life of the page.
pub struct DomListener {
	target: EventTarget,
	kinds: Vec<String>,
	closure: RefCell<Option<Closure<dyn Fn(web_sys::Event)>>>,
}
impl Debug for DomListener {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("DomListener")
			.field("target", &self.target.dyn_ref::<wNode>().map(|node| Node(node.clone())))
			.field("kinds", &self.kinds)
			.field("attached", &self.is_attached())
			.finish()
	}
}
impl DomListener {
	#[must_use]
	pub fn kinds(&self) -> &[String] {
		&self.kinds
	}

	#[must_use]
	pub fn is_attached(&self) -> bool {
		self.closure.borrow().is_some()
	}

	/// Unregisters the listener for all its event types. Later calls do nothing.
	pub fn remove(&self) {
		let closure = match self.closure.borrow_mut().take() {
			Some(closure) => closure,
			None => return,
		};
		for kind in &self.kinds {
			if let Err(error) = self.target.remove_event_listener_with_callback(kind, closure.as_ref().unchecked_ref()) {
				error!("Failed to remove event listener {:?}: {}", kind, describe_js(&error));
			}
		}
	}
}
impl Drop for DomListener {
	fn drop(&mut self) {
		if let Some(closure) = self.closure.get_mut().take() {
			closure.forget();
		}
	}
}
