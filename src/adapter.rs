//! Per-element-kind wiring for `cb-bind`: how a source property is written to an element,
//! and which element events write it back.

use crate::{
	binding::{set_coerced, Binding},
	dom::Node,
	event::Listener,
	observable::{change_event, Bindable},
	value::{loosely_equal, Function, Value},
};
use std::rc::Rc;
use tracing::{trace, warn};

/// The element events that signal a user-driven change.
pub const INPUT_EVENTS: &str = "input change";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
	Checkbox,
	Radio,
	/// Text-like `<input>`s, `<select>` and `<textarea>`.
	TextInput,
	/// `<cb-text>`, replaced by a managed text node.
	TextNode,
	/// Anything else, bound through its inner HTML.
	Generic,
}
impl ElementKind {
	#[must_use]
	pub fn of(element: &Node) -> Self {
		match element.tag_name().as_str() {
			"INPUT" | "SELECT" | "TEXTAREA" => match element.input_type().as_str() {
				"checkbox" => Self::Checkbox,
				"radio" => Self::Radio,
				_ => Self::TextInput,
			},
			"CB-TEXT" => Self::TextNode,
			_ => Self::Generic,
		}
	}
}

fn parsed(parse: &Function, value: Value) -> Value {
	parse.call(&[value])
}

/// Pushes element-side changes of `read` back to `source[property]`.
fn write_back(source: &Rc<dyn Bindable>, property: &str, element: &Node, read: fn(&Node) -> Value) -> Binding {
	let weak_source = Rc::downgrade(source);
	let weak_element = element.downgrade();
	let property = property.to_owned();
	Binding::on_element(element.add_event_listener(INPUT_EVENTS, move |_| {
		if let (Some(source), Some(element)) = (weak_source.upgrade(), weak_element.upgrade()) {
			set_coerced(&*source, &property, read(&element));
		}
	}))
}

/// Subscribes `update` to `change:<property>`, if the source is observable.
fn on_change(source: &Rc<dyn Bindable>, property: &str, update: impl Fn(&Value) + 'static) -> Option<Binding> {
	let observable = source.as_observable()?;
	let kind = change_event(property);
	let listener = Listener::new(move |event| update(event.value()));
	observable.add_change_listener(&kind, &listener);
	Some(Binding::on_source(source, kind, listener))
}

fn with_element(element: &Node, update: impl Fn(&Node, &Value) + 'static) -> impl Fn(&Value) + 'static {
	let weak = element.downgrade();
	move |value: &Value| match weak.upgrade() {
		Some(element) => update(&element, value),
		None => trace!("Bound element was dropped."),
	}
}

/// Writes `source[property]` to `element` now and whenever it changes, and where the element is a form control,
/// writes user input back. Returns the teardown descriptors.
pub fn bind(source: &Rc<dyn Bindable>, property: &str, element: &Node, parse: &Function) -> Vec<Binding> {
	let current = source.get(property);
	let mut bindings = Vec::new();

	match ElementKind::of(element) {
		ElementKind::Checkbox => {
			element.set_checked(current.is_truthy());
			bindings.extend(on_change(
				source,
				property,
				with_element(element, |element, value| {
					if element.checked() != value.is_truthy() {
						element.set_checked(value.is_truthy())
					}
				}),
			));
			bindings.push(write_back(source, property, element, |element| Value::Bool(element.checked())));
		}

		ElementKind::Radio => {
			if loosely_equal(&Value::String(element.value()), &current) {
				element.set_checked(true);
			}
			bindings.extend(on_change(
				source,
				property,
				with_element(element, |element, value| {
					// Only the radio carrying the new value reacts.
					if loosely_equal(&Value::String(element.value()), value) {
						element.set_checked(true)
					}
				}),
			));
			bindings.push(write_back(source, property, element, |element| Value::String(element.value())));
		}

		ElementKind::TextInput => {
			element.set_value(&current.to_display_string());
			bindings.extend(on_change(
				source,
				property,
				with_element(element, |element, value| {
					let text = value.to_display_string();
					if element.value() != text {
						element.set_value(&text)
					}
				}),
			));
			bindings.push(write_back(source, property, element, |element| Value::String(element.value())));
		}

		ElementKind::TextNode => match (element.parent(), Node::text("")) {
			(Some(parent), Ok(text)) => {
				parent.insert_before(&text, Some(element));
				parent.remove_child(element);
				bindings.extend(bind_text(source, property, &text, parse));
			}
			(None, _) => {
				warn!("<cb-text> must be attached to be replaced by a text node; binding its content instead");
				bindings.extend(bind_content(source, property, element, parse, current));
			}
			(Some(_), Err(error)) => {
				warn!("Could not create a text node for <cb-text> ({}); binding its content instead", error);
				bindings.extend(bind_content(source, property, element, parse, current));
			}
		},

		ElementKind::Generic => bindings.extend(bind_content(source, property, element, parse, current)),
	}

	bindings
}

/// Writes `source[property]` into the data of the text node `text`, now and on every change.
pub fn bind_text(source: &Rc<dyn Bindable>, property: &str, text: &Node, parse: &Function) -> Option<Binding> {
	text.set_data(&parsed(parse, source.get(property)).to_display_string());
	let parse = parse.clone();
	on_change(
		source,
		property,
		with_element(text, move |text, value| {
			let data = parsed(&parse, value.clone()).to_display_string();
			if text.data() != data {
				text.set_data(&data)
			}
		}),
	)
}

fn bind_content(source: &Rc<dyn Bindable>, property: &str, element: &Node, parse: &Function, current: Value) -> Option<Binding> {
	element.set_inner_html(&parsed(parse, current).to_display_string());
	let parse = parse.clone();
	on_change(
		source,
		property,
		with_element(element, move |element, value| {
			let html = parsed(&parse, value.clone()).to_display_string();
			if element.inner_html() != html {
				element.set_inner_html(&html)
			}
		}),
	)
}
