#![cfg(target_arch = "wasm32")]

use cobind_dom::{Node, Value};
use std::{any::Any, cell::Cell, rc::Rc, sync::Once};
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};

wasm_bindgen_test_configure!(run_in_browser);

static LOG_INIT: Once = Once::new();

fn element(tag_name: &str, markup: &str) -> Node {
	LOG_INIT.call_once(tracing_wasm::set_as_global_default);
	let element = Node::element(tag_name).unwrap();
	element.set_inner_html(markup);
	element
}

#[wasm_bindgen_test]
fn tree_navigation_and_mutation() {
	let root = element("div", "<a></a><b><i></i></b>tail");
	let children = root.children();
	assert_eq!(children.len(), 3);
	assert!(children[2].is_text());
	assert_eq!(root.child_elements().len(), 2);
	assert_eq!(root.descendant_elements().iter().map(Node::tag_name).collect::<Vec<_>>(), vec!["A", "B", "I"]);
	assert_eq!(root.descendants().len(), 4);

	let b = children[1].clone();
	let i = b.first_child().unwrap();
	assert_eq!(i.parent(), Some(b.clone()));
	assert_eq!(i.root(), root);
	assert!(root.contains(&i));
	assert!(!i.contains(&root));
	assert_eq!(b.next_sibling(), Some(children[2].clone()));
	assert_eq!(b.previous_sibling(), Some(children[0].clone()));
	assert_eq!(root.last_child(), Some(children[2].clone()));

	let pruned = root.descendant_elements_pruned(|element| element.tag_name() == "B");
	assert_eq!(pruned.iter().map(Node::tag_name).collect::<Vec<_>>(), vec!["A", "B"]);
	assert_eq!(i.closest(|element| element.tag_name() == "DIV"), Some(root.clone()));

	let u = Node::element("u").unwrap();
	root.insert_before(&u, Some(&b));
	assert_eq!(root.child_elements()[1], u);
	// Not a child of `root`, so `u` is appended.
	root.insert_before(&u, Some(&i));
	assert_eq!(root.last_child(), Some(u.clone()));

	assert!(root.remove_child(&u));
	assert!(!root.remove_child(&u));
	root.prepend_child(&u);
	assert_eq!(root.first_child(), Some(u.clone()));

	let s = Node::element("s").unwrap();
	assert!(u.replace_with(&s));
	assert!(u.parent().is_none());
	assert!(!u.replace_with(&s));
	s.remove();
	assert_eq!(root.inner_html(), "<a></a><b><i></i></b>tail");
}

#[wasm_bindgen_test]
fn cloning_copies_markup_but_not_storage() {
	let original = element("p", r#"<span class="x">y</span>"#);
	original.set_attribute("id", "p");
	original.set_expando("key", Rc::new(1_u8) as Rc<dyn Any>);

	let shallow = original.clone_node(false).unwrap();
	assert_eq!(shallow.outer_html(), r#"<p id="p"></p>"#);
	let deep = original.clone_node(true).unwrap();
	assert_eq!(deep.outer_html(), original.outer_html());
	assert_ne!(deep, original);
	assert!(deep.expando("key").is_none());
}

#[wasm_bindgen_test]
fn attributes_classes_and_styles() {
	let el = element("div", "");
	el.set_attribute("title", "t");
	el.set_attribute("data-x", "1");
	assert_eq!(el.attribute_names(), vec!["title", "data-x"]);
	assert!(el.has_attribute("title"));
	assert!(el.remove_attribute("title"));
	assert!(!el.remove_attribute("title"));
	assert_eq!(el.attributes(), vec![("data-x".to_owned(), "1".to_owned())]);

	el.add_class("a b");
	el.toggle_class("c", true);
	el.toggle_class("a", false);
	assert_eq!(el.class_list(), vec!["b", "c"]);
	assert!(el.has_class("c"));
	el.remove_class("b c");
	assert!(el.class_list().is_empty());

	el.set_style("font-size", Some("12px"));
	el.set_style("color", Some("red"));
	assert_eq!(el.style("font-size").as_deref(), Some("12px"));
	el.set_style("font-size", None);
	assert_eq!(el.style("font-size"), None);
	el.set_style("color", Some(""));
	assert!(!el.has_attribute("style"));
}

#[wasm_bindgen_test]
fn content_and_character_data() {
	let el = element("div", "a<b>c</b>");
	assert_eq!(el.text_content(), "ac");
	el.set_text_content("<x>");
	assert_eq!(el.inner_html(), "&lt;x&gt;");
	assert_eq!(el.children().len(), 1);

	let text = Node::text("one").unwrap();
	assert_eq!(text.data(), "one");
	text.set_data("two");
	assert_eq!(text.node_name(), "#text");
	assert_eq!(text.value(), "two");
	assert_eq!(text.tag_name(), "");

	let comment = Node::comment("note").unwrap();
	assert!(comment.is_comment());
	assert_eq!(comment.data(), "note");
}

#[wasm_bindgen_test]
fn form_control_state() {
	let form = element(
		"form",
		r#"<input type="CHECKBOX"><input type="radio" name="r" value="1"><input type="radio" name="r" value="2"><select><option value="a">A</option><option value="b">B</option></select><textarea></textarea>"#,
	);
	let controls = form.child_elements();
	assert_eq!(controls[0].input_type(), "checkbox");
	assert_eq!(controls[3].input_type(), "select-one");
	assert_eq!(controls[4].input_type(), "textarea");

	controls[0].set_checked(true);
	assert!(controls[0].checked());

	controls[1].set_checked(true);
	controls[2].set_checked(true);
	assert!(!controls[1].checked());
	assert!(controls[2].checked());

	controls[3].set_value("b");
	assert_eq!(controls[3].value(), "b");
	controls[3].set_value("missing");
	assert_eq!(controls[3].value(), "");

	controls[4].set_value("text");
	assert_eq!(controls[4].value(), "text");
}

#[wasm_bindgen_test]
fn native_properties() {
	let input = element("input", "");
	assert!(input.has_property("disabled"));
	assert!(input.is_boolean_property("disabled"));
	assert!(input.is_method("focus"));
	assert!(input.is_event_handler("onclick"));
	assert!(!input.has_property("bogus"));
	assert!(input.property("focus").is_none());

	assert!(input.set_property("disabled", &Value::Bool(true)));
	assert!(input.has_attribute("disabled"));
	assert!(input.set_property("value", &Value::Number(3.0)));
	assert_eq!(input.property("value").and_then(|value| value.as_str().map(str::to_owned)).as_deref(), Some("3"));
	assert!(!input.set_property("focus", &Value::Null));
	assert!(!input.set_property("bogus", &Value::Null));
}

#[wasm_bindgen_test]
fn listeners_can_be_removed() {
	let button = element("button", "");
	let clicks = Rc::new(Cell::new(0));
	let listener = {
		let clicks = Rc::clone(&clicks);
		button.add_event_listener("click custom", move |_| clicks.set(clicks.get() + 1))
	};
	assert_eq!(listener.kinds(), ["click", "custom"]);

	button.click();
	button.dispatch_event("custom");
	assert_eq!(clicks.get(), 2);

	listener.remove();
	assert!(!listener.is_attached());
	listener.remove();
	button.click();
	assert_eq!(clicks.get(), 2);
}

#[wasm_bindgen_test]
fn dropped_listener_handles_stay_attached() {
	let button = element("button", "");
	let clicks = Rc::new(Cell::new(0));
	{
		let clicks = Rc::clone(&clicks);
		drop(button.add_event_listener("click", move |_| clicks.set(clicks.get() + 1)));
	}
	button.click();
	assert_eq!(clicks.get(), 1);
}

#[wasm_bindgen_test]
fn input_value_fires_input_and_change() {
	let input = element("input", "");
	let seen = Rc::new(Cell::new(0));
	let _listener = {
		let seen = Rc::clone(&seen);
		input.add_event_listener("input change", move |_| seen.set(seen.get() + 1))
	};
	input.input_value("x");
	assert_eq!(input.value(), "x");
	assert_eq!(seen.get(), 2);
}

#[wasm_bindgen_test]
fn expandos_are_per_node() {
	let a = element("div", "");
	let b = element("div", "");
	a.set_expando("n", Rc::new(1_i32) as Rc<dyn Any>);
	b.set_expando("n", Rc::new(2_i32) as Rc<dyn Any>);
	a.set_expando("m", Rc::new("m") as Rc<dyn Any>);

	let n = |node: &Node| node.expando("n").and_then(|value| value.downcast::<i32>().ok()).map(|value| *value);
	assert_eq!(n(&a), Some(1));
	assert_eq!(n(&b), Some(2));
	assert_eq!(n(&a.clone()), Some(1));

	assert!(a.remove_expando("n").is_some());
	assert!(a.remove_expando("n").is_none());
	assert!(a.expando("m").is_some());
	a.clear_expando();
	assert!(a.expando("m").is_none());
	assert_eq!(n(&b), Some(2));
}

#[wasm_bindgen_test]
fn weak_handles_upgrade_while_the_node_is_referenced() {
	let el = element("p", "");
	let weak = el.downgrade();
	assert_eq!(weak.upgrade(), Some(el));
}

#[wasm_bindgen_test]
fn debug_output_leaves_out_attribute_values() {
	let el = element("input", "");
	el.set_attribute("id", "name");
	el.set_attribute("value", "secret");
	let text = Node::text("secret").unwrap();
	if cfg!(feature = "dangerous-logging") {
		assert!(format!("{:?}", el).contains("secret"));
	} else {
		assert_eq!(format!("{:?}", el), r#"<input id="name" value>"#);
		assert_eq!(format!("{:?}", text), "Text(6 bytes)");
	}
}
