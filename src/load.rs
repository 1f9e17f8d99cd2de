//! Wrapping of live browser node lists into [`dom::Node`](`crate::dom::Node`) handles.

use crate::dom::Node;
use tracing::warn;
use wasm_bindgen::JsCast;
use web_sys::{Attr, Comment, Element, NamedNodeMap, Node as wNode, NodeList, Text};

/// Node types other than elements, text and comments are skipped.
#[must_use]
pub fn load_child_nodes(child_nodes: &NodeList) -> Vec<Node> {
	(0..child_nodes.length())
		.filter_map(|i| child_nodes.item(i))
		.filter_map(|child| load_node(&child))
		.collect()
}

#[must_use]
pub fn load_node(node: &wNode) -> Option<Node> {
	if let Some(element) = node.dyn_ref::<Element>() {
		Some(load_element(element))
	} else if node.dyn_ref::<Text>().is_some() || node.dyn_ref::<Comment>().is_some() {
		Some(Node::from(node.clone()))
	} else {
		warn!(node_type = node.node_type(), "Skipped unrecognised child node.");
		None
	}
}

/// A handle to `element` itself. Bindings made through it act on the live page.
#[must_use]
pub fn load_element(element: &Element) -> Node {
	Node::from(element.clone())
}

#[must_use]
pub fn load_attributes(attributes: &NamedNodeMap) -> Vec<(String, String)> {
	(0..attributes.length())
		.filter_map(|i| attributes.item(i))
		.map(|attribute| load_attribute(&attribute))
		.collect()
}

#[must_use]
pub fn load_attribute(attribute: &Attr) -> (String, String) {
	(attribute.name(), attribute.value())
}
