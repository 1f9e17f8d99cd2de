#![cfg(target_arch = "wasm32")]

use cobind_dom::{
	event::Listener,
	namespace::Namespace,
	scheduler::Scheduler,
	template::StaticTemplateLoader,
	view::{BIND, CREATION_COMPLETE, DETACH, REMOVE, TEMPLATE_ERROR, UNBIND},
	Context, Error, Glimpse, Node, View, ViewOptions,
};
use std::{cell::RefCell, rc::Rc, sync::Once};
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};

wasm_bindgen_test_configure!(run_in_browser);

static LOG_INIT: Once = Once::new();

fn context() -> Context {
	LOG_INIT.call_once(tracing_wasm::set_as_global_default);
	Context::builder().scheduler(Scheduler::new()).build()
}

fn recorder(view: &View, kinds: &str) -> Rc<RefCell<Vec<String>>> {
	let log = Rc::new(RefCell::new(Vec::new()));
	let listener = {
		let log = Rc::clone(&log);
		Listener::new(move |event| log.borrow_mut().push(event.kind().to_owned()))
	};
	view.add_event_listener(kinds, &listener);
	log
}

#[wasm_bindgen_test]
fn lifecycle_events() {
	let context = context();
	let view = View::new(
		ViewOptions::new()
			.template("<p>{{name}}</p>")
			.property("name", "Ada")
			.auto_init_template(false)
			.context(&context),
	)
	.unwrap();
	assert!(view.el().inner_html().is_empty());
	let log = recorder(&view, "templatecomplete bind creationcomplete");

	view.init_template();
	assert_eq!(view.el().inner_html(), "<p>Ada</p>");
	assert_eq!(*log.borrow(), vec!["templatecomplete", "bind"]);

	context.scheduler().run_pending();
	assert_eq!(*log.borrow(), vec!["templatecomplete", "bind", CREATION_COMPLETE]);
}

#[wasm_bindgen_test]
fn creation_complete_is_skipped_after_removal() {
	let context = context();
	let view = View::new(ViewOptions::new().auto_init_template(false).context(&context)).unwrap();
	let log = recorder(&view, CREATION_COMPLETE);
	view.init_template();
	view.remove();
	context.scheduler().run_pending();
	assert!(log.borrow().is_empty());
}

#[wasm_bindgen_test]
fn render_functions_see_the_view() {
	let view = View::new(
		ViewOptions::new()
			.property("count", 2)
			.render(|view| format!("<i>{}</i> items, {{{{count}}}} bound", view.get("count").to_display_string()))
			.context(&context()),
	)
	.unwrap();
	assert_eq!(view.el().text_content(), "2 items, 2 bound");

	view.set("count", 3);
	assert_eq!(view.el().text_content(), "2 items, 3 bound");
}

#[wasm_bindgen_test]
fn expressions_in_existing_markup() {
	let el = Node::element("div").unwrap();
	el.set_inner_html("<p>Hello, {{ name }}!</p>");
	let view = View::new(ViewOptions::new().el(&el).property("name", "Ada").context(&context())).unwrap();
	assert_eq!(view.el().inner_html(), "<p>Hello, Ada!</p>");
	assert!(!view.has_template());
}

#[wasm_bindgen_test]
fn original_content_moves_into_cb_content() {
	let el = Node::element("div").unwrap();
	el.set_inner_html("<i>child</i>");
	let view = View::new(
		ViewOptions::new()
			.el(&el)
			.template(r#"<header></header><section cb-content></section>"#)
			.context(&context()),
	)
	.unwrap();
	let content = view.content().unwrap();
	assert_eq!(content.tag_name(), "SECTION");
	assert_eq!(content.inner_html(), "<i>child</i>");
	assert!(view.has_content());
	assert_eq!(view.body(), content);

	let plain = View::new(ViewOptions::new().context(&context())).unwrap();
	assert!(!plain.has_content());
	assert_eq!(plain.body(), plain.el());
}

#[wasm_bindgen_test]
fn template_urls_load_through_the_cache() {
	let loader = StaticTemplateLoader::new().with("greeting.html", "<b>{{name}}</b>");
	let context = Context::builder().scheduler(Scheduler::new()).template_loader(loader.clone()).build();

	let first = View::new(
		ViewOptions::new()
			.template_url("greeting.html")
			.property("name", "Ada")
			.context(&context),
	)
	.unwrap();
	assert_eq!(first.el().inner_html(), "<b>Ada</b>");
	assert!(first.has_template());

	let second = View::new(
		ViewOptions::new()
			.template_url("greeting.html")
			.property("name", "Grace")
			.context(&context),
	)
	.unwrap();
	assert_eq!(second.el().inner_html(), "<b>Grace</b>");
	assert_eq!(loader.requests().len(), 1);
	assert_eq!(context.templates().len(), 1);

	let uncached = View::new(
		ViewOptions::new()
			.template_url("greeting.html")
			.template_cache_enabled(false)
			.context(&context),
	)
	.unwrap();
	assert_eq!(uncached.el().text_content(), "");
	assert_eq!(loader.requests().len(), 2);
}

#[wasm_bindgen_test]
fn failed_loads_empty_the_view() {
	let loader = StaticTemplateLoader::new();
	let context = Context::builder().scheduler(Scheduler::new()).template_loader(loader).build();
	let el = Node::element("div").unwrap();
	el.set_inner_html("<p>stale</p>");

	let view = View::new(
		ViewOptions::new()
			.el(&el)
			.template_url("missing.html")
			.auto_init_template(false)
			.context(&context),
	)
	.unwrap();
	let log = recorder(&view, &format!("{} templatecomplete", TEMPLATE_ERROR));
	view.init_template();

	assert_eq!(view.el().inner_html(), "");
	assert_eq!(*log.borrow(), vec![TEMPLATE_ERROR, "templatecomplete"]);
	assert!(context.templates().is_empty());
}

#[wasm_bindgen_test]
fn loads_without_a_loader_fail_softly() {
	let view = View::new(ViewOptions::new().template_url("a.html").context(&context())).unwrap();
	assert!(view.initialized());
	assert_eq!(view.el().inner_html(), "");
}

#[wasm_bindgen_test]
fn loading_a_template_into_an_unbound_view_does_not_unbind() {
	let loader = StaticTemplateLoader::new().with("a.html", "<b>{{name}}</b>");
	let context = Context::builder().scheduler(Scheduler::new()).template_loader(loader).build();
	let view = View::new(
		ViewOptions::new()
			.template_url("a.html")
			.property("name", "Ada")
			.auto_init_template(false)
			.context(&context),
	)
	.unwrap();
	let log = recorder(&view, &format!("{} {}", UNBIND, BIND));

	view.load_template(None);
	assert_eq!(*log.borrow(), vec![BIND]);
	assert_eq!(view.el().inner_html(), "<b>Ada</b>");

	view.load_template(None);
	assert_eq!(*log.borrow(), vec![BIND, UNBIND, BIND]);
}

#[wasm_bindgen_test]
fn nested_views_bind_their_own_subtrees() {
	let namespace = Namespace::new();
	namespace.register_view("Child", || ViewOptions::new().property("label", "inner"));
	namespace.register_view("FancyBadge", || ViewOptions::new().template("<em>badge</em>"));
	namespace.register_glimpse("Tip");
	let context = Context::builder().scheduler(Scheduler::new()).namespace(namespace).build();

	let outer = View::new(
		ViewOptions::new()
			.template(concat!(
				r#"<span cb-html="label"></span>"#,
				r#"<div cb-view="Child"><b cb-html="label"></b></div>"#,
				r#"<fancy-badge></fancy-badge>"#,
				r#"<i cb-glimpse="Tip" cb-html="label"></i>"#,
			))
			.property("label", "outer")
			.context(&context),
	)
	.unwrap();
	let el = outer.el();
	let children = el.child_elements();

	assert_eq!(children[0].inner_html(), "outer");

	let child = View::of(&children[1]).unwrap();
	assert_eq!(children[1].inner_html(), "<b>inner</b>");
	assert!(child.parent().unwrap().ptr_eq(&outer));
	assert!(outer.parent().is_none());

	assert!(children[2].has_class("cb-view"));
	assert_eq!(children[2].inner_html(), "<em>badge</em>");

	// Glimpses don't own their subtree: the outer view binds it.
	assert!(Glimpse::of(&children[3]).is_some());
	assert!(children[3].has_class("cb-glimpse"));
	assert_eq!(children[3].inner_html(), "outer");

	assert_eq!(outer.elements(false).len(), 2);
	assert_eq!(outer.elements(true).len(), 6);

	outer.set("label", "changed");
	assert_eq!(children[1].inner_html(), "<b>inner</b>");
	assert_eq!(children[3].inner_html(), "changed");
}

#[wasm_bindgen_test]
fn removal_disposes_nested_views() {
	let namespace = Namespace::new();
	namespace.register_view("Child", ViewOptions::new);
	let context = Context::builder().scheduler(Scheduler::new()).namespace(namespace).build();

	let container = Node::element("main").unwrap();
	let outer = View::new(
		ViewOptions::new()
			.template(r#"<span cb-html="label"></span><div cb-view="Child"></div>"#)
			.property("label", "x")
			.context(&context),
	)
	.unwrap();
	container.append_child(&outer.el());

	let child_el = outer.el().child_elements()[1].clone();
	let child = View::of(&child_el).unwrap();
	let child_log = recorder(&child, REMOVE);
	let outer_log = recorder(&outer, &format!("{} {}", REMOVE, DETACH));

	outer.remove();
	assert_eq!(*child_log.borrow(), vec![REMOVE]);
	assert_eq!(*outer_log.borrow(), vec![REMOVE, DETACH]);
	assert!(View::of(&child_el).is_none());
	assert!(View::of(&outer.el()).is_none());
	assert!(container.children().is_empty());
	assert!(outer.removed());

	outer.set("label", "y");
	assert_eq!(outer.el().child_elements()[0].inner_html(), "x");

	outer.remove();
	assert_eq!(outer_log.borrow().len(), 2);
}

#[wasm_bindgen_test]
fn detach_only_reports_actual_detachment() {
	let view = View::new(ViewOptions::new().context(&context())).unwrap();
	let log = recorder(&view, DETACH);
	view.detach();
	assert!(log.borrow().is_empty());

	let parent = Node::element("div").unwrap();
	parent.append_child(&view.el());
	view.detach();
	assert_eq!(log.borrow().len(), 1);
	assert!(view.el().parent().is_none());
}

#[wasm_bindgen_test]
fn appending_and_prepending_views() {
	let context = context();
	let host = View::new(ViewOptions::new().template("<p cb-content></p>").context(&context)).unwrap();
	let a = View::new(ViewOptions::new().tag_name("a").context(&context)).unwrap();
	let b = View::new(ViewOptions::new().tag_name("b").context(&context)).unwrap();

	host.append_view(&a);
	host.prepend_view(&b);
	let body = host.body();
	assert_eq!(body.child_elements(), vec![b.el(), a.el()]);
	assert!(a.parent().unwrap().ptr_eq(&host));
}

#[wasm_bindgen_test]
fn current_state_is_bindable() {
	let view = View::new(ViewOptions::new().template(r#"<span cb-html="currentState"></span>"#).context(&context())).unwrap();
	let span = view.el().child_elements()[0].clone();
	assert_eq!(span.inner_html(), "");

	view.set_current_state("busy");
	assert_eq!(span.inner_html(), "busy");
	assert!(view.el().has_class("cb-state-busy"));
}

#[wasm_bindgen_test]
fn the_element_is_a_read_only_property() {
	let view = View::new(ViewOptions::new().context(&context())).unwrap();
	assert!(matches!(view.get("el"), cobind_dom::Value::Node(node) if node == view.el()));
}

#[wasm_bindgen_test]
fn options_shape_the_element() {
	let view = View::new(
		ViewOptions::new()
			.tag_name("section")
			.class_name("a")
			.class_name("b")
			.id("main")
			.attribute("role", "region")
			.style("font-size", "12px")
			.context(&context()),
	)
	.unwrap();
	let el = view.el();
	assert_eq!(el.tag_name(), "SECTION");
	assert_eq!(el.class_list(), vec!["cb-view", "a", "b"]);
	assert_eq!(el.attribute("id").as_deref(), Some("main"));
	assert_eq!(el.attribute("role").as_deref(), Some("region"));
	assert_eq!(el.style("font-size").as_deref(), Some("12px"));
	assert!(view.initialized());
	assert!(View::of(&el).unwrap().ptr_eq(&view));
}

#[wasm_bindgen_test]
fn rejects_non_elements() {
	let result = View::new(ViewOptions::new().el(&Node::text("x").unwrap()).context(&context()));
	assert!(matches!(result, Err(Error::InvalidElement(_))));
}

#[wasm_bindgen_test]
fn current_state_swaps_classes() {
	let view = View::new(ViewOptions::new().context(&context())).unwrap();
	assert_eq!(view.current_state(), "");
	view.set_current_state("busy");
	assert!(view.el().has_class("cb-state-busy"));
	view.set_current_state("idle");
	assert!(!view.el().has_class("cb-state-busy"));
	assert!(view.el().has_class("cb-state-idle"));
	assert_eq!(view.get("currentState").as_str(), Some("idle"));
}

#[wasm_bindgen_test]
fn glimpses_are_found_through_their_element() {
	let el = Node::element("span").unwrap();
	let glimpse = Glimpse::new(&el, &context()).unwrap();
	assert!(el.has_class("cb-glimpse"));
	assert!(Glimpse::of(&el).is_some());
	assert_eq!(glimpse.el(), Some(el));
}

#[wasm_bindgen_test]
fn removal_forgets_recorded_directives() {
	let context = context();
	let el = Node::element("div").unwrap();
	el.set_inner_html(r#"<span cb-html="title"></span>"#);
	let view = View::new(ViewOptions::new().el(&el).property("title", "x").context(&context)).unwrap();
	let span = el.child_elements()[0].clone();
	assert!(span.expando("cbBindings").is_some());

	view.remove();
	assert!(span.expando("cbBindings").is_none());
	assert!(el.expando("cbView").is_none());
}
