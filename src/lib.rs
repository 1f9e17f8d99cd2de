#![doc(html_root_url = "https://docs.rs/cobind-dom/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod adapter;
pub mod binding;
pub mod context;
pub mod directive;
pub mod dom;
pub mod error;
pub mod event;
pub mod load;
pub mod namespace;
pub mod observable;
pub mod path;
pub mod scheduler;
pub mod template;
pub mod value;
pub mod view;

pub use binding::{Binding, BindingEngine};
pub use context::Context;
pub use dom::Node;
pub use error::Error;
pub use observable::{Bindable, Model, Observable};
pub use value::Value;
pub use view::{Glimpse, View, ViewOptions};
