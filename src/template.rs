//! Template sources: the per-URL cache and the loader collaborator that fetches templates by URL.

use crate::error::TemplateLoadError;
use core::cell::RefCell;
use hashbrown::HashMap;
use std::rc::Rc;
use tracing::trace;

/// Receives the outcome of a [`TemplateLoader::load`], possibly long after `load` returned.
pub type LoadCallback = Box<dyn FnOnce(Result<String, TemplateLoadError>)>;

/// Fetches template markup by URL.
///
/// Implementations may complete synchronously (calling `done` before returning) or later.
pub trait TemplateLoader {
	fn load(&self, url: &str, done: LoadCallback);
}

/// Serves templates from memory. Unknown URLs fail with [`TemplateLoadError::NotFound`].
#[derive(Debug, Default, Clone)]
pub struct StaticTemplateLoader {
	templates: Rc<RefCell<HashMap<String, String>>>,
	requests: Rc<RefCell<Vec<String>>>,
}
impl StaticTemplateLoader {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with(self, url: &str, template: &str) -> Self {
		self.insert(url, template);
		self
	}

	pub fn insert(&self, url: &str, template: &str) {
		self.templates.borrow_mut().insert(url.to_owned(), template.to_owned());
	}

	/// The URLs requested so far, in order.
	#[must_use]
	pub fn requests(&self) -> Vec<String> {
		self.requests.borrow().clone()
	}
}
impl TemplateLoader for StaticTemplateLoader {
	fn load(&self, url: &str, done: LoadCallback) {
		self.requests.borrow_mut().push(url.to_owned());
		let result = self.templates.borrow().get(url).cloned().ok_or_else(|| TemplateLoadError::NotFound(url.to_owned()));
		done(result)
	}
}

/// Loaded (and parsed) templates by URL. Each URL is written at most once.
#[derive(Debug, Default)]
pub struct TemplateCache {
	entries: RefCell<HashMap<String, Rc<str>>>,
}
impl TemplateCache {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn get(&self, url: &str) -> Option<Rc<str>> {
		self.entries.borrow().get(url).cloned()
	}

	/// Stores `template` unless `url` is cached already. Returns whether it was stored.
	pub fn insert(&self, url: &str, template: &str) -> bool {
		let mut entries = self.entries.borrow_mut();
		if entries.contains_key(url) {
			trace!(url, "Template already cached.");
			false
		} else {
			entries.insert(url.to_owned(), template.into());
			true
		}
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.entries.borrow().len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.entries.borrow().is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn first_write_wins() {
		let cache = TemplateCache::new();
		assert!(cache.insert("a.html", "one"));
		assert!(!cache.insert("a.html", "two"));
		assert_eq!(cache.get("a.html").as_deref(), Some("one"));
		assert_eq!(cache.len(), 1);
	}

	#[test]
	fn static_loader() {
		let loader = StaticTemplateLoader::new().with("a.html", "<p></p>");
		let results = Rc::new(RefCell::new(Vec::new()));
		for url in &["a.html", "b.html"] {
			let results = Rc::clone(&results);
			loader.load(url, Box::new(move |result| results.borrow_mut().push(result)));
		}
		assert_eq!(
			*results.borrow(),
			vec![Ok("<p></p>".to_owned()), Err(TemplateLoadError::NotFound("b.html".to_owned()))]
		);
		assert_eq!(loader.requests(), vec!["a.html", "b.html"]);
	}
}
