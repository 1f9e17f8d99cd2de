//! Dotted/bracketed property paths, resolved by plain property access. Never evaluated as code.

use crate::{error::PathError, observable::Bindable, value::Value};
use once_cell::sync::Lazy;
use regex::Regex;
use std::rc::Rc;

static BRACKETS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(.*?)\]").expect("valid bracket pattern"));
static DISALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w._\s]").expect("valid character class"));

/// Trims `expression`, rewrites `[segment]` as `.segment` and strips everything but word characters, dots, underscores and whitespace.
#[must_use]
pub fn clean(expression: &str) -> String {
	let dotted = BRACKETS.replace_all(expression.trim(), ".$1");
	DISALLOWED.replace_all(&dotted, "").into_owned()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPath {
	segments: Vec<String>,
}
impl PropertyPath {
	/// # Errors
	///
	/// Iff nothing is left of `expression` after cleaning.
	pub fn parse(expression: &str) -> Result<Self, PathError> {
		let segments: Vec<String> = clean(expression)
			.split('.')
			.map(str::trim)
			.filter(|segment| !segment.is_empty())
			.map(str::to_owned)
			.collect();
		if segments.is_empty() {
			Err(PathError::Empty(expression.to_owned()))
		} else {
			Ok(Self { segments })
		}
	}

	/// The bindable property: the last segment.
	#[must_use]
	pub fn key(&self) -> &str {
		self.segments.last().map_or("", String::as_str)
	}

	/// The segments traversed to reach the owner of [`PropertyPath::key`].
	#[must_use]
	pub fn parents(&self) -> &[String] {
		&self.segments[..self.segments.len() - 1]
	}

	#[must_use]
	pub fn segments(&self) -> &[String] {
		&self.segments
	}

	#[must_use]
	pub fn to_dotted(&self) -> String {
		self.segments.join(".")
	}

	/// Walks `segments` from `root`, each of which must name a nested object.
	///
	/// # Errors
	///
	/// Iff a segment is `undefined`/`null` or not an object.
	pub fn traverse(root: &Rc<dyn Bindable>, segments: &[String]) -> Result<Rc<dyn Bindable>, PathError> {
		let mut owner = Rc::clone(root);
		for segment in segments {
			owner = match owner.get(segment) {
				Value::Object(object) => object,
				Value::Undefined | Value::Null => {
					return Err(PathError::Undefined {
						path: segments.join("."),
						segment: segment.clone(),
					})
				}
				_ => {
					return Err(PathError::NotAnObject {
						path: segments.join("."),
						segment: segment.clone(),
					})
				}
			};
		}
		Ok(owner)
	}

	/// # Errors
	///
	/// See [`PropertyPath::traverse`].
	pub fn resolve_from(&self, root: &Rc<dyn Bindable>) -> Result<Resolved, PathError> {
		let owner = Self::traverse(root, self.parents()).map_err(|error| match error {
			PathError::Undefined { segment, .. } => PathError::Undefined {
				path: self.to_dotted(),
				segment,
			},
			PathError::NotAnObject { segment, .. } => PathError::NotAnObject {
				path: self.to_dotted(),
				segment,
			},
			empty @ PathError::Empty(_) => empty,
		})?;
		Ok(Resolved {
			owner,
			key: self.key().to_owned(),
		})
	}
}

/// The object a property lives on, and the property's name.
#[derive(Clone)]
pub struct Resolved {
	pub owner: Rc<dyn Bindable>,
	pub key: String,
}
impl Resolved {
	#[must_use]
	pub fn get(&self) -> Value {
		self.owner.get(&self.key)
	}
}

/// # Errors
///
/// Iff the path is empty after cleaning or an intermediate segment doesn't resolve to an object.
pub fn resolve(root: &Rc<dyn Bindable>, expression: &str) -> Result<Resolved, PathError> {
	PropertyPath::parse(expression)?.resolve_from(root)
}

/// Resolves `expression` all the way to its value.
///
/// # Errors
///
/// See [`resolve`].
pub fn evaluate(root: &Rc<dyn Bindable>, expression: &str) -> Result<Value, PathError> {
	resolve(root, expression).map(|resolved| resolved.get())
}
