//! Dynamically typed property values, with the handful of JavaScript-flavoured coercions the binding layer relies on.

use crate::{dom::Node, observable::Bindable};
use core::fmt::{self, Debug, Formatter};
use num_traits::Float;
use std::rc::Rc;

/// A shared, callable value, identified by reference.
#[derive(Clone)]
pub struct Function(Rc<dyn Fn(&[Value]) -> Value>);
impl Function {
	pub fn new(f: impl Fn(&[Value]) -> Value + 'static) -> Self {
		Self(Rc::new(f))
	}

	/// Wraps a single-argument function, the shape of parse functions.
	pub fn unary(f: impl Fn(&Value) -> Value + 'static) -> Self {
		Self::new(move |args| f(args.first().unwrap_or(&Value::Undefined)))
	}

	pub fn call(&self, args: &[Value]) -> Value {
		(self.0)(args)
	}

	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::as_ptr(&self.0).cast::<()>() == Rc::as_ptr(&other.0).cast::<()>()
	}
}
impl Debug for Function {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "Function({:p})", Rc::as_ptr(&self.0).cast::<()>())
	}
}

#[derive(Clone)]
pub enum Value {
	Undefined,
	Null,
	Bool(bool),
	Number(f64),
	String(String),
	/// Compared by contents.
	List(Rc<Vec<Value>>),
	/// A nested source object, compared by reference.
	Object(Rc<dyn Bindable>),
	Function(Function),
	Node(Node),
}

impl Default for Value {
	fn default() -> Self {
		Value::Undefined
	}
}

impl Debug for Value {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Value::Undefined => f.write_str("Undefined"),
			Value::Null => f.write_str("Null"),
			Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
			Value::Number(n) => f.debug_tuple("Number").field(n).finish(),
			Value::String(s) => f.debug_tuple("String").field(s).finish(),
			Value::List(items) => f.debug_tuple("List").field(&**items).finish(),
			Value::Object(object) => write!(f, "Object({:p})", Rc::as_ptr(object).cast::<()>()),
			Value::Function(function) => function.fmt(f),
			Value::Node(node) => f.debug_tuple("Node").field(node).finish(),
		}
	}
}

impl Value {
	#[must_use]
	pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
		Value::List(Rc::new(items.into_iter().collect()))
	}

	#[must_use]
	pub fn object(object: impl Bindable + 'static) -> Self {
		Value::Object(Rc::new(object))
	}

	#[must_use]
	pub fn is_undefined(&self) -> bool {
		matches!(self, Value::Undefined)
	}

	#[must_use]
	pub fn is_nullish(&self) -> bool {
		matches!(self, Value::Undefined | Value::Null)
	}

	#[must_use]
	pub fn as_number(&self) -> Option<f64> {
		match *self {
			Value::Number(n) => Some(n),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::String(s) => Some(s),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_object(&self) -> Option<&Rc<dyn Bindable>> {
		match self {
			Value::Object(object) => Some(object),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_function(&self) -> Option<&Function> {
		match self {
			Value::Function(function) => Some(function),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_list(&self) -> Option<&[Value]> {
		match self {
			Value::List(items) => Some(items),
			_ => None,
		}
	}

	/// JavaScript truthiness.
	#[must_use]
	pub fn is_truthy(&self) -> bool {
		match self {
			Value::Undefined | Value::Null => false,
			Value::Bool(b) => *b,
			Value::Number(n) => !(*n == 0.0 || n.is_nan()),
			Value::String(s) => !s.is_empty(),
			Value::List(_) | Value::Object(_) | Value::Function(_) | Value::Node(_) => true,
		}
	}

	/// The text an element shows for this value. `undefined` and `null` display as nothing.
	#[must_use]
	pub fn to_display_string(&self) -> String {
		match self {
			Value::Undefined | Value::Null => String::new(),
			Value::Bool(b) => b.to_string(),
			Value::Number(n) => format_number(*n),
			Value::String(s) => s.clone(),
			Value::List(items) => items.iter().map(Value::to_display_string).collect::<Vec<_>>().join(","),
			Value::Object(_) => "[object Object]".to_owned(),
			Value::Function(_) => "function".to_owned(),
			Value::Node(node) => format!("[object {}]", node.node_name()),
		}
	}
}

/// `Object.is`: `NaN` equals itself, `+0` and `-0` differ, shared values compare by reference.
/// Lists compare their contents.
#[must_use]
pub fn same_value(a: &Value, b: &Value) -> bool {
	match (a, b) {
		(Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
		(Value::Bool(a), Value::Bool(b)) => a == b,
		(Value::Number(a), Value::Number(b)) => same_float(*a, *b),
		(Value::String(a), Value::String(b)) => a == b,
		(Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b) || (a.len() == b.len() && a.iter().zip(b.iter()).all(|(a, b)| same_value(a, b))),
		(Value::Object(a), Value::Object(b)) => Rc::as_ptr(a).cast::<()>() == Rc::as_ptr(b).cast::<()>(),
		(Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
		(Value::Node(a), Value::Node(b)) => a == b,
		_ => false,
	}
}

fn same_float<F: Float>(a: F, b: F) -> bool {
	if a.is_nan() {
		return b.is_nan();
	}
	a == b && a.is_sign_negative() == b.is_sign_negative()
}

/// Loose comparison through display strings, as used when matching radio values.
#[must_use]
pub fn loosely_equal(a: &Value, b: &Value) -> bool {
	a.to_display_string() == b.to_display_string()
}

/// Formats like JavaScript's `String(number)`.
#[must_use]
pub fn format_number(n: f64) -> String {
	if n.is_nan() {
		"NaN".to_owned()
	} else if n.is_infinite() {
		(if n > 0.0 { "Infinity" } else { "-Infinity" }).to_owned()
	} else if n == 0.0 {
		"0".to_owned()
	} else if n.abs() >= 1e21 || n.abs() < 1e-6 {
		let formatted = format!("{:e}", n);
		match formatted.find('e') {
			Some(i) if !formatted[i + 1..].starts_with('-') => format!("{}e+{}", &formatted[..i], &formatted[i + 1..]),
			_ => formatted,
		}
	} else {
		n.to_string()
	}
}

fn is_js_whitespace(c: char) -> bool {
	c.is_whitespace() || c == '\u{feff}'
}

/// Length of the longest prefix of `s` that is a decimal number literal, or `0`.
fn decimal_prefix_len(s: &str) -> usize {
	let bytes = s.as_bytes();
	let mut i = 0;
	if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
		i += 1;
	}
	let mut digits = 0;
	while bytes.get(i).map_or(false, u8::is_ascii_digit) {
		i += 1;
		digits += 1;
	}
	if bytes.get(i) == Some(&b'.') {
		i += 1;
		while bytes.get(i).map_or(false, u8::is_ascii_digit) {
			i += 1;
			digits += 1;
		}
	}
	if digits == 0 {
		return 0;
	}
	if matches!(bytes.get(i), Some(b'e') | Some(b'E')) {
		let mut j = i + 1;
		if matches!(bytes.get(j), Some(b'+') | Some(b'-')) {
			j += 1;
		}
		let exponent_start = j;
		while bytes.get(j).map_or(false, u8::is_ascii_digit) {
			j += 1;
		}
		if j > exponent_start {
			i = j;
		}
	}
	i
}

fn signed_infinity(s: &str) -> Option<f64> {
	match s {
		"Infinity" | "+Infinity" => Some(f64::INFINITY),
		"-Infinity" => Some(f64::NEG_INFINITY),
		_ => None,
	}
}

/// `Number(s)`: the whole (trimmed) string must be numeric, otherwise `NaN`.
#[must_use]
pub fn js_number(s: &str) -> f64 {
	let s = s.trim_matches(is_js_whitespace);
	if s.is_empty() {
		return 0.0;
	}
	if let Some(n) = signed_infinity(s) {
		return n;
	}
	for &(prefix, radix) in &[("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
		if let Some(digits) = s.strip_prefix(prefix) {
			if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
				return f64::NAN;
			}
			#[allow(clippy::cast_precision_loss)]
			return u64::from_str_radix(digits, radix).map_or(f64::NAN, |n| n as f64);
		}
	}
	if decimal_prefix_len(s) == s.len() {
		s.parse().unwrap_or(f64::NAN)
	} else {
		f64::NAN
	}
}

/// `parseFloat(s)`: the longest numeric prefix, otherwise `NaN`.
#[must_use]
pub fn js_parse_float(s: &str) -> f64 {
	let s = s.trim_start_matches(is_js_whitespace);
	for candidate in &["Infinity", "+Infinity", "-Infinity"] {
		if s.starts_with(candidate) {
			return signed_infinity(candidate).unwrap_or(f64::NAN);
		}
	}
	match decimal_prefix_len(s) {
		0 => f64::NAN,
		len => s[..len].parse().unwrap_or(f64::NAN),
	}
}

/// Coerces a value coming back from an element before it is written to a source property.
///
/// Numeric strings become numbers. A string that would convert to `NaN` becomes `""`,
/// as does a non-numeric string headed for a property that currently holds a number.
#[must_use]
pub fn coerce_input(current: &Value, incoming: Value) -> Value {
	match incoming {
		Value::String(s) if !s.is_empty() => {
			if !js_number(&s).is_nan() {
				let n = js_parse_float(&s);
				if n.is_nan() {
					Value::String(String::new())
				} else {
					Value::Number(n)
				}
			} else if matches!(current, Value::Number(_)) {
				Value::String(String::new())
			} else {
				Value::String(s)
			}
		}
		other => other,
	}
}

impl From<bool> for Value {
	fn from(b: bool) -> Self {
		Value::Bool(b)
	}
}
impl From<f64> for Value {
	fn from(n: f64) -> Self {
		Value::Number(n)
	}
}
impl From<i32> for Value {
	fn from(n: i32) -> Self {
		Value::Number(n.into())
	}
}
impl From<&str> for Value {
	fn from(s: &str) -> Self {
		Value::String(s.to_owned())
	}
}
impl From<String> for Value {
	fn from(s: String) -> Self {
		Value::String(s)
	}
}
impl From<Vec<Value>> for Value {
	fn from(items: Vec<Value>) -> Self {
		Value::List(Rc::new(items))
	}
}
impl From<Function> for Value {
	fn from(function: Function) -> Self {
		Value::Function(function)
	}
}
impl From<Node> for Value {
	fn from(node: Node) -> Self {
		Value::Node(node)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn nan_and_signed_zero() {
		assert!(same_value(&Value::Number(f64::NAN), &Value::Number(f64::NAN)));
		assert!(!same_value(&Value::Number(0.0), &Value::Number(-0.0)));
		assert!(same_value(&Value::Number(1.5), &Value::Number(1.5)));
		assert!(!same_value(&Value::Number(1.0), &Value::String("1".into())));
	}

	#[test]
	fn lists_compare_contents() {
		assert!(same_value(&Value::list(vec![1.into(), "a".into()]), &Value::list(vec![1.into(), "a".into()])));
		assert!(!same_value(&Value::list(vec![1.into()]), &Value::list(vec![2.into()])));
	}

	#[test]
	fn functions_compare_by_reference() {
		let f = Function::unary(Value::clone);
		let g = Function::unary(Value::clone);
		assert!(same_value(&Value::Function(f.clone()), &Value::Function(f.clone())));
		assert!(!same_value(&Value::Function(f), &Value::Function(g)));
	}

	#[test]
	fn display_strings() {
		assert_eq!(Value::Undefined.to_display_string(), "");
		assert_eq!(Value::Null.to_display_string(), "");
		assert_eq!(Value::Number(42.0).to_display_string(), "42");
		assert_eq!(Value::Number(-0.0).to_display_string(), "0");
		assert_eq!(Value::Number(1.5).to_display_string(), "1.5");
		assert_eq!(Value::Number(1e21).to_display_string(), "1e+21");
		assert_eq!(Value::Number(f64::NAN).to_display_string(), "NaN");
		assert_eq!(Value::list(vec![1.into(), Value::Null, "x".into()]).to_display_string(), "1,,x");
	}

	#[test]
	fn numeric_strings() {
		assert_eq!(js_number("42"), 42.0);
		assert_eq!(js_number(" 4.5e1 "), 45.0);
		assert_eq!(js_number("0x1F"), 31.0);
		assert_eq!(js_number(""), 0.0);
		assert!(js_number("42abc").is_nan());
		assert!(js_number("NaN").is_nan());
		assert!(js_number("inf").is_nan());
		assert_eq!(js_number("-Infinity"), f64::NEG_INFINITY);

		assert_eq!(js_parse_float("42abc"), 42.0);
		assert_eq!(js_parse_float(".5"), 0.5);
		assert!(js_parse_float("abc").is_nan());
		assert_eq!(js_parse_float("0x1F"), 0.0);
	}

	#[test]
	fn input_coercion() {
		assert!(same_value(&coerce_input(&Value::Undefined, "42".into()), &Value::Number(42.0)));
		assert!(same_value(&coerce_input(&Value::Number(42.0), "42abc".into()), &Value::String(String::new())));
		assert!(same_value(&coerce_input(&Value::String("x".into()), "42abc".into()), &Value::String("42abc".into())));
		assert!(same_value(&coerce_input(&Value::Undefined, "   ".into()), &Value::String(String::new())));
		assert!(same_value(&coerce_input(&Value::Undefined, "".into()), &Value::String(String::new())));
		assert!(same_value(&coerce_input(&Value::Undefined, true.into()), &Value::Bool(true)));
	}

	#[test]
	fn truthiness() {
		assert!(!Value::Number(0.0).is_truthy());
		assert!(!Value::Number(f64::NAN).is_truthy());
		assert!(!Value::String(String::new()).is_truthy());
		assert!(Value::String("0".into()).is_truthy());
		assert!(Value::list(vec![]).is_truthy());
	}
}
