//! Query parameter values.
//!
//! A [`QueryValue`] is what a single query-string key maps to once parsed:
//! null, a boolean, a number, a string, or a list of numbers and strings.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::options::DEFAULT_DELIMITER;

/// Ordered mapping from parameter name to value.
///
/// Insertion order is kept so that serialized query strings are stable.
pub type ParamMap = IndexMap<String, QueryValue>;

/// One element of a list-valued parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryItem {
	/// Numeric element.
	Number(f64),
	/// Text element.
	Text(String),
}

impl QueryItem {
	/// Coerces a raw query-string token.
	///
	/// The whole token (surrounding whitespace ignored) must parse as a finite
	/// number to become [`QueryItem::Number`]; anything else, including the
	/// empty string, stays text. This never fails.
	pub fn coerce(raw: &str) -> Self {
		// Blank tokens stay `""` rather than coercing to `0`: `?page=` reads as
		// absent and `1,,3` keeps its gap.
		let trimmed = raw.trim();
		if !trimmed.is_empty()
			&& let Ok(number) = trimmed.parse::<f64>()
			&& number.is_finite()
		{
			return Self::Number(number);
		}
		Self::Text(raw.to_string())
	}

	/// Returns the number, if this is one.
	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Self::Number(n) => Some(*n),
			Self::Text(_) => None,
		}
	}

	/// Returns the text, if this is text.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Text(s) => Some(s),
			Self::Number(_) => None,
		}
	}
}

impl fmt::Display for QueryItem {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Number(n) => fmt_number(*n, f),
			Self::Text(s) => f.write_str(s),
		}
	}
}

/// Value of a single query parameter.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
	/// No value. Never serialized.
	#[default]
	Null,
	/// Boolean flag, serialized as `true` / `false`.
	Bool(bool),
	/// Number.
	Number(f64),
	/// String. The empty string is treated like [`QueryValue::Null`].
	Text(String),
	/// List, serialized as one delimiter-joined token.
	List(Vec<QueryItem>),
}

impl QueryValue {
	/// Parses a raw query-string value.
	///
	/// A value containing `delimiter` becomes a list whose elements are
	/// coerced one by one; otherwise the value is coerced as a scalar.
	pub fn parse(raw: &str, delimiter: &str) -> Self {
		if !delimiter.is_empty() && raw.contains(delimiter) {
			return Self::List(raw.split(delimiter).map(QueryItem::coerce).collect());
		}
		QueryItem::coerce(raw).into()
	}

	/// Returns `true` for [`QueryValue::Null`].
	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	/// Returns `true` if this value is left out of serialized query strings.
	pub fn is_absent(&self) -> bool {
		match self {
			Self::Null => true,
			Self::Text(s) => s.is_empty(),
			_ => false,
		}
	}

	/// Renders the value as a single query-string token.
	///
	/// Returns `None` for absent values. List elements are joined with
	/// `delimiter`.
	pub fn to_query_string(&self, delimiter: &str) -> Option<String> {
		if self.is_absent() {
			return None;
		}
		match self {
			Self::List(items) => Some(
				items
					.iter()
					.map(ToString::to_string)
					.collect::<Vec<_>>()
					.join(delimiter),
			),
			other => Some(other.to_string()),
		}
	}

	/// Returns the string, if this is text.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Text(s) => Some(s),
			_ => None,
		}
	}

	/// Returns the number, if this is one.
	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Self::Number(n) => Some(*n),
			_ => None,
		}
	}

	/// Returns the number as an integer, if it is one without a fractional part.
	pub fn as_i64(&self) -> Option<i64> {
		let n = self.as_f64()?;
		(n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64).then_some(n as i64)
	}

	/// Returns the boolean, if this is one.
	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Self::Bool(b) => Some(*b),
			_ => None,
		}
	}

	/// Returns the list elements, if this is a list.
	pub fn as_list(&self) -> Option<&[QueryItem]> {
		match self {
			Self::List(items) => Some(items),
			_ => None,
		}
	}
}

impl fmt::Display for QueryValue {
	/// Lists are joined with the default delimiter; use
	/// [`QueryValue::to_query_string`] for a custom one.
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Null => Ok(()),
			Self::Bool(b) => write!(f, "{}", b),
			Self::Number(n) => fmt_number(*n, f),
			Self::Text(s) => f.write_str(s),
			Self::List(items) => {
				for (i, item) in items.iter().enumerate() {
					if i > 0 {
						f.write_str(DEFAULT_DELIMITER)?;
					}
					write!(f, "{}", item)?;
				}
				Ok(())
			}
		}
	}
}

// Browser number-to-string rules: `-0` prints as `0`, integral floats print
// without a fraction, and magnitudes from 1e21 up or below 1e-6 use exponent
// notation with an explicit sign (`1e+21`, `1e-7`).
fn fmt_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
	if n == 0.0 {
		return f.write_str("0");
	}
	let magnitude = n.abs();
	if !(1e-6..1e21).contains(&magnitude) {
		let exponential = format!("{:e}", n);
		return match exponential.split_once('e') {
			Some((mantissa, exponent)) if !exponent.starts_with('-') => {
				write!(f, "{}e+{}", mantissa, exponent)
			}
			_ => f.write_str(&exponential),
		};
	}
	write!(f, "{}", n)
}

impl From<QueryItem> for QueryValue {
	fn from(item: QueryItem) -> Self {
		match item {
			QueryItem::Number(n) => Self::Number(n),
			QueryItem::Text(s) => Self::Text(s),
		}
	}
}

// Macro for numeric conversions into both value types
macro_rules! impl_from_number {
	($($ty:ty),* $(,)?) => {
		$(
			impl From<$ty> for QueryItem {
				fn from(n: $ty) -> Self {
					Self::Number(n as f64)
				}
			}

			impl From<$ty> for QueryValue {
				fn from(n: $ty) -> Self {
					Self::Number(n as f64)
				}
			}
		)*
	};
}

impl_from_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl From<&str> for QueryItem {
	fn from(s: &str) -> Self {
		Self::Text(s.to_string())
	}
}

impl From<String> for QueryItem {
	fn from(s: String) -> Self {
		Self::Text(s)
	}
}

impl From<&str> for QueryValue {
	fn from(s: &str) -> Self {
		Self::Text(s.to_string())
	}
}

impl From<String> for QueryValue {
	fn from(s: String) -> Self {
		Self::Text(s)
	}
}

impl From<bool> for QueryValue {
	fn from(b: bool) -> Self {
		Self::Bool(b)
	}
}

impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
	fn from(value: Option<T>) -> Self {
		value.map_or(Self::Null, Into::into)
	}
}

impl<T: Into<QueryItem>> From<Vec<T>> for QueryValue {
	fn from(items: Vec<T>) -> Self {
		Self::List(items.into_iter().map(Into::into).collect())
	}
}

impl<T: Into<QueryItem>, const N: usize> From<[T; N]> for QueryValue {
	fn from(items: [T; N]) -> Self {
		Self::List(items.into_iter().map(Into::into).collect())
	}
}
