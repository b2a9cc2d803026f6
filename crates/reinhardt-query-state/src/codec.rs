//! Conversion between [`ParamMap`] and query strings.
//!
//! - [`to_query_params`] flattens a parameter map into the string data a
//!   navigator receives. Null and empty-string values are left out.
//! - [`parse_query_string`] reads `?key=value` pairs back into typed values,
//!   coercing numbers and splitting delimited lists.
//! - [`encode_query_string`] form-urlencodes flattened data for use in a URL.

use indexmap::IndexMap;

use crate::value::{ParamMap, QueryValue};

/// Flattens `params` into string data, skipping absent values.
///
/// # Example
///
/// ```ignore
/// let mut params = ParamMap::new();
/// params.insert("ids".into(), vec![1, 2, 3].into());
/// params.insert("search".into(), QueryValue::Null);
///
/// let data = to_query_params(&params, ",");
/// assert_eq!(data.get("ids").map(String::as_str), Some("1,2,3"));
/// assert!(!data.contains_key("search"));
/// ```
pub fn to_query_params(params: &ParamMap, delimiter: &str) -> IndexMap<String, String> {
	params
		.iter()
		.filter_map(|(key, value)| {
			value
				.to_query_string(delimiter)
				.map(|token| (key.clone(), token))
		})
		.collect()
}

/// Parses a query string such as `?search=test&page=1`.
///
/// The leading `?` is optional, `+` decodes to a space and percent escapes
/// are decoded. When a key repeats, the last value wins but the key keeps
/// the position of its first occurrence.
pub fn parse_query_string(search: &str, delimiter: &str) -> ParamMap {
	let query = search.strip_prefix('?').unwrap_or(search);
	if query.is_empty() {
		return ParamMap::new();
	}

	let pairs: Vec<(String, String)> = match serde_urlencoded::from_str(query) {
		Ok(pairs) => pairs,
		Err(err) => {
			tracing::warn!(error = %err, query, "ignoring undecodable query string");
			return ParamMap::new();
		}
	};

	pairs
		.into_iter()
		.map(|(key, raw)| {
			let value = QueryValue::parse(&raw, delimiter);
			(key, value)
		})
		.collect()
}

/// Form-urlencodes flattened data, preserving its order.
pub fn encode_query_string(
	data: &IndexMap<String, String>,
) -> Result<String, serde_urlencoded::ser::Error> {
	let pairs: Vec<(&str, &str)> = data
		.iter()
		.map(|(key, value)| (key.as_str(), value.as_str()))
		.collect();
	serde_urlencoded::to_string(pairs)
}
