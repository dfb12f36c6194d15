//! Structured in-page function calls.
//!
//! Scripts are sent as a function declaration plus JSON arguments. Values
//! from a snapshot travel only in `args`, never spliced into the source.

use std::borrow::Cow;

use serde::Serialize;
use serde_json::{Value, json};

use crate::LocalStorageEntry;

/// Writes `[{ name, value }, ...]` into localStorage in order.
pub const SET_LOCAL_STORAGE: &str = "(entries) => {
	for (const { name, value } of entries) {
		window.localStorage.setItem(name, value);
	}
	return entries.length;
}";

/// Reads one localStorage key.
pub const GET_LOCAL_STORAGE_ITEM: &str = "(name) => window.localStorage.getItem(name)";

/// A function to call in the page with serialized arguments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScriptCall {
	/// JavaScript function declaration
	pub function: Cow<'static, str>,
	/// Positional arguments, passed by value
	pub args: Vec<Value>,
}

impl ScriptCall {
	pub fn new(function: impl Into<Cow<'static, str>>, args: Vec<Value>) -> Self {
		Self {
			function: function.into(),
			args,
		}
	}

	/// Call that writes `entries` into the page's localStorage.
	pub fn set_local_storage(entries: &[LocalStorageEntry]) -> Self {
		let entries: Vec<Value> = entries
			.iter()
			.map(|entry| json!({ "name": entry.name, "value": entry.value }))
			.collect();
		Self::new(SET_LOCAL_STORAGE, vec![Value::Array(entries)])
	}

	/// Call that reads `name` from the page's localStorage.
	pub fn get_local_storage_item(name: &str) -> Self {
		Self::new(GET_LOCAL_STORAGE_ITEM, vec![Value::String(name.to_string())])
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn values_travel_as_arguments() {
		let hostile = "x'); localStorage.clear(); ('";
		let call = ScriptCall::set_local_storage(&[LocalStorageEntry::new(hostile, "v\"\n")]);

		assert_eq!(call.function, SET_LOCAL_STORAGE);
		assert!(!call.function.contains(hostile));
		assert_eq!(call.args, vec![json!([{ "name": hostile, "value": "v\"\n" }])]);
	}

	#[test]
	fn entries_keep_their_order() {
		let call = ScriptCall::set_local_storage(&[
			LocalStorageEntry::new("theme", "light"),
			LocalStorageEntry::new("lang", "en"),
			LocalStorageEntry::new("theme", "dark"),
		]);
		let values: Vec<_> = call.args[0].as_array().unwrap().iter().map(|e| e["value"].as_str().unwrap()).collect();
		assert_eq!(values, ["light", "en", "dark"]);
	}
}
