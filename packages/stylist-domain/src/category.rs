//! Mapping from planner category names to catalog product-type names.

use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryMap {
	entries: BTreeMap<String, Vec<String>>,
}
impl CategoryMap {
	/// Builds a map with trimmed, lowercased category keys. Categories with no product types are
	/// dropped.
	pub fn new<I>(entries: I) -> Self
	where
		I: IntoIterator<Item = (String, Vec<String>)>,
	{
		let entries = entries
			.into_iter()
			.filter_map(|(name, types)| {
				let name = normalize_category(&name);
				let types: Vec<String> = types
					.into_iter()
					.map(|value| value.trim().to_string())
					.filter(|value| !value.is_empty())
					.collect();

				(!name.is_empty() && !types.is_empty()).then_some((name, types))
			})
			.collect();

		Self { entries }
	}

	/// Decodes a hash whose field values are JSON-encoded string arrays.
	///
	/// Returns the map together with the names of fields that could not be decoded.
	pub fn from_hash_fields(fields: HashMap<String, String>) -> (Self, Vec<String>) {
		let mut rejected = Vec::new();
		let mut decoded = Vec::with_capacity(fields.len());

		for (name, raw) in fields {
			match serde_json::from_str::<Vec<String>>(&raw) {
				Ok(types) => decoded.push((name, types)),
				Err(_) => rejected.push(name),
			}
		}

		rejected.sort();

		(Self::new(decoded), rejected)
	}

	pub fn to_hash_fields(&self) -> Vec<(String, String)> {
		self.entries
			.iter()
			.filter_map(|(name, types)| {
				serde_json::to_string(types).ok().map(|raw| (name.clone(), raw))
			})
			.collect()
	}

	/// Case-insensitive lookup of the product types behind a category.
	pub fn product_types(&self, category: &str) -> Option<&[String]> {
		self.entries.get(&normalize_category(category)).map(Vec::as_slice)
	}

	pub fn categories(&self) -> impl Iterator<Item = &str> {
		self.entries.keys().map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

pub fn normalize_category(name: &str) -> String {
	name.trim().to_lowercase()
}
