//! Search plans and the deterministic fallback planner.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{category::normalize_category, filter::Filters};

/// Keyword to category, scanned in order.
const SINGLE_ITEM_KEYWORDS: [(&str, &str); 7] = [
	("jeans", "pants"),
	("shirt", "shirt"),
	("dress", "dress"),
	("shoes", "shoes"),
	("jacket", "jacket"),
	("pants", "pants"),
	("top", "shirt"),
];
const OUTFIT_MARKER: &str = "outfit";
const WORD_START_KEYWORD: &str = "top";

pub const FALLBACK_OUTFIT_CATEGORIES: [&str; 3] = ["shirt", "pants", "shoes"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPlan {
	pub categories: Vec<String>,
	#[serde(default)]
	pub descriptions: Vec<String>,
	#[serde(default)]
	pub is_single_item: bool,
	#[serde(default)]
	pub filters: Filters,
}
impl SearchPlan {
	pub fn new(categories: Vec<String>, mut descriptions: Vec<String>, is_single_item: bool) -> Self {
		descriptions.truncate(categories.len());

		Self { categories, descriptions, is_single_item, filters: Filters::new() }
	}

	/// Reads the planner's JSON object. Returns `None` when no usable category survives.
	pub fn from_model_output(object: &Map<String, Value>) -> Option<Self> {
		let raw_categories = object.get("categories")?.as_array()?;
		let raw_descriptions =
			object.get("descriptions").and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[]);
		let mut categories = Vec::with_capacity(raw_categories.len());
		let mut descriptions = Vec::with_capacity(raw_categories.len());
		let mut aligned = true;

		for (idx, raw) in raw_categories.iter().enumerate() {
			let Some(category) = raw.as_str().map(normalize_category).filter(|name| !name.is_empty())
			else {
				continue;
			};
			let description = raw_descriptions
				.get(idx)
				.and_then(Value::as_str)
				.map(str::trim)
				.filter(|text| !text.is_empty());

			categories.push(category);

			// Descriptions stay a prefix of the categories; the rest is synthesized.
			match description {
				Some(text) if aligned => descriptions.push(text.to_string()),
				_ => aligned = false,
			}
		}

		if categories.is_empty() {
			return None;
		}

		let is_single_item = object.get("is_single_item").and_then(Value::as_bool).unwrap_or(false);

		Some(Self::new(categories, descriptions, is_single_item))
	}

	/// Plans with no categories are never written to the plan cache.
	pub fn is_cacheable(&self) -> bool {
		!self.categories.is_empty()
	}

	pub fn description_for(&self, index: usize, query: &str) -> String {
		match self.descriptions.get(index) {
			Some(description) => description.clone(),
			None => {
				let category = self.categories.get(index).map(String::as_str).unwrap_or_default();

				format!("{query} {category}")
			},
		}
	}

	/// `(category, description)` pairs in plan order.
	pub fn tasks(&self, query: &str) -> Vec<(String, String)> {
		self.categories
			.iter()
			.enumerate()
			.map(|(idx, category)| (category.clone(), self.description_for(idx, query)))
			.collect()
	}
}

/// Keyword heuristic used whenever the planner model is unavailable or unparsable.
pub fn fallback_plan(query: &str) -> SearchPlan {
	let lowered = query.to_lowercase();

	if !lowered.contains(OUTFIT_MARKER)
		&& let Some(category) = single_item_category(&lowered)
	{
		return SearchPlan::new(vec![category.to_string()], vec![query.to_string()], true);
	}

	let categories = FALLBACK_OUTFIT_CATEGORIES.iter().map(|name| name.to_string()).collect();
	let descriptions =
		FALLBACK_OUTFIT_CATEGORIES.iter().map(|name| format!("{query} {name}")).collect();

	SearchPlan::new(categories, descriptions, false)
}

fn single_item_category(lowered: &str) -> Option<&'static str> {
	SINGLE_ITEM_KEYWORDS
		.iter()
		.find_map(|(keyword, category)| keyword_matches(lowered, keyword).then_some(*category))
}

/// Substring match, so plurals and compounds ("dresses", "sweatpants") count. `top` must also
/// start a word, which keeps "stop" and "laptop" out.
fn keyword_matches(lowered: &str, keyword: &str) -> bool {
	if keyword != WORD_START_KEYWORD {
		return lowered.contains(keyword);
	}

	lowered.match_indices(keyword).any(|(idx, _)| {
		lowered[..idx].chars().next_back().is_none_or(|prev| !prev.is_alphanumeric())
	})
}
