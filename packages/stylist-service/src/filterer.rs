use std::sync::Arc;

use serde_json::{Map, Value};

use stylist_domain::{
	filter::{self, Filters},
	llm_json::{self, LlmJson},
};

use crate::Context;

const FILTER_SYSTEM_PROMPT: &str = "\
You extract catalog filters from fashion search queries. Only use these fields: {fields}. \
Include a field only when the query states it explicitly. Values are catalog labels such as \
\"Black\" for colour_group_name or \"Menswear\" for index_name; use a list when several values \
are acceptable. Answer with one JSON object and nothing else:
{\"filters\": {\"field\": \"value\"}}";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFilters {
	pub filters: Filters,
	/// False when the model failed or its output could not be read.
	pub parsed: bool,
}

/// Pulls structured scalar filters out of free text.
#[derive(Clone)]
pub struct FilterExtractor {
	ctx: Arc<Context>,
}
impl FilterExtractor {
	pub fn new(ctx: Arc<Context>) -> Self {
		Self { ctx }
	}

	/// Never fails; an unreadable answer means an unfiltered search.
	pub async fn extract(&self, query: &str) -> ExtractedFilters {
		let allowed = &self.ctx.cfg.search.filter_fields;
		let messages = build_filter_messages(query, allowed);
		let raw = match self.ctx.complete(&messages).await {
			Ok(raw) => raw,
			Err(err) => {
				tracing::warn!(error = %err, "Filter extraction failed; searching unfiltered.");

				return ExtractedFilters::default();
			},
		};

		match llm_json::extract_json_object(&raw) {
			LlmJson::Parsed(object) => {
				let filters = filter::filters_from_json(filter_object(&object), allowed);

				tracing::info!(fields = ?filters.keys().collect::<Vec<_>>(), "Filters extracted.");

				ExtractedFilters { filters, parsed: true }
			},
			LlmJson::Unparsable { reason } => {
				tracing::warn!(reason = %reason, "Filter output is not JSON; searching unfiltered.");

				ExtractedFilters::default()
			},
		}
	}
}

/// Filters may sit under a `filters` key or be the top-level object.
fn filter_object(object: &Map<String, Value>) -> &Map<String, Value> {
	object.get("filters").and_then(Value::as_object).unwrap_or(object)
}

fn build_filter_messages(query: &str, allowed: &[String]) -> Vec<Value> {
	let system = FILTER_SYSTEM_PROMPT.replace("{fields}", &allowed.join(", "));

	vec![
		serde_json::json!({ "role": "system", "content": system }),
		serde_json::json!({ "role": "user", "content": format!("Query: {query}") }),
	]
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn nested_filters_are_preferred() {
		let object = serde_json::json!({
			"filters": { "colour_group_name": "Black" },
			"index_name": "Menswear"
		});
		let inner = filter_object(object.as_object().expect("Object literal."));

		assert_eq!(inner.len(), 1);
		assert!(inner.contains_key("colour_group_name"));
	}

	#[test]
	fn top_level_object_is_accepted() {
		let object = serde_json::json!({ "colour_group_name": "Black" });
		let map = object.as_object().expect("Object literal.");

		assert_eq!(filter_object(map), map);
	}

	#[test]
	fn non_object_filters_key_falls_back_to_top_level() {
		let object = serde_json::json!({ "filters": "none", "index_name": "Divided" });
		let map = object.as_object().expect("Object literal.");

		assert!(filter_object(map).contains_key("index_name"));
	}

	#[test]
	fn prompt_names_allowed_fields() {
		let messages = build_filter_messages(
			"black jeans",
			&["colour_group_name".to_string(), "index_name".to_string()],
		);
		let system = messages[0]["content"].as_str().expect("System prompt must be text.");

		assert!(system.contains("Only use these fields: colour_group_name, index_name."));
		assert_eq!(messages[1]["content"], "Query: black jeans");
	}
}
