use std::sync::Arc;

use serde_json::Value;

use stylist_domain::{
	llm_json::{self, LlmJson},
	plan::{self, SearchPlan},
};

use crate::Context;

const PLAN_SYSTEM_PROMPT: &str = "\
You plan product searches for a fashion catalog. Decide whether the shopper wants a single \
item or a complete outfit, then list the garment categories to search and a short visual \
description for each. Answer with one JSON object and nothing else:
{\"categories\": [\"...\"], \"descriptions\": [\"...\"], \"is_single_item\": true}
Descriptions align with categories by position. Use lowercase category names.";

/// Decomposes a query into per-category search tasks.
#[derive(Clone)]
pub struct OutfitPlanner {
	ctx: Arc<Context>,
}
impl OutfitPlanner {
	pub fn new(ctx: Arc<Context>) -> Self {
		Self { ctx }
	}

	/// Never fails: model errors and unusable output fall back to the keyword planner.
	pub async fn analyze(&self, query: &str) -> SearchPlan {
		let messages = build_plan_messages(query, &self.known_categories());
		let raw = match self.ctx.complete(&messages).await {
			Ok(raw) => raw,
			Err(err) => {
				tracing::warn!(error = %err, "Outfit planning failed; using keyword fallback.");

				return plan::fallback_plan(query);
			},
		};

		match llm_json::extract_json_object(&raw) {
			LlmJson::Parsed(object) => match SearchPlan::from_model_output(&object) {
				Some(plan) => {
					tracing::info!(
						categories = ?plan.categories,
						is_single_item = plan.is_single_item,
						"Outfit plan parsed."
					);

					plan
				},
				None => {
					tracing::warn!("Outfit plan has no usable categories; using keyword fallback.");

					plan::fallback_plan(query)
				},
			},
			LlmJson::Unparsable { reason } => {
				tracing::warn!(reason = %reason, "Outfit plan is not JSON; using keyword fallback.");

				plan::fallback_plan(query)
			},
		}
	}

	fn known_categories(&self) -> Vec<String> {
		self.ctx.categories.categories().map(str::to_string).collect()
	}
}

fn build_plan_messages(query: &str, categories: &[String]) -> Vec<Value> {
	let mut user = format!("Shopper request: {query}");

	if !categories.is_empty() {
		user.push_str("\nPrefer these category names: ");
		user.push_str(&categories.join(", "));
	}

	vec![
		serde_json::json!({ "role": "system", "content": PLAN_SYSTEM_PROMPT }),
		serde_json::json!({ "role": "user", "content": user }),
	]
}
