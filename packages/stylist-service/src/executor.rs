use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::Instrument;

use stylist_domain::{
	filter::{self, FilterExpr},
	plan::SearchPlan,
};

use crate::{Context, bounded, embedder};

/// One hit retrieved for a planned category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
	pub article_id: String,
	pub score: f32,
	pub category: String,
}

/// Hits grouped by category, in plan order.
pub type CategorizedResults = Vec<(String, Vec<SearchResult>)>;

/// Runs one filtered vector search per planned category.
#[derive(Clone)]
pub struct SearchExecutor {
	ctx: Arc<Context>,
}
impl SearchExecutor {
	pub fn new(ctx: Arc<Context>) -> Self {
		Self { ctx }
	}

	/// `plan.filters` must already be scoped for the plan. Failures are logged and yield no hits.
	pub async fn search_category(
		&self,
		plan: &SearchPlan,
		category: &str,
		description: &str,
		top_k: u32,
	) -> Vec<SearchResult> {
		let filters =
			filter::with_category_constraint(plan.filters.clone(), category, &self.ctx.categories);
		let expr = FilterExpr::from_filters(&filters);
		let rendered = expr.as_ref().map(ToString::to_string).unwrap_or_default();

		tracing::info!(category, description, filter = %rendered, top_k, "Category search.");

		let vector = match embedder::embed_text(&self.ctx, description).await {
			Ok(vector) => vector,
			Err(err) => {
				tracing::warn!(error = %err, category, "Category embedding failed; skipping.");

				return Vec::new();
			},
		};
		let hits = match bounded(
			"vector search",
			self.ctx.index_timeout(),
			self.ctx.index.search(vector, top_k, expr.as_ref()),
		)
		.await
		{
			Ok(hits) => hits,
			Err(err) => {
				tracing::warn!(error = %err, category, "Category search failed; skipping.");

				return Vec::new();
			},
		};

		hits.into_iter()
			.map(|hit| SearchResult {
				article_id: hit.article_id,
				score: hit.score,
				category: category.to_string(),
			})
			.collect()
	}

	/// Searches every planned category concurrently and merges hits in plan order.
	///
	/// Empty categories are omitted and repeated categories share one entry. Dropping the
	/// returned future aborts the in-flight searches.
	pub async fn execute(&self, plan: &SearchPlan, query: &str, top_k: u32) -> CategorizedResults {
		let tasks = plan.tasks(query);
		let shared_plan = Arc::new(plan.clone());
		let mut set = JoinSet::new();

		for (position, (category, description)) in tasks.into_iter().enumerate() {
			let executor = self.clone();
			let plan = shared_plan.clone();

			set.spawn(
				async move {
					let hits = executor.search_category(&plan, &category, &description, top_k).await;

					(position, category, hits)
				}
				.in_current_span(),
			);
		}

		let mut slots: Vec<Option<(String, Vec<SearchResult>)>> = vec![None; plan.categories.len()];

		while let Some(joined) = set.join_next().await {
			match joined {
				Ok((position, category, hits)) => {
					if let Some(slot) = slots.get_mut(position) {
						*slot = Some((category, hits));
					}
				},
				Err(err) => {
					tracing::warn!(error = %err, "Category search task aborted.");
				},
			}
		}

		merge_in_plan_order(slots.into_iter().flatten())
	}
}

fn merge_in_plan_order<I>(ordered: I) -> CategorizedResults
where
	I: IntoIterator<Item = (String, Vec<SearchResult>)>,
{
	let mut merged: CategorizedResults = Vec::new();

	for (category, hits) in ordered {
		if hits.is_empty() {
			continue;
		}

		match merged.iter_mut().find(|(name, _)| *name == category) {
			Some((_, existing)) => existing.extend(hits),
			None => merged.push((category, hits)),
		}
	}

	merged
}
