//! Request pipeline: response cache, refinement, planning, filtering, retrieval, formatting.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use stylist_domain::{
	filter::{self, Filters},
	plan::SearchPlan,
};

use crate::{
	Context, Error, Result,
	cache::{CacheKind, QueryCache, normalize_query},
	conversation::ConversationManager,
	executor::SearchExecutor,
	filterer::FilterExtractor,
	formatter::{self, FormattedResponse},
	planner::OutfitPlanner,
	refiner::QueryRefiner,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendRequest {
	pub query: String,
	#[serde(default)]
	pub top_k: Option<u32>,
	#[serde(default)]
	pub session_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
	/// Served from the response cache by raw query text.
	AgentCache,
	/// Served from the response cache by refined query text.
	AgentCacheRefined,
	MultiAgent,
}
impl ResponseSource {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::AgentCache => "agent_cache",
			Self::AgentCacheRefined => "agent_cache_refined",
			Self::MultiAgent => "multi_agent",
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecommendOutcome {
	pub response: FormattedResponse,
	pub source: ResponseSource,
	pub refined_query: String,
}

pub struct Orchestrator {
	ctx: Arc<Context>,
	cache: QueryCache,
	conversations: ConversationManager,
	refiner: QueryRefiner,
	planner: OutfitPlanner,
	filterer: FilterExtractor,
	executor: SearchExecutor,
}
impl Orchestrator {
	pub fn new(ctx: Arc<Context>) -> Self {
		let timeout = ctx.store_timeout();
		let cache = QueryCache::new(ctx.store.clone(), ctx.cfg.cache.clone(), timeout);
		let conversations =
			ConversationManager::new(ctx.store.clone(), &ctx.cfg.conversation, timeout);

		Self {
			cache,
			conversations,
			refiner: QueryRefiner::new(ctx.clone()),
			planner: OutfitPlanner::new(ctx.clone()),
			filterer: FilterExtractor::new(ctx.clone()),
			executor: SearchExecutor::new(ctx.clone()),
			ctx,
		}
	}

	pub fn context(&self) -> &Arc<Context> {
		&self.ctx
	}

	pub fn conversations(&self) -> &ConversationManager {
		&self.conversations
	}

	pub async fn recommend(&self, req: RecommendRequest) -> Result<RecommendOutcome> {
		let query = req.query.trim();

		if query.is_empty() {
			return Err(Error::InvalidRequest { message: "query must be non-empty.".to_string() });
		}

		let top_k = self.resolve_top_k(req.top_k)?;
		let session_id = req.session_id.as_deref().map(str::trim).filter(|id| !id.is_empty());

		if let Some(response) = self.cache.fetch::<FormattedResponse>(CacheKind::Response, query).await
		{
			tracing::info!(source = ResponseSource::AgentCache.as_str(), "Serving cached response.");

			return Ok(RecommendOutcome {
				response,
				source: ResponseSource::AgentCache,
				refined_query: query.to_string(),
			});
		}

		let refined = match session_id {
			Some(id) => {
				let history = self.conversations.get_history(id).await;

				self.refiner.refine(query, &history).await
			},
			None => query.to_string(),
		};

		if normalize_query(&refined) != normalize_query(query)
			&& let Some(response) =
				self.cache.fetch::<FormattedResponse>(CacheKind::Response, &refined).await
		{
			tracing::info!(
				source = ResponseSource::AgentCacheRefined.as_str(),
				"Serving cached response."
			);

			self.record_turn(session_id, query, &response.summary_text).await;

			return Ok(RecommendOutcome {
				response,
				source: ResponseSource::AgentCacheRefined,
				refined_query: refined,
			});
		}

		let mut plan = self.plan(&refined).await;
		let extracted = self.filters(&refined).await;

		plan.filters = filter::scope_filters(&extracted, plan.is_single_item);

		let categorized = self.executor.execute(&plan, &refined, top_k).await;
		let response = formatter::format_results(&categorized, &refined, plan.is_single_item);

		if response.has_results() {
			self.cache.store(CacheKind::Response, &refined, &response).await;
		}

		self.record_turn(session_id, query, &response.summary_text).await;

		tracing::info!(
			source = ResponseSource::MultiAgent.as_str(),
			categories = response.categorized_articles.len(),
			"Recommendation complete."
		);

		Ok(RecommendOutcome { response, source: ResponseSource::MultiAgent, refined_query: refined })
	}

	fn resolve_top_k(&self, requested: Option<u32>) -> Result<u32> {
		let search = &self.ctx.cfg.search;

		match requested {
			None => Ok(search.default_top_k),
			Some(0) => Err(Error::InvalidRequest {
				message: "top_k must be greater than zero.".to_string(),
			}),
			Some(top_k) => Ok(top_k.min(search.max_top_k)),
		}
	}

	async fn plan(&self, refined: &str) -> SearchPlan {
		if let Some(plan) = self.cache.fetch::<SearchPlan>(CacheKind::Plan, refined).await
			&& plan.is_cacheable()
		{
			return plan;
		}

		let plan = self.planner.analyze(refined).await;

		if plan.is_cacheable() {
			self.cache.store(CacheKind::Plan, refined, &plan).await;
		}

		plan
	}

	async fn filters(&self, refined: &str) -> Filters {
		if let Some(filters) = self.cache.fetch::<Filters>(CacheKind::Filters, refined).await {
			return filters;
		}

		let extracted = self.filterer.extract(refined).await;

		if extracted.parsed {
			self.cache.store(CacheKind::Filters, refined, &extracted.filters).await;
		}

		extracted.filters
	}

	async fn record_turn(&self, session_id: Option<&str>, query: &str, summary: &str) {
		let Some(id) = session_id else {
			return;
		};

		if let Err(err) = self.conversations.add_turn(id, query, summary).await {
			tracing::warn!(error = %err, "Conversation append failed.");
		}
	}
}
