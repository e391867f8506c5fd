pub mod backends;
pub mod cache;
pub mod catalog;
pub mod conversation;
pub mod embedder;
pub mod executor;
pub mod filterer;
pub mod formatter;
pub mod orchestrator;
pub mod planner;
pub mod refiner;

mod error;

pub use error::{Error, Result};
pub use executor::SearchResult;
pub use formatter::{ArticleScore, FormattedResponse};
pub use orchestrator::{Orchestrator, RecommendOutcome, RecommendRequest, ResponseSource};
pub use stylist_storage::qdrant::ScoredArticle;

use std::{collections::HashMap, future::Future, pin::Pin, sync::Arc, time::Duration};

use serde_json::Value;

use stylist_config::{Config, EmbeddingProviderConfig, LlmProviderConfig};
use stylist_domain::{category::CategoryMap, filter::FilterExpr};
use stylist_providers::{embedding, llm};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>>;
}

pub trait LlmProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, Result<String>>;
}

pub trait VectorIndex
where
	Self: Send + Sync,
{
	/// Hits come back best first. A `None` filter searches the whole collection.
	fn search<'a>(
		&'a self,
		vector: Vec<f32>,
		top_k: u32,
		filter: Option<&'a FilterExpr>,
	) -> BoxFuture<'a, Result<Vec<ScoredArticle>>>;
}

pub trait KeyValueStore
where
	Self: Send + Sync,
{
	fn get_json<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Value>>>;

	fn set_json<'a>(
		&'a self,
		key: &'a str,
		value: Value,
		ttl: Duration,
	) -> BoxFuture<'a, Result<()>>;

	fn list_range<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Vec<Value>>>;

	/// Append, trim to the newest `max_len`, and refresh the expiry as one atomic step.
	fn list_push_trim_expire<'a>(
		&'a self,
		key: &'a str,
		items: Vec<Value>,
		max_len: u32,
		ttl: Duration,
	) -> BoxFuture<'a, Result<u64>>;

	fn hash_get_all<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<HashMap<String, String>>>;

	fn hash_set_all<'a>(
		&'a self,
		key: &'a str,
		fields: Vec<(String, String)>,
	) -> BoxFuture<'a, Result<()>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub llm: Arc<dyn LlmProvider>,
}
impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>, llm: Arc<dyn LlmProvider>) -> Self {
		Self { embedding, llm }
	}

	/// HTTP-backed providers sharing one connection pool.
	pub fn http() -> Result<Self> {
		let provider = Arc::new(HttpProviders { client: stylist_providers::http_client()? });

		Ok(Self { embedding: provider.clone(), llm: provider })
	}
}

/// Everything a request needs, built once at startup and never mutated afterwards.
pub struct Context {
	pub cfg: Config,
	pub providers: Providers,
	pub index: Arc<dyn VectorIndex>,
	pub store: Arc<dyn KeyValueStore>,
	pub categories: CategoryMap,
}
impl Context {
	pub fn new(
		cfg: Config,
		providers: Providers,
		index: Arc<dyn VectorIndex>,
		store: Arc<dyn KeyValueStore>,
		categories: CategoryMap,
	) -> Self {
		Self { cfg, providers, index, store, categories }
	}

	pub fn store_timeout(&self) -> Duration {
		Duration::from_millis(self.cfg.storage.postgres.timeout_ms)
	}

	pub fn index_timeout(&self) -> Duration {
		Duration::from_millis(self.cfg.storage.qdrant.timeout_ms)
	}

	/// One chat completion against the configured model, bounded by its timeout.
	pub async fn complete(&self, messages: &[Value]) -> Result<String> {
		let cfg = &self.cfg.providers.llm;

		bounded(
			"llm completion",
			Duration::from_millis(cfg.timeout_ms),
			self.providers.llm.complete(cfg, messages),
		)
		.await
	}
}

struct HttpProviders {
	client: stylist_providers::Client,
}
impl EmbeddingProvider for HttpProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(async move { Ok(embedding::embed(&self.client, cfg, texts).await?) })
	}
}
impl LlmProvider for HttpProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, Result<String>> {
		Box::pin(async move { Ok(llm::complete(&self.client, cfg, messages).await?) })
	}
}

pub(crate) async fn bounded<T, F>(operation: &str, limit: Duration, fut: F) -> Result<T>
where
	F: Future<Output = Result<T>>,
{
	tokio::time::timeout(limit, fut)
		.await
		.map_err(|_| Error::Timeout { operation: operation.to_string() })?
}
