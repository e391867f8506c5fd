#![allow(dead_code)]

use std::{
	collections::{HashMap, HashSet},
	sync::{
		Arc, Mutex,
		atomic::{AtomicBool, AtomicUsize, Ordering},
	},
	time::Duration,
};

use serde_json::{Map, Value};

use stylist_config::{
	Cache, Catalog, Config, Conversation, EmbeddingProviderConfig, LlmProviderConfig, Postgres,
	Qdrant, Search, Service, Storage,
};
use stylist_domain::{
	category::CategoryMap,
	filter::{Clause, FilterExpr, PRODUCT_TYPE_FIELD},
};
use stylist_service::{
	BoxFuture, Context, EmbeddingProvider, Error, KeyValueStore, LlmProvider, Providers, Result,
	ScoredArticle, VectorIndex,
};

pub const VECTOR_DIM: u32 = 4;
pub const SHORT_TIMEOUT_MS: u64 = 50;

pub fn test_config() -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
			public_base_url: "http://127.0.0.1:8000/".to_string(),
		},
		storage: Storage {
			postgres: Postgres {
				dsn: "postgres://localhost/stylist".to_string(),
				pool_max_conns: 1,
				timeout_ms: 1_000,
			},
			qdrant: Qdrant {
				url: "http://127.0.0.1:6334".to_string(),
				collection: "articles".to_string(),
				vector_dim: VECTOR_DIM,
				vector_name: None,
				timeout_ms: 1_000,
			},
		},
		providers: stylist_config::Providers {
			embedding: EmbeddingProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: String::new(),
				path: "/v1/embeddings".to_string(),
				model: "clip".to_string(),
				dimensions: VECTOR_DIM,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			llm: LlmProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: String::new(),
				path: "/v1/chat/completions".to_string(),
				model: "local".to_string(),
				temperature: 0.1,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
		},
		search: Search::default(),
		cache: Cache::default(),
		conversation: Conversation::default(),
		catalog: Catalog::default(),
	}
}

/// Same as `test_config`, with every backend and provider bounded by `SHORT_TIMEOUT_MS`.
pub fn short_timeout_config() -> Config {
	let mut cfg = test_config();

	cfg.storage.postgres.timeout_ms = SHORT_TIMEOUT_MS;
	cfg.storage.qdrant.timeout_ms = SHORT_TIMEOUT_MS;
	cfg.providers.embedding.timeout_ms = SHORT_TIMEOUT_MS;
	cfg.providers.llm.timeout_ms = SHORT_TIMEOUT_MS;

	cfg
}

/// A future that never resolves.
pub fn stall<'a, T>() -> BoxFuture<'a, T>
where
	T: Send + 'a,
{
	Box::pin(std::future::pending())
}

/// Counts how many stalled calls were dropped before resolving.
pub struct ReleaseGuard(Arc<AtomicUsize>);
impl Drop for ReleaseGuard {
	fn drop(&mut self) {
		self.0.fetch_add(1, Ordering::SeqCst);
	}
}

pub fn test_categories() -> CategoryMap {
	CategoryMap::new([
		("shirt".to_string(), vec!["Shirt".to_string(), "Blouse".to_string()]),
		("pants".to_string(), vec!["Trousers".to_string()]),
		("shoes".to_string(), vec!["Sneakers".to_string(), "Boots".to_string()]),
		("dress".to_string(), vec!["Dress".to_string()]),
	])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
	Refine,
	Plan,
	Filter,
}
impl Stage {
	fn of(messages: &[Value]) -> Option<Self> {
		let system = messages.first()?.get("content")?.as_str()?;

		if system.starts_with("You rewrite") {
			Some(Self::Refine)
		} else if system.starts_with("You plan") {
			Some(Self::Plan)
		} else if system.starts_with("You extract") {
			Some(Self::Filter)
		} else {
			None
		}
	}
}

/// Answers each prompt stage with a fixed reply; stages without a reply fail and stalled stages
/// never answer.
#[derive(Default)]
pub struct ScriptedLlm {
	replies: Mutex<HashMap<Stage, String>>,
	stalled: Mutex<HashSet<Stage>>,
	calls: Mutex<HashMap<Stage, usize>>,
}
impl ScriptedLlm {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn reply(self, stage: Stage, text: &str) -> Self {
		self.replies.lock().unwrap_or_else(|err| err.into_inner()).insert(stage, text.to_string());

		self
	}

	pub fn stall(self, stage: Stage) -> Self {
		self.stalled.lock().unwrap_or_else(|err| err.into_inner()).insert(stage);

		self
	}

	pub fn calls(&self, stage: Stage) -> usize {
		self.calls.lock().unwrap_or_else(|err| err.into_inner()).get(&stage).copied().unwrap_or(0)
	}

	pub fn total_calls(&self) -> usize {
		self.calls.lock().unwrap_or_else(|err| err.into_inner()).values().sum()
	}
}
impl LlmProvider for ScriptedLlm {
	fn complete<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, Result<String>> {
		let stage = Stage::of(messages);

		if let Some(stage) = stage
			&& self.stalled.lock().unwrap_or_else(|err| err.into_inner()).contains(&stage)
		{
			*self.calls.lock().unwrap_or_else(|err| err.into_inner()).entry(stage).or_default() += 1;

			return stall();
		}

		let reply = stage.and_then(|stage| {
			*self
				.calls
				.lock()
				.unwrap_or_else(|err| err.into_inner())
				.entry(stage)
				.or_default() += 1;

			self.replies.lock().unwrap_or_else(|err| err.into_inner()).get(&stage).cloned()
		});

		Box::pin(async move {
			reply.ok_or_else(|| Error::Provider { message: "model unavailable".to_string() })
		})
	}
}

/// Deterministic, non-zero vectors derived from the text bytes.
#[derive(Default)]
pub struct HashEmbedding {
	pub calls: AtomicUsize,
	pub texts: Mutex<Vec<String>>,
}
impl EmbeddingProvider for HashEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.texts.lock().unwrap_or_else(|err| err.into_inner()).extend(texts.iter().cloned());

		let vectors = texts
			.iter()
			.map(|text| {
				let mut vector = vec![1.0_f32; VECTOR_DIM as usize];

				for (idx, byte) in text.bytes().enumerate() {
					vector[idx % VECTOR_DIM as usize] += f32::from(byte) / 255.0;
				}

				vector
			})
			.collect();

		Box::pin(async move { Ok(vectors) })
	}
}

#[derive(Debug, Clone)]
pub struct SearchCall {
	pub filter: Option<String>,
	pub top_k: u32,
}

/// Returns hits keyed by the first product type in the filter's product-type clause.
#[derive(Default)]
pub struct CatalogIndex {
	pub hits_by_type: HashMap<String, Vec<ScoredArticle>>,
	pub unfiltered: Vec<ScoredArticle>,
	pub failing_types: HashSet<String>,
	pub stalled_types: HashSet<String>,
	pub released: Arc<AtomicUsize>,
	pub calls: Mutex<Vec<SearchCall>>,
}
impl CatalogIndex {
	pub fn with_type(mut self, product_type: &str, article_ids: &[&str]) -> Self {
		let hits = article_ids
			.iter()
			.enumerate()
			.map(|(idx, id)| article(id, 0.9 - idx as f32 * 0.1))
			.collect();

		self.hits_by_type.insert(product_type.to_string(), hits);

		self
	}

	pub fn failing(mut self, product_type: &str) -> Self {
		self.failing_types.insert(product_type.to_string());

		self
	}

	/// Searches for `product_type` never answer; `released` counts the ones dropped.
	pub fn stalling(mut self, product_type: &str) -> Self {
		self.stalled_types.insert(product_type.to_string());

		self
	}

	pub fn calls(&self) -> Vec<SearchCall> {
		self.calls.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	pub fn released(&self) -> usize {
		self.released.load(Ordering::SeqCst)
	}
}
impl VectorIndex for CatalogIndex {
	fn search<'a>(
		&'a self,
		_vector: Vec<f32>,
		top_k: u32,
		filter: Option<&'a FilterExpr>,
	) -> BoxFuture<'a, Result<Vec<ScoredArticle>>> {
		self.calls
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.push(SearchCall { filter: filter.map(ToString::to_string), top_k });

		let product_type = filter.and_then(|expr| {
			expr.clauses().iter().find_map(|clause| match clause {
				Clause::In { field, values } if field == PRODUCT_TYPE_FIELD => values.first().cloned(),
				_ => None,
			})
		});
		if let Some(product_type) = product_type.as_ref()
			&& self.stalled_types.contains(product_type)
		{
			let guard = ReleaseGuard(self.released.clone());

			return Box::pin(async move {
				let _guard = guard;

				std::future::pending::<Result<Vec<ScoredArticle>>>().await
			});
		}

		let result = match product_type {
			Some(product_type) if self.failing_types.contains(&product_type) =>
				Err(Error::Qdrant { message: format!("search for {product_type} failed") }),
			Some(product_type) =>
				Ok(self.hits_by_type.get(&product_type).cloned().unwrap_or_default()),
			None => Ok(self.unfiltered.clone()),
		}
		.map(|hits| hits.into_iter().take(top_k as usize).collect::<Vec<_>>());

		Box::pin(async move { result })
	}
}

pub fn article(article_id: &str, score: f32) -> ScoredArticle {
	ScoredArticle { article_id: article_id.to_string(), score }
}

/// In-memory store honoring list caps; TTLs are recorded but not enforced.
#[derive(Default)]
pub struct MemoryStore {
	pub entries: Mutex<HashMap<String, (Value, Duration)>>,
	pub lists: Mutex<HashMap<String, Vec<Value>>>,
	pub hashes: Mutex<HashMap<String, HashMap<String, String>>>,
	pub offline: AtomicBool,
	pub stalled: AtomicBool,
	pub writes: AtomicUsize,
}
impl MemoryStore {
	pub fn set_offline(&self, offline: bool) {
		self.offline.store(offline, Ordering::SeqCst);
	}

	/// While stalled, every call hangs without touching the stored data.
	pub fn set_stalled(&self, stalled: bool) {
		self.stalled.store(stalled, Ordering::SeqCst);
	}

	fn is_stalled(&self) -> bool {
		self.stalled.load(Ordering::SeqCst)
	}

	pub fn entry(&self, key: &str) -> Option<Value> {
		self.entries.lock().unwrap_or_else(|err| err.into_inner()).get(key).map(|(v, _)| v.clone())
	}

	pub fn entry_ttl(&self, key: &str) -> Option<Duration> {
		self.entries.lock().unwrap_or_else(|err| err.into_inner()).get(key).map(|(_, ttl)| *ttl)
	}

	pub fn insert_entry(&self, key: &str, value: Value) {
		self.entries
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.insert(key.to_string(), (value, Duration::from_secs(3_600)));
	}

	pub fn list(&self, key: &str) -> Vec<Value> {
		self.lists.lock().unwrap_or_else(|err| err.into_inner()).get(key).cloned().unwrap_or_default()
	}

	fn check(&self) -> Result<()> {
		if self.offline.load(Ordering::SeqCst) {
			return Err(Error::Storage { message: "store offline".to_string() });
		}

		Ok(())
	}
}
impl KeyValueStore for MemoryStore {
	fn get_json<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Value>>> {
		if self.is_stalled() {
			return stall();
		}

		let result = self.check().map(|()| self.entry(key));

		Box::pin(async move { result })
	}

	fn set_json<'a>(
		&'a self,
		key: &'a str,
		value: Value,
		ttl: Duration,
	) -> BoxFuture<'a, Result<()>> {
		if self.is_stalled() {
			return stall();
		}

		let result = self.check().map(|()| {
			self.writes.fetch_add(1, Ordering::SeqCst);
			self.entries
				.lock()
				.unwrap_or_else(|err| err.into_inner())
				.insert(key.to_string(), (value, ttl));
		});

		Box::pin(async move { result })
	}

	fn list_range<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Vec<Value>>> {
		if self.is_stalled() {
			return stall();
		}

		let result = self.check().map(|()| self.list(key));

		Box::pin(async move { result })
	}

	fn list_push_trim_expire<'a>(
		&'a self,
		key: &'a str,
		items: Vec<Value>,
		max_len: u32,
		_ttl: Duration,
	) -> BoxFuture<'a, Result<u64>> {
		if self.is_stalled() {
			return stall();
		}

		let result = self.check().map(|()| {
			let mut lists = self.lists.lock().unwrap_or_else(|err| err.into_inner());
			let list = lists.entry(key.to_string()).or_default();

			list.extend(items);

			let excess = list.len().saturating_sub(max_len as usize);

			list.drain(..excess);

			list.len() as u64
		});

		Box::pin(async move { result })
	}

	fn hash_get_all<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<HashMap<String, String>>> {
		if self.is_stalled() {
			return stall();
		}

		let result = self.check().map(|()| {
			self.hashes
				.lock()
				.unwrap_or_else(|err| err.into_inner())
				.get(key)
				.cloned()
				.unwrap_or_default()
		});

		Box::pin(async move { result })
	}

	fn hash_set_all<'a>(
		&'a self,
		key: &'a str,
		fields: Vec<(String, String)>,
	) -> BoxFuture<'a, Result<()>> {
		if self.is_stalled() {
			return stall();
		}

		let result = self.check().map(|()| {
			self.hashes
				.lock()
				.unwrap_or_else(|err| err.into_inner())
				.entry(key.to_string())
				.or_default()
				.extend(fields);
		});

		Box::pin(async move { result })
	}
}

pub struct Harness {
	pub ctx: Arc<Context>,
	pub llm: Arc<ScriptedLlm>,
	pub embedding: Arc<HashEmbedding>,
	pub index: Arc<CatalogIndex>,
	pub store: Arc<MemoryStore>,
}
impl Harness {
	pub fn new(llm: ScriptedLlm, index: CatalogIndex) -> Self {
		Self::with_categories(llm, index, test_categories())
	}

	pub fn with_categories(llm: ScriptedLlm, index: CatalogIndex, categories: CategoryMap) -> Self {
		Self::build(llm, index, categories, test_config())
	}

	pub fn with_config(llm: ScriptedLlm, index: CatalogIndex, cfg: Config) -> Self {
		Self::build(llm, index, test_categories(), cfg)
	}

	fn build(llm: ScriptedLlm, index: CatalogIndex, categories: CategoryMap, cfg: Config) -> Self {
		let llm = Arc::new(llm);
		let embedding = Arc::new(HashEmbedding::default());
		let index = Arc::new(index);
		let store = Arc::new(MemoryStore::default());
		let providers = Providers::new(embedding.clone(), llm.clone());
		let ctx = Arc::new(Context::new(
			cfg,
			providers,
			index.clone(),
			store.clone(),
			categories,
		));

		Self { ctx, llm, embedding, index, store }
	}
}

/// The standard three-part outfit catalog.
pub fn outfit_index() -> CatalogIndex {
	CatalogIndex::default()
		.with_type("Shirt", &["0100", "0101"])
		.with_type("Trousers", &["0200", "0201"])
		.with_type("Sneakers", &["0300"])
}
