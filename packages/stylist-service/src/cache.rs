//! Layered query cache: final responses, plans, and extracted filters.
//!
//! Every operation degrades to a miss or a no-op when the store is slow or unavailable.

use std::{sync::Arc, time::Duration};

use serde::{Serialize, de::DeserializeOwned};

use stylist_config::Cache as CacheConfig;

use crate::{KeyValueStore, bounded};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
	/// Formatted responses, looked up by raw and by refined query text.
	Response,
	Plan,
	Filters,
}
impl CacheKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Response => "agent",
			Self::Plan => "plan",
			Self::Filters => "filters",
		}
	}
}

pub fn normalize_query(text: &str) -> String {
	text.trim().to_lowercase()
}

pub fn cache_key(kind: CacheKind, text: &str) -> String {
	let digest = blake3::hash(normalize_query(text).as_bytes());

	format!("cache:{}:{}", kind.as_str(), digest.to_hex())
}

pub fn cache_key_prefix(key: &str) -> &str {
	let digest = key.rsplit(':').next().unwrap_or(key);
	let len = digest.len().min(12);

	&digest[..len]
}

#[derive(Clone)]
pub struct QueryCache {
	store: Arc<dyn KeyValueStore>,
	cfg: CacheConfig,
	timeout: Duration,
}
impl QueryCache {
	pub fn new(store: Arc<dyn KeyValueStore>, cfg: CacheConfig, timeout: Duration) -> Self {
		Self { store, cfg, timeout }
	}

	pub fn ttl(&self, kind: CacheKind) -> Duration {
		let secs = match kind {
			CacheKind::Response => self.cfg.response_ttl_secs,
			CacheKind::Plan => self.cfg.plan_ttl_secs,
			CacheKind::Filters => self.cfg.filter_ttl_secs,
		};

		Duration::from_secs(secs)
	}

	pub async fn fetch<T>(&self, kind: CacheKind, text: &str) -> Option<T>
	where
		T: DeserializeOwned,
	{
		if !self.cfg.enabled {
			return None;
		}

		let key = cache_key(kind, text);
		let ttl_secs = self.ttl(kind).as_secs();

		match bounded("cache read", self.timeout, self.store.get_json(&key)).await {
			Ok(Some(payload)) => match serde_json::from_value(payload) {
				Ok(value) => {
					tracing::info!(
						cache_kind = kind.as_str(),
						cache_key_prefix = cache_key_prefix(&key),
						hit = true,
						ttl_secs,
						"Cache hit."
					);

					Some(value)
				},
				Err(err) => {
					tracing::warn!(
						error = %err,
						cache_kind = kind.as_str(),
						cache_key_prefix = cache_key_prefix(&key),
						"Cache payload decode failed."
					);

					None
				},
			},
			Ok(None) => {
				tracing::info!(
					cache_kind = kind.as_str(),
					cache_key_prefix = cache_key_prefix(&key),
					hit = false,
					ttl_secs,
					"Cache miss."
				);

				None
			},
			Err(err) => {
				tracing::warn!(
					error = %err,
					cache_kind = kind.as_str(),
					cache_key_prefix = cache_key_prefix(&key),
					"Cache read failed."
				);

				None
			},
		}
	}

	pub async fn store<T>(&self, kind: CacheKind, text: &str, value: &T)
	where
		T: Serialize,
	{
		if !self.cfg.enabled {
			return;
		}

		let key = cache_key(kind, text);
		let ttl = self.ttl(kind);
		let payload = match serde_json::to_value(value) {
			Ok(payload) => payload,
			Err(err) => {
				tracing::warn!(
					error = %err,
					cache_kind = kind.as_str(),
					cache_key_prefix = cache_key_prefix(&key),
					"Cache payload encode failed."
				);

				return;
			},
		};

		match bounded("cache write", self.timeout, self.store.set_json(&key, payload, ttl)).await {
			Ok(()) => {
				tracing::info!(
					cache_kind = kind.as_str(),
					cache_key_prefix = cache_key_prefix(&key),
					ttl_secs = ttl.as_secs(),
					"Cache stored."
				);
			},
			Err(err) => {
				tracing::warn!(
					error = %err,
					cache_kind = kind.as_str(),
					cache_key_prefix = cache_key_prefix(&key),
					"Cache write failed."
				);
			},
		}
	}
}
