//! Production collaborators: Postgres as the key/value store and Qdrant as the vector index.

use std::{collections::HashMap, time::Duration};

use serde_json::Value;
use time::OffsetDateTime;

use stylist_domain::filter::FilterExpr;
use stylist_storage::{
	db::Db,
	kv,
	qdrant::{QdrantStore, ScoredArticle},
};

use crate::{BoxFuture, KeyValueStore, Result, VectorIndex};

impl KeyValueStore for Db {
	fn get_json<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Value>>> {
		Box::pin(async move { Ok(kv::get_json(&self.pool, key, OffsetDateTime::now_utc()).await?) })
	}

	fn set_json<'a>(
		&'a self,
		key: &'a str,
		value: Value,
		ttl: Duration,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let now = OffsetDateTime::now_utc();

			kv::set_json(&self.pool, key, &value, now, Some(now + ttl)).await?;

			Ok(())
		})
	}

	fn list_range<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Vec<Value>>> {
		Box::pin(async move { Ok(kv::list_range(&self.pool, key, OffsetDateTime::now_utc()).await?) })
	}

	fn list_push_trim_expire<'a>(
		&'a self,
		key: &'a str,
		items: Vec<Value>,
		max_len: u32,
		ttl: Duration,
	) -> BoxFuture<'a, Result<u64>> {
		Box::pin(async move {
			let now = OffsetDateTime::now_utc();

			Ok(kv::list_push_trim_expire(&self.pool, key, &items, max_len, now, now + ttl).await?)
		})
	}

	fn hash_get_all<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<HashMap<String, String>>> {
		Box::pin(async move { Ok(kv::hash_get_all(&self.pool, key).await?) })
	}

	fn hash_set_all<'a>(
		&'a self,
		key: &'a str,
		fields: Vec<(String, String)>,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move { Ok(kv::hash_set_all(&self.pool, key, &fields).await?) })
	}
}

impl VectorIndex for QdrantStore {
	fn search<'a>(
		&'a self,
		vector: Vec<f32>,
		top_k: u32,
		filter: Option<&'a FilterExpr>,
	) -> BoxFuture<'a, Result<Vec<ScoredArticle>>> {
		Box::pin(async move { Ok(QdrantStore::search(self, vector, u64::from(top_k), filter).await?) })
	}
}
