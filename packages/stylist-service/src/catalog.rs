//! Catalog lookups around the pipeline: the category map and per-article records.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use stylist_config::Config;
use stylist_domain::category::CategoryMap;

use crate::{Context, KeyValueStore, bounded, formatter::FormattedResponse};

const ARTICLE_ID_WIDTH: usize = 10;

pub type EnrichedArticles = BTreeMap<String, Vec<Map<String, Value>>>;

/// Reads the category map from the hash store, seeding it from configuration when absent.
pub async fn load_category_map(store: &dyn KeyValueStore, cfg: &Config) -> CategoryMap {
	let key = cfg.catalog.category_map_key.as_str();
	let timeout = std::time::Duration::from_millis(cfg.storage.postgres.timeout_ms);

	match bounded("category map read", timeout, store.hash_get_all(key)).await {
		Ok(fields) if !fields.is_empty() => {
			let (categories, rejected) = CategoryMap::from_hash_fields(fields);

			if !rejected.is_empty() {
				tracing::warn!(?rejected, "Skipping undecodable category map fields.");
			}
			if !categories.is_empty() {
				tracing::info!(categories = categories.len(), "Category map loaded.");

				return categories;
			}
		},
		Ok(_) => {},
		Err(err) => {
			tracing::warn!(error = %err, "Category map read failed; using configured seed.");
		},
	}

	let seed = CategoryMap::new(cfg.catalog.category_map.clone());

	match bounded("category map seed", timeout, store.hash_set_all(key, seed.to_hash_fields()))
		.await
	{
		Ok(()) => tracing::info!(categories = seed.len(), "Category map seeded."),
		Err(err) => tracing::warn!(error = %err, "Category map seed write failed."),
	}

	seed
}

/// Attaches stored article records and image URLs to each returned article.
///
/// Articles without a stored record keep only `article_id` and `relevance_score`.
pub async fn enrich_articles(ctx: &Context, response: &FormattedResponse) -> EnrichedArticles {
	let mut out = BTreeMap::new();

	for (category, articles) in &response.categorized_articles {
		let mut enriched = Vec::with_capacity(articles.len());

		for article in articles {
			let article_id = catalog_article_id(&article.article_id);
			let record = fetch_article(ctx, &article_id).await;
			let mut item = record.unwrap_or_default();

			if let Some(path) = item.get("image_path").and_then(Value::as_str) {
				let url = image_url(&ctx.cfg.service.public_base_url, path);

				item.insert("image_url".to_string(), Value::String(url));
			}

			item.insert("article_id".to_string(), Value::String(article_id));
			item.insert("relevance_score".to_string(), Value::from(article.relevance_score));
			enriched.push(item);
		}

		out.insert(category.clone(), enriched);
	}

	out
}

/// Left-pads an article identifier with zeros to the catalog's ten-character form.
///
/// Integer point IDs lose their leading zeros in the vector index; longer IDs pass through.
pub fn catalog_article_id(article_id: &str) -> String {
	format!("{article_id:0>ARTICLE_ID_WIDTH$}")
}

pub fn article_key(prefix: &str, article_id: &str) -> String {
	format!("{prefix}:{}", catalog_article_id(article_id))
}

async fn fetch_article(ctx: &Context, article_id: &str) -> Option<Map<String, Value>> {
	let key = article_key(&ctx.cfg.catalog.article_key_prefix, article_id);

	match bounded("article read", ctx.store_timeout(), ctx.store.get_json(&key)).await {
		Ok(Some(Value::Object(record))) => Some(record),
		Ok(_) => None,
		Err(err) => {
			tracing::warn!(error = %err, article_id, "Article record read failed.");

			None
		},
	}
}

fn image_url(public_base_url: &str, image_path: &str) -> String {
	format!("{public_base_url}images/{}", image_path.trim_start_matches('/'))
}
