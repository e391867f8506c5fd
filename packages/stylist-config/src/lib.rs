mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Cache, Catalog, Config, Conversation, EmbeddingProviderConfig, LlmProviderConfig, Postgres,
	Providers, Qdrant, Search, Service, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}
	if cfg.storage.qdrant.collection.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.collection must be non-empty.".to_string(),
		});
	}

	let temperature = cfg.providers.llm.temperature;

	if !temperature.is_finite() {
		return Err(Error::Validation {
			message: "providers.llm.temperature must be a finite number.".to_string(),
		});
	}
	if !(0.0..=0.5).contains(&temperature) {
		return Err(Error::Validation {
			message: "providers.llm.temperature must be in the range 0.0-0.5.".to_string(),
		});
	}

	for (label, timeout_ms) in [
		("providers.embedding.timeout_ms", cfg.providers.embedding.timeout_ms),
		("providers.llm.timeout_ms", cfg.providers.llm.timeout_ms),
		("storage.qdrant.timeout_ms", cfg.storage.qdrant.timeout_ms),
		("storage.postgres.timeout_ms", cfg.storage.postgres.timeout_ms),
	] {
		if timeout_ms == 0 {
			return Err(Error::Validation {
				message: format!("{label} must be greater than zero."),
			});
		}
	}

	if cfg.search.default_top_k == 0 {
		return Err(Error::Validation {
			message: "search.default_top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.search.default_top_k > cfg.search.max_top_k {
		return Err(Error::Validation {
			message: "search.default_top_k must not exceed search.max_top_k.".to_string(),
		});
	}

	for (label, ttl) in [
		("cache.response_ttl_secs", cfg.cache.response_ttl_secs),
		("cache.plan_ttl_secs", cfg.cache.plan_ttl_secs),
		("cache.filter_ttl_secs", cfg.cache.filter_ttl_secs),
		("cache.purge_interval_secs", cfg.cache.purge_interval_secs),
		("conversation.ttl_secs", cfg.conversation.ttl_secs),
	] {
		if ttl == 0 {
			return Err(Error::Validation { message: format!("{label} must be greater than zero.") });
		}
	}

	if cfg.conversation.max_entries < 2 {
		return Err(Error::Validation {
			message: "conversation.max_entries must be at least 2.".to_string(),
		});
	}
	if cfg.conversation.max_entries % 2 != 0 {
		return Err(Error::Validation {
			message: "conversation.max_entries must be even so exchanges stay paired.".to_string(),
		});
	}
	if cfg.catalog.category_map_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "catalog.category_map_key must be non-empty.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.storage.qdrant.vector_name.as_deref().map(|name| name.trim().is_empty()).unwrap_or(false)
	{
		cfg.storage.qdrant.vector_name = None;
	}
	if !cfg.service.public_base_url.ends_with('/') {
		cfg.service.public_base_url.push('/');
	}

	cfg.search.filter_fields = cfg
		.search
		.filter_fields
		.iter()
		.map(|field| field.trim().to_string())
		.filter(|field| !field.is_empty())
		.collect();
	cfg.catalog.category_map = std::mem::take(&mut cfg.catalog.category_map)
		.into_iter()
		.map(|(name, types)| (name.trim().to_lowercase(), types))
		.filter(|(name, _)| !name.is_empty())
		.collect();
}
