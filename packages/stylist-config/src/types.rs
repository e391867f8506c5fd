use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub cache: Cache,
	#[serde(default)]
	pub conversation: Conversation,
	#[serde(default)]
	pub catalog: Catalog,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
	/// Prefix for article image URLs, e.g. "http://127.0.0.1:8000/".
	#[serde(default = "default_public_base_url")]
	pub public_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub qdrant: Qdrant,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
	/// Upper bound for a single store round trip.
	#[serde(default = "default_store_timeout_ms")]
	pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
	/// Named vector to query. Unnamed collections leave this unset.
	#[serde(default)]
	pub vector_name: Option<String>,
	#[serde(default = "default_qdrant_timeout_ms")]
	pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub llm: LlmProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	#[serde(default)]
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	#[serde(default)]
	pub api_key: String,
	pub path: String,
	pub model: String,
	#[serde(default = "default_llm_temperature")]
	pub temperature: f32,
	#[serde(default = "default_llm_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Search {
	pub default_top_k: u32,
	pub max_top_k: u32,
	/// Scalar payload fields the filter extractor is allowed to emit.
	pub filter_fields: Vec<String>,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			default_top_k: 20,
			max_top_k: 100,
			filter_fields: vec![
				"index_name".to_string(),
				"product_type_name".to_string(),
				"colour_group_name".to_string(),
				"graphical_appearance_name".to_string(),
			],
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Cache {
	pub enabled: bool,
	pub response_ttl_secs: u64,
	pub plan_ttl_secs: u64,
	pub filter_ttl_secs: u64,
	pub purge_interval_secs: u64,
}
impl Default for Cache {
	fn default() -> Self {
		Self {
			enabled: true,
			response_ttl_secs: 3_600,
			plan_ttl_secs: 86_400,
			filter_ttl_secs: 86_400,
			purge_interval_secs: 600,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Conversation {
	pub max_entries: u32,
	pub ttl_secs: u64,
}
impl Default for Conversation {
	fn default() -> Self {
		Self { max_entries: 10, ttl_secs: 1_800 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Catalog {
	pub category_map_key: String,
	pub article_key_prefix: String,
	/// Seed used when the hash store holds no category map yet.
	pub category_map: BTreeMap<String, Vec<String>>,
}
impl Default for Catalog {
	fn default() -> Self {
		Self {
			category_map_key: "app:category_map".to_string(),
			article_key_prefix: "article".to_string(),
			category_map: default_category_map(),
		}
	}
}

fn default_public_base_url() -> String {
	"http://127.0.0.1:8000/".to_string()
}

fn default_store_timeout_ms() -> u64 {
	2_000
}

fn default_qdrant_timeout_ms() -> u64 {
	10_000
}

fn default_llm_temperature() -> f32 {
	0.1
}

fn default_llm_timeout_ms() -> u64 {
	120_000
}

fn default_category_map() -> BTreeMap<String, Vec<String>> {
	let entries: [(&str, &[&str]); 11] = [
		("shirt", &["Shirt", "Blouse", "Top", "Polo shirt", "T-shirt", "Vest top"]),
		("pants", &["Trousers", "Shorts", "Leggings/Tights", "Outdoor trousers", "Pyjama bottom"]),
		(
			"jacket",
			&[
				"Jacket",
				"Blazer",
				"Coat",
				"Cardigan",
				"Hoodie",
				"Sweater",
				"Outdoor Waistcoat",
				"Robe",
			],
		),
		(
			"shoes",
			&[
				"Boots",
				"Sneakers",
				"Pumps",
				"Heels",
				"Sandals",
				"Ballerinas",
				"Flat shoes",
				"Moccasins",
				"Slippers",
				"Heeled sandals",
				"Wedge",
				"Bootie",
			],
		),
		("tie", &["Tie"]),
		("belt", &["Belt"]),
		("dress", &["Dress", "Jumpsuit/Playsuit", "Dungarees", "Underdress", "Robe"]),
		(
			"handbag",
			&[
				"Bag",
				"Backpack",
				"Bumbag",
				"Cross-body bag",
				"Shoulder bag",
				"Tote bag",
				"Wallet",
			],
		),
		("jewelry", &["Earring", "Earrings", "Necklace", "Ring", "Bracelet", "Accessories set"]),
		("accessories", &["Scarf", "Gloves", "Hat/beanie", "Cap", "Sunglasses", "Watch"]),
		("swimwear", &["Swimsuit", "Swimwear bottom", "Swimwear top", "Bikini top"]),
	];

	entries
		.into_iter()
		.map(|(name, types)| {
			(name.to_string(), types.iter().map(|value| value.to_string()).collect())
		})
		.collect()
}
