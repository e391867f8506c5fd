mod support;

use std::collections::BTreeMap;

use serde_json::json;

use stylist_service::{
	ArticleScore, FormattedResponse,
	catalog::{enrich_articles, load_category_map},
};

use support::{Harness, ScriptedLlm, outfit_index, test_config};

#[tokio::test]
async fn empty_store_is_seeded_from_configuration() {
	let harness = Harness::new(ScriptedLlm::new(), outfit_index());
	let cfg = test_config();
	let categories = load_category_map(harness.store.as_ref(), &cfg).await;

	assert_eq!(categories.len(), cfg.catalog.category_map.len());

	let hashes = harness.store.hashes.lock().unwrap_or_else(|err| err.into_inner());
	let stored = hashes.get(&cfg.catalog.category_map_key).expect("Seed was not written.");

	assert_eq!(stored.len(), cfg.catalog.category_map.len());
	assert!(stored.contains_key("shirt"));
}

#[tokio::test]
async fn stored_category_map_wins_over_seed() {
	let harness = Harness::new(ScriptedLlm::new(), outfit_index());
	let cfg = test_config();

	harness.store.hashes.lock().unwrap_or_else(|err| err.into_inner()).insert(
		cfg.catalog.category_map_key.clone(),
		[
			("Dress".to_string(), r#"["Dress", "Jumpsuit"]"#.to_string()),
			("broken".to_string(), "not json".to_string()),
		]
		.into_iter()
		.collect(),
	);

	let categories = load_category_map(harness.store.as_ref(), &cfg).await;

	assert_eq!(categories.len(), 1);
	assert_eq!(
		categories.product_types("dress"),
		Some(&["Dress".to_string(), "Jumpsuit".to_string()][..])
	);
}

#[tokio::test]
async fn unreachable_store_falls_back_to_seed() {
	let harness = Harness::new(ScriptedLlm::new(), outfit_index());
	let cfg = test_config();

	harness.store.set_offline(true);

	let categories = load_category_map(harness.store.as_ref(), &cfg).await;

	assert!(categories.product_types("pants").is_some());
}

#[tokio::test]
async fn articles_are_enriched_with_records_and_image_urls() {
	let harness = Harness::new(ScriptedLlm::new(), outfit_index());

	harness.store.insert_entry(
		"article:0108775015",
		json!({ "prod_name": "Relaxed chinos", "image_path": "/010/0108775015.jpg" }),
	);

	let response = FormattedResponse {
		summary_text: "Here are some great options for 'chinos'. Found matches in: pants.".to_string(),
		categorized_articles: BTreeMap::from([(
			"pants".to_string(),
			vec![
				ArticleScore { article_id: "0108775015".to_string(), relevance_score: 0.91 },
				ArticleScore { article_id: "0108775044".to_string(), relevance_score: 0.42 },
			],
		)]),
	};
	let enriched = enrich_articles(&harness.ctx, &response).await;
	let pants = &enriched["pants"];

	assert_eq!(pants[0]["prod_name"], "Relaxed chinos");
	assert_eq!(pants[0]["image_url"], "http://127.0.0.1:8000/images/010/0108775015.jpg");
	assert_eq!(pants[0]["relevance_score"], 0.91);
	assert_eq!(pants[1].len(), 2);
	assert_eq!(pants[1]["article_id"], "0108775044");
}

#[tokio::test]
async fn unpadded_index_ids_resolve_to_catalog_records() {
	let harness = Harness::new(ScriptedLlm::new(), outfit_index());

	harness.store.insert_entry(
		"article:0108775015",
		json!({ "prod_name": "Strap top", "image_path": "/010/0108775015.jpg" }),
	);

	let response = FormattedResponse {
		summary_text: "Here are some great options for 'strap top'. Found matches in: shirt."
			.to_string(),
		categorized_articles: BTreeMap::from([(
			"shirt".to_string(),
			vec![ArticleScore { article_id: "108775015".to_string(), relevance_score: 0.8 }],
		)]),
	};
	let enriched = enrich_articles(&harness.ctx, &response).await;
	let shirt = &enriched["shirt"][0];

	assert_eq!(shirt["article_id"], "0108775015");
	assert_eq!(shirt["prod_name"], "Strap top");
	assert_eq!(shirt["image_url"], "http://127.0.0.1:8000/images/010/0108775015.jpg");
}
