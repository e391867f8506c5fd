use std::{collections::HashMap, time::Duration};

use qdrant_client::{
	Qdrant,
	qdrant::{
		Condition, Filter, PointId, Query, QueryPointsBuilder, ScoredPoint, Value,
		point_id::PointIdOptions, value::Kind,
	},
};

use stylist_domain::filter::{Clause, FilterExpr};

use crate::Result;

pub const ARTICLE_ID_FIELD: &str = "article_id";

/// One nearest-neighbour hit. `score` is cosine similarity, higher is closer.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredArticle {
	pub article_id: String,
	pub score: f32,
}

pub struct QdrantStore {
	pub client: Qdrant,
	pub collection: String,
	pub vector_dim: u32,
	pub vector_name: Option<String>,
}
impl QdrantStore {
	pub fn new(cfg: &stylist_config::Qdrant) -> Result<Self> {
		let client =
			Qdrant::from_url(&cfg.url).timeout(Duration::from_millis(cfg.timeout_ms)).build()?;

		Ok(Self {
			client,
			collection: cfg.collection.clone(),
			vector_dim: cfg.vector_dim,
			vector_name: cfg.vector_name.clone(),
		})
	}

	pub async fn collection_exists(&self) -> Result<bool> {
		Ok(self.client.collection_exists(self.collection.clone()).await?)
	}

	pub async fn search(
		&self,
		vector: Vec<f32>,
		limit: u64,
		filter: Option<&FilterExpr>,
	) -> Result<Vec<ScoredArticle>> {
		let mut search = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector))
			.with_payload(true)
			.limit(limit);

		if let Some(name) = self.vector_name.as_ref() {
			search = search.using(name.clone());
		}
		if let Some(expr) = filter {
			search = search.filter(filter_from_expr(expr));
		}

		let response = self.client.query(search).await?;

		Ok(response.result.into_iter().filter_map(scored_article).collect())
	}
}

pub fn filter_from_expr(expr: &FilterExpr) -> Filter {
	let conditions: Vec<Condition> = expr
		.clauses()
		.iter()
		.map(|clause| match clause {
			Clause::Eq { field, value } => Condition::matches(field.as_str(), value.clone()),
			Clause::In { field, values } => Condition::matches(field.as_str(), values.clone()),
		})
		.collect();

	Filter::must(conditions)
}

fn scored_article(point: ScoredPoint) -> Option<ScoredArticle> {
	let article_id = payload_text(&point.payload, ARTICLE_ID_FIELD)
		.or_else(|| point.id.as_ref().and_then(point_id_text))?;

	Some(ScoredArticle { article_id, score: point.score })
}

fn payload_text(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	payload.get(key).and_then(value_text)
}

fn value_text(value: &Value) -> Option<String> {
	match &value.kind {
		Some(Kind::StringValue(text)) => Some(text.to_string()),
		Some(Kind::IntegerValue(number)) => Some(number.to_string()),
		_ => None,
	}
}

fn point_id_text(point_id: &PointId) -> Option<String> {
	match &point_id.point_id_options {
		Some(PointIdOptions::Num(number)) => Some(number.to_string()),
		Some(PointIdOptions::Uuid(id)) => Some(id.clone()),
		None => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use stylist_domain::filter::{FilterValue, Filters};

	#[test]
	fn each_clause_becomes_a_must_condition() {
		let mut filters = Filters::new();

		filters.insert("colour_group_name".to_string(), FilterValue::Scalar("Black".to_string()));
		filters.insert(
			"product_type_name".to_string(),
			FilterValue::Set(vec!["Trousers".to_string(), "Shorts".to_string()]),
		);

		let expr = FilterExpr::from_filters(&filters).expect("Expected expression.");
		let filter = filter_from_expr(&expr);

		assert_eq!(filter.must.len(), 2);
		assert!(filter.should.is_empty());
		assert!(filter.must_not.is_empty());
	}

	#[test]
	fn article_id_reads_strings_and_integers() {
		let mut payload = HashMap::new();

		payload.insert(ARTICLE_ID_FIELD.to_string(), Value::from("0108775015"));

		assert_eq!(payload_text(&payload, ARTICLE_ID_FIELD), Some("0108775015".to_string()));

		payload.insert(ARTICLE_ID_FIELD.to_string(), Value::from(108_775_015_i64));

		assert_eq!(payload_text(&payload, ARTICLE_ID_FIELD), Some("108775015".to_string()));
	}

	#[test]
	fn numeric_point_ids_render_as_text() {
		let id = PointId::from(42_u64);

		assert_eq!(point_id_text(&id), Some("42".to_string()));
	}
}
