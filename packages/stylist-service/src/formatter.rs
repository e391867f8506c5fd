//! Deterministic response templates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::executor::SearchResult;

pub const NO_RESULTS_MESSAGE: &str =
	"I couldn't find any items matching your request. Please try a different search term.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleScore {
	pub article_id: String,
	pub relevance_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedResponse {
	pub summary_text: String,
	pub categorized_articles: BTreeMap<String, Vec<ArticleScore>>,
}
impl FormattedResponse {
	pub fn has_results(&self) -> bool {
		!self.categorized_articles.is_empty()
	}
}

/// Keeps the executor's hit order within each category; scores are rounded to four decimals.
pub fn format_results(
	categorized: &[(String, Vec<SearchResult>)],
	query: &str,
	is_single_item: bool,
) -> FormattedResponse {
	let found: Vec<&(String, Vec<SearchResult>)> =
		categorized.iter().filter(|(_, hits)| !hits.is_empty()).collect();

	if found.is_empty() {
		return FormattedResponse {
			summary_text: NO_RESULTS_MESSAGE.to_string(),
			categorized_articles: BTreeMap::new(),
		};
	}

	let names: Vec<&str> = found.iter().map(|(category, _)| category.as_str()).collect();
	let summary_text = if is_single_item {
		format!("Here are some great options for '{query}'. Found matches in: {}.", names.join(", "))
	} else {
		format!(
			"Here's a complete outfit recommendation for '{query}'. Found matches in: {}.",
			names.join(", ")
		)
	};
	let mut categorized_articles: BTreeMap<String, Vec<ArticleScore>> = BTreeMap::new();

	for (category, hits) in found {
		categorized_articles.entry(category.clone()).or_default().extend(hits.iter().map(|hit| {
			ArticleScore {
				article_id: hit.article_id.clone(),
				relevance_score: round_score(hit.score),
			}
		}));
	}

	FormattedResponse { summary_text, categorized_articles }
}

fn round_score(score: f32) -> f64 {
	(f64::from(score) * 10_000.0).round() / 10_000.0
}
