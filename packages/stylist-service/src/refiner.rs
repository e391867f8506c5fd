use std::sync::Arc;

use serde_json::Value;

use stylist_domain::conversation::{ConversationTurn, render_history};

use crate::Context;

const REFINE_SYSTEM_PROMPT: &str = "\
You rewrite fashion search queries. Given a shopper's recent conversation and their newest \
message, produce one standalone search query that carries over any garment, colour, style, \
or occasion the newest message refers back to. Reply with the query text only, no quotes, \
no explanation.";

/// Rewrites follow-up queries into standalone ones using the session history.
#[derive(Clone)]
pub struct QueryRefiner {
	ctx: Arc<Context>,
}
impl QueryRefiner {
	pub fn new(ctx: Arc<Context>) -> Self {
		Self { ctx }
	}

	/// Best effort: an empty history skips the model entirely, and any model failure returns
	/// `query` unchanged.
	pub async fn refine(&self, query: &str, history: &[ConversationTurn]) -> String {
		if history.is_empty() {
			return query.to_string();
		}

		let messages = build_refine_messages(query, history);
		let raw = match self.ctx.complete(&messages).await {
			Ok(raw) => raw,
			Err(err) => {
				tracing::warn!(error = %err, "Query refinement failed; using the original query.");

				return query.to_string();
			},
		};

		match clean_refined_query(&raw) {
			Some(refined) => {
				tracing::info!(refined_query = %refined, "Query refined from history.");

				refined
			},
			None => {
				tracing::warn!("Query refinement returned no text; using the original query.");

				query.to_string()
			},
		}
	}
}

fn build_refine_messages(query: &str, history: &[ConversationTurn]) -> Vec<Value> {
	let user = format!(
		"Conversation so far:\n{}\n\nNewest message: {query}\n\nStandalone search query:",
		render_history(history)
	);

	vec![
		serde_json::json!({ "role": "system", "content": REFINE_SYSTEM_PROMPT }),
		serde_json::json!({ "role": "user", "content": user }),
	]
}

/// First non-empty line with surrounding quotes removed.
fn clean_refined_query(raw: &str) -> Option<String> {
	let line = raw.lines().map(str::trim).find(|line| !line.is_empty())?;
	let unquoted = line.trim_matches(|ch| ch == '"' || ch == '\'' || ch == '`').trim();

	(!unquoted.is_empty()).then(|| unquoted.to_string())
}
