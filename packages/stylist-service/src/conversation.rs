//! Per-session conversation history stored as a bounded, expiring list.

use std::{sync::Arc, time::Duration};

use stylist_config::Conversation as ConversationConfig;
use stylist_domain::conversation::{ConversationTurn, conversation_key};

use crate::{Error, KeyValueStore, Result, bounded};

#[derive(Clone)]
pub struct ConversationManager {
	store: Arc<dyn KeyValueStore>,
	max_entries: u32,
	ttl: Duration,
	timeout: Duration,
}
impl ConversationManager {
	pub fn new(store: Arc<dyn KeyValueStore>, cfg: &ConversationConfig, timeout: Duration) -> Self {
		Self {
			store,
			max_entries: cfg.max_entries,
			ttl: Duration::from_secs(cfg.ttl_secs),
			timeout,
		}
	}

	/// Oldest turn first. Missing sessions, undecodable entries, and store failures all read as
	/// no history.
	pub async fn get_history(&self, session_id: &str) -> Vec<ConversationTurn> {
		let key = conversation_key(session_id);
		let items =
			match bounded("conversation read", self.timeout, self.store.list_range(&key)).await {
				Ok(items) => items,
				Err(err) => {
					tracing::warn!(error = %err, "Conversation history read failed.");

					return Vec::new();
				},
			};

		items
			.into_iter()
			.filter_map(|item| match serde_json::from_value::<ConversationTurn>(item) {
				Ok(turn) => Some(turn),
				Err(err) => {
					tracing::warn!(error = %err, "Skipping undecodable conversation turn.");

					None
				},
			})
			.collect()
	}

	/// Appends the user turn and the assistant turn together, trims the window, and refreshes
	/// the session TTL. Returns the stored history length.
	pub async fn add_turn(
		&self,
		session_id: &str,
		user_query: &str,
		assistant_summary: &str,
	) -> Result<u64> {
		let key = conversation_key(session_id);
		let items = vec![
			serde_json::to_value(ConversationTurn::user(user_query))
				.map_err(|err| Error::Storage { message: err.to_string() })?,
			serde_json::to_value(ConversationTurn::assistant(assistant_summary))
				.map_err(|err| Error::Storage { message: err.to_string() })?,
		];

		bounded(
			"conversation append",
			self.timeout,
			self.store.list_push_trim_expire(&key, items, self.max_entries, self.ttl),
		)
		.await
	}
}
