use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

pub const CONVERSATION_KEY_PREFIX: &str = "conversation";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
	User,
	Assistant,
}
impl Display for Role {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::User => f.write_str("User"),
			Self::Assistant => f.write_str("Assistant"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
	pub role: Role,
	pub content: String,
}
impl ConversationTurn {
	pub fn user(content: impl Into<String>) -> Self {
		Self { role: Role::User, content: content.into() }
	}

	pub fn assistant(content: impl Into<String>) -> Self {
		Self { role: Role::Assistant, content: content.into() }
	}
}

pub fn conversation_key(session_id: &str) -> String {
	format!("{CONVERSATION_KEY_PREFIX}:{session_id}")
}

/// Renders turns oldest first as `- Role: content` lines for prompt inclusion.
pub fn render_history(turns: &[ConversationTurn]) -> String {
	turns
		.iter()
		.map(|turn| format!("- {}: {}", turn.role, turn.content))
		.collect::<Vec<_>>()
		.join("\n")
}
