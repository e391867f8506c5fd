//! Lenient JSON recovery for language-model output.
//!
//! Models wrap JSON in prose or code fences often enough that the raw text is never parsed
//! directly. The slice between the first `{` and the last `}` is parsed instead, and the caller
//! always receives a tagged result rather than a decode error.

use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum LlmJson {
	Parsed(Map<String, Value>),
	Unparsable { reason: String },
}
#[cfg(test)]
impl LlmJson {
	pub(crate) fn into_object(self) -> Option<Map<String, Value>> {
		match self {
			Self::Parsed(map) => Some(map),
			Self::Unparsable { .. } => None,
		}
	}
}

pub fn extract_json_object(raw: &str) -> LlmJson {
	let Some(start) = raw.find('{') else {
		return LlmJson::Unparsable { reason: "no opening brace in model output".to_string() };
	};
	let Some(end) = raw.rfind('}') else {
		return LlmJson::Unparsable { reason: "no closing brace in model output".to_string() };
	};

	if end < start {
		return LlmJson::Unparsable {
			reason: "closing brace precedes opening brace".to_string(),
		};
	}

	match serde_json::from_str::<Value>(&raw[start..=end]) {
		Ok(Value::Object(map)) => LlmJson::Parsed(map),
		Ok(_) => LlmJson::Unparsable { reason: "model output is not a JSON object".to_string() },
		Err(err) => LlmJson::Unparsable { reason: err.to_string() },
	}
}
