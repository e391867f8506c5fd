//! OpenAI-compatible chat completion.

use std::time::Duration;

use reqwest::{Client, Request};
use serde_json::Value;

use crate::{Error, Result};

/// Sends one chat request at the configured temperature and returns the first choice's text.
pub async fn complete(
	client: &Client,
	cfg: &stylist_config::LlmProviderConfig,
	messages: &[Value],
) -> Result<String> {
	let res = client.execute(completion_request(client, cfg, messages)?).await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_completion_text(&json)
}

fn completion_request(
	client: &Client,
	cfg: &stylist_config::LlmProviderConfig,
	messages: &[Value],
) -> Result<Request> {
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"stream": false,
		"messages": messages,
	});

	Ok(client
		.post(url)
		.timeout(Duration::from_millis(cfg.timeout_ms))
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.build()?)
}

fn parse_completion_text(json: &Value) -> Result<String> {
	json.get("choices")
		.and_then(Value::as_array)
		.and_then(|choices| choices.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|message| message.get("content"))
		.and_then(Value::as_str)
		.map(|content| content.to_string())
		.ok_or_else(|| Error::InvalidResponse {
			message: "Completion response is missing choices[0].message.content.".to_string(),
		})
}
