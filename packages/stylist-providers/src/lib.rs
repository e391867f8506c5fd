pub mod embedding;
pub mod llm;

mod error;

pub use error::{Error, Result};
pub use reqwest::Client;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName};
use serde_json::{Map, Value};

/// One pooled client shared by every provider call. Timeouts are set per request.
pub fn http_client() -> Result<Client> {
	Ok(Client::builder().build()?)
}

/// Local model servers usually run without a key, so the bearer header is optional.
pub fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	if !api_key.trim().is_empty() {
		headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);
	}

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: format!("Default header {key} must be a string."),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}
