//! Single client for every generative text/vision call in the pipeline.
//!
//! All four call sites (classify, locate diagram, narrative, crop region) go
//! through [`LlmClient::extract`]: send one user message, optionally with an
//! inlined base64 PNG, strip a markdown code fence off the reply, parse JSON
//! into the caller's expected shape.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::config::OPENAI_BASE_URL;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned {status}: {body}")]
    Api { status: StatusCode, body: String },

    #[error("response contained no text payload")]
    Empty,

    #[error("reply was not the expected JSON shape: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One structured-extraction request. Vision calls attach the raw PNG bytes;
/// text calls leave `image_png` empty.
pub struct ExtractRequest<'a> {
    pub model: &'a str,
    pub prompt: String,
    pub image_png: Option<&'a [u8]>,
    pub temperature: f64,
    pub max_tokens: u32,
}

pub struct LlmClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl LlmClient {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable must be set"))?;
        Ok(Self::new(OPENAI_BASE_URL, api_key))
    }

    pub fn new(base_url: &str, api_key: String) -> Self {
        // No client timeout here: generative calls ride on the service's own
        // defaults, unlike the page/PDF fetches.
        Self {
            http: reqwest::Client::new(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
        }
    }

    /// Ask the service for a JSON object of shape `T`.
    pub async fn extract<T: DeserializeOwned>(
        &self,
        req: &ExtractRequest<'_>,
    ) -> Result<T, LlmError> {
        let content = match req.image_png {
            Some(png) => {
                let data_uri = format!("data:image/png;base64,{}", BASE64.encode(png));
                json!([
                    { "type": "text", "text": req.prompt },
                    { "type": "image_url", "image_url": { "url": data_uri } },
                ])
            }
            None => json!(req.prompt),
        };

        let body = json!({
            "model": req.model,
            "messages": [{ "role": "user", "content": content }],
            "temperature": req.temperature,
            "max_tokens": req.max_tokens,
        });

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_else(|_| "<body unavailable>".into());
            return Err(LlmError::Api { status, body });
        }

        let parsed: ChatResponse = resp.json().await?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(LlmError::Empty)?;

        let cleaned = strip_code_fence(&text);
        Ok(serde_json::from_str(cleaned)?)
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

/// Strip an optional ```json ... ``` wrapper off a model reply.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.trim_start_matches(['\r', '\n']);
    match rest.find("```") {
        Some(end) => rest[..end].trim(),
        None => rest.trim(),
    }
}
