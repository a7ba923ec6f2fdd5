use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("model unavailable: {0}")]
    Unavailable(String),
}

/// Rewrites event descriptions into a consistent house style. The rules live
/// entirely in the system prompt; the handler never post-processes the output.
const SYSTEM_PROMPT: &str = "Du überarbeitest Veranstaltungsbeschreibungen für ein regionales \
Veranstaltungsportal. Schreibe jede Beschreibung neu, zwischen 200 und 400 Zeichen lang. \
Verwende deutsche Anführungszeichen („…“), entferne sämtliche Emojis, schreibe Datumsangaben \
als „15. März“ und Uhrzeiten als „19:00 Uhr“. Erfinde keine Angaben, die nicht im Text stehen. \
Gib ausschließlich die überarbeitete Beschreibung aus, ohne Kommentar und ohne Anrede.";

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[async_trait]
pub trait Summarizer {
    async fn summarize(&self, description: &str) -> Result<String, LlmError>;
}

pub struct LlmClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl LlmClient {
    /// `None` when no API key is configured; the handler turns that into a
    /// 500 before touching any description.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("LLM_API_KEY").ok().filter(|k| !k.is_empty())?;
        let base_url =
            std::env::var("LLM_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Some(Self {
            client: Client::new(),
            base_url,
            model,
            api_key,
        })
    }
}

#[async_trait]
impl Summarizer for LlmClient {
    async fn summarize(&self, description: &str) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        let payload = json!({
            "model": self.model,
            "temperature": 0.3,
            "max_tokens": 400,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": description },
            ],
        });

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|err| LlmError::Unavailable(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| LlmError::Unavailable(err.to_string()))?;

        if !status.is_success() {
            return Err(LlmError::Unavailable(format!("HTTP {}: {}", status, body)));
        }

        let value: serde_json::Value = serde_json::from_str(&body)
            .map_err(|err| LlmError::Unavailable(err.to_string()))?;

        value
            .get("choices")
            .and_then(|choices| choices.as_array())
            .and_then(|choices| choices.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| LlmError::Unavailable("response missing content".to_string()))
    }
}
