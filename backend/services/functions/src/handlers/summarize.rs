use actix_web::{post, web, HttpResponse, Responder};
use futures_util::future::join_all;
use log::warn;
use serde_json::json;

use crate::llm::{LlmClient, Summarizer};

/// Rewrites every description concurrently. A failed model call keeps the
/// original text for that item; the batch itself never fails.
pub async fn summarize_batch<S: Summarizer + Sync>(
    summarizer: &S,
    descriptions: &[String],
) -> Vec<String> {
    let rewrites = descriptions.iter().map(|description| async move {
        match summarizer.summarize(description).await {
            Ok(rewritten) => rewritten,
            Err(e) => {
                warn!("Summarization failed, keeping original text: {}", e);
                description.clone()
            }
        }
    });

    join_all(rewrites).await
}

#[post("/summarize-descriptions")]
pub async fn summarize_descriptions(body: web::Json<serde_json::Value>) -> impl Responder {
    let descriptions: Vec<String> = match body
        .get("descriptions")
        .and_then(|value| value.as_array())
    {
        Some(entries) => entries
            .iter()
            .map(|entry| entry.as_str().unwrap_or_default().to_string())
            .collect(),
        None => {
            return HttpResponse::InternalServerError().json(json!({
                "error": "Request body must contain a 'descriptions' array"
            }));
        }
    };

    let client = match LlmClient::from_env() {
        Some(client) => client,
        None => {
            return HttpResponse::InternalServerError().json(json!({
                "error": "LLM API key is not configured"
            }));
        }
    };

    let summarized = summarize_batch(&client, &descriptions).await;

    HttpResponse::Ok().json(json!({
        "summarizedDescriptions": summarized
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;
    use async_trait::async_trait;

    /// Fails on configured indices, prefixes the rest.
    struct FlakyModel {
        failing: Vec<usize>,
        calls: std::sync::Mutex<usize>,
    }

    #[async_trait]
    impl Summarizer for FlakyModel {
        async fn summarize(&self, description: &str) -> Result<String, LlmError> {
            let index = {
                let mut calls = self.calls.lock().unwrap();
                let current = *calls;
                *calls += 1;
                current
            };

            if self.failing.contains(&index) {
                Err(LlmError::Unavailable("boom".to_string()))
            } else {
                Ok(format!("rewritten: {}", description))
            }
        }
    }

    #[tokio::test]
    async fn failed_items_fall_back_to_original_text() {
        let model = FlakyModel {
            failing: vec![1],
            calls: std::sync::Mutex::new(0),
        };
        let descriptions = vec!["a".to_string(), "b".to_string()];

        let result = summarize_batch(&model, &descriptions).await;

        assert_eq!(result.len(), 2);
        assert_eq!(result[0], "rewritten: a");
        assert_eq!(result[1], "b");
    }

    #[tokio::test]
    async fn order_and_length_are_preserved() {
        let model = FlakyModel {
            failing: Vec::new(),
            calls: std::sync::Mutex::new(0),
        };
        let descriptions: Vec<String> = (0..5).map(|i| format!("text {}", i)).collect();

        let result = summarize_batch(&model, &descriptions).await;

        assert_eq!(result.len(), descriptions.len());
        for (i, rewritten) in result.iter().enumerate() {
            assert_eq!(rewritten, &format!("rewritten: text {}", i));
        }
    }

    #[tokio::test]
    async fn empty_batch_yields_empty_result() {
        let model = FlakyModel {
            failing: Vec::new(),
            calls: std::sync::Mutex::new(0),
        };

        let result = summarize_batch(&model, &[]).await;
        assert!(result.is_empty());
    }
}
