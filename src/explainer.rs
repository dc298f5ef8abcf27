//! # Ingredient Explainer Module
//!
//! Plain-English explanations for ingredient names, produced by a
//! chat-completions language model. The model is asked for a JSON object
//! `{"explanations": {name: text}}` and may leave out ingredients that need
//! no explanation.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

use crate::circuit_breaker::CircuitBreaker;
use crate::config::{ExplainApiConfig, RecoveryConfig};
use crate::errors::LookupError;

/// Ingredient name to explanation text
pub type Explanations = BTreeMap<String, String>;

#[async_trait]
pub trait IngredientExplainer: Send + Sync {
    async fn explain(&self, ingredients: &[String]) -> Result<Explanations, LookupError>;
}

lazy_static! {
    static ref OPENING_FENCE: Regex =
        Regex::new(r"(?i)^```(?:json)?\s*").expect("Opening fence pattern should be valid");
    static ref CLOSING_FENCE: Regex =
        Regex::new(r"\s*```$").expect("Closing fence pattern should be valid");
}

/// Build the prompt sent to the model
pub fn build_prompt(ingredients: &[String]) -> String {
    format!(
        "You are a helpful food and cosmetics ingredient expert. For each of the following \
ingredients, provide a brief, plain-English explanation of what it is and why it is used in \
the product. Keep each explanation to 1-2 sentences max. Be factual and neutral.

If an explanation would only restate the ingredient name (e.g. \"Water is water\", \"Salt is \
salt\"), omit that ingredient from the response entirely.

Ingredients: {}

Respond ONLY with a valid JSON object in this exact format (no markdown, no extra text):
{{
  \"explanations\": {{
    \"Ingredient Name\": \"Brief explanation here.\"
  }}
}}

Each key must exactly match one of the ingredient names provided.",
        ingredients.join(", ")
    )
}

/// Remove a Markdown code fence wrapped around the model output
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let start = OPENING_FENCE.find(text).map_or(0, |m| m.end());
    let text = &text[start..];
    let end = CLOSING_FENCE.find(text).map_or(text.len(), |m| m.start());
    text[..end].trim()
}

/// Parse model output; a missing `explanations` object is an empty map
pub fn parse_explanations(text: &str) -> Result<Explanations, LookupError> {
    #[derive(Deserialize)]
    struct Payload {
        #[serde(default)]
        explanations: Option<Explanations>,
    }

    let payload: Payload = serde_json::from_str(strip_code_fences(text))?;
    Ok(payload.explanations.unwrap_or_default())
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// OpenRouter chat-completions client
pub struct OpenRouterExplainer {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    breaker: CircuitBreaker,
}

impl OpenRouterExplainer {
    /// Returns `None` when no API key is configured
    pub fn from_config(config: &ExplainApiConfig, recovery: RecoveryConfig) -> anyhow::Result<Option<Self>> {
        let Some(api_key) = config.api_key.clone() else {
            return Ok(None);
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        info!(model = %config.model, "Ingredient explainer ready");
        Ok(Some(Self {
            client,
            url: config.url.clone(),
            api_key,
            model: config.model.clone(),
            breaker: CircuitBreaker::new("explainer", recovery),
        }))
    }

    async fn request_once(&self, prompt: &str) -> Result<Explanations, LookupError> {
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(LookupError::Upstream(format!(
                "Explanation API answered {status}: {detail}"
            )));
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| LookupError::Decode("Explanation API returned no content".to_string()))?;

        parse_explanations(&content)
    }
}

#[async_trait]
impl IngredientExplainer for OpenRouterExplainer {
    async fn explain(&self, ingredients: &[String]) -> Result<Explanations, LookupError> {
        debug!(count = ingredients.len(), "Requesting ingredient explanations");
        let prompt = build_prompt(ingredients);
        self.breaker.call(|| self.request_once(&prompt)).await
    }
}
