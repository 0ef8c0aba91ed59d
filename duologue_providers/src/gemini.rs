use async_trait::async_trait;
use duologue_core::{ChatMessage, LlmProvider, LlmResponse, Role, Usage};
use reqwest::Client;
use serde_json::{Value, json};
use tracing::info;

/// Provider for the Google Generative Language API.
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    max_tokens: usize,
}

impl GeminiProvider {
    #[must_use]
    pub fn new(api_key: String) -> Self {
        info!("Creating GeminiProvider");
        Self {
            client: Client::new(),
            api_key,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            max_tokens: 50,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Map the transcript onto Gemini's request shape: system messages go
    /// into `systemInstruction`, assistant turns become `model` contents.
    fn build_request(messages: &[ChatMessage], max_tokens: usize) -> Value {
        let system_text = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let contents: Vec<Value> = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| {
                let role = match m.role {
                    Role::Assistant => "model",
                    _ => "user",
                };
                json!({
                    "role": role,
                    "parts": [{ "text": m.content }],
                })
            })
            .collect();

        let mut request = json!({
            "contents": contents,
            "generationConfig": { "maxOutputTokens": max_tokens },
        });
        if !system_text.is_empty() {
            request["systemInstruction"] = json!({ "parts": [{ "text": system_text }] });
        }
        request
    }

    fn parse_response(response: &Value) -> anyhow::Result<LlmResponse> {
        let parts = response["candidates"][0]["content"]["parts"]
            .as_array()
            .ok_or_else(|| anyhow::anyhow!("Invalid response format: missing candidates"))?;

        let content = parts
            .iter()
            .filter_map(|p| p["text"].as_str())
            .collect::<Vec<_>>()
            .join("");

        if content.is_empty() {
            anyhow::bail!("Invalid response format: empty candidate text");
        }

        let usage = response["usageMetadata"].as_object().map(|u| Usage {
            prompt_tokens: u32::try_from(u["promptTokenCount"].as_u64().unwrap_or(0))
                .unwrap_or(0),
            completion_tokens: u32::try_from(u["candidatesTokenCount"].as_u64().unwrap_or(0))
                .unwrap_or(0),
            total_tokens: u32::try_from(u["totalTokenCount"].as_u64().unwrap_or(0)).unwrap_or(0),
        });

        Ok(LlmResponse { content, usage })
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn chat(&self, messages: &[ChatMessage], model: &str) -> anyhow::Result<LlmResponse> {
        let request = Self::build_request(messages, self.max_tokens);

        info!("Sending request to Gemini API: model={model}");

        let response = self
            .client
            .post(format!(
                "{}/models/{model}:generateContent",
                self.base_url
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;

        Self::parse_response(&response)
    }

    fn default_model(&self) -> &str {
        "gemini-1.5-flash"
    }
}
