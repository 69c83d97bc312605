use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::OnceCell;

use crate::error::AppError;

const CAP_EMBED: &str = "embedContent";
const CAP_GENERATE: &str = "generateContent";

const EMBEDDING_PREFERENCE: &[&str] = &["models/embedding-001"];

// Cost-effective first, then stable.
const GENERATION_PREFERENCE: &[&str] = &[
    "models/gemini-1.5-flash",
    "models/gemini-pro",
    "models/gemini-1.5-pro",
];

const RAW_PREVIEW_CHARS: usize = 200;

static JSON_OBJECT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[\s\S]*\}").expect("valid JSON object regex"));

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Option<EmbeddingValues>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    #[serde(default)]
    values: Vec<f32>,
}

/// Client for the Gemini REST API.
///
/// Constructed once at startup and injected through the application state.
/// The two model handles are resolved on first use and reused for the
/// process lifetime; there is no refresh if the remote list changes later.
pub struct GeminiClient {
    http: Client,
    api_key: String,
    base_url: String,
    embedding_model: OnceCell<String>,
    generation_model: OnceCell<String>,
}

impl GeminiClient {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            http: Client::new(),
            api_key,
            base_url,
            embedding_model: OnceCell::new(),
            generation_model: OnceCell::new(),
        }
    }

    /// Returns a vector embedding for the given text. Blank input yields an
    /// empty vector without calling the remote service.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let model = self.embedding_model().await?;
        let url = format!(
            "{}/v1beta/{}:embedContent?key={}",
            self.base_url, model, self.api_key
        );
        let body = json!({
            "model": model,
            "content": { "parts": [{ "text": text }] }
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::EmbeddingFailed(format!("embedding request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::EmbeddingFailed(format!(
                "embedding request failed ({}): {}",
                status,
                truncate_chars(&detail, RAW_PREVIEW_CHARS)
            )));
        }

        let parsed: EmbedResponse = response.json().await.map_err(|e| {
            AppError::EmbeddingFailed(format!("failed to parse embedding response: {}", e))
        })?;

        let values = parsed.embedding.map(|e| e.values).unwrap_or_default();
        if values.is_empty() {
            return Err(AppError::EmbeddingFailed(
                "the embedding API returned an empty or invalid embedding".to_string(),
            ));
        }

        Ok(values)
    }

    /// Free-form text generation.
    pub async fn generate_text(&self, prompt: &str) -> Result<String, AppError> {
        if prompt.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "please provide a prompt for the AI to process".to_string(),
            ));
        }

        let model = self.generation_model().await?;
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self.request_generation(model, &body).await?;
        extract_text(response)
    }

    /// Generation constrained to a caller-supplied JSON schema. The schema
    /// must be a non-empty object with a `type` key; the model's text reply
    /// is parsed back into a JSON value.
    pub async fn generate_structured(
        &self,
        prompt: &str,
        schema: &Value,
    ) -> Result<Value, AppError> {
        if prompt.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "please provide a prompt for structured AI processing".to_string(),
            ));
        }

        let schema_ok = schema
            .as_object()
            .map_or(false, |map| !map.is_empty() && map.contains_key("type"));
        if !schema_ok {
            return Err(AppError::InvalidInput(
                "a response schema object with a \"type\" field is required for structured output"
                    .to_string(),
            ));
        }

        let model = self.generation_model().await?;
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema
            }
        });

        let response = self.request_generation(model, &body).await?;
        let text = extract_text(response)?;

        // Models occasionally wrap the JSON in prose or code fences.
        let json_str = JSON_OBJECT_RE
            .find(&text)
            .map(|m| m.as_str())
            .unwrap_or(text.as_str());

        serde_json::from_str(json_str).map_err(|e| {
            AppError::StructuredParse(format!(
                "the AI returned malformed JSON ({}); raw response: {}",
                e,
                truncate_chars(&text, RAW_PREVIEW_CHARS)
            ))
        })
    }

    async fn embedding_model(&self) -> Result<&str, AppError> {
        self.embedding_model
            .get_or_try_init(|| async {
                let models = self.list_models().await?;
                let name = select_model(&models, CAP_EMBED, EMBEDDING_PREFERENCE)?.to_string();
                tracing::info!("Gemini embedding model initialized: {}", name);
                Ok::<_, AppError>(name)
            })
            .await
            .map(String::as_str)
    }

    async fn generation_model(&self) -> Result<&str, AppError> {
        self.generation_model
            .get_or_try_init(|| async {
                let models = self.list_models().await?;
                let name = select_model(&models, CAP_GENERATE, GENERATION_PREFERENCE)?.to_string();
                tracing::info!("Gemini generative model initialized: {}", name);
                Ok::<_, AppError>(name)
            })
            .await
            .map(String::as_str)
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, AppError> {
        let url = format!("{}/v1beta/models?key={}", self.base_url, self.api_key);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Http(format!("failed to list models: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Http(format!(
                "model listing failed ({}): {}",
                status,
                truncate_chars(&detail, RAW_PREVIEW_CHARS)
            )));
        }

        let parsed: ModelsResponse = response
            .json()
            .await
            .map_err(|e| AppError::Http(format!("failed to parse the model list: {}", e)))?;

        Ok(parsed.models)
    }

    async fn request_generation(
        &self,
        model: &str,
        body: &Value,
    ) -> Result<GenerateResponse, AppError> {
        let url = format!(
            "{}/v1beta/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::GenerationFailed(format!("generation request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::GenerationFailed(format!(
                "generation request failed ({}): {}",
                status,
                truncate_chars(&detail, RAW_PREVIEW_CHARS)
            )));
        }

        response.json().await.map_err(|e| {
            AppError::GenerationFailed(format!("failed to parse generation response: {}", e))
        })
    }
}

/// Capability-filtered model selection: first preferred name present wins,
/// otherwise the first listed model with the capability.
fn select_model<'a>(
    models: &'a [ModelInfo],
    capability: &str,
    preferred: &[&str],
) -> Result<&'a str, AppError> {
    let supported: Vec<&ModelInfo> = models
        .iter()
        .filter(|m| m.supported_generation_methods.iter().any(|c| c == capability))
        .collect();

    for name in preferred {
        if let Some(model) = supported.iter().find(|m| m.name == *name) {
            return Ok(model.name.as_str());
        }
    }

    supported
        .first()
        .map(|m| m.name.as_str())
        .ok_or_else(|| {
            AppError::NoModelAvailable(format!("no available model supports '{}'", capability))
        })
}

fn extract_text(response: GenerateResponse) -> Result<String, AppError> {
    if let Some(feedback) = response.prompt_feedback {
        if let Some(reason) = feedback.block_reason {
            return Err(AppError::SafetyBlocked(format!(
                "the request was blocked by the safety policy: {}",
                reason
            )));
        }
    }

    for candidate in response.candidates {
        if candidate.finish_reason.as_deref() == Some("SAFETY") {
            return Err(AppError::SafetyBlocked(
                "the response was blocked by the safety policy".to_string(),
            ));
        }
        if let Some(content) = candidate.content {
            for part in content.parts {
                if let Some(text) = part.text {
                    if !text.is_empty() {
                        return Ok(text);
                    }
                }
            }
        }
    }

    Err(AppError::GenerationFailed(
        "the AI did not return a text response".to_string(),
    ))
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(name: &str, methods: &[&str]) -> ModelInfo {
        ModelInfo {
            name: name.to_string(),
            supported_generation_methods: methods.iter().map(|m| m.to_string()).collect(),
        }
    }

    // Unroutable base URL: any accidental network call fails immediately.
    fn client() -> GeminiClient {
        GeminiClient::new("test-key".to_string(), "http://127.0.0.1:0".to_string())
    }

    #[test]
    fn resolution_prefers_the_preference_order() {
        let models = vec![
            model("models/gemini-1.5-pro", &[CAP_GENERATE]),
            model("models/gemini-1.5-flash", &[CAP_GENERATE]),
            model("models/embedding-001", &[CAP_EMBED]),
        ];

        let chosen = select_model(&models, CAP_GENERATE, GENERATION_PREFERENCE).unwrap();
        assert_eq!(chosen, "models/gemini-1.5-flash");
    }

    #[test]
    fn resolution_falls_back_to_first_listed() {
        let models = vec![
            model("models/gemini-experimental", &[CAP_GENERATE]),
            model("models/gemini-other", &[CAP_GENERATE]),
        ];

        let chosen = select_model(&models, CAP_GENERATE, GENERATION_PREFERENCE).unwrap();
        assert_eq!(chosen, "models/gemini-experimental");
    }

    #[test]
    fn resolution_filters_by_capability() {
        // Preferred name exists but lacks the capability we need.
        let models = vec![
            model("models/gemini-1.5-flash", &[CAP_EMBED]),
            model("models/gemini-other", &[CAP_GENERATE]),
        ];

        let chosen = select_model(&models, CAP_GENERATE, GENERATION_PREFERENCE).unwrap();
        assert_eq!(chosen, "models/gemini-other");
    }

    #[test]
    fn resolution_fails_on_empty_filtered_set() {
        let models = vec![model("models/embedding-001", &[CAP_EMBED])];
        let result = select_model(&models, CAP_GENERATE, GENERATION_PREFERENCE);
        assert!(matches!(result, Err(AppError::NoModelAvailable(_))));
    }

    #[test]
    fn blank_text_embeds_to_an_empty_vector_without_io() {
        let result = tokio_test::block_on(client().embed("   \n\t"));
        assert_eq!(result.unwrap(), Vec::<f32>::new());
    }

    #[test]
    fn blank_prompt_is_rejected_without_io() {
        let result = tokio_test::block_on(client().generate_text(" "));
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn empty_schema_is_rejected_without_io() {
        let result = tokio_test::block_on(client().generate_structured("summarize", &json!({})));
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn schema_without_type_is_rejected_without_io() {
        let schema = json!({ "properties": { "a": { "type": "string" } } });
        let result = tokio_test::block_on(client().generate_structured("summarize", &schema));
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn safety_blocks_surface_as_their_own_error() {
        let response = GenerateResponse {
            candidates: vec![],
            prompt_feedback: Some(PromptFeedback {
                block_reason: Some("SAFETY".to_string()),
            }),
        };
        assert!(matches!(
            extract_text(response),
            Err(AppError::SafetyBlocked(_))
        ));
    }

    #[test]
    fn raw_previews_are_truncated_to_two_hundred_chars() {
        let long = "x".repeat(500);
        let preview = truncate_chars(&long, RAW_PREVIEW_CHARS);
        assert_eq!(preview.chars().count(), RAW_PREVIEW_CHARS + 3);
        assert!(preview.ends_with("..."));
        assert_eq!(truncate_chars("short", RAW_PREVIEW_CHARS), "short");
    }
}
