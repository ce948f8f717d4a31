use crate::traits::{CompletionRequest, Provider};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    temperature: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop_sequences: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    temperature: f64,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: api_key.into(),
            model: "gemini-1.5-flash".to_string(),
            temperature: 0.7,
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn generate_url(&self) -> String {
        let model = self.model.trim();
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model.strip_prefix("models/").unwrap_or(model)
        )
    }

    fn build_http_request(&self, body: &GenerateContentRequest<'_>) -> reqwest::Result<reqwest::Request> {
        self.client
            .post(self.generate_url())
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .build()
    }
}

fn is_blocked_finish_reason(reason: &str) -> bool {
    matches!(reason, "SAFETY" | "RECITATION" | "BLOCKLIST")
}

fn extract_text(response: GenerateContentResponse) -> anyhow::Result<String> {
    let candidate = response
        .candidates
        .and_then(|c| c.into_iter().next())
        .ok_or_else(|| anyhow::anyhow!("No candidates in Gemini response"))?;

    if let Some(reason) = candidate.finish_reason.as_deref()
        && is_blocked_finish_reason(reason)
    {
        return Err(anyhow::anyhow!("Gemini blocked the response: {}", reason));
    }

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(anyhow::anyhow!("Empty response from Gemini"));
    }
    Ok(text)
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: CompletionRequest<'_>) -> anyhow::Result<String> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                stop_sequences: request.stop.to_vec(),
            },
        };

        let http_request = self.build_http_request(&body)?;
        let response = self.client.execute(http_request).await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Gemini API error {}: {}",
                status,
                error_text
            ));
        }

        let generated: GenerateContentResponse = response.json().await?;
        extract_text(generated)
    }
}
