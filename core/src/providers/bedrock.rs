use crate::providers::sigv4::{AwsCredentials, Signer, encode_segment};
use crate::traits::{CompletionRequest, Provider};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SERVICE: &str = "bedrock";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConverseRequest<'a> {
    messages: Vec<ConverseMessage<'a>>,
    inference_config: InferenceConfig<'a>,
}

#[derive(Debug, Serialize)]
struct ConverseMessage<'a> {
    role: &'a str,
    content: Vec<TextBlock<'a>>,
}

#[derive(Debug, Serialize)]
struct TextBlock<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InferenceConfig<'a> {
    temperature: f64,
    #[serde(skip_serializing_if = "no_stop")]
    stop_sequences: &'a [&'a str],
}

fn no_stop(stop: &&[&str]) -> bool {
    stop.is_empty()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConverseResponse {
    output: ConverseOutput,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConverseOutput {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
struct ResponseBlock {
    text: Option<String>,
}

pub struct BedrockProvider {
    client: reqwest::Client,
    credentials: AwsCredentials,
    region: String,
    model: String,
    temperature: f64,
    base_url: Option<String>,
}

impl BedrockProvider {
    pub fn new(credentials: AwsCredentials, region: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            credentials,
            region: region.into(),
            model: String::new(),
            temperature: 0.7,
            base_url: None,
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
        self.base_url = Some(base_url.into());
        self
    }

    fn base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://bedrock-runtime.{}.amazonaws.com", self.region),
        }
    }

    /// Path as sent on the wire, and its SigV4 canonical form (encoded twice).
    fn paths(&self) -> (String, String) {
        let once = encode_segment(&self.model);
        let twice = encode_segment(&once);
        (
            format!("/model/{}/converse", once),
            format!("/model/{}/converse", twice),
        )
    }
}

fn extract_text(response: ConverseResponse) -> anyhow::Result<String> {
    let text: String = response
        .output
        .message
        .map(|m| {
            m.content
                .into_iter()
                .filter_map(|block| block.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(anyhow::anyhow!(
            "Empty response from Bedrock (stop reason: {})",
            response.stop_reason.as_deref().unwrap_or("unknown")
        ));
    }
    Ok(text)
}

#[async_trait]
impl Provider for BedrockProvider {
    fn name(&self) -> &str {
        "bedrock"
    }

    async fn complete(&self, request: CompletionRequest<'_>) -> anyhow::Result<String> {
        let body = ConverseRequest {
            messages: vec![ConverseMessage {
                role: "user",
                content: vec![TextBlock {
                    text: request.prompt,
                }],
            }],
            inference_config: InferenceConfig {
                temperature: self.temperature,
                stop_sequences: request.stop,
            },
        };
        let payload = serde_json::to_vec(&body)?;

        let base_url = self.base_url();
        let url = reqwest::Url::parse(&base_url)?;
        let host = match url.port() {
            Some(port) => format!("{}:{}", url.host_str().unwrap_or_default(), port),
            None => url.host_str().unwrap_or_default().to_string(),
        };
        let (path, canonical_path) = self.paths();

        let signer = Signer::new(&self.credentials, &self.region, SERVICE);
        let headers = signer.sign(
            "POST",
            &canonical_path,
            &[("host", host.as_str()), ("content-type", "application/json")],
            &payload,
            chrono::Utc::now(),
        );

        let mut builder = self.client.post(format!("{}{}", base_url, path));
        for (name, value) in headers {
            builder = builder.header(name, value);
        }

        let response = builder.body(payload).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Bedrock API error {}: {}",
                status,
                error_text
            ));
        }

        let converse: ConverseResponse = response.json().await?;
        extract_text(converse)
    }
}
