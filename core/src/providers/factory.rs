use crate::config::{Config, Variant};
use crate::providers::sigv4::AwsCredentials;
use crate::providers::{BedrockProvider, GeminiProvider, OpenAIProvider};
use crate::traits::Provider;
use anyhow::Result;
use std::sync::Arc;

pub fn create_provider(config: &Config) -> Result<Arc<dyn Provider>> {
    config.validate()?;
    let timeout = config.request_timeout();

    let provider: Arc<dyn Provider> = match config.variant {
        Variant::Bedrock => {
            let bedrock = &config.bedrock;
            let credentials = AwsCredentials {
                access_key_id: bedrock.access_key_id.clone(),
                secret_access_key: bedrock.secret_access_key.clone(),
                session_token: bedrock.session_token.clone(),
            };
            let mut provider = BedrockProvider::new(credentials, bedrock.region.clone(), timeout)
                .with_model(bedrock.model_target())
                .with_temperature(config.temperature);
            if let Some(base_url) = &bedrock.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Arc::new(provider)
        }
        Variant::Gemini => {
            let gemini = &config.gemini;
            let mut provider = GeminiProvider::new(gemini.api_key.clone(), timeout)
                .with_model(gemini.model.clone())
                .with_temperature(config.temperature);
            if let Some(base_url) = &gemini.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Arc::new(provider)
        }
        Variant::OpenAI => {
            let openai = &config.openai;
            let mut provider = OpenAIProvider::new(openai.api_key.clone(), timeout)
                .with_model(openai.model.clone())
                .with_temperature(config.temperature);
            if let Some(base_url) = &openai.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Arc::new(provider)
        }
    };

    Ok(provider)
}
