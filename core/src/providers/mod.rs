pub mod bedrock;
pub mod factory;
pub mod gemini;
pub mod openai;
pub mod sigv4;

pub use bedrock::BedrockProvider;
pub use factory::create_provider;
pub use gemini::GeminiProvider;
pub use openai::OpenAIProvider;
pub use sigv4::AwsCredentials;
