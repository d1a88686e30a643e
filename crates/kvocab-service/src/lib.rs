use kvocab_types::Pos;
use serde_json::Value;

/// Structured-output language model provider
#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send a prompt and return the raw response body text
    async fn generate(&self, prompt: &Prompt) -> Result<LlmResponse, ServiceError>;

    /// Provider name for logs
    fn metadata(&self) -> ProviderMetadata;
}

/// Syntax analysis provider returning lemma and POS per token
#[async_trait::async_trait]
pub trait Lemmatizer: Send + Sync {
    async fn analyze(&self, text: &str) -> Result<Vec<Token>, ServiceError>;

    fn metadata(&self) -> ProviderMetadata;
}

/// Prompt text plus the JSON schema the response must follow
#[derive(Debug, Clone)]
pub struct Prompt {
    pub text: String,
    pub schema: Value,
}

#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub surface: String,
    pub lemma: String,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct ProviderMetadata {
    pub name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("Authentication error")]
    AuthenticationError,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ServiceError {
    /// Only quota exhaustion is worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::RateLimitExceeded(_))
    }
}
