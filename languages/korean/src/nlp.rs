use async_trait::async_trait;
use kvocab_config::nlp::NlpConfig;
use kvocab_service::{Lemmatizer, ProviderMetadata, ServiceError, Token};
use kvocab_types::Pos;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

/// Cloud Natural Language syntax analysis
#[derive(Clone)]
pub struct CloudNlpLemmatizer {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
    language: String,
}

#[derive(Debug, Deserialize)]
struct SyntaxResponse {
    #[serde(default)]
    tokens: Vec<SyntaxToken>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SyntaxToken {
    text: TextSpan,
    lemma: String,
    part_of_speech: PartOfSpeech,
}

#[derive(Debug, Deserialize)]
struct TextSpan {
    content: String,
}

#[derive(Debug, Deserialize)]
struct PartOfSpeech {
    tag: String,
}

impl From<SyntaxToken> for Token {
    fn from(token: SyntaxToken) -> Self {
        let lemma = if token.lemma.is_empty() {
            token.text.content.clone()
        } else {
            token.lemma
        };

        Token {
            surface: token.text.content,
            lemma,
            pos: Pos::from_service_tag(&token.part_of_speech.tag),
        }
    }
}

impl CloudNlpLemmatizer {
    pub fn new(config: &NlpConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            api_url: config.api_url.clone(),
            language: config.language.clone(),
        }
    }
}

fn parse_tokens(body: &str) -> Result<Vec<Token>, ServiceError> {
    let response: SyntaxResponse = serde_json::from_str(body)
        .map_err(|e| ServiceError::InvalidResponse(format!("Failed to parse response: {}", e)))?;
    Ok(response.tokens.into_iter().map(Token::from).collect())
}

#[async_trait]
impl Lemmatizer for CloudNlpLemmatizer {
    async fn analyze(&self, text: &str) -> Result<Vec<Token>, ServiceError> {
        if self.api_key.is_empty() {
            return Err(ServiceError::AuthenticationError);
        }

        let body = json!({
            "document": {
                "type": "PLAIN_TEXT",
                "language": self.language,
                "content": text
            },
            "encodingType": "UTF8"
        });

        let response = self
            .client
            .post(&self.api_url)
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ServiceError::RateLimitExceeded(format!("HTTP {status}")));
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ServiceError::AuthenticationError);
        }
        if !status.is_success() {
            return Err(ServiceError::ApiError(format!("HTTP {}", status)));
        }

        parse_tokens(&response.text().await?)
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            name: "Cloud Natural Language".to_string(),
        }
    }
}
