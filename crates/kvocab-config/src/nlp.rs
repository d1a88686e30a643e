use serde::{Deserialize, Serialize};

fn default_api_url() -> String {
    "https://language.googleapis.com/v1/documents:analyzeSyntax".to_string()
}

fn default_language() -> String {
    "ko".to_string()
}

/// Syntax analysis service used for lemmas and POS tags
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct NlpConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for NlpConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: default_api_url(),
            language: default_language(),
        }
    }
}
