use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use self::llm::LlmConfig;
use self::nlp::NlpConfig;
use self::pipeline::PipelineConfig;
use self::store::StoreConfig;

pub mod llm;
pub mod nlp;
pub mod pipeline;
pub mod store;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub nlp: NlpConfig,
    pub pipeline: PipelineConfig,
    pub store: StoreConfig,
}

/// External service a command needs credentials for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Llm,
    Nlp,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing credential: set {0}")]
    MissingCredential(&'static str),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl Config {
    /// Defaults overlaid with the process environment
    pub fn new() -> Result<Self, ConfigError> {
        let mut config = Config::default();
        config.apply_env_with(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Load a JSON config file, then overlay the process environment
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config =
            serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.apply_env_with(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Overlay values from a variable lookup; the first key found wins
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |keys: &[&str]| {
            keys.iter()
                .find_map(|key| lookup(*key).filter(|value| !value.is_empty()))
        };

        if let Some(key) = first(&["KVOCAB_LLM_API_KEY", "GEMINI_API_KEY"]) {
            self.llm.api_key = key;
        }
        if let Some(model) = first(&["KVOCAB_LLM_MODEL"]) {
            self.llm.model = model;
        }
        if let Some(url) = first(&["KVOCAB_LLM_API_URL"]) {
            self.llm.api_url = url;
        }
        if let Some(key) = first(&["KVOCAB_NLP_API_KEY", "GOOGLE_API_KEY"]) {
            self.nlp.api_key = key;
        }
        if let Some(url) = first(&["KVOCAB_NLP_API_URL"]) {
            self.nlp.api_url = url;
        }
        if let Some(path) = first(&["KVOCAB_STORE_PATH"]) {
            self.store.path = PathBuf::from(path);
        }
        if let Some(rpm) = first(&["KVOCAB_MAX_RPM"]) {
            self.pipeline.llm_max_rpm = match rpm.parse() {
                Ok(rpm) if rpm > 0 => rpm,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "KVOCAB_MAX_RPM",
                        value: rpm,
                    });
                }
            };
        }

        Ok(())
    }

    /// Fail before any work starts if a needed credential is missing
    pub fn validate_for(&self, service: Service) -> Result<(), ConfigError> {
        match service {
            Service::Llm if self.llm.api_key.is_empty() => {
                Err(ConfigError::MissingCredential("KVOCAB_LLM_API_KEY"))
            }
            Service::Nlp if self.nlp.api_key.is_empty() => {
                Err(ConfigError::MissingCredential("KVOCAB_NLP_API_KEY"))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use kvocab_types::Pos;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_match_reference_batch_sizes() {
        let config = Config::default();

        assert_eq!(config.pipeline.batch_sizes.audit, 10);
        assert_eq!(config.pipeline.batch_sizes.definitions, 50);
        assert_eq!(config.pipeline.target_pos, vec![Pos::Noun, Pos::Verb, Pos::Adj, Pos::Adv]);
    }

    #[test]
    fn env_overlay_prefers_first_key() {
        let mut config = Config::default();
        config
            .apply_env_with(lookup(&[
                ("GEMINI_API_KEY", "fallback"),
                ("KVOCAB_LLM_API_KEY", "primary"),
                ("GOOGLE_API_KEY", "nlp"),
                ("KVOCAB_MAX_RPM", "15"),
            ]))
            .unwrap();

        assert_eq!(config.llm.api_key, "primary");
        assert_eq!(config.nlp.api_key, "nlp");
        assert_eq!(config.pipeline.llm_max_rpm, 15);
    }

    #[test]
    fn invalid_rpm_is_rejected() {
        let mut config = Config::default();
        let err = config
            .apply_env_with(lookup(&[("KVOCAB_MAX_RPM", "0")]))
            .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn missing_credentials_fail_validation() {
        let config = Config::default();

        assert!(matches!(
            config.validate_for(Service::Llm),
            Err(ConfigError::MissingCredential("KVOCAB_LLM_API_KEY"))
        ));
        assert!(config.validate_for(Service::Nlp).is_err());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"pipeline": {{"concurrency": 2, "batch_sizes": {{"audit": 4}}}}}}"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.pipeline.concurrency, 2);
        assert_eq!(config.pipeline.batch_sizes.audit, 4);
        assert_eq!(config.pipeline.batch_sizes.translation, 100);
        assert_eq!(config.llm.model, "gemini-2.0-flash");
    }
}
