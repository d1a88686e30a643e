use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use kvocab_config::{Config, ConfigError, Service};
use kvocab_core::RecordStore;
use kvocab_core::pipeline::CallPolicy;
use kvocab_lang_korean::{CloudNlpLemmatizer, GeminiClient, KoreanPrompts};
use kvocab_service::{LanguageModel, Lemmatizer};

const DEFAULT_CONFIG: &str = "kvocab.json";

/// Config file if given or present, then the environment
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load(path)?,
        None if Path::new(DEFAULT_CONFIG).exists() => Config::load(Path::new(DEFAULT_CONFIG))?,
        None => Config::new()?,
    };
    Ok(config)
}

/// Clients and store handle for one command, built once at startup
pub struct AppState {
    pub config: Config,
    pub records: RecordStore,
    llm: Option<Arc<dyn LanguageModel>>,
    lemmatizer: Option<Arc<dyn Lemmatizer>>,
}

impl AppState {
    /// Validate credentials for `services` and build only those clients
    pub fn new(config: Config, services: &[Service]) -> anyhow::Result<Self> {
        let mut llm: Option<Arc<dyn LanguageModel>> = None;
        let mut lemmatizer: Option<Arc<dyn Lemmatizer>> = None;

        for service in services {
            config.validate_for(*service)?;
            match service {
                Service::Llm => {
                    if config.llm.provider != "gemini" {
                        return Err(ConfigError::InvalidValue {
                            key: "llm.provider",
                            value: config.llm.provider.clone(),
                        }
                        .into());
                    }
                    let client = GeminiClient::new(&config.llm)
                        .context("failed to build language model client")?;
                    tracing::info!(
                        provider = %client.metadata().name,
                        model = %config.llm.model,
                        "Language model ready"
                    );
                    llm = Some(Arc::new(client));
                }
                Service::Nlp => {
                    let client = CloudNlpLemmatizer::new(&config.nlp);
                    tracing::info!(
                        provider = %client.metadata().name,
                        language = %config.nlp.language,
                        "Lemmatizer ready"
                    );
                    lemmatizer = Some(Arc::new(client));
                }
            }
        }

        Ok(Self {
            records: RecordStore::new(config.store.path.clone()),
            config,
            llm,
            lemmatizer,
        })
    }

    pub fn llm(&self) -> anyhow::Result<Arc<dyn LanguageModel>> {
        self.llm.clone().context("language model client was not configured")
    }

    pub fn lemmatizer(&self) -> anyhow::Result<Arc<dyn Lemmatizer>> {
        self.lemmatizer.clone().context("lemmatizer client was not configured")
    }

    pub fn prompts(&self) -> Arc<KoreanPrompts> {
        Arc::new(KoreanPrompts)
    }

    pub fn llm_policy(&self) -> CallPolicy {
        CallPolicy::llm(&self.config.pipeline)
    }

    pub fn nlp_policy(&self) -> CallPolicy {
        CallPolicy::nlp(&self.config.pipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_fails_before_clients_exist() {
        let err = AppState::new(Config::default(), &[Service::Llm]).err().unwrap();

        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::MissingCredential(_))
        ));
    }

    #[test]
    fn only_requested_clients_are_built() {
        let mut config = Config::default();
        config.nlp.api_key = "nlp-key".to_string();

        let state = AppState::new(config, &[Service::Nlp]).unwrap();

        let lemmatizer = state.lemmatizer().unwrap();
        assert_eq!(lemmatizer.metadata().name, "Cloud Natural Language");
        assert!(state.llm().is_err());
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let mut config = Config::default();
        config.llm.api_key = "key".to_string();
        config.llm.provider = "other".to_string();

        assert!(AppState::new(config, &[Service::Llm]).is_err());
    }
}
