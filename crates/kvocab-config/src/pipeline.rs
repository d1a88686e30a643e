use kvocab_types::Pos;
use serde::{Deserialize, Serialize};

fn default_concurrency() -> usize {
    5
}

fn default_llm_max_rpm() -> u32 {
    60
}

fn default_nlp_max_rpm() -> u32 {
    600
}

fn default_max_retries() -> u32 {
    5
}

fn default_base_backoff_ms() -> u64 {
    1000
}

fn default_target_pos() -> Vec<Pos> {
    vec![Pos::Noun, Pos::Verb, Pos::Adj, Pos::Adv]
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct PipelineConfig {
    pub batch_sizes: BatchSizes,
    /// Parallel calls issued at once inside a batch
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_llm_max_rpm")]
    pub llm_max_rpm: u32,
    #[serde(default = "default_nlp_max_rpm")]
    pub nlp_max_rpm: u32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,
    /// Parts of speech that receive generated definitions
    #[serde(default = "default_target_pos")]
    pub target_pos: Vec<Pos>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_sizes: BatchSizes::default(),
            concurrency: default_concurrency(),
            llm_max_rpm: default_llm_max_rpm(),
            nlp_max_rpm: default_nlp_max_rpm(),
            max_retries: default_max_retries(),
            base_backoff_ms: default_base_backoff_ms(),
            target_pos: default_target_pos(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct BatchSizes {
    pub lemmatize: usize,
    pub definitions: usize,
    pub audit: usize,
    pub correction: usize,
    pub translation: usize,
    /// Definitions joined into one coverage analysis block
    pub coverage_block: usize,
}

impl Default for BatchSizes {
    fn default() -> Self {
        Self {
            lemmatize: 50,
            definitions: 50,
            audit: 10,
            correction: 50,
            translation: 100,
            coverage_block: 20,
        }
    }
}
