use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_path() -> PathBuf {
    PathBuf::from("data/definitions.json")
}

fn default_coverage_report() -> PathBuf {
    PathBuf::from("data/coverage.json")
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct StoreConfig {
    /// Durable rank -> entry mapping
    #[serde(default = "default_path")]
    pub path: PathBuf,
    #[serde(default = "default_coverage_report")]
    pub coverage_report: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            coverage_report: default_coverage_report(),
        }
    }
}
