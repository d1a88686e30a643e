use std::collections::{HashMap, HashSet};
use std::path::Path;

use kvocab_service::Lemmatizer;
use kvocab_types::Pos;
use serde::Serialize;
use uuid::Uuid;

use super::CallPolicy;
use crate::batcher::chunk;
use crate::error::{BatchContext, PipelineError};
use crate::store::Store;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LemmaCount {
    pub lemma: String,
    pub count: usize,
    /// Lemma is itself an entry of the vocabulary list
    pub in_vocabulary: bool,
}

/// Which lemmas the definitions are written with, most frequent first
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverageReport {
    pub definitions: usize,
    pub blocks: usize,
    pub lemmas: Vec<LemmaCount>,
}

impl CoverageReport {
    /// Lemmas used in definitions that learners have not been taught
    pub fn outside_vocabulary(&self) -> impl Iterator<Item = &LemmaCount> {
        self.lemmas.iter().filter(|l| !l.in_vocabulary)
    }

    pub async fn write(&self, path: &Path) -> Result<(), PipelineError> {
        let io_err = |source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        let data = serde_json::to_vec_pretty(self).map_err(|source| PipelineError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        tokio::fs::write(path, data).await.map_err(io_err)
    }
}

/// Lemmatize all definitions in newline-joined blocks and pool lemma counts.
///
/// Read-only with respect to the store.
pub async fn definition_coverage(
    store: &Store,
    lemmatizer: &dyn Lemmatizer,
    policy: &CallPolicy,
    block_size: usize,
) -> Result<CoverageReport, PipelineError> {
    let definitions: Vec<&str> = store.values().filter_map(|e| e.def.as_deref()).collect();
    let blocks: Vec<String> = chunk(&definitions, block_size)
        .into_iter()
        .map(|defs| defs.join("\n"))
        .collect();

    let vocabulary: HashSet<&str> = store.values().map(|e| e.headword()).collect();
    let mut counts: HashMap<String, usize> = HashMap::new();
    let groups = chunk(&blocks, policy.concurrency);
    let total = blocks.len();
    let mut completed = 0;

    for (index, group) in groups.iter().enumerate() {
        let analyses = policy
            .analyze_all(lemmatizer, group)
            .await
            .map_err(|err| {
                err.in_batch(BatchContext {
                    operation: "coverage",
                    batch: index + 1,
                    request_id: Uuid::new_v4().to_string(),
                })
            })?;

        for token in analyses.into_iter().flatten() {
            if matches!(token.pos, Pos::Punct | Pos::Num) {
                continue;
            }
            *counts.entry(token.lemma).or_insert(0) += 1;
        }

        completed += group.len();
        tracing::info!(operation = "coverage", completed, total, "Blocks analyzed");
    }

    let mut lemmas: Vec<LemmaCount> = counts
        .into_iter()
        .map(|(lemma, count)| LemmaCount {
            in_vocabulary: vocabulary.contains(lemma.as_str()),
            lemma,
            count,
        })
        .collect();
    lemmas.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.lemma.cmp(&b.lemma)));

    Ok(CoverageReport {
        definitions: definitions.len(),
        blocks: total,
        lemmas,
    })
}
