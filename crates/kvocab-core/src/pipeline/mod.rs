use std::collections::BTreeSet;
use std::time::Duration;

use futures::future::join_all;
use kvocab_config::pipeline::PipelineConfig;
use kvocab_service::{LanguageModel, Lemmatizer, Prompt, ServiceError, Token};
use kvocab_types::{Entry, Rank};
use tokio::time::Instant;

use crate::batcher::chunk;
use crate::error::{BatchContext, BatchError, PipelineError};
use crate::merger::{MergeStats, Stamp};
use crate::rate_limit::RateLimiter;
use crate::retry::RetryPolicy;
use crate::store::{RecordStore, Store};
use crate::validator::{self, ResponseItem};

pub mod audit;
pub mod correction;
pub mod coverage;
pub mod definitions;
pub mod lemmatize;
pub mod translation;

pub use audit::AuditDefinitions;
pub use correction::CorrectDefinitions;
pub use coverage::{CoverageReport, LemmaCount, definition_coverage};
pub use definitions::GenerateDefinitions;
pub use lemmatize::Lemmatize;
pub use translation::TranslateDefinitions;

/// One store-mutating pass over the pending subset
#[async_trait::async_trait]
pub trait Operation: Send + Sync {
    type Output: Send;

    fn name(&self) -> &'static str;

    fn batch_size(&self) -> usize;

    /// Ranks this operation still has to process
    fn pending(&self, store: &Store) -> Vec<Rank>;

    /// External call(s) for one batch, validated
    async fn fetch(&self, store: &Store, batch: &[Rank]) -> Result<Self::Output, BatchError>;

    fn merge(&self, store: &mut Store, batch: &[Rank], output: Self::Output, stamp: &Stamp) -> MergeStats;
}

/// Retry and rate limiting around calls to one external service
#[derive(Debug, Clone, Copy)]
pub struct CallPolicy {
    pub retry: RetryPolicy,
    pub limiter: RateLimiter,
    /// Calls issued together before the rate limit pause
    pub concurrency: usize,
}

impl CallPolicy {
    pub fn llm(config: &PipelineConfig) -> Self {
        Self::with_rpm(config, config.llm_max_rpm)
    }

    pub fn nlp(config: &PipelineConfig) -> Self {
        Self::with_rpm(config, config.nlp_max_rpm)
    }

    fn with_rpm(config: &PipelineConfig, rpm: u32) -> Self {
        Self {
            retry: RetryPolicy::new(config.max_retries, Duration::from_millis(config.base_backoff_ms)),
            limiter: RateLimiter::new(rpm),
            concurrency: config.concurrency.max(1),
        }
    }

    /// One structured-output request for `batch`, validated against `T`
    pub async fn structured<T: ResponseItem>(
        &self,
        llm: &dyn LanguageModel,
        text: String,
        batch: &[Rank],
    ) -> Result<Vec<T>, BatchError> {
        let prompt = Prompt {
            text,
            schema: T::schema(),
        };

        let started = Instant::now();
        let response = self
            .retry
            .invoke(|| llm.generate(&prompt), ServiceError::is_retryable)
            .await;
        self.limiter.enforce(1, started).await;
        let response = response?;
        tracing::debug!(
            provider = %llm.metadata().name,
            model = %response.model,
            field = T::FIELD,
            "Response received"
        );

        let ranks: BTreeSet<Rank> = batch.iter().copied().collect();
        let validated = validator::parse::<T>(&response.text, &ranks)
            .map_err(|e| BatchError::MalformedResponse(e.0))?;

        for rejection in &validated.rejected {
            tracing::warn!(?rejection, field = T::FIELD, "Dropped response item");
        }

        Ok(validated.items)
    }

    /// Analyze each text, `concurrency` calls at a time, results in input order
    pub async fn analyze_all(
        &self,
        lemmatizer: &dyn Lemmatizer,
        texts: &[String],
    ) -> Result<Vec<Vec<Token>>, BatchError> {
        let mut results = Vec::with_capacity(texts.len());

        for group in texts.chunks(self.concurrency.max(1)) {
            let started = Instant::now();
            let calls = group.iter().map(|text| {
                self.retry
                    .invoke(|| lemmatizer.analyze(text), ServiceError::is_retryable)
            });
            let outcomes = join_all(calls).await;
            self.limiter.enforce(group.len(), started).await;

            for outcome in outcomes {
                results.push(outcome?);
            }
        }

        Ok(results)
    }
}

/// Batch entries in batch order, skipping ranks missing from the store
pub(crate) fn batch_entries<'s>(store: &'s Store, batch: &[Rank]) -> Vec<&'s Entry> {
    batch.iter().filter_map(|rank| store.get(rank)).collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub pending: usize,
    pub batches: usize,
    pub applied: usize,
    pub skipped: usize,
}

/// Drives operations batch by batch, persisting after each one
pub struct PipelineDriver<'a> {
    records: &'a RecordStore,
}

impl<'a> PipelineDriver<'a> {
    pub fn new(records: &'a RecordStore) -> Self {
        Self { records }
    }

    /// Run `op` over its pending subset.
    ///
    /// A failed batch aborts the run; every earlier batch is already on disk,
    /// so rerunning resumes where this run stopped.
    pub async fn run<O>(&self, op: &O, store: &mut Store) -> Result<RunReport, PipelineError>
    where
        O: Operation + ?Sized,
    {
        let operation = op.name();
        let pending = op.pending(store);
        let mut report = RunReport {
            pending: pending.len(),
            ..RunReport::default()
        };

        if pending.is_empty() {
            tracing::info!(operation, "Nothing pending");
            return Ok(report);
        }

        let batches = chunk(&pending, op.batch_size());
        let total = pending.len();
        let mut completed = 0;
        tracing::info!(operation, total, batches = batches.len(), "Starting run");

        for (index, batch) in batches.iter().enumerate() {
            let stamp = Stamp::new();
            let context = || BatchContext {
                operation,
                batch: index + 1,
                request_id: stamp.request_id.clone(),
            };

            let output = match op.fetch(store, batch).await {
                Ok(output) => output,
                Err(err) => {
                    let err = err.in_batch(context());
                    tracing::error!(operation, completed, total, error = %err, "Batch failed, aborting run");
                    return Err(err);
                }
            };

            let stats = op.merge(store, batch, output, &stamp);
            if let Err(source) = self.records.persist(store).await {
                let err = PipelineError::Persist {
                    context: context(),
                    source: Box::new(source),
                };
                tracing::error!(operation, completed, total, error = %err, "Persist failed, aborting run");
                return Err(err);
            }

            completed += batch.len();
            report.batches += 1;
            report.applied += stats.applied;
            report.skipped += stats.skipped;
            tracing::info!(
                operation,
                batch = index + 1,
                request_id = %stamp.request_id,
                applied = stats.applied,
                completed,
                total,
                "Batch persisted"
            );
        }

        Ok(report)
    }
}
