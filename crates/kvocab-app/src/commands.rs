use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::Context;
use kvocab_core::audit::{
    pending_audit, pending_correction, pending_definitions, pending_lemmatize, pending_translation,
    status_counts,
};
use kvocab_core::merger::Stamp;
use kvocab_core::pipeline::{
    AuditDefinitions, CorrectDefinitions, GenerateDefinitions, Lemmatize, Operation,
    PipelineDriver, TranslateDefinitions, definition_coverage,
};
use kvocab_core::rollback::clear_by_request_ids;
use kvocab_core::store::ensure_all_keys_present;
use kvocab_lang_korean::FrequencyListLoader;
use kvocab_types::AuditStatus;
use serde::Serialize;

use crate::state::AppState;

pub async fn ingest(state: &AppState, file: &Path) -> anyhow::Result<()> {
    let terms = FrequencyListLoader::load_from_file(file)?;

    let mut store = state.records.load_or_default().await?;
    let inserted = ensure_all_keys_present(&mut store, &terms);
    state.records.persist(&store).await?;

    tracing::info!(
        listed = terms.len(),
        inserted,
        entries = store.len(),
        "Ingested frequency list"
    );
    Ok(())
}

/// Load the store and drive `op` over it; the store must already exist
async fn run<O: Operation>(state: &AppState, op: &O) -> anyhow::Result<()> {
    let mut store = state
        .records
        .load()
        .await
        .with_context(|| format!("cannot run {}: ingest a frequency list first", op.name()))?;

    let report = PipelineDriver::new(&state.records)
        .run(op, &mut store)
        .await?;

    tracing::info!(
        operation = op.name(),
        pending = report.pending,
        batches = report.batches,
        applied = report.applied,
        skipped = report.skipped,
        "Run complete"
    );
    Ok(())
}

pub async fn lemmatize(state: &AppState) -> anyhow::Result<()> {
    let op = Lemmatize {
        lemmatizer: state.lemmatizer()?,
        policy: state.nlp_policy(),
        batch_size: state.config.pipeline.batch_sizes.lemmatize,
    };
    run(state, &op).await
}

pub async fn define(state: &AppState) -> anyhow::Result<()> {
    let op = GenerateDefinitions {
        llm: state.llm()?,
        prompts: state.prompts(),
        policy: state.llm_policy(),
        batch_size: state.config.pipeline.batch_sizes.definitions,
        targets: state.config.pipeline.target_pos.clone(),
    };
    run(state, &op).await
}

pub async fn audit(state: &AppState) -> anyhow::Result<()> {
    let op = AuditDefinitions {
        llm: state.llm()?,
        prompts: state.prompts(),
        policy: state.llm_policy(),
        batch_size: state.config.pipeline.batch_sizes.audit,
    };
    run(state, &op).await
}

pub async fn correct(state: &AppState) -> anyhow::Result<()> {
    let op = CorrectDefinitions {
        llm: state.llm()?,
        prompts: state.prompts(),
        policy: state.llm_policy(),
        batch_size: state.config.pipeline.batch_sizes.correction,
    };
    run(state, &op).await
}

pub async fn translate(state: &AppState) -> anyhow::Result<()> {
    let op = TranslateDefinitions {
        llm: state.llm()?,
        prompts: state.prompts(),
        policy: state.llm_policy(),
        batch_size: state.config.pipeline.batch_sizes.translation,
    };
    run(state, &op).await
}

pub async fn rollback(state: &AppState, request_ids: Vec<String>) -> anyhow::Result<()> {
    let ids: HashSet<String> = request_ids.into_iter().collect();
    let mut store = state.records.load().await?;

    let cleared = clear_by_request_ids(&mut store, &ids, &Stamp::new());
    if cleared > 0 {
        state.records.persist(&store).await?;
    }

    tracing::info!(requests = ids.len(), cleared, "Rollback complete");
    println!("{cleared} definitions cleared");
    Ok(())
}

pub async fn coverage(state: &AppState, output: Option<&Path>) -> anyhow::Result<()> {
    let store = state.records.load().await?;
    let lemmatizer = state.lemmatizer()?;

    let report = definition_coverage(
        &store,
        lemmatizer.as_ref(),
        &state.nlp_policy(),
        state.config.pipeline.batch_sizes.coverage_block,
    )
    .await?;

    let path = output.unwrap_or(state.config.store.coverage_report.as_path());
    report
        .write(path)
        .await
        .with_context(|| format!("failed to write coverage report to {}", path.display()))?;

    tracing::info!(
        definitions = report.definitions,
        lemmas = report.lemmas.len(),
        outside_vocabulary = report.outside_vocabulary().count(),
        path = %path.display(),
        "Coverage report written"
    );
    Ok(())
}

#[derive(Debug, Serialize)]
struct StatusSummary {
    entries: usize,
    statuses: BTreeMap<&'static str, usize>,
    pending: BTreeMap<&'static str, usize>,
}

pub async fn status(state: &AppState) -> anyhow::Result<()> {
    let store = state.records.load().await?;
    let counts = status_counts(&store);
    let targets = &state.config.pipeline.target_pos;

    let statuses = [
        AuditStatus::Undefined,
        AuditStatus::Unaudited,
        AuditStatus::Clean,
        AuditStatus::Flagged,
    ]
    .into_iter()
    .map(|status| (status.as_str(), counts.get(&status).copied().unwrap_or(0)))
    .collect();

    let pending = BTreeMap::from([
        ("lemmatize", pending_lemmatize(&store).len()),
        ("define", pending_definitions(&store, targets).len()),
        ("audit", pending_audit(&store).len()),
        ("correct", pending_correction(&store).len()),
        ("translate", pending_translation(&store).len()),
    ]);

    let summary = StatusSummary {
        entries: store.len(),
        statuses,
        pending,
    };
    tracing::info!(?summary, "Store status");
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
