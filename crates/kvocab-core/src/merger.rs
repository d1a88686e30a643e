//! Per-operation merge rules applying validated items onto the store.
//!
//! Merges never remove entries and never touch `rank` or `term`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use kvocab_types::{Concern, ConcernKey, Entry, Rank};
use uuid::Uuid;

use crate::items::{AuditItem, CorrectionAction, CorrectionItem, DefinitionItem, LemmaItem, TranslationItem};
use crate::store::Store;

/// Provenance of one batch call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamp {
    pub request_id: String,
    pub at: DateTime<Utc>,
}

impl Stamp {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            at: Utc::now(),
        }
    }
}

impl Default for Stamp {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub applied: usize,
    pub skipped: usize,
}

/// Lemmatization is one-time: entries that already carry a tag are kept
pub fn apply_lemmas(store: &mut Store, items: &[LemmaItem]) -> MergeStats {
    let mut stats = MergeStats::default();

    for item in items {
        let Some(entry) = store.get_mut(&item.rank).filter(|e| e.pos.is_none()) else {
            stats.skipped += 1;
            continue;
        };
        entry.lemma = (item.lemma != entry.term).then(|| item.lemma.clone());
        entry.pos = Some(item.pos);
        stats.applied += 1;
    }

    stats
}

/// Fill definitions of entries that are still undefined
pub fn apply_definitions(store: &mut Store, items: &[DefinitionItem], stamp: &Stamp) -> MergeStats {
    let mut stats = MergeStats::default();

    for item in items {
        let Some(entry) = store.get_mut(&item.rank).filter(|e| e.def.is_none()) else {
            stats.skipped += 1;
            continue;
        };

        match &item.def {
            Some(def) => {
                entry.def = Some(def.trim().to_string());
                entry.def_request_id = stamp.request_id.clone();
            }
            None => {
                tracing::debug!(rank = item.rank, term = %entry.term, "Term rejected as not definable");
                entry.def_request_id.clear();
            }
        }
        entry.created_at = Some(stamp.at);
        stats.applied += 1;
    }

    stats
}

/// Apply corrections; every action consumes the entry's concerns
pub fn apply_corrections(store: &mut Store, items: &[CorrectionItem], stamp: &Stamp) -> MergeStats {
    let mut stats = MergeStats::default();

    for item in items {
        let Some(entry) = store.get_mut(&item.rank) else {
            stats.skipped += 1;
            continue;
        };

        match (item.action, &item.def) {
            (CorrectionAction::Replace, Some(def)) => {
                entry.def = Some(def.trim().to_string());
                entry.def_request_id = stamp.request_id.clone();
                entry.created_at = Some(stamp.at);
            }
            (CorrectionAction::Null, _) => clear_def(entry, stamp),
            _ => {}
        }
        entry.concerns.clear();
        entry.llm_check_on = Some(stamp.at);
        stats.applied += 1;
    }

    stats
}

/// Restamp every audited entry and replace its concerns with this batch's findings.
///
/// Findings on the `pos` channel rewrite the tag instead of becoming concerns.
pub fn apply_audit(store: &mut Store, batch: &[Rank], items: &[AuditItem], stamp: &Stamp) -> MergeStats {
    let mut findings: BTreeMap<Rank, Vec<&AuditItem>> = BTreeMap::new();
    for item in items {
        findings.entry(item.rank).or_default().push(item);
    }

    let mut stats = MergeStats::default();

    for rank in batch {
        let Some(entry) = store.get_mut(rank) else {
            stats.skipped += 1;
            continue;
        };
        let found = findings.remove(rank).unwrap_or_default();

        for pos in found.iter().filter_map(|item| item.pos_fix()) {
            if entry.pos != Some(pos) {
                tracing::info!(rank, term = %entry.term, from = ?entry.pos, to = %pos, "POS corrected");
                entry.pos = Some(pos);
            }
        }

        entry.concerns = if entry.def.is_some() {
            found
                .iter()
                .filter(|item| item.key == ConcernKey::Def)
                .map(|item| Concern {
                    rank: *rank,
                    key: ConcernKey::Def,
                    why: item.why.trim().to_string(),
                })
                .collect()
        } else {
            Vec::new()
        };
        entry.llm_check_on = Some(stamp.at);
        stats.applied += 1;
    }

    stats
}

/// Translations are write-once
pub fn apply_translations(store: &mut Store, items: &[TranslationItem]) -> MergeStats {
    let mut stats = MergeStats::default();

    for item in items {
        let Some(entry) = store.get_mut(&item.rank).filter(|e| e.eng.is_none()) else {
            stats.skipped += 1;
            continue;
        };
        entry.eng = Some(item.eng.trim().to_string());
        stats.applied += 1;
    }

    stats
}

/// Deleting a definition keeps the entry and drops everything derived from it
pub(crate) fn clear_def(entry: &mut Entry, stamp: &Stamp) {
    entry.def = None;
    entry.def_request_id.clear();
    entry.concerns.clear();
    entry.created_at = Some(stamp.at);
}
