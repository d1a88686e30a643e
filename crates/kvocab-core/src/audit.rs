//! Audit status derived from entry fields, and the pending-work predicates
//! that drive each operation from it.
//!
//! ```text
//! Unaudited --audit--> Clean | Flagged
//! Flagged --correct | re-audit--> Clean
//! ```
//!
//! No audited entry ever returns to `Unaudited`.

use std::collections::BTreeMap;

use kvocab_types::{AuditStatus, Entry, Pos, Rank};

use crate::store::Store;

/// Whether an entry may move from `from` to `to` within one merge
pub fn permits(from: AuditStatus, to: AuditStatus) -> bool {
    use AuditStatus::*;

    match (from, to) {
        (a, b) if a == b => true,
        (Unaudited, Clean | Flagged) => true,
        (Flagged, Clean) => true,
        (Clean, Flagged) => true,
        // Deleting a definition
        (Unaudited | Clean | Flagged, Undefined) => true,
        (Undefined, Unaudited) => true,
        // A regenerated definition keeps its earlier audit stamp
        (Undefined, Clean) => true,
        _ => false,
    }
}

fn select(store: &Store, predicate: impl Fn(&Entry) -> bool) -> Vec<Rank> {
    store
        .values()
        .filter(|entry| predicate(entry))
        .map(|entry| entry.rank)
        .collect()
}

/// Entries never tagged by the lemmatizer
pub fn pending_lemmatize(store: &Store) -> Vec<Rank> {
    select(store, |e| e.pos.is_none())
}

/// Undefined entries whose POS is in `targets`
pub fn pending_definitions(store: &Store, targets: &[Pos]) -> Vec<Rank> {
    select(store, |e| {
        e.def.is_none() && e.pos.is_some_and(|pos| targets.contains(&pos))
    })
}

pub fn pending_audit(store: &Store) -> Vec<Rank> {
    select(store, |e| e.audit_status() == AuditStatus::Unaudited)
}

pub fn pending_correction(store: &Store) -> Vec<Rank> {
    select(store, |e| e.audit_status() == AuditStatus::Flagged)
}

/// Audited, clean and not yet translated
pub fn pending_translation(store: &Store) -> Vec<Rank> {
    select(store, |e| {
        e.audit_status() == AuditStatus::Clean && e.eng.is_none()
    })
}

pub fn status_counts(store: &Store) -> BTreeMap<AuditStatus, usize> {
    let mut counts = BTreeMap::new();
    for entry in store.values() {
        *counts.entry(entry.audit_status()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use kvocab_types::{Concern, ConcernKey};

    use super::*;

    fn store() -> Store {
        let now = Utc::now();
        let mut store = Store::new();

        let mut untagged = Entry::placeholder(1, "그");
        untagged.pos = None;
        store.insert(1, untagged);

        let mut particle = Entry::placeholder(2, "는");
        particle.pos = Some(Pos::Prt);
        store.insert(2, particle);

        let mut verb = Entry::placeholder(3, "하다");
        verb.pos = Some(Pos::Verb);
        store.insert(3, verb);

        let mut unaudited = Entry::placeholder(4, "사람");
        unaudited.pos = Some(Pos::Noun);
        unaudited.def = Some("인간이다.".into());
        store.insert(4, unaudited);

        let mut flagged = Entry::placeholder(5, "보다");
        flagged.pos = Some(Pos::Verb);
        flagged.def = Some("눈으로 아는 것이다.".into());
        flagged.llm_check_on = Some(now);
        flagged.concerns = vec![Concern { rank: 5, key: ConcernKey::Def, why: "too short".into() }];
        store.insert(5, flagged);

        let mut clean = Entry::placeholder(6, "크다");
        clean.pos = Some(Pos::Adj);
        clean.def = Some("부피나 길이가 보통을 넘는 것이다.".into());
        clean.llm_check_on = Some(now);
        store.insert(6, clean.clone());

        clean.rank = 7;
        clean.eng = Some("to be big".into());
        store.insert(7, clean);

        store
    }

    #[test]
    fn predicates_select_disjoint_stages() {
        let store = store();

        assert_eq!(pending_lemmatize(&store), vec![1]);
        assert_eq!(pending_definitions(&store, &[Pos::Noun, Pos::Verb]), vec![3]);
        assert_eq!(pending_audit(&store), vec![4]);
        assert_eq!(pending_correction(&store), vec![5]);
        assert_eq!(pending_translation(&store), vec![6]);
    }

    #[test]
    fn counts_cover_every_entry() {
        let counts = status_counts(&store());

        assert_eq!(counts[&AuditStatus::Undefined], 3);
        assert_eq!(counts[&AuditStatus::Unaudited], 1);
        assert_eq!(counts[&AuditStatus::Flagged], 1);
        assert_eq!(counts[&AuditStatus::Clean], 2);
    }

    #[test]
    fn audited_entries_never_become_unaudited() {
        assert!(!permits(AuditStatus::Clean, AuditStatus::Unaudited));
        assert!(!permits(AuditStatus::Flagged, AuditStatus::Unaudited));
        assert!(permits(AuditStatus::Unaudited, AuditStatus::Flagged));
        assert!(permits(AuditStatus::Flagged, AuditStatus::Clean));
        assert!(!permits(AuditStatus::Undefined, AuditStatus::Flagged));
    }
}
