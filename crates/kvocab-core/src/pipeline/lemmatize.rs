use std::sync::Arc;

use kvocab_service::Lemmatizer;
use kvocab_types::{Pos, Rank};

use super::{CallPolicy, Operation};
use crate::audit::pending_lemmatize;
use crate::error::BatchError;
use crate::items::LemmaItem;
use crate::merger::{self, MergeStats, Stamp};
use crate::store::Store;

/// Tag every untagged term with its lemma and POS, one term per call
pub struct Lemmatize {
    pub lemmatizer: Arc<dyn Lemmatizer>,
    pub policy: CallPolicy,
    pub batch_size: usize,
}

#[async_trait::async_trait]
impl Operation for Lemmatize {
    type Output = Vec<LemmaItem>;

    fn name(&self) -> &'static str {
        "lemmatize"
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn pending(&self, store: &Store) -> Vec<Rank> {
        pending_lemmatize(store)
    }

    async fn fetch(&self, store: &Store, batch: &[Rank]) -> Result<Self::Output, BatchError> {
        let (ranks, terms): (Vec<Rank>, Vec<String>) = batch
            .iter()
            .filter_map(|rank| store.get(rank))
            .map(|entry| (entry.rank, entry.term.clone()))
            .unzip();

        let analyses = self
            .policy
            .analyze_all(self.lemmatizer.as_ref(), &terms)
            .await?;

        let mut items = Vec::with_capacity(ranks.len());
        for ((rank, term), tokens) in ranks.into_iter().zip(&terms).zip(analyses) {
            let item = match tokens.into_iter().next() {
                Some(token) => LemmaItem {
                    rank,
                    lemma: token.lemma,
                    pos: token.pos,
                },
                None => {
                    tracing::warn!(rank, term = %term, "No tokens for term, tagged X");
                    LemmaItem {
                        rank,
                        lemma: term.clone(),
                        pos: Pos::X,
                    }
                }
            };
            items.push(item);
        }

        Ok(items)
    }

    fn merge(&self, store: &mut Store, _batch: &[Rank], output: Self::Output, _stamp: &Stamp) -> MergeStats {
        merger::apply_lemmas(store, &output)
    }
}
