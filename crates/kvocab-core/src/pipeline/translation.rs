use std::sync::Arc;

use kvocab_service::LanguageModel;
use kvocab_types::Rank;

use super::{CallPolicy, Operation, batch_entries};
use crate::audit::pending_translation;
use crate::error::BatchError;
use crate::items::TranslationItem;
use crate::merger::{self, MergeStats, Stamp};
use crate::prompt::PromptSet;
use crate::store::Store;

/// English glosses of clean definitions
pub struct TranslateDefinitions {
    pub llm: Arc<dyn LanguageModel>,
    pub prompts: Arc<dyn PromptSet>,
    pub policy: CallPolicy,
    pub batch_size: usize,
}

#[async_trait::async_trait]
impl Operation for TranslateDefinitions {
    type Output = Vec<TranslationItem>;

    fn name(&self) -> &'static str {
        "translate"
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn pending(&self, store: &Store) -> Vec<Rank> {
        pending_translation(store)
    }

    async fn fetch(&self, store: &Store, batch: &[Rank]) -> Result<Self::Output, BatchError> {
        let text = self.prompts.translation(&batch_entries(store, batch));
        self.policy.structured(self.llm.as_ref(), text, batch).await
    }

    fn merge(&self, store: &mut Store, _batch: &[Rank], output: Self::Output, _stamp: &Stamp) -> MergeStats {
        merger::apply_translations(store, &output)
    }
}
