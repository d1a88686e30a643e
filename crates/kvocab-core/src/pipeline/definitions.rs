use std::sync::Arc;

use kvocab_service::LanguageModel;
use kvocab_types::{Pos, Rank};

use super::{CallPolicy, Operation, batch_entries};
use crate::audit::pending_definitions;
use crate::error::BatchError;
use crate::items::DefinitionItem;
use crate::merger::{self, MergeStats, Stamp};
use crate::prompt::PromptSet;
use crate::store::Store;

/// Learner-oriented definitions for undefined terms of the target parts of speech
pub struct GenerateDefinitions {
    pub llm: Arc<dyn LanguageModel>,
    pub prompts: Arc<dyn PromptSet>,
    pub policy: CallPolicy,
    pub batch_size: usize,
    pub targets: Vec<Pos>,
}

#[async_trait::async_trait]
impl Operation for GenerateDefinitions {
    type Output = Vec<DefinitionItem>;

    fn name(&self) -> &'static str {
        "define"
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn pending(&self, store: &Store) -> Vec<Rank> {
        pending_definitions(store, &self.targets)
    }

    async fn fetch(&self, store: &Store, batch: &[Rank]) -> Result<Self::Output, BatchError> {
        let text = self.prompts.definitions(&batch_entries(store, batch));
        self.policy.structured(self.llm.as_ref(), text, batch).await
    }

    fn merge(&self, store: &mut Store, _batch: &[Rank], output: Self::Output, stamp: &Stamp) -> MergeStats {
        merger::apply_definitions(store, &output, stamp)
    }
}
