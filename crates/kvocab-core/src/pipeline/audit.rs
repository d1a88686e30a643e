use std::sync::Arc;

use kvocab_service::LanguageModel;
use kvocab_types::Rank;

use super::{CallPolicy, Operation, batch_entries};
use crate::audit::pending_audit;
use crate::error::BatchError;
use crate::items::AuditItem;
use crate::merger::{self, MergeStats, Stamp};
use crate::prompt::PromptSet;
use crate::store::Store;

/// First quality review of freshly defined entries
pub struct AuditDefinitions {
    pub llm: Arc<dyn LanguageModel>,
    pub prompts: Arc<dyn PromptSet>,
    pub policy: CallPolicy,
    pub batch_size: usize,
}

#[async_trait::async_trait]
impl Operation for AuditDefinitions {
    type Output = Vec<AuditItem>;

    fn name(&self) -> &'static str {
        "audit"
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn pending(&self, store: &Store) -> Vec<Rank> {
        pending_audit(store)
    }

    async fn fetch(&self, store: &Store, batch: &[Rank]) -> Result<Self::Output, BatchError> {
        let text = self.prompts.audit(&batch_entries(store, batch));
        self.policy.structured(self.llm.as_ref(), text, batch).await
    }

    fn merge(&self, store: &mut Store, batch: &[Rank], output: Self::Output, stamp: &Stamp) -> MergeStats {
        merger::apply_audit(store, batch, &output, stamp)
    }
}
