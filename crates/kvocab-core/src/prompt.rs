use kvocab_types::Entry;

/// Wording of the language model requests, one method per operation.
///
/// Implementations describe the batch entries; the response schema is
/// fixed by the operation and attached separately.
pub trait PromptSet: Send + Sync {
    fn definitions(&self, entries: &[&Entry]) -> String;

    fn audit(&self, entries: &[&Entry]) -> String;

    /// Entries carry the open concerns to address
    fn correction(&self, entries: &[&Entry]) -> String;

    fn translation(&self, entries: &[&Entry]) -> String;
}
