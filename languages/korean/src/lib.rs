pub mod gemini;
pub mod loader;
pub mod nlp;
pub mod prompts;

pub use gemini::GeminiClient;
pub use loader::{FrequencyListLoader, IngestError};
pub use nlp::CloudNlpLemmatizer;
pub use prompts::KoreanPrompts;
