pub mod audit;
pub mod batcher;
pub mod error;
pub mod items;
pub mod merger;
pub mod pipeline;
pub mod preprocess;
pub mod prompt;
pub mod rate_limit;
pub mod retry;
pub mod rollback;
pub mod store;
pub mod validator;

pub use error::{BatchError, PipelineError};
pub use store::{RecordStore, Store};
