use std::fmt;
use std::path::PathBuf;

use kvocab_config::ConfigError;
use kvocab_service::ServiceError;

use crate::retry::RetryError;

/// Where in a run a batch failure happened
#[derive(Debug, Clone)]
pub struct BatchContext {
    pub operation: &'static str,
    /// 1-based batch index
    pub batch: usize,
    pub request_id: String,
}

impl fmt::Display for BatchContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} batch {} (request {})",
            self.operation, self.batch, self.request_id
        )
    }
}

/// Failure of a single batch before context is attached
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: ServiceError },

    #[error(transparent)]
    Service(ServiceError),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl From<RetryError<ServiceError>> for BatchError {
    fn from(err: RetryError<ServiceError>) -> Self {
        match err {
            RetryError::Exhausted { attempts, last } => BatchError::RetriesExhausted { attempts, last },
            RetryError::Fatal(err) => BatchError::Service(err),
        }
    }
}

impl BatchError {
    pub fn in_batch(self, context: BatchContext) -> PipelineError {
        match self {
            BatchError::RetriesExhausted { attempts, last } => PipelineError::RetriesExhausted {
                context,
                attempts,
                source: last,
            },
            BatchError::Service(source) => PipelineError::Service { context, source },
            BatchError::MalformedResponse(reason) => {
                PipelineError::MalformedResponse { context, reason }
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("store not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("{context}: gave up after {attempts} attempts: {source}")]
    RetriesExhausted {
        context: BatchContext,
        attempts: u32,
        #[source]
        source: ServiceError,
    },

    #[error("{context}: malformed response: {reason}")]
    MalformedResponse {
        context: BatchContext,
        reason: String,
    },

    #[error("{context}: {source}")]
    Service {
        context: BatchContext,
        #[source]
        source: ServiceError,
    },

    #[error("{context}: failed to persist store: {source}")]
    Persist {
        context: BatchContext,
        #[source]
        source: Box<PipelineError>,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store file {} is not valid: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl PipelineError {
    /// Batch context for replaying or rolling back a failed batch
    pub fn batch_context(&self) -> Option<&BatchContext> {
        match self {
            PipelineError::RetriesExhausted { context, .. }
            | PipelineError::MalformedResponse { context, .. }
            | PipelineError::Service { context, .. }
            | PipelineError::Persist { context, .. } => Some(context),
            _ => None,
        }
    }
}
