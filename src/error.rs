use thiserror::Error;

/// Failure of an adapter invocation.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("upstream request to {endpoint} failed with status {status}: {body}")]
    UpstreamRequestFailed {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("run did not complete after {attempts} status checks; last status: {last_status}")]
    RunTimedOut { attempts: u32, last_status: String },

    #[error("run ended with status {status}")]
    RunFailed { status: String },

    #[error("malformed upstream response: {0}")]
    MalformedUpstreamResponse(String),

    #[error("transport error calling {endpoint}: {message}")]
    Transport { endpoint: String, message: String },
}

impl AdapterError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        AdapterError::InvalidInput(reason.into())
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        AdapterError::MalformedUpstreamResponse(reason.into())
    }

    /// Whether a status check that failed this way may be retried by the poll loop.
    pub fn is_transient(&self) -> bool {
        match self {
            AdapterError::Transport { .. } => true,
            AdapterError::UpstreamRequestFailed { status, .. } => {
                *status == 429 || (500..600).contains(status)
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, AdapterError>;
