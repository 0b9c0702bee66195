use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BcClientError {
    #[error("Failed to build explorer http client: {0}")]
    FailedToBuildClient(String),
    #[error("Request to {url} failed: {reason}")]
    Network { url: String, reason: String },
    #[error("Request to {url} failed with status code {status}")]
    Status { url: String, status: u16 },
    #[error("Unexpected response from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },
    #[error("Invalid {kind} '{value}': only ASCII letters and digits are accepted")]
    InvalidIdentifier { kind: &'static str, value: String },
}

impl BcClientError {
    /// Whether repeating the same request may succeed. Connection problems,
    /// rate limiting and server side failures qualify.
    pub fn is_retryable(&self) -> bool {
        match self {
            BcClientError::Network { .. } => true,
            BcClientError::Status { status, .. } => *status == 429 || *status >= 500,
            BcClientError::FailedToBuildClient(_)
            | BcClientError::MalformedResponse { .. }
            | BcClientError::InvalidIdentifier { .. } => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum AggregatorError {
    #[error(transparent)]
    Explorer(#[from] BcClientError),
    #[error("Transaction {0} is not confirmed yet and has no block time")]
    UnconfirmedTransaction(String),
    #[error("Block time {0} is out of range")]
    InvalidBlockTime(i64),
}
