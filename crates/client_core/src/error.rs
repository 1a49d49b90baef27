use thiserror::Error;

/// The request never produced a response (connection refused, DNS, reset, ...).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("network request failed: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value.to_string())
    }
}

#[derive(Debug, Error)]
pub enum PageAddressError {
    #[error("invalid page address: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("page address '{0}' has no usable origin")]
    OpaqueOrigin(String),
    #[error("page address '{0}' does not end with a question identifier")]
    MissingQuestionId(String),
}

/// Input rejected before any request is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a question first.")]
    EmptyQuestion,
    #[error("Please write something first.")]
    EmptyOpinion,
}
