use shared::error::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid server url '{0}'")]
    InvalidServerUrl(String),
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server answered {status}: {}", error.message)]
    Api { status: u16, error: ApiError },
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            ClientError::Api { error, .. } => Some(error),
            _ => None,
        }
    }
}
