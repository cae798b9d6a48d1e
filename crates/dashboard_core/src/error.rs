use shared::{error::ErrorBody, forms::ValidationError};
use thiserror::Error;

const GENERIC_FETCH_FAILURE: &str = "There was an error fetching data.";

/// Failure of a list fetch or a mutation.
///
/// Kept `Clone` so the last failure can live inside the published view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("failed to reach server: {0}")]
    Unreachable(String),
    #[error("server responded with status {status}")]
    Server { status: u16, message: Option<String> },
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("invalid endpoint url: {0}")]
    InvalidUrl(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl FetchError {
    pub fn server(status: u16, body: &ErrorBody) -> Self {
        Self::Server {
            status,
            message: body.message(),
        }
    }

    /// Text shown in the failure notification.
    pub fn user_message(&self) -> String {
        match self {
            Self::Unreachable(_) => "Can't connect to server.".to_string(),
            Self::Server {
                message: Some(message),
                ..
            } => message.clone(),
            Self::Server {
                status,
                message: None,
            } => format!("Server Error ({status})"),
            Self::Validation(err) => err.to_string(),
            Self::Decode(_) | Self::InvalidUrl(_) => GENERIC_FETCH_FAILURE.to_string(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Validation(_) | Self::InvalidUrl(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::Decode(err.to_string());
        }
        if let Some(status) = err.status() {
            return Self::Server {
                status: status.as_u16(),
                message: None,
            };
        }
        Self::Unreachable(err.to_string())
    }
}

impl From<url::ParseError> for FetchError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}
