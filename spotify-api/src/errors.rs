use thiserror::Error;

/// Every way a call into the Web API (or the accounts service) can fail.
///
/// Callers are expected to match on the variant rather than the message; the
/// dispatcher in particular treats `NotAuthenticated` and `InvalidToken` as routine.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("The client is not authenticated, no request was sent")]
    NotAuthenticated,

    #[error("access_token is invalid")]
    InvalidToken,

    #[error("client_id, client_secret or refresh_token are not set")]
    InvalidClient,

    #[error("{0}")]
    RequestFailed(String),

    #[error("The playback device did not become available in time")]
    Timeout,

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error(transparent)]
    Request(ureq::Error),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

impl ApiError {
    /// The reason carried by a `RequestFailed`, if this is one.
    pub fn failure_message(&self) -> Option<&str> {
        match self {
            Self::RequestFailed(message) => Some(message.as_str()),
            _ => None,
        }
    }
}
