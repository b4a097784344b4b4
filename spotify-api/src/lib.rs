//! A small, blocking client for the parts of the Spotify Web API we need: starting and
//! pausing playback, setting the volume, and the OAuth2 token exchange that guards them.

use std::ops::Deref;
use std::time::Duration;

use ureq::{Agent, AgentBuilder, Response};

mod auth;
pub use auth::{AuthState, AuthorizationPrompt, BrowserPrompt, Credentials, TokenManager};

mod credentials;
pub use credentials::{ClientSecrets, CredentialStore, RefreshTokenStore};

mod errors;
pub use errors::ApiError;

mod player;
pub use player::{MediaControl, PlayerClient};

mod retry;
pub use retry::{Attempt, RetryPolicy, Sleeper, ThreadSleeper};

/// Scope required to start, pause and change the volume of playback.
pub const PLAYBACK_SCOPE: &str = "user-modify-playback-state";

/// Default timeout that we use on client types.
pub(crate) fn default_timeout() -> Duration {
    Duration::from_millis(5000)
}

/// A wrapper type that simply dereferences to a `ureq::Agent`.
///
/// Anything that can be called on a `ureq::Agent` can be called on this type. You can
/// also clone this with little cost, as it manages itself under the hood with `Arc`; the
/// token manager and player share one connection pool this way.
#[derive(Clone, Debug)]
pub struct APIClient(Agent);

impl APIClient {
    /// Creates and initializes a new APIClient.
    pub fn new(version: &str) -> Self {
        let http_client = AgentBuilder::new()
            .max_idle_connections(2)
            .timeout(default_timeout())
            .user_agent(&format!("OverwatchSpotify/{} (Rust)", version))
            .build();

        Self(http_client)
    }
}

impl Deref for APIClient {
    type Target = Agent;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// `ureq` reports 4xx/5xx responses as errors. We want to look at every status code
/// ourselves, so fold those back into a plain response and only surface transport failures.
pub(crate) fn into_response(result: Result<Response, ureq::Error>) -> Result<Response, ApiError> {
    match result {
        Ok(response) => Ok(response),
        Err(ureq::Error::Status(_, response)) => Ok(response),
        Err(error) => Err(ApiError::Request(error)),
    }
}

/// Strips a trailing slash so paths can be appended with `format!`.
pub(crate) fn base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
