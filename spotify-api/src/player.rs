use ureq::Response;

use ow_integrations::Log;

use crate::{APIClient, ApiError, Attempt, RetryPolicy, Sleeper, ThreadSleeper, TokenManager, base_url, into_response};

const DEFAULT_API_URL: &str = "https://api.spotify.com";

/// The playback operations the dispatcher drives. Implemented by `PlayerClient`, and by
/// fakes in tests.
pub trait MediaControl {
    /// Resumes playback on the user's active device.
    fn play(&mut self) -> Result<(), ApiError>;

    /// Pauses playback on the user's active device.
    fn pause(&mut self) -> Result<(), ApiError>;

    /// Sets the volume. The value is forwarded untouched; the API decides what is valid.
    fn set_volume(&mut self, volume_percent: i64) -> Result<(), ApiError>;

    /// Whether a previously good access token has since been rejected.
    fn session_expired(&self) -> bool;

    /// Tries to get back to an authenticated session without user interaction.
    fn resume_session(&mut self) -> Result<(), ApiError>;
}

/// A playback command and the messages it reports with.
#[derive(Clone, Copy, Debug)]
struct Command<'a> {
    path: &'static str,
    query: Option<(&'static str, &'a str)>,
    success: &'a str,
    failure: &'static str,
}

/// Sends playback commands to the Web API on behalf of an authenticated user.
#[derive(Debug)]
pub struct PlayerClient<S = ThreadSleeper> {
    api_client: APIClient,
    api_url: String,
    tokens: TokenManager,
    retry: RetryPolicy,
    sleeper: S,
}

impl PlayerClient<ThreadSleeper> {
    pub fn new(api_client: APIClient, tokens: TokenManager) -> Self {
        Self {
            api_client,
            api_url: DEFAULT_API_URL.to_string(),
            tokens,
            retry: RetryPolicy::default(),
            sleeper: ThreadSleeper,
        }
    }
}

impl<S> PlayerClient<S>
where
    S: Sleeper,
{
    /// Swaps how the client waits between attempts on a busy device.
    pub fn with_sleeper<T: Sleeper>(self, sleeper: T) -> PlayerClient<T> {
        PlayerClient {
            api_client: self.api_client,
            api_url: self.api_url,
            tokens: self.tokens,
            retry: self.retry,
            sleeper,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Points the client at a different Web API host (e.g, a local mock server).
    pub fn api_url(mut self, url: &str) -> Self {
        self.api_url = base_url(url);
        self
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    pub fn tokens_mut(&mut self) -> &mut TokenManager {
        &mut self.tokens
    }

    /// Sends `command`, waiting out `202 Accepted` responses, and maps the final status
    /// code onto a result.
    fn send_command(&mut self, command: Command<'_>) -> Result<(), ApiError> {
        let Some(access_token) = self.tokens.access_token() else {
            tracing::debug!(target: Log::Spotify, path = command.path, "Skipping request, not authenticated");
            return Err(ApiError::NotAuthenticated);
        };

        let url = format!("{}{}", self.api_url, command.path);
        let bearer = format!("Bearer {}", access_token);

        let response = self.retry.run(&self.sleeper, |attempt| {
            let mut request = self.api_client.put(&url).set("Authorization", &bearer);

            if let Some((param, value)) = command.query {
                request = request.query(param, value);
            }

            tracing::trace!(target: Log::Spotify, attempt, url = %url, "Sending playback command");

            let response = into_response(request.send_bytes(&[]))?;

            match response.status() {
                202 => Ok(Attempt::Retry),
                _ => Ok(Attempt::Done(response)),
            }
        })?;

        self.parse_status(response, command)
    }

    fn parse_status(&mut self, response: Response, command: Command<'_>) -> Result<(), ApiError> {
        let status = response.status();

        match status {
            200..=299 => {
                tracing::info!(target: Log::Spotify, "{}", command.success);
                Ok(())
            },

            401 => {
                tracing::warn!(target: Log::Spotify, "Access token rejected, a refresh is required");
                self.tokens.invalidate();
                Err(ApiError::InvalidToken)
            },

            403 => Err(ApiError::RequestFailed(command.failure.to_string())),

            404 => Err(ApiError::RequestFailed("Playback device not found".to_string())),

            _ => {
                let body = response.into_string().unwrap_or_default();
                tracing::error!(target: Log::Spotify, status, body = %body, "Unexpected response to playback command");
                Err(ApiError::RequestFailed("Unhandled response code".to_string()))
            },
        }
    }
}

impl<S> MediaControl for PlayerClient<S>
where
    S: Sleeper,
{
    fn play(&mut self) -> Result<(), ApiError> {
        self.send_command(Command {
            path: "/v1/me/player/play",
            query: None,
            success: "Started playback",
            failure: "Unable to play",
        })
    }

    fn pause(&mut self) -> Result<(), ApiError> {
        self.send_command(Command {
            path: "/v1/me/player/pause",
            query: None,
            success: "Paused playback",
            failure: "Unable to pause",
        })
    }

    fn set_volume(&mut self, volume_percent: i64) -> Result<(), ApiError> {
        let volume = volume_percent.to_string();
        let success = format!("Set volume to {}", volume_percent);

        self.send_command(Command {
            path: "/v1/me/player/volume",
            query: Some(("volume_percent", &volume)),
            success: &success,
            failure: "Unable to set volume",
        })
    }

    fn session_expired(&self) -> bool {
        self.tokens.state() == crate::AuthState::Expired
    }

    fn resume_session(&mut self) -> Result<(), ApiError> {
        self.tokens.refresh()
    }
}
