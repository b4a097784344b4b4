use std::collections::BTreeSet;
use std::io::{self, BufRead, Write};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ureq::Response;

use ow_integrations::Log;

use crate::{APIClient, ApiError, ClientSecrets, RefreshTokenStore, PLAYBACK_SCOPE, base_url, into_response};

const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.spotify.com";
const DEFAULT_REDIRECT_URI: &str = "https://localhost/";

/// Everything we know about our authorization with Spotify.
///
/// Only the `TokenManager` mutates this; `access_token` and `authenticated` change on
/// `authenticate()`, `refresh()`, and when a request comes back unauthorized.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub authenticated: bool,
    pub scopes: Vec<String>,
}

/// Where the token lifecycle currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthState {
    /// We have never held an access token.
    Unauthenticated,

    /// The current access token is believed to be good.
    Authenticated,

    /// We had an access token but the API rejected it; `refresh()` should be attempted.
    Expired,
}

/// Walks the user through the interactive half of the authorization-code flow.
pub trait AuthorizationPrompt {
    /// Sends the user to `authorize_url` and returns the authorization code they bring back.
    fn authorization_code(&mut self, authorize_url: &str) -> Result<String, ApiError>;
}

/// Opens the authorization page in the default browser and reads the resulting code
/// from stdin.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserPrompt;

impl AuthorizationPrompt for BrowserPrompt {
    fn authorization_code(&mut self, authorize_url: &str) -> Result<String, ApiError> {
        let stdin = io::stdin();
        let mut input = String::new();

        println!("A browser window will be opened so that you can authorize this app");
        println!("After you press enter, authenticate with Spotify and paste the \"code\" parameter at the next prompt");
        print!("<press Enter to continue>");
        io::stdout().flush()?;
        stdin.lock().read_line(&mut input)?;

        tracing::info!(target: Log::Auth, url = authorize_url, "Opening authorization page in browser");

        if let Err(error) = open::that_detached(authorize_url) {
            tracing::error!(target: Log::Auth, ?error, "Failed to open authorization page");
            println!("Unable to open a browser, please visit this URL manually:\n{}", authorize_url);
        }

        print!("Please paste the \"code\" parameter from the URL here: ");
        io::stdout().flush()?;

        input.clear();
        stdin.lock().read_line(&mut input)?;

        let code = input.trim();

        if code.is_empty() {
            return Err(ApiError::AuthenticationFailed("No authorization code was provided".into()));
        }

        Ok(code.to_string())
    }
}

/// The subset of the token endpoint's response that we care about. Everything is
/// optional here so that a missing field can be reported on our own terms.
#[derive(Debug, Default, serde::Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    scope: Option<String>,
}

/// Owns our OAuth2 credentials and talks to the accounts service to obtain and renew
/// access tokens.
#[derive(Debug)]
pub struct TokenManager {
    api_client: APIClient,
    accounts_url: String,
    redirect_uri: String,
    credentials: Credentials,
    store: Box<dyn RefreshTokenStore>,
}

impl TokenManager {
    /// Creates a manager that requests the playback scope from the production accounts
    /// service. Use the builder methods to point it elsewhere.
    pub fn new(api_client: APIClient, secrets: ClientSecrets, store: Box<dyn RefreshTokenStore>) -> Self {
        Self {
            api_client,
            accounts_url: DEFAULT_ACCOUNTS_URL.to_string(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            credentials: Credentials {
                client_id: secrets.client_id,
                client_secret: secrets.client_secret,
                scopes: vec![PLAYBACK_SCOPE.to_string()],
                ..Default::default()
            },
            store,
        }
    }

    /// Sets the accounts service base URL (e.g, `https://accounts.spotify.com`).
    pub fn accounts_url(mut self, url: &str) -> Self {
        self.accounts_url = base_url(url);
        self
    }

    /// Sets the redirect URI registered for the application.
    pub fn redirect_uri<Uri>(mut self, uri: Uri) -> Self
    where
        Uri: Into<String>,
    {
        self.redirect_uri = uri.into();
        self
    }

    /// Sets the scopes to request. The granted scopes must match these exactly.
    pub fn scopes(mut self, scopes: Vec<String>) -> Self {
        self.credentials.scopes = scopes;
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn state(&self) -> AuthState {
        match (self.credentials.authenticated, self.credentials.access_token.is_some()) {
            (true, _) => AuthState::Authenticated,
            (false, true) => AuthState::Expired,
            (false, false) => AuthState::Unauthenticated,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.authenticated
    }

    /// The bearer token to send, if we currently consider ourselves authenticated.
    pub(crate) fn access_token(&self) -> Option<&str> {
        match self.credentials.authenticated {
            true => self.credentials.access_token.as_deref(),
            false => None,
        }
    }

    /// Called when the API rejects our access token. Nothing is sent until a
    /// `refresh()` succeeds.
    pub(crate) fn invalidate(&mut self) {
        self.credentials.authenticated = false;
    }

    /// The page the user visits to grant us access.
    pub fn authorize_url(&self) -> Result<String, ApiError> {
        let endpoint = format!("{}/authorize", self.accounts_url);
        let scope = self.credentials.scopes.join(" ");

        let url = url::Url::parse_with_params(
            &endpoint,
            &[
                ("client_id", self.credentials.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", scope.as_str()),
            ],
        )
        .map_err(|error| ApiError::AuthenticationFailed(format!("Invalid accounts URL: {}", error)))?;

        Ok(url.into())
    }

    /// Gets us to `AuthState::Authenticated`.
    ///
    /// A stored refresh token is tried first. If there isn't one, or the accounts service
    /// rejects it, we fall back to the interactive authorization-code flow and persist the
    /// refresh token it yields. Failures in the interactive flow are fatal.
    pub fn authenticate(&mut self, prompt: &mut dyn AuthorizationPrompt) -> Result<(), ApiError> {
        if self.credentials.client_id.is_empty() || self.credentials.client_secret.is_empty() {
            tracing::warn!(target: Log::Auth, "Cannot authenticate without a client id and client secret");
            return Err(ApiError::InvalidClient);
        }

        if let Some(refresh_token) = self.store.load_refresh_token() {
            self.credentials.refresh_token = Some(refresh_token);

            match self.refresh() {
                Ok(()) => return Ok(()),

                Err(ApiError::InvalidToken) => {
                    tracing::warn!(target: Log::Auth, "Unable to authenticate with the stored refresh token");
                },

                Err(error) => return Err(error),
            }
        }

        let code = prompt.authorization_code(&self.authorize_url()?)?;
        self.exchange_code(&code)?;

        tracing::info!(target: Log::Auth, "Authentication succeeded");

        if let Some(refresh_token) = self.credentials.refresh_token.as_deref() {
            if let Err(error) = self.store.save_refresh_token(refresh_token) {
                tracing::warn!(target: Log::Auth, ?error, "Unable to write refresh token file. Refresh token will not persist");
                return Err(error.into());
            }
        }

        Ok(())
    }

    /// Redeems the refresh token for a new access token.
    ///
    /// Fails with `InvalidClient` before sending anything if the client id, client secret
    /// or refresh token are missing, and with `InvalidToken` if the accounts service turns
    /// the refresh token down. That case is not retried: the user has to authorize again.
    pub fn refresh(&mut self) -> Result<(), ApiError> {
        match self.redeem_refresh_token() {
            Err(error @ (ApiError::InvalidToken | ApiError::AuthenticationFailed(_))) => {
                self.revoke();
                Err(error)
            },

            result => result,
        }
    }

    /// Drops the access token after the accounts service refused to renew it. The session
    /// is then `Unauthenticated` rather than `Expired`, so nothing tries to refresh it
    /// again; only a fresh `authenticate()` recovers.
    fn revoke(&mut self) {
        if self.credentials.access_token.take().is_some() {
            tracing::warn!(target: Log::Auth, "Session revoked, restart to authorize again");
        }

        self.credentials.authenticated = false;
    }

    fn redeem_refresh_token(&mut self) -> Result<(), ApiError> {
        let refresh_token = match self.credentials.refresh_token.clone() {
            Some(token)
                if !token.is_empty()
                    && !self.credentials.client_id.is_empty()
                    && !self.credentials.client_secret.is_empty() =>
            {
                token
            },

            _ => {
                tracing::warn!(target: Log::Auth, "Cannot refresh if client_id, client_secret, or refresh_token are not set");
                return Err(ApiError::InvalidClient);
            },
        };

        let response = self.request_token(&[("grant_type", "refresh_token"), ("refresh_token", refresh_token.as_str())])?;
        let status = response.status();

        if status != 200 {
            let body = response.into_string().unwrap_or_default();

            if status == 400 {
                tracing::info!(
                    target: Log::Auth,
                    "Refresh token is invalid. Please delete the refresh token file and authorize again"
                );
            }

            tracing::debug!(target: Log::Auth, status, body = %body, "Refresh rejected");
            return Err(ApiError::InvalidToken);
        }

        let payload = parse_token_response(response).map_err(|error| {
            tracing::debug!(target: Log::Auth, ?error, "Unreadable refresh response");
            ApiError::InvalidToken
        })?;

        let access_token = payload.access_token.ok_or(ApiError::InvalidToken)?;
        self.verify_scopes(payload.scope.as_deref())?;

        self.credentials.access_token = Some(access_token);
        self.credentials.authenticated = true;

        // The accounts service may rotate the refresh token; keep the new one around.
        if let Some(rotated) = payload.refresh_token.filter(|token| *token != refresh_token) {
            if let Err(error) = self.store.save_refresh_token(&rotated) {
                tracing::warn!(target: Log::Auth, ?error, "Unable to persist rotated refresh token");
            }

            self.credentials.refresh_token = Some(rotated);
        }

        tracing::info!(target: Log::Auth, "Authentication with refresh token succeeded");

        Ok(())
    }

    /// Trades an authorization code for an access and refresh token pair.
    fn exchange_code(&mut self, code: &str) -> Result<(), ApiError> {
        let response = self.request_token(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ])?;

        let status = response.status();

        if status != 200 {
            let body = response.into_string().unwrap_or_default();
            tracing::error!(target: Log::Auth, status, "Authentication failed");
            tracing::debug!(target: Log::Auth, body = %body, "Token endpoint response");

            return Err(ApiError::AuthenticationFailed(format!("token endpoint returned {}", status)));
        }

        let payload = parse_token_response(response)?;

        let (access_token, refresh_token) = match (payload.access_token, payload.refresh_token) {
            (Some(access_token), Some(refresh_token)) => (access_token, refresh_token),

            _ => {
                tracing::error!(target: Log::Auth, "Authentication failed, token response is incomplete");
                return Err(ApiError::AuthenticationFailed("missing access_token or refresh_token".into()));
            },
        };

        self.verify_scopes(payload.scope.as_deref())?;

        self.credentials.access_token = Some(access_token);
        self.credentials.refresh_token = Some(refresh_token);
        self.credentials.authenticated = true;

        Ok(())
    }

    /// POSTs a form to the token endpoint with HTTP Basic client authentication.
    fn request_token(&self, form: &[(&str, &str)]) -> Result<Response, ApiError> {
        let url = format!("{}/api/token", self.accounts_url);
        let basic = STANDARD.encode(format!(
            "{}:{}",
            self.credentials.client_id, self.credentials.client_secret
        ));

        into_response(
            self.api_client
                .post(&url)
                .set("Authorization", &format!("Basic {}", basic))
                .send_form(form),
        )
    }

    /// The granted scopes must be exactly the ones we asked for.
    fn verify_scopes(&self, granted: Option<&str>) -> Result<(), ApiError> {
        let requested: BTreeSet<&str> = self.credentials.scopes.iter().map(String::as_str).collect();
        let granted: BTreeSet<&str> = granted.unwrap_or_default().split_whitespace().collect();

        if granted != requested {
            tracing::error!(target: Log::Auth, ?requested, ?granted, "Granted scopes do not match the requested scopes");
            return Err(ApiError::AuthenticationFailed("granted scopes do not match".into()));
        }

        Ok(())
    }
}

fn parse_token_response(response: Response) -> Result<TokenResponse, ApiError> {
    let body = response.into_string()?;

    serde_json::from_str(&body)
        .map_err(|error| ApiError::AuthenticationFailed(format!("Unable to parse token response: {}", error)))
}
