use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ow_integrations::Log;

const SECRETS_FILE: &str = "spotify_secret.key";
const REFRESH_TOKEN_FILE: &str = "refresh.token";

/// The application's client id and secret, as registered with Spotify.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
}

/// Somewhere the long-lived refresh token can be persisted between runs.
pub trait RefreshTokenStore: std::fmt::Debug {
    /// Returns the stored token, or `None` if there isn't a usable one.
    fn load_refresh_token(&self) -> Option<String>;

    fn save_refresh_token(&self, token: &str) -> io::Result<()>;
}

/// Plain-text credential files living side by side in one folder:
///
/// - `spotify_secret.key`: client id and client secret, one per line.
/// - `refresh.token`: the refresh token on a single line.
#[derive(Clone, Debug)]
pub struct CredentialStore {
    secrets_path: PathBuf,
    refresh_token_path: PathBuf,
}

impl CredentialStore {
    pub fn new(folder: impl AsRef<Path>) -> Self {
        let folder = folder.as_ref();

        Self {
            secrets_path: folder.join(SECRETS_FILE),
            refresh_token_path: folder.join(REFRESH_TOKEN_FILE),
        }
    }

    pub fn secrets_path(&self) -> &Path {
        &self.secrets_path
    }

    pub fn refresh_token_path(&self) -> &Path {
        &self.refresh_token_path
    }

    /// Reads the client id and secret. A file with fewer than two lines is reported as
    /// `InvalidData` so that the caller can fall back to prompting.
    pub fn load_secrets(&self) -> io::Result<ClientSecrets> {
        let contents = fs::read_to_string(&self.secrets_path)?;
        let mut lines = contents.lines().map(str::trim_end);

        match (lines.next(), lines.next()) {
            (Some(client_id), Some(client_secret)) => Ok(ClientSecrets {
                client_id: client_id.to_string(),
                client_secret: client_secret.to_string(),
            }),

            _ => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{} must contain a client id and a client secret", SECRETS_FILE),
            )),
        }
    }

    pub fn save_secrets(&self, secrets: &ClientSecrets) -> io::Result<()> {
        fs::write(
            &self.secrets_path,
            format!("{}\n{}\n", secrets.client_id, secrets.client_secret),
        )
    }
}

impl RefreshTokenStore for CredentialStore {
    fn load_refresh_token(&self) -> Option<String> {
        match fs::read_to_string(&self.refresh_token_path) {
            Ok(contents) => {
                let token = contents.lines().next().unwrap_or_default().trim_end();

                if token.is_empty() {
                    tracing::warn!(target: Log::Auth, path = ?self.refresh_token_path, "Refresh token file is empty");
                    return None;
                }

                Some(token.to_string())
            },

            Err(error) => {
                // Not having a token yet just means this is the first run.
                if error.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(target: Log::Auth, ?error, "Unable to read refresh token file");
                }

                None
            },
        }
    }

    fn save_refresh_token(&self, token: &str) -> io::Result<()> {
        fs::write(&self.refresh_token_path, format!("{}\n", token))
    }
}
