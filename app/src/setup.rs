use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};

use ow_config::AppSettings;
use ow_integrations::Log;
use spotify_api::{APIClient, BrowserPrompt, ClientSecrets, CredentialStore, PlayerClient, TokenManager};

/// Loads (or asks for) the client secrets, authenticates, and hands back a player ready
/// for the poll loop. Any authentication failure here ends the run.
pub fn connect(settings: &AppSettings, folder: &Path) -> Result<PlayerClient> {
    let store = CredentialStore::new(folder);
    let secrets = load_or_prompt_secrets(&store, &mut io::stdin().lock())?;

    let api_client = APIClient::new(env!("CARGO_PKG_VERSION"));

    let mut tokens = TokenManager::new(api_client.clone(), secrets, Box::new(store))
        .accounts_url(&settings.accounts_url)
        .redirect_uri(settings.redirect_uri.as_str())
        .scopes(settings.scopes.clone());

    tokens
        .authenticate(&mut BrowserPrompt)
        .context("Unable to authenticate with Spotify")?;

    Ok(PlayerClient::new(api_client, tokens).api_url(&settings.api_url))
}

/// Reads the client id and secret from the store, or asks for them on `input` and tries
/// to save them for next time. Not being able to save them is only a warning.
pub fn load_or_prompt_secrets<R>(store: &CredentialStore, input: &mut R) -> Result<ClientSecrets>
where
    R: BufRead,
{
    match store.load_secrets() {
        Ok(secrets) => {
            tracing::info!(target: Log::App, "Successfully loaded client information");
            return Ok(secrets);
        },

        Err(error) => {
            tracing::info!(target: Log::App, path = ?store.secrets_path(), "Could not access client secrets file");
            tracing::debug!(target: Log::App, ?error);
        },
    }

    let client_id = prompt(input, "Enter your Spotify application's Client ID: ")?;
    let client_secret = prompt(input, "Enter your Spotify application's Client Secret: ")?;

    if client_id.is_empty() || client_secret.is_empty() {
        bail!("A client id and client secret are required");
    }

    let secrets = ClientSecrets {
        client_id,
        client_secret,
    };

    match store.save_secrets(&secrets) {
        Ok(()) => tracing::info!(target: Log::App, "Successfully saved client information"),

        Err(error) => {
            tracing::error!(target: Log::App, "Unable to write client secrets file. Client info will not persist");
            tracing::debug!(target: Log::App, ?error);
        },
    }

    Ok(secrets)
}

fn prompt<R>(input: &mut R, message: &str) -> Result<String>
where
    R: BufRead,
{
    print!("{}", message);
    io::stdout().flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;

    Ok(line.trim().to_string())
}
