use std::time::Duration;

use mockito::{Matcher, Server};
use tempfile::TempDir;

use ow_dispatcher::{ActionConfig, ActionDispatcher, Outcome, TransitionWatcher};
use spotify_api::{
    APIClient, ApiError, AuthState, AuthorizationPrompt, ClientSecrets, CredentialStore, MediaControl, PlayerClient,
    RefreshTokenStore, Sleeper, TokenManager,
};

#[derive(Clone, Copy, Default)]
struct NoSleep;

impl Sleeper for NoSleep {
    fn sleep(&self, _duration: Duration) {}
}

struct NoPrompt;

impl AuthorizationPrompt for NoPrompt {
    fn authorization_code(&mut self, _authorize_url: &str) -> Result<String, ApiError> {
        Err(ApiError::AuthenticationFailed("no user in tests".into()))
    }
}

fn player(server: &mut Server) -> (PlayerClient<NoSleep>, TempDir) {
    let token = server
        .mock("POST", "/api/token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token":"access-1","scope":"user-modify-playback-state"}"#)
        .create();

    let dir = tempfile::tempdir().unwrap();
    let store = CredentialStore::new(dir.path());
    store.save_refresh_token("stored-refresh").unwrap();

    let api_client = APIClient::new("test");
    let secrets = ClientSecrets {
        client_id: "client-id".into(),
        client_secret: "client-secret".into(),
    };

    let mut tokens = TokenManager::new(api_client.clone(), secrets, Box::new(store)).accounts_url(&server.url());
    tokens.authenticate(&mut NoPrompt).unwrap();
    token.remove();

    let player = PlayerClient::new(api_client, tokens)
        .api_url(&server.url())
        .with_sleeper(NoSleep);

    (player, dir)
}

#[test]
fn waiting_sets_the_volume_once() {
    let mut server = Server::new();
    let (player, _dir) = player(&mut server);

    let volume = server
        .mock("PUT", "/v1/me/player/volume")
        .match_query(Matcher::UrlEncoded("volume_percent".into(), "80".into()))
        .with_status(204)
        .expect(1)
        .create();

    let any_other = server
        .mock("PUT", Matcher::Regex("^/v1/me/player/(play|pause)$".into()))
        .expect(0)
        .create();

    let config = ActionConfig::from_json_str(r#"{"waiting": {"actions": [["set_volume", 80]]}}"#).unwrap();
    let mut dispatcher = ActionDispatcher::new(player, config);

    let report = dispatcher.dispatch("waiting");

    volume.assert();
    any_other.assert();
    assert_eq!(report.applied(), 1);
}

#[test]
fn unauthorized_pause_is_swallowed() {
    let mut server = Server::new();
    let (player, _dir) = player(&mut server);

    server.mock("PUT", "/v1/me/player/pause").with_status(401).create();

    let config = ActionConfig::from_json_str(r#"{"character_select": {"actions": [["pause"]]}}"#).unwrap();
    let mut dispatcher = ActionDispatcher::new(player, config);

    let report = dispatcher.dispatch("character_select");

    assert_eq!(report.unhandled(), 0);
    assert_eq!(report.actions[0].outcome, Outcome::Handled("access_token is invalid".into()));
    assert_eq!(dispatcher.player().tokens().state(), AuthState::Expired);
}

#[test]
fn next_transition_refreshes_an_expired_session() {
    let mut server = Server::new();
    let (player, _dir) = player(&mut server);

    let rejected = server
        .mock("PUT", "/v1/me/player/pause")
        .match_header("authorization", "Bearer access-1")
        .with_status(401)
        .create();

    let config = ActionConfig::default();
    let mut dispatcher = ActionDispatcher::new(player, config);
    dispatcher.dispatch("character_select");
    rejected.assert();

    let refresh = server
        .mock("POST", "/api/token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token":"access-2","scope":"user-modify-playback-state"}"#)
        .create();

    let volume = server
        .mock("PUT", "/v1/me/player/volume")
        .match_header("authorization", "Bearer access-2")
        .match_query(Matcher::Any)
        .with_status(204)
        .create();

    let play = server
        .mock("PUT", "/v1/me/player/play")
        .match_header("authorization", "Bearer access-2")
        .with_status(403)
        .create();

    let report = dispatcher.dispatch("main_menu");

    refresh.assert();
    volume.assert();
    play.assert();
    assert_eq!(report.applied(), 1);
    assert_eq!(report.actions[1].outcome, Outcome::Handled("Unable to play".into()));
    assert!(!dispatcher.player().session_expired());
}

#[test]
fn revoked_refresh_token_leaves_actions_unsent() {
    let mut server = Server::new();
    let (player, _dir) = player(&mut server);

    server.mock("PUT", "/v1/me/player/pause").with_status(401).expect(1).create();

    let mut dispatcher = ActionDispatcher::new(player, ActionConfig::default());
    dispatcher.dispatch("character_select");

    server.mock("POST", "/api/token").with_status(400).create();
    let sent = server.mock("PUT", Matcher::Any).expect(0).create();

    let report = dispatcher.dispatch("main_menu");

    sent.assert();
    assert_eq!(report.unhandled(), 0);
    assert!(report
        .actions
        .iter()
        .all(|action| action.outcome == Outcome::Handled(ApiError::NotAuthenticated.to_string())));
}

#[test]
fn repeated_states_dispatch_once() {
    let mut server = Server::new();
    let (player, _dir) = player(&mut server);

    let pause = server.mock("PUT", "/v1/me/player/pause").with_status(204).expect(1).create();

    let mut dispatcher = ActionDispatcher::new(player, ActionConfig::default());
    let mut watcher = TransitionWatcher::new();

    for state in ["character_select", "character_select", "character_select"] {
        if let Some(state) = watcher.observe(state) {
            dispatcher.dispatch(state);
        }
    }

    pause.assert();
}

#[test]
fn revoked_refresh_token_is_only_tried_once() {
    let mut server = Server::new();
    let (player, _dir) = player(&mut server);

    server.mock("PUT", "/v1/me/player/pause").with_status(401).expect(1).create();

    let mut dispatcher = ActionDispatcher::new(player, ActionConfig::default());
    dispatcher.dispatch("character_select");

    let refresh = server.mock("POST", "/api/token").with_status(400).expect(1).create();

    for state in ["main_menu", "waiting", "main_menu"] {
        let report = dispatcher.dispatch(state);
        assert_eq!(report.unhandled(), 0);
    }

    refresh.assert();
    assert!(!dispatcher.player().session_expired());
    assert_eq!(dispatcher.player().tokens().state(), AuthState::Unauthenticated);
}
