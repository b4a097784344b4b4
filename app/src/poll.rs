use std::thread;
use std::time::Duration;

use ow_dispatcher::{ActionDispatcher, DispatchReport, TransitionWatcher};
use ow_integrations::Log;
use ow_screen::{GameState, PixelSampler, StateClassifier};
use spotify_api::MediaControl;

/// Classifies the screen once and dispatches if the state changed.
pub fn tick<S, M>(
    classifier: &StateClassifier<S>,
    watcher: &mut TransitionWatcher<GameState>,
    dispatcher: &mut ActionDispatcher<M>,
) -> Option<DispatchReport>
where
    S: PixelSampler,
    M: MediaControl,
{
    let first = watcher.current().is_none();
    let state = watcher.observe(classifier.classify())?;

    match first {
        true => tracing::info!(target: Log::App, %state, "Overwatch: Initial state"),
        false => tracing::info!(target: Log::App, %state, "Overwatch: Changed state"),
    }

    let report = dispatcher.dispatch(state.config_key());

    if report.unhandled() > 0 {
        tracing::debug!(target: Log::App, ?report, "Dispatch finished with unhandled errors");
    }

    Some(report)
}

/// Polls forever. The process is expected to be ended by an interrupt.
pub fn run<S, M>(classifier: &StateClassifier<S>, dispatcher: &mut ActionDispatcher<M>, interval: Duration) -> !
where
    S: PixelSampler,
    M: MediaControl,
{
    let mut watcher = TransitionWatcher::new();

    loop {
        tick(classifier, &mut watcher, dispatcher);
        thread::sleep(interval);
    }
}
