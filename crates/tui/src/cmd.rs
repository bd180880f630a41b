//! # Effect execution
//!
//! Translates [`Effect`]s returned by components into state changes and
//! background tasks. Network work never runs on the UI task: each request is
//! spawned with everything it needs and reports back with a [`Msg`], which
//! the runtime feeds into [`App::update`].

use actorbench_types::ExecutionResult;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::app::{App, Effect, Msg};

/// Results of one batch of effects.
#[derive(Default)]
pub(crate) struct CommandBatch {
    /// Spawned tasks that resolve to a message.
    pub pending: Vec<JoinHandle<Msg>>,
    pub quit: bool,
}

pub(crate) fn run_from_effects(app: &mut App, effects: Vec<Effect>) -> CommandBatch {
    let mut batch = CommandBatch::default();
    for effect in effects {
        match effect {
            Effect::Authenticate(api_key) => authenticate(app, &api_key, &mut batch),
            Effect::SelectActor(actor) => {
                let actor_id = actor.id.clone();
                match app.session.begin_selection(actor) {
                    Ok(request) => {
                        app.schema_pane.loading = true;
                        app.schema_pane.scroll.reset();
                        app.execution.reset(None);
                        batch.pending.push(tokio::spawn(async move {
                            let (actor_id, schema) = request.fetch().await;
                            Msg::SchemaLoaded { actor_id, schema }
                        }));
                    }
                    Err(error) => debug!(actor_id = %actor_id, error = %error, "cannot select actor"),
                }
            }
            Effect::Execute => execute(app, &mut batch),
            Effect::CancelRun => {
                if app.execution.running {
                    info!("cancelling run");
                    app.execution.cancel_run();
                }
            }
            Effect::Logout => app.reset_to_login(),
            Effect::Quit => batch.quit = true,
        }
    }
    batch
}

fn authenticate(app: &mut App, api_key: &str, batch: &mut CommandBatch) {
    if app.auth.loading {
        return;
    }
    let connection = match app.session.connect(api_key) {
        Ok(connection) => connection,
        Err(error) => {
            app.auth.error = Some(error.to_string());
            return;
        }
    };
    app.auth.loading = true;
    app.auth.error = None;
    batch.pending.push(tokio::spawn(async move {
        let outcome = connection.load_directory().await;
        Msg::Authenticated(outcome.map(|actors| (connection, actors)).map_err(|error| error.to_string()))
    }));
}

fn execute(app: &mut App, batch: &mut CommandBatch) {
    if app.execution.running {
        return;
    }
    let request = match app.session.prepare_execution(app.execution.form.values()) {
        Ok(request) => request,
        Err(error) => {
            app.execution.error = Some(error.to_string());
            return;
        }
    };

    let cancel = CancellationToken::new();
    let (sender, receiver) = mpsc::unbounded_channel::<ExecutionResult>();
    let generation = app.execution.start_run(cancel.clone());
    app.set_pending_progress(receiver);
    info!(actor_id = %request.actor_id, "executing actor");

    batch.pending.push(tokio::spawn(async move {
        let outcome = request.run(cancel, Some(sender)).await.map_err(|error| error.to_string());
        Msg::RunFinished { generation, outcome }
    }));
}
