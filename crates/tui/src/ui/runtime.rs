//! Runtime: event loop and input routing for the TUI.
//!
//! - Owns the terminal lifecycle (alternate screen, raw mode).
//! - A dedicated task reads terminal input and forwards it over a channel.
//! - One `select!` loop drives input, finished background tasks, run
//!   progress and the animation ticker.
//! - Ticking is fast (100 ms) only while something is loading; otherwise the
//!   loop wakes every 5 s.
use std::time::Duration;

use actorbench_engine::Session;
use actorbench_types::ExecutionResult;
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures_util::{StreamExt, stream::FuturesUnordered};
use ratatui::{Terminal, prelude::*};
use tokio::task::JoinHandle;
use tokio::{
    signal,
    sync::mpsc::{self, UnboundedReceiver},
    time::{self, MissedTickBehavior},
};
use tracing::{debug, warn};

use crate::app::{App, Effect, Msg};
use crate::cmd;
use crate::ui::components::Component;
use crate::ui::main_view::MainView;

type Backend = CrosstermBackend<std::io::Stdout>;

/// Spawns a task that polls terminal input and forwards `crossterm` events
/// over a channel. Closing the receiver stops the task.
fn spawn_input_thread() -> mpsc::Receiver<Event> {
    let (sender, receiver) = mpsc::channel(500);
    tokio::task::spawn_blocking(move || {
        let poll_interval = Duration::from_millis(16);
        loop {
            if sender.is_closed() {
                break;
            }
            match event::poll(poll_interval) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(error) => {
                    warn!("Failed to poll terminal input: {}", error);
                    break;
                }
            }
            match event::read() {
                Ok(event) => {
                    if sender.blocking_send(event).is_err() {
                        break;
                    }
                }
                Err(error) => {
                    warn!("Failed to read terminal input: {}", error);
                    break;
                }
            }
        }
    });
    receiver
}

/// Puts the terminal into raw mode and enters the alternate screen.
fn setup_terminal() -> Result<Terminal<Backend>> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

/// Restores terminal settings and leaves the alternate screen.
fn cleanup_terminal(terminal: &mut Terminal<Backend>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn render(terminal: &mut Terminal<Backend>, app: &mut App, main_view: &mut MainView) -> Result<()> {
    terminal.draw(|frame| {
        let area = frame.area();
        main_view.render(frame, area, app)
    })?;
    Ok(())
}

fn is_quit_key(event: &Event) -> bool {
    matches!(event, Event::Key(key)
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}

fn handle_input_event(app: &mut App, main_view: &mut MainView, input_event: Event) -> Vec<Effect> {
    match input_event {
        Event::Key(key_event) if key_event.kind != KeyEventKind::Release => main_view.handle_key_events(app, key_event),
        _ => Vec::new(),
    }
}

/// Runs effects and queues the spawned tasks. Returns `true` on quit.
fn process_effects(
    app: &mut App,
    effects: Vec<Effect>,
    pending: &mut FuturesUnordered<JoinHandle<Msg>>,
    progress: &mut Option<UnboundedReceiver<ExecutionResult>>,
) -> bool {
    if effects.is_empty() {
        return false;
    }
    let batch = cmd::run_from_effects(app, effects);
    pending.extend(batch.pending);
    if let Some(receiver) = app.take_pending_progress() {
        *progress = Some(receiver);
    }
    batch.quit
}

/// Entry point for the TUI runtime: sets up the terminal, runs the event
/// loop and restores the terminal on exit.
///
/// `initial_key` pre-fills the key entry form.
pub async fn run_app(session: Session, initial_key: Option<String>) -> Result<()> {
    let mut input_receiver = spawn_input_thread();
    let mut main_view = MainView::default();
    let mut app = App::new(session);
    let mut terminal = setup_terminal()?;

    let mut pending: FuturesUnordered<JoinHandle<Msg>> = FuturesUnordered::new();
    let mut progress: Option<UnboundedReceiver<ExecutionResult>> = None;

    if let Some(api_key) = initial_key {
        app.auth.key.set_input(api_key);
    }

    let fast_interval = Duration::from_millis(100);
    let idle_interval = Duration::from_millis(5000);
    let mut current_interval = idle_interval;
    let mut ticker = time::interval(current_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    render(&mut terminal, &mut app, &mut main_view)?;

    loop {
        let needs_animation = app.is_busy();
        let target_interval = if needs_animation { fast_interval } else { idle_interval };
        if target_interval != current_interval {
            current_interval = target_interval;
            ticker = time::interval(current_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        }

        let mut needs_render = false;
        let mut effects = Vec::new();
        tokio::select! {
            maybe_event = input_receiver.recv() => {
                let Some(event) = maybe_event else {
                    break;
                };
                if is_quit_key(&event) {
                    break;
                }
                effects = handle_input_event(&mut app, &mut main_view, event);
                needs_render = true;
            }

            Some(joined) = pending.next(), if !pending.is_empty() => {
                match joined {
                    Ok(msg) => app.update(msg),
                    Err(error) => warn!("Background task failed: {}", error),
                }
                needs_render = true;
            }

            maybe_snapshot = async {
                match progress.as_mut() {
                    Some(receiver) => receiver.recv().await,
                    None => None,
                }
            }, if progress.is_some() => {
                match maybe_snapshot {
                    Some(snapshot) => {
                        app.update(Msg::RunProgress(snapshot));
                        needs_render = true;
                    }
                    None => progress = None,
                }
            }

            _ = ticker.tick() => {
                app.update(Msg::Tick);
                needs_render = needs_animation;
            }

            _ = signal::ctrl_c() => { break; }
        }

        if process_effects(&mut app, effects, &mut pending, &mut progress) {
            break;
        }
        if needs_render {
            render(&mut terminal, &mut app, &mut main_view)?;
        }
    }

    debug!(pending = pending.len(), "shutting down");
    app.execution.cancel_run();
    drop(input_receiver);
    cleanup_terminal(&mut terminal)?;
    Ok(())
}
