//! Application state and message handling for the Actorbench TUI.
//!
//! [`App`] wraps the engine's [`Session`] with the view state each pane
//! needs (key entry, list cursor, form drafts, run progress). State changes
//! arrive as [`Msg`]s; user intents leave as [`Effect`]s that `cmd` turns
//! into background tasks.

use actorbench_engine::{Connection, FormState, PollEnd, RunOutcome, Session, form_fields};
use actorbench_types::{Actor, ActorSchema, ExecutionResult};
use ratatui::widgets::ListState;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::ui::components::common::{FieldEditor, ScrollMetrics, TextInputState};
use crate::ui::theme::{self, Theme};

/// Pane that receives key events once authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pane {
    #[default]
    Actors,
    Schema,
    Form,
}

impl Pane {
    pub fn next(self) -> Self {
        match self {
            Pane::Actors => Pane::Schema,
            Pane::Schema => Pane::Form,
            Pane::Form => Pane::Actors,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            Pane::Actors => Pane::Form,
            Pane::Schema => Pane::Actors,
            Pane::Form => Pane::Schema,
        }
    }
}

/// Messages delivered to [`App::update`].
pub enum Msg {
    Tick,
    Authenticated(Result<(Connection, Vec<Actor>), String>),
    SchemaLoaded {
        actor_id: String,
        schema: Option<ActorSchema>,
    },
    RunProgress(ExecutionResult),
    RunFinished {
        generation: u64,
        outcome: Result<RunOutcome, String>,
    },
}

/// Side effects requested by components.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Authenticate(String),
    SelectActor(Actor),
    Execute,
    CancelRun,
    Logout,
    Quit,
}

#[derive(Debug, Default)]
pub struct AuthState {
    pub key: TextInputState,
    pub show_key: bool,
    pub error: Option<String>,
    pub loading: bool,
}

#[derive(Debug, Default)]
pub struct SchemaPaneState {
    pub loading: bool,
    pub scroll: ScrollMetrics,
}

/// Form drafts, committed values and the state of the current run.
#[derive(Debug, Default)]
pub struct ExecutionState {
    pub editors: Vec<FieldEditor>,
    pub form: FormState,
    /// Index into `editors`; `editors.len()` is the execute button.
    pub focused: usize,
    pub running: bool,
    pub cancel: Option<CancellationToken>,
    pub generation: u64,
    pub result: Option<ExecutionResult>,
    pub ended: Option<PollEnd>,
    pub error: Option<String>,
    pub form_scroll: ScrollMetrics,
    pub result_scroll: ScrollMetrics,
}

impl ExecutionState {
    /// Rebuilds the form for `schema` and forgets any previous run. A run
    /// still in flight is cancelled and its result will be ignored.
    pub fn reset(&mut self, schema: Option<&ActorSchema>) {
        self.cancel_run();
        self.running = false;
        self.generation += 1;
        self.editors = schema.map(form_fields).unwrap_or_default().into_iter().map(FieldEditor::new).collect();
        self.form.clear();
        self.focused = 0;
        self.result = None;
        self.ended = None;
        self.error = None;
        self.form_scroll.reset();
        self.result_scroll.reset();
    }

    /// Marks a new run as started and returns its generation.
    pub fn start_run(&mut self, cancel: CancellationToken) -> u64 {
        self.generation += 1;
        self.running = true;
        self.cancel = Some(cancel);
        self.result = None;
        self.ended = None;
        self.error = None;
        self.result_scroll.reset();
        self.generation
    }

    pub fn cancel_run(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
    }

    pub fn on_execute_button(&self) -> bool {
        self.focused >= self.editors.len()
    }

    pub fn focused_editor_mut(&mut self) -> Option<&mut FieldEditor> {
        self.editors.get_mut(self.focused)
    }

    pub fn focus_next(&mut self) {
        self.focused = (self.focused + 1).min(self.editors.len());
    }

    pub fn focus_previous(&mut self) {
        self.focused = self.focused.saturating_sub(1);
    }
}

pub struct App {
    pub session: Session,
    pub theme: Box<dyn Theme>,
    pub focus: Pane,
    pub auth: AuthState,
    pub actor_list: ListState,
    pub schema_pane: SchemaPaneState,
    pub execution: ExecutionState,
    /// Animation frame for the loading indicator.
    pub throbber_idx: usize,
    pending_progress: Option<UnboundedReceiver<ExecutionResult>>,
}

impl App {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            theme: theme::load(),
            focus: Pane::default(),
            auth: AuthState::default(),
            actor_list: ListState::default(),
            schema_pane: SchemaPaneState::default(),
            execution: ExecutionState::default(),
            throbber_idx: 0,
            pending_progress: None,
        }
    }

    /// True while a background task is in flight and the throbber animates.
    pub fn is_busy(&self) -> bool {
        self.auth.loading || self.schema_pane.loading || self.execution.running
    }

    pub fn set_pending_progress(&mut self, receiver: UnboundedReceiver<ExecutionResult>) {
        self.pending_progress = Some(receiver);
    }

    /// Hands a newly created progress receiver to the runtime loop.
    pub fn take_pending_progress(&mut self) -> Option<UnboundedReceiver<ExecutionResult>> {
        self.pending_progress.take()
    }

    /// Returns to the key entry screen with nothing remembered.
    pub fn reset_to_login(&mut self) {
        self.session.logout();
        self.execution.reset(None);
        self.auth = AuthState::default();
        self.actor_list = ListState::default();
        self.schema_pane = SchemaPaneState::default();
        self.focus = Pane::default();
    }

    pub fn update(&mut self, msg: Msg) {
        match msg {
            Msg::Tick => {
                if self.is_busy() {
                    self.throbber_idx = self.throbber_idx.wrapping_add(1);
                } else {
                    self.throbber_idx = 0;
                }
            }
            Msg::Authenticated(Ok((connection, actors))) => {
                if !self.auth.loading {
                    debug!("ignoring directory for an abandoned login");
                    return;
                }
                self.session.apply_directory(connection, actors);
                self.auth = AuthState::default();
                self.focus = Pane::Actors;
                self.actor_list = ListState::default();
                if !self.session.actors().is_empty() {
                    self.actor_list.select(Some(0));
                }
                self.schema_pane = SchemaPaneState::default();
                self.execution.reset(None);
            }
            Msg::Authenticated(Err(message)) => {
                self.auth.loading = false;
                self.auth.error = Some(message);
            }
            Msg::SchemaLoaded { actor_id, schema } => {
                if self.session.apply_schema(&actor_id, schema) {
                    self.schema_pane.loading = false;
                    self.schema_pane.scroll.reset();
                    self.execution.reset(self.session.schema());
                }
            }
            Msg::RunProgress(snapshot) => {
                if self.execution.running {
                    self.execution.result = Some(snapshot);
                }
            }
            Msg::RunFinished { generation, outcome } => {
                if generation != self.execution.generation {
                    debug!(generation, "ignoring result of a superseded run");
                    return;
                }
                self.execution.running = false;
                self.execution.cancel = None;
                match outcome {
                    Ok(outcome) => {
                        self.execution.result = Some(outcome.result);
                        self.execution.ended = Some(outcome.ended);
                    }
                    Err(message) => {
                        self.execution.result = None;
                        self.execution.error = Some(message);
                    }
                }
            }
        }
    }
}
