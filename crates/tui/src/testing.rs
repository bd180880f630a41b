//! Fixed-response platform and render helpers for the TUI's unit tests.

use std::sync::Arc;

use actorbench_api::{ActorPlatform, ApiError, ListScope};
use actorbench_engine::{PlatformConnector, Session, SessionSettings};
use actorbench_types::{Actor, ActorSchema, ExecutionResult, RunStats, RunStatus};
use ratatui::{Terminal, backend::TestBackend, buffer::Buffer};
use serde_json::{Map, Value};

use crate::app::App;

#[derive(Debug, Clone, Default)]
pub struct StaticPlatform {
    pub actors: Vec<Actor>,
    pub schema: Option<ActorSchema>,
    pub run: Option<ExecutionResult>,
}

#[async_trait::async_trait]
impl ActorPlatform for StaticPlatform {
    async fn list_actors(&self, scope: ListScope) -> Result<Vec<Actor>, ApiError> {
        Ok(match scope {
            ListScope::Owned => self.actors.clone(),
            ListScope::Store => Vec::new(),
        })
    }

    async fn input_schema(&self, _actor_id: &str) -> Result<ActorSchema, ApiError> {
        self.schema.clone().ok_or(ApiError::Status {
            status: 404,
            message: "Actor was not found".to_string(),
        })
    }

    async fn start_run(&self, _actor_id: &str, _input: &Map<String, Value>) -> Result<ExecutionResult, ApiError> {
        self.run.clone().ok_or(ApiError::Status {
            status: 400,
            message: "bad input".to_string(),
        })
    }

    async fn run_status(&self, _run_id: &str) -> Result<ExecutionResult, ApiError> {
        self.run.clone().ok_or(ApiError::Status {
            status: 404,
            message: "Run was not found".to_string(),
        })
    }
}

struct FixedConnector(Arc<StaticPlatform>);

impl PlatformConnector for FixedConnector {
    fn connect(&self, _api_key: &str) -> Result<Arc<dyn ActorPlatform>, ApiError> {
        Ok(self.0.clone())
    }
}

pub fn session_with(platform: StaticPlatform) -> Session {
    Session::new(Arc::new(FixedConnector(Arc::new(platform))), SessionSettings::default())
}

pub fn actor(id: &str) -> Actor {
    Actor {
        id: id.to_string(),
        name: format!("actor-{id}"),
        title: None,
        description: None,
        username: "tester".to_string(),
        created_at: None,
        modified_at: None,
        stats: Default::default(),
    }
}

pub fn snapshot(status: RunStatus) -> ExecutionResult {
    ExecutionResult {
        id: "run-1".to_string(),
        status,
        started_at: None,
        finished_at: None,
        stats: RunStats::default(),
        output: None,
        error: None,
    }
}

/// An app that has logged in and loaded `actors`.
pub fn authenticated_app(actors: Vec<Actor>) -> App {
    let mut app = App::new(session_with(StaticPlatform::default()));
    if let Ok(connection) = app.session.connect("apify_api_key") {
        app.session.apply_directory(connection, actors);
    }
    if !app.session.actors().is_empty() {
        app.actor_list.select(Some(0));
    }
    app
}

/// Renders with `draw` into an in-memory terminal and returns the buffer.
pub fn render_to_buffer(width: u16, height: u16, draw: impl FnOnce(&mut ratatui::Frame)) -> Buffer {
    let mut terminal = Terminal::new(TestBackend::new(width, height)).expect("terminal");
    terminal.draw(draw).expect("draw");
    terminal.backend().buffer().clone()
}

/// Buffer contents as one string per row, trailing spaces trimmed.
pub fn buffer_lines(buffer: &Buffer) -> Vec<String> {
    let area = buffer.area;
    (area.top()..area.bottom())
        .map(|y| {
            (area.left()..area.right())
                .map(|x| buffer[(x, y)].symbol())
                .collect::<String>()
                .trim_end()
                .to_string()
        })
        .collect()
}

/// True when any rendered row contains `needle`.
pub fn buffer_contains(buffer: &Buffer, needle: &str) -> bool {
    buffer_lines(buffer).iter().any(|line| line.contains(needle))
}
