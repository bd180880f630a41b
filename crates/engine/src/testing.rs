//! Scripted `ActorPlatform` used by the engine's unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use actorbench_api::{ActorPlatform, ApiError, ListScope};
use actorbench_types::{Actor, ActorSchema, ExecutionResult, RunStatus, RunStats};
use serde_json::{Map, Value};

/// Step the fake replays for one call.
pub enum Reply<T> {
    Ok(T),
    Status(u16, &'static str),
    Decode(&'static str),
}

impl<T> Reply<T> {
    fn into_result(self) -> Result<T, ApiError> {
        match self {
            Reply::Ok(value) => Ok(value),
            Reply::Status(status, message) => Err(ApiError::Status {
                status,
                message: message.to_string(),
            }),
            Reply::Decode(message) => Err(ApiError::Decode(message.to_string())),
        }
    }
}

#[derive(Default)]
pub struct ScriptedPlatform {
    pub owned: Mutex<Option<Reply<Vec<Actor>>>>,
    pub store: Mutex<Option<Reply<Vec<Actor>>>>,
    pub schema: Mutex<Option<Reply<ActorSchema>>>,
    pub start: Mutex<Option<Reply<ExecutionResult>>>,
    pub polls: Mutex<VecDeque<Reply<ExecutionResult>>>,
    pub submitted: Mutex<Vec<(String, Map<String, Value>)>>,
    pub poll_count: AtomicUsize,
}

impl ScriptedPlatform {
    pub fn with_directory(owned: Reply<Vec<Actor>>, store: Reply<Vec<Actor>>) -> Self {
        let platform = Self::default();
        *platform.owned.lock().expect("owned") = Some(owned);
        *platform.store.lock().expect("store") = Some(store);
        platform
    }

    pub fn with_run(start: Reply<ExecutionResult>, polls: Vec<Reply<ExecutionResult>>) -> Self {
        let platform = Self::default();
        *platform.start.lock().expect("start") = Some(start);
        *platform.polls.lock().expect("polls") = polls.into();
        platform
    }

    pub fn polls_made(&self) -> usize {
        self.poll_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ActorPlatform for ScriptedPlatform {
    async fn list_actors(&self, scope: ListScope) -> Result<Vec<Actor>, ApiError> {
        let slot = match scope {
            ListScope::Owned => &self.owned,
            ListScope::Store => &self.store,
        };
        slot.lock()
            .expect("listing")
            .take()
            .unwrap_or(Reply::Ok(Vec::new()))
            .into_result()
    }

    async fn input_schema(&self, _actor_id: &str) -> Result<ActorSchema, ApiError> {
        self.schema
            .lock()
            .expect("schema")
            .take()
            .unwrap_or(Reply::Status(404, "Actor was not found"))
            .into_result()
    }

    async fn start_run(&self, actor_id: &str, input: &Map<String, Value>) -> Result<ExecutionResult, ApiError> {
        self.submitted
            .lock()
            .expect("submitted")
            .push((actor_id.to_string(), input.clone()));
        self.start
            .lock()
            .expect("start")
            .take()
            .unwrap_or(Reply::Status(500, "HTTP 500: Internal Server Error"))
            .into_result()
    }

    async fn run_status(&self, _run_id: &str) -> Result<ExecutionResult, ApiError> {
        self.poll_count.fetch_add(1, Ordering::SeqCst);
        self.polls
            .lock()
            .expect("polls")
            .pop_front()
            .unwrap_or(Reply::Ok(snapshot("SUCCEEDED")))
            .into_result()
    }
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

pub fn snapshot(status: &str) -> ExecutionResult {
    ExecutionResult {
        id: "run-1".to_string(),
        status: RunStatus::from(status.to_string()),
        started_at: None,
        finished_at: None,
        stats: RunStats::default(),
        output: None,
        error: None,
    }
}
