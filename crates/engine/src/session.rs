//! Explicit application state for one interactive session.
//!
//! [`Session`] owns the API key, the platform handle built from it, the actor
//! directory, the selected actor and its schema. Every mutation goes through a
//! method here. Long-running work is split into a *prepare* step that hands a
//! self-contained request to a background task and an *apply* step that
//! commits the task's result, so the UI never holds the session across an
//! await point.

use std::sync::Arc;

use actorbench_api::{ActorPlatform, ApiError, ApifyClient, ClientSettings};
use actorbench_types::{Actor, ActorSchema, ExecutionResult};
use serde_json::{Map, Value};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::directory::fetch_directory;
use crate::payload::RunDefaults;
use crate::runner::{RunError, RunOutcome, RunPolicy, execute_run};
use crate::schema::{FallbackSchemas, fetch_schema};

/// Builds a platform handle for an API key.
pub trait PlatformConnector: Send + Sync {
    fn connect(&self, api_key: &str) -> Result<Arc<dyn ActorPlatform>, ApiError>;
}

/// Connects to the platform's HTTP API.
#[derive(Debug, Clone)]
pub struct ApifyConnector {
    pub settings: ClientSettings,
}

impl ApifyConnector {
    pub fn new(settings: ClientSettings) -> Self {
        Self { settings }
    }
}

impl PlatformConnector for ApifyConnector {
    fn connect(&self, api_key: &str) -> Result<Arc<dyn ActorPlatform>, ApiError> {
        Ok(Arc::new(ApifyClient::new(&self.settings, api_key)?))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSettings {
    pub run_defaults: RunDefaults,
    pub fallbacks: FallbackSchemas,
    pub policy: RunPolicy,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Please enter your API key")]
    MissingApiKey,
    #[error("No actor selected")]
    NoActorSelected,
    #[error("Not authenticated")]
    NotAuthenticated,
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Run(#[from] RunError),
}

/// A validated key with the platform handle built for it.
#[derive(Clone)]
pub struct Connection {
    pub api_key: String,
    pub platform: Arc<dyn ActorPlatform>,
}

impl Connection {
    /// Fetches the merged actor directory for this connection.
    pub async fn load_directory(&self) -> Result<Vec<Actor>, ApiError> {
        fetch_directory(self.platform.as_ref()).await
    }
}

/// Schema lookup for the actor being selected.
#[derive(Clone)]
pub struct SchemaRequest {
    pub actor_id: String,
    platform: Arc<dyn ActorPlatform>,
    fallbacks: FallbackSchemas,
}

impl SchemaRequest {
    pub async fn fetch(self) -> (String, Option<ActorSchema>) {
        let schema = fetch_schema(self.platform.as_ref(), &self.fallbacks, &self.actor_id).await;
        (self.actor_id, schema)
    }
}

/// Everything a background task needs to submit and follow one run.
#[derive(Clone)]
pub struct ExecutionRequest {
    pub actor_id: String,
    pub payload: Map<String, Value>,
    pub policy: RunPolicy,
    platform: Arc<dyn ActorPlatform>,
}

impl ExecutionRequest {
    pub async fn run(
        self,
        cancel: CancellationToken,
        progress: Option<UnboundedSender<ExecutionResult>>,
    ) -> Result<RunOutcome, RunError> {
        execute_run(
            self.platform.as_ref(),
            &self.actor_id,
            &self.payload,
            &self.policy,
            &cancel,
            progress.as_ref(),
        )
        .await
    }
}

pub struct Session {
    connector: Arc<dyn PlatformConnector>,
    settings: SessionSettings,
    connection: Option<Connection>,
    authenticated: bool,
    actors: Vec<Actor>,
    selected_actor: Option<Actor>,
    schema: Option<ActorSchema>,
}

impl Session {
    pub fn new(connector: Arc<dyn PlatformConnector>, settings: SessionSettings) -> Self {
        Self {
            connector,
            settings,
            connection: None,
            authenticated: false,
            actors: Vec::new(),
            selected_actor: None,
            schema: None,
        }
    }

    /// Validates a key and builds a platform handle without touching state.
    pub fn connect(&self, api_key: &str) -> Result<Connection, SessionError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(SessionError::MissingApiKey);
        }
        let platform = self.connector.connect(api_key)?;
        Ok(Connection {
            api_key: api_key.to_string(),
            platform,
        })
    }

    /// Commits a successfully fetched directory and marks the session as
    /// authenticated. Any previous selection is dropped.
    pub fn apply_directory(&mut self, connection: Connection, actors: Vec<Actor>) {
        info!(actors = actors.len(), "authenticated");
        self.connection = Some(connection);
        self.authenticated = true;
        self.actors = actors;
        self.selected_actor = None;
        self.schema = None;
    }

    /// Fetches the directory for `api_key`. State changes only on success.
    pub async fn authenticate(&mut self, api_key: &str) -> Result<(), SessionError> {
        let connection = self.connect(api_key)?;
        let actors = connection.load_directory().await?;
        self.apply_directory(connection, actors);
        Ok(())
    }

    /// Selects an actor and returns the schema lookup to run for it. The
    /// previous schema is cleared until the lookup is applied.
    pub fn begin_selection(&mut self, actor: Actor) -> Result<SchemaRequest, SessionError> {
        let connection = self.connection.as_ref().ok_or(SessionError::NotAuthenticated)?;
        let request = SchemaRequest {
            actor_id: actor.id.clone(),
            platform: Arc::clone(&connection.platform),
            fallbacks: self.settings.fallbacks.clone(),
        };
        debug!(actor_id = %actor.id, "actor selected");
        self.selected_actor = Some(actor);
        self.schema = None;
        Ok(request)
    }

    /// Commits a schema lookup. Returns false and changes nothing when the
    /// selection moved on while the lookup was in flight.
    pub fn apply_schema(&mut self, actor_id: &str, schema: Option<ActorSchema>) -> bool {
        if self.selected_actor.as_ref().map(|actor| actor.id.as_str()) != Some(actor_id) {
            debug!(actor_id = %actor_id, "discarding schema for a stale selection");
            return false;
        }
        self.schema = schema;
        true
    }

    pub async fn select_actor(&mut self, actor: Actor) -> Result<Option<&ActorSchema>, SessionError> {
        let (actor_id, schema) = self.begin_selection(actor)?.fetch().await;
        self.apply_schema(&actor_id, schema);
        Ok(self.schema.as_ref())
    }

    /// Builds the run request for the selected actor with `input` overlaid on
    /// the default payload.
    pub fn prepare_execution(&self, input: &Map<String, Value>) -> Result<ExecutionRequest, SessionError> {
        let actor = self.selected_actor.as_ref().ok_or(SessionError::NoActorSelected)?;
        let connection = self.connection.as_ref().ok_or(SessionError::NotAuthenticated)?;
        Ok(ExecutionRequest {
            actor_id: actor.id.clone(),
            payload: self.settings.run_defaults.overlay(input),
            policy: self.settings.policy,
            platform: Arc::clone(&connection.platform),
        })
    }

    pub async fn execute(&self, input: &Map<String, Value>, cancel: CancellationToken) -> Result<RunOutcome, SessionError> {
        let request = self.prepare_execution(input)?;
        Ok(request.run(cancel, None).await?)
    }

    /// Forgets the key, the directory and the selection.
    pub fn logout(&mut self) {
        info!("logged out");
        self.connection = None;
        self.authenticated = false;
        self.actors.clear();
        self.selected_actor = None;
        self.schema = None;
    }

    pub fn api_key(&self) -> Option<&str> {
        self.connection.as_ref().map(|connection| connection.api_key.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    pub fn selected_actor(&self) -> Option<&Actor> {
        self.selected_actor.as_ref()
    }

    pub fn schema(&self) -> Option<&ActorSchema> {
        self.schema.as_ref()
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }
}
