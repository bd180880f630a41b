//! Non-interactive subcommands.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use actorbench_api::ActorPlatform;
use actorbench_engine::{
    ApifyConnector, EngineConfig, PlatformConnector, PollEnd, RunOutcome, RunPolicy, execute_run, fetch_directory,
    fetch_schema, schema_rows,
};
use actorbench_proxy::{ForwardingProxy, ProxyConfig, resolve_bind_address};
use actorbench_types::{Actor, ActorSchema, ExecutionResult};
use actorbench_util::format_optional_date;
use anyhow::{Context, Result, anyhow, bail};
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use unicode_width::UnicodeWidthStr;

pub struct CommandContext {
    pub config: EngineConfig,
    pub token: Option<String>,
}

impl CommandContext {
    fn platform(&self) -> Result<Arc<dyn ActorPlatform>> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| anyhow!("no API token; pass --token or set APIFY_TOKEN"))?;
        Ok(ApifyConnector::new(self.config.client_settings()).connect(token)?)
    }
}

pub async fn list_actors(context: &CommandContext, json: bool) -> Result<()> {
    let platform = context.platform()?;
    let actors = fetch_directory(platform.as_ref()).await.context("failed to load actors")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&actors)?);
    } else {
        print!("{}", actor_table(&actors));
    }
    Ok(())
}

pub async fn show_schema(context: &CommandContext, actor_id: &str, json: bool) -> Result<()> {
    let platform = context.platform()?;
    let Some(schema) = fetch_schema(platform.as_ref(), &context.config.fallback_schemas, actor_id).await else {
        println!("No input schema available");
        return Ok(());
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&schema)?);
    } else {
        print!("{}", schema_tree(&schema));
    }
    Ok(())
}

pub async fn run_actor(context: &CommandContext, actor_id: &str, input: &Map<String, Value>, max_wait: Option<u64>) -> Result<()> {
    let platform = context.platform()?;
    let mut policy = context.config.run_policy();
    if let Some(seconds) = max_wait {
        policy.max_wait = Some(Duration::from_secs(seconds));
    }
    let payload = context.config.run_defaults().overlay(input);

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    let outcome = follow_run(platform.as_ref(), actor_id, &payload, &policy, &cancel).await?;
    if let Some(note) = ended_note(&outcome.ended) {
        eprintln!("{note}");
    }
    println!("{}", serde_json::to_string_pretty(&outcome.result)?);
    Ok(())
}

/// Runs the actor, printing a status line to stderr whenever the status changes.
async fn follow_run(
    platform: &dyn ActorPlatform,
    actor_id: &str,
    payload: &Map<String, Value>,
    policy: &RunPolicy,
    cancel: &CancellationToken,
) -> Result<RunOutcome> {
    let (sender, mut receiver) = mpsc::unbounded_channel::<ExecutionResult>();
    let printer = tokio::spawn(async move {
        let mut last_status = None;
        while let Some(snapshot) = receiver.recv().await {
            if last_status.as_ref() != Some(&snapshot.status) {
                eprintln!("{}", status_line(&snapshot));
                last_status = Some(snapshot.status);
            }
        }
    });

    let outcome = execute_run(platform, actor_id, payload, policy, cancel, Some(&sender)).await;
    drop(sender);
    let _ = printer.await;
    outcome.with_context(|| format!("run of {actor_id} was not started"))
}

pub async fn serve_proxy(context: &CommandContext, bind: Option<&str>) -> Result<()> {
    let config = &context.config;
    let proxy = ForwardingProxy::new(ProxyConfig {
        bind_address: resolve_bind_address(Some(bind.unwrap_or(&config.proxy.bind_address)))?,
        upstream: config.proxy_upstream().to_string(),
        prefix: config.proxy.prefix.clone(),
        timeout: Duration::from_secs(config.request_timeout_secs),
    });
    let running = proxy.start().await?;
    eprintln!("Proxy listening on http://{}{}", running.bound_address(), config.proxy.prefix);

    tokio::signal::ctrl_c().await.context("failed to listen for Ctrl+C")?;
    info!("shutting down proxy");
    running.stop().await?;
    Ok(())
}

/// Reads the run input from `--input` or `--input-file`; none means `{}`.
pub fn parse_input(inline: Option<&str>, file: Option<&Path>) -> Result<Map<String, Value>> {
    let text = match (inline, file) {
        (Some(text), _) => text.to_string(),
        (None, Some(path)) => {
            std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?
        }
        (None, None) => return Ok(Map::new()),
    };
    match serde_json::from_str::<Value>(&text).context("run input is not valid JSON")? {
        Value::Object(map) => Ok(map),
        _ => bail!("run input must be a JSON object"),
    }
}

fn status_line(snapshot: &ExecutionResult) -> String {
    format!("[{}] run {} {}", snapshot.stats.duration_label(), snapshot.id, snapshot.status)
}

fn ended_note(ended: &PollEnd) -> Option<String> {
    match ended {
        PollEnd::Terminal => None,
        PollEnd::Cancelled => Some("Interrupted; printing the last known state.".to_string()),
        PollEnd::PollFailed(error) => Some(format!("Status check failed ({error}); printing the last known state.")),
        PollEnd::BudgetExhausted => Some("Wait limit reached; printing the last known state.".to_string()),
    }
}

fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{text}{}", " ".repeat(fill))
}

fn actor_table(actors: &[Actor]) -> String {
    if actors.is_empty() {
        return "No actors found in your account\n".to_string();
    }
    let headers = ["ID", "NAME", "RUNS", "MODIFIED"];
    let rows: Vec<[String; 4]> = actors
        .iter()
        .map(|actor| {
            [
                actor.id.clone(),
                actor.display_name().to_string(),
                actor.stats.total_runs.to_string(),
                format_optional_date(actor.modified_at.as_ref()),
            ]
        })
        .collect();

    let mut widths = headers.map(|header| header.width());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.width());
        }
    }

    let mut out = String::new();
    let mut push_row = |cells: [&str; 4]| {
        let line: Vec<String> = cells.iter().zip(widths).map(|(cell, width)| pad(cell, width)).collect();
        let _ = writeln!(out, "{}", line.join("  ").trim_end());
    };
    push_row(headers);
    for row in &rows {
        push_row([&row[0], &row[1], &row[2], &row[3]]);
    }
    out
}

fn schema_tree(schema: &ActorSchema) -> String {
    let mut out = format!("{}\n", schema.title);
    if !schema.has_properties() {
        out.push_str("This actor doesn't require any input parameters\n");
        return out;
    }
    for row in schema_rows(schema) {
        let indent = "  ".repeat(row.depth + 1);
        let marker = if row.required { " *" } else { "" };
        let _ = writeln!(out, "{indent}{}{marker} ({})", row.name, row.kind_label);
        if let Some(default) = &row.default_json {
            let _ = writeln!(out, "{indent}  default: {default}");
        }
        if let Some(description) = &row.description {
            let _ = writeln!(out, "{indent}  {description}");
        }
        if !row.choices.is_empty() {
            let _ = writeln!(out, "{indent}  options: {}", row.choices.join(", "));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use actorbench_api::{ApiError, ListScope};
    use actorbench_engine::search_scraper_schema;
    use actorbench_types::{RunStats, RunStatus};
    use serde_json::json;
    use std::io::Write;
    use std::sync::Mutex;

    fn actor(id: &str, title: Option<&str>, runs: u64) -> Actor {
        let mut actor: Actor = serde_json::from_value(json!({"id": id, "name": format!("name-{id}")})).expect("actor");
        actor.title = title.map(str::to_string);
        actor.stats.total_runs = runs;
        actor
    }

    fn snapshot(status: RunStatus) -> ExecutionResult {
        ExecutionResult {
            id: "run-9".to_string(),
            status,
            started_at: None,
            finished_at: None,
            stats: RunStats::default(),
            output: None,
            error: None,
        }
    }

    /// Serves a fixed submission response followed by scripted polls.
    struct ScriptedRuns {
        submitted: Result<ExecutionResult, u16>,
        polls: Mutex<Vec<ExecutionResult>>,
    }

    #[async_trait::async_trait]
    impl ActorPlatform for ScriptedRuns {
        async fn list_actors(&self, _scope: ListScope) -> Result<Vec<Actor>, ApiError> {
            Ok(Vec::new())
        }

        async fn input_schema(&self, _actor_id: &str) -> Result<ActorSchema, ApiError> {
            Err(ApiError::Decode("unused".to_string()))
        }

        async fn start_run(&self, _actor_id: &str, _input: &Map<String, Value>) -> Result<ExecutionResult, ApiError> {
            self.submitted.clone().map_err(|status| ApiError::Status {
                status,
                message: "bad input".to_string(),
            })
        }

        async fn run_status(&self, _run_id: &str) -> Result<ExecutionResult, ApiError> {
            let mut polls = self.polls.lock().expect("polls");
            if polls.is_empty() {
                return Err(ApiError::Decode("script exhausted".to_string()));
            }
            Ok(polls.remove(0))
        }
    }

    #[test]
    fn input_defaults_to_an_empty_object() {
        assert!(parse_input(None, None).expect("input").is_empty());
        let map = parse_input(Some("{\"maxConcurrency\": 5}"), None).expect("input");
        assert_eq!(map.get("maxConcurrency"), Some(&json!(5)));
    }

    #[test]
    fn input_must_be_a_json_object() {
        assert!(parse_input(Some("[1, 2]"), None).is_err());
        assert!(parse_input(Some("{oops"), None).is_err());
    }

    #[test]
    fn input_file_is_read() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"{\"languageCode\": \"fr\"}").expect("write");
        let map = parse_input(None, Some(file.path())).expect("input");
        assert_eq!(map.get("languageCode"), Some(&json!("fr")));
    }

    #[test]
    fn actor_table_aligns_columns() {
        let table = actor_table(&[actor("a1", Some("Web Scraper"), 42), actor("b22", None, 3)]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "ID   NAME         RUNS  MODIFIED");
        assert_eq!(lines[1], "a1   Web Scraper  42    —");
        assert_eq!(lines[2], "b22  name-b22     3     —");
    }

    #[test]
    fn empty_directory_table() {
        assert_eq!(actor_table(&[]), "No actors found in your account\n");
    }

    #[test]
    fn schema_tree_marks_required_properties() {
        let tree = schema_tree(&search_scraper_schema());
        assert!(tree.starts_with("Search Scraper Input (Bing Recommended)\n"));
        assert!(tree.contains("  startUrls * (array)"));
        assert!(tree.contains("      url * (string)"));
        assert!(tree.contains("    default: 10"));
    }

    #[tokio::test]
    async fn follow_run_polls_until_terminal() {
        let platform = ScriptedRuns {
            submitted: Ok(snapshot(RunStatus::Running)),
            polls: Mutex::new(vec![snapshot(RunStatus::Running), snapshot(RunStatus::Succeeded)]),
        };
        let policy = RunPolicy {
            poll_interval: Duration::from_millis(1),
            max_wait: None,
        };

        let outcome = follow_run(&platform, "a1", &Map::new(), &policy, &CancellationToken::new())
            .await
            .expect("outcome");
        assert_eq!(outcome.ended, PollEnd::Terminal);
        assert_eq!(outcome.result.status, RunStatus::Succeeded);
    }

    #[tokio::test]
    async fn rejected_submission_is_an_error() {
        let platform = ScriptedRuns {
            submitted: Err(400),
            polls: Mutex::new(Vec::new()),
        };
        let error = follow_run(&platform, "a1", &Map::new(), &RunPolicy::default(), &CancellationToken::new())
            .await
            .expect_err("rejected");
        assert!(format!("{error:#}").contains("bad input"));
    }
}
