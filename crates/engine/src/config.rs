//! Configuration file handling.
//!
//! Configuration is a single JSON document. Every field is optional and a
//! missing file is equivalent to an empty one, so the compiled-in defaults
//! always apply unless overridden.

use std::fs;
use std::path::Path;
use std::time::Duration;

use actorbench_api::{ClientSettings, DEFAULT_API_BASE, validate_base_url};
use actorbench_util::default_config_path;
use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::payload::{RunDefaults, builtin_payload, builtin_proxy};
use crate::runner::RunPolicy;
use crate::schema::FallbackSchemas;
use crate::session::SessionSettings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub api_base: String,
    pub request_timeout_secs: u64,
    pub list_limit: u32,
    pub run: RunConfig,
    pub fallback_schemas: FallbackSchemas,
    pub proxy: ProxySettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout_secs: 30,
            list_limit: 100,
            run: RunConfig::default(),
            fallback_schemas: FallbackSchemas::builtin(),
            proxy: ProxySettings::default(),
        }
    }
}

/// Run payload and polling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub defaults: Map<String, Value>,
    /// Proxy block added to every payload; `null` disables it.
    pub proxy: Option<Value>,
    pub poll_interval_ms: u64,
    pub max_wait_secs: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            defaults: builtin_payload(),
            proxy: Some(builtin_proxy()),
            poll_interval_ms: 2000,
            max_wait_secs: None,
        }
    }
}

/// Local forwarding proxy settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub bind_address: String,
    /// Upstream base; falls back to `api_base`.
    pub upstream: Option<String>,
    pub prefix: String,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3001".to_string(),
            upstream: None,
            prefix: "/api".to_string(),
        }
    }
}

impl EngineConfig {
    /// Loads configuration from the default location.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from_path(&default_config_path())
    }

    pub fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no configuration file; using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        let config: EngineConfig =
            serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))?;
        config.validate().with_context(|| format!("invalid configuration in {}", path.display()))?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        validate_base_url(&self.api_base)?;
        if let Some(upstream) = &self.proxy.upstream {
            validate_base_url(upstream)?;
        }
        if self.run.poll_interval_ms == 0 {
            bail!("run.poll_interval_ms must be greater than zero");
        }
        if !self.proxy.prefix.starts_with('/') {
            bail!("proxy.prefix must start with '/'");
        }
        Ok(())
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.api_base.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
            list_limit: self.list_limit,
        }
    }

    pub fn run_policy(&self) -> RunPolicy {
        RunPolicy {
            poll_interval: Duration::from_millis(self.run.poll_interval_ms),
            max_wait: self.run.max_wait_secs.map(Duration::from_secs),
        }
    }

    pub fn run_defaults(&self) -> RunDefaults {
        RunDefaults {
            payload: self.run.defaults.clone(),
            proxy: self.run.proxy.clone().filter(|proxy| !proxy.is_null()),
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            run_defaults: self.run_defaults(),
            fallbacks: self.fallback_schemas.clone(),
            policy: self.run_policy(),
        }
    }

    /// Upstream the forwarding proxy sends requests to.
    pub fn proxy_upstream(&self) -> &str {
        self.proxy.upstream.as_deref().unwrap_or(&self.api_base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DEFAULT_FALLBACK_ACTOR_ID;
    use serde_json::json;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(content.as_bytes()).expect("write");
        file
    }

    #[test]
    fn missing_file_yields_defaults() {
        let directory = tempfile::tempdir().expect("temp dir");
        let config = EngineConfig::load_from_path(&directory.path().join("config.json")).expect("config");

        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.run_policy(), RunPolicy::default());
        assert!(config.fallback_schemas.get(DEFAULT_FALLBACK_ACTOR_ID).is_some());
        assert_eq!(config.proxy_upstream(), DEFAULT_API_BASE);
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let file = write_config(
            r#"{
                "list_limit": 20,
                "run": { "poll_interval_ms": 500, "max_wait_secs": 60, "proxy": null },
                "fallback_schemas": {}
            }"#,
        );

        let config = EngineConfig::load_from_path(file.path()).expect("config");

        assert_eq!(config.list_limit, 20);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(
            config.run_policy(),
            RunPolicy {
                poll_interval: Duration::from_millis(500),
                max_wait: Some(Duration::from_secs(60)),
            }
        );
        assert_eq!(config.run.defaults["maxConcurrency"], json!(10));
        assert!(config.run_defaults().proxy.is_none());
        assert!(config.fallback_schemas.is_empty());
    }

    #[test]
    fn rejects_untrusted_api_base() {
        let file = write_config(r#"{ "api_base": "http://api.example.com/v2" }"#);
        let error = EngineConfig::load_from_path(file.path()).expect_err("rejected");
        assert!(format!("{error:#}").contains("https"), "unexpected error: {error:#}");
    }

    #[test]
    fn rejects_zero_poll_interval() {
        let file = write_config(r#"{ "run": { "poll_interval_ms": 0 } }"#);
        assert!(EngineConfig::load_from_path(file.path()).is_err());
    }

    #[test]
    fn load_honors_path_override() {
        let file = write_config(r#"{ "api_base": "http://localhost:9000/v2" }"#);
        let path = file.path().to_string_lossy().to_string();

        temp_env::with_var(actorbench_util::CONFIG_PATH_ENV, Some(path.as_str()), || {
            let config = EngineConfig::load().expect("config");
            assert_eq!(config.client_settings().base_url, "http://localhost:9000/v2");
        });
    }
}
