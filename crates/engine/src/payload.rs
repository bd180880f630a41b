//! Run payload construction.

use serde_json::{Map, Value, json};

/// Key under which the proxy configuration block is placed.
pub const PROXY_KEY: &str = "proxy";

/// Baseline payload every run starts from.
#[derive(Debug, Clone, PartialEq)]
pub struct RunDefaults {
    pub payload: Map<String, Value>,
    /// Proxy block inserted under [`PROXY_KEY`]; `None` omits it.
    pub proxy: Option<Value>,
}

impl RunDefaults {
    pub fn builtin() -> Self {
        Self {
            payload: builtin_payload(),
            proxy: Some(builtin_proxy()),
        }
    }

    /// Builds the submitted payload: defaults, then the proxy block, then
    /// every caller key whose value is not `null`.
    pub fn overlay(&self, input: &Map<String, Value>) -> Map<String, Value> {
        let mut payload = self.payload.clone();
        if let Some(proxy) = &self.proxy {
            payload.insert(PROXY_KEY.to_string(), proxy.clone());
        }
        for (key, value) in input {
            if !value.is_null() {
                payload.insert(key.clone(), value.clone());
            }
        }
        payload
    }
}

impl Default for RunDefaults {
    fn default() -> Self {
        Self::builtin()
    }
}

pub(crate) fn builtin_payload() -> Map<String, Value> {
    let value = json!({
        "startUrls": [{ "url": "https://duckduckgo.com/?q=artificial+intelligence" }],
        "maxRequestRetries": 3,
        "maxConcurrency": 10,
        "languageCode": "en"
    });
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

pub(crate) fn builtin_proxy() -> Value {
    json!({ "useApifyProxy": true, "apifyProxyGroups": ["BUYPROXIES94952"] })
}
