//! Sensitive value redaction for log lines and displayed URLs.
//!
//! The platform accepts its API token as a `token` query parameter, so any
//! URL we log carries the credential. Everything that reaches `tracing` or the
//! terminal goes through [`redact_sensitive`] first.
//!
//! # Example
//! ```rust
//! use actorbench_util::redact_sensitive;
//!
//! let redacted = redact_sensitive("https://api.apify.com/v2/acts?my=true&token=apify_api_abc");
//! assert_eq!(redacted, "https://api.apify.com/v2/acts?my=true&token=[REDACTED]");
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

/// Redacts secret-looking values using the default `[REDACTED]` marker.
pub fn redact_sensitive(input: &str) -> String {
    redact_with(input, "[REDACTED]")
}

/// Every pattern captures a prefix (kept), the secret value (replaced) and an
/// optional suffix (kept).
fn redact_with(input: &str, replacement: &str) -> String {
    let mut redacted = input.to_string();

    for pattern in redact_patterns().iter() {
        redacted = pattern
            .replace_all(&redacted, |captures: &regex::Captures| {
                let prefix = captures.get(1).map(|m| m.as_str()).unwrap_or("");
                let suffix = captures.get(3).map(|m| m.as_str()).unwrap_or("");
                format!("{}{}{}", prefix, replacement, suffix)
            })
            .to_string();
    }

    redacted
}

fn redact_patterns() -> &'static [Regex] {
    static PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
        [
            // ?token=... / &token=... in URLs
            r"(?i)([?&]token=)([^&\s#]+)()",
            // Authorization: Bearer <value>
            r"(?i)(authorization:\s*(?:bearer\s+)?)([\w\-\.=:/+]+)()",
            // APIFY_TOKEN=..., SOME_API_KEY=...
            r"(?i)\b([A-Z0-9_]*(?:TOKEN|KEY|SECRET|PASSWORD)=)([^\s&]+)()",
            // bare platform tokens
            r"()(apify_api_[A-Za-z0-9]{8,})()",
        ]
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
    });

    &PATTERNS
}

/// Masks a secret for display, keeping only its length visible.
pub fn mask_secret(secret: &str) -> String {
    "•".repeat(secret.chars().count())
}
