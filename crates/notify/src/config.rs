//! Mail and dispatch configuration.
//!
//! Loaded once at process start and immutable afterwards. A JSON
//! config file takes precedence when present; otherwise everything
//! comes from environment variables.
//!
//! | Variable                  | Default          |
//! |---------------------------|------------------|
//! | `EMAIL_HOST`              | `smtp.gmail.com` |
//! | `EMAIL_PORT`              | `587`            |
//! | `EMAIL_USERNAME`          | —                |
//! | `EMAIL_PASSWORD`          | —                |
//! | `EMAIL_USE_TLS`           | `true`           |
//! | `EMAIL_FROM`              | username         |
//! | `EMAIL_TO`                | — (comma list)   |
//! | `EMAIL_MAX_RETRIES`       | `3`              |
//! | `EMAIL_RETRY_DELAY_SECS`  | `5`              |
//! | `EMAIL_SEND_TIMEOUT_SECS` | `30`             |

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Default config file looked up next to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "email_config.json";

const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 587;

// ---------------------------------------------------------------------------
// MailConfig
// ---------------------------------------------------------------------------

/// SMTP connection and addressing settings.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// SMTP server hostname.
    #[serde(default = "default_host")]
    pub host: String,
    /// SMTP server port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// SMTP login username.
    #[serde(default)]
    pub username: String,
    /// SMTP login password (app password for gmail).
    #[serde(default)]
    pub password: String,
    /// Whether to upgrade the connection via STARTTLS.
    #[serde(default = "default_true")]
    pub use_tls: bool,
    /// RFC 5322 "From" address; falls back to `username` when empty.
    #[serde(default)]
    pub from_email: String,
    /// Recipient list.
    #[serde(default)]
    pub to_emails: Vec<String>,
}

fn default_host() -> String {
    DEFAULT_SMTP_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_SMTP_PORT
}

fn default_true() -> bool {
    true
}

impl MailConfig {
    /// Load from environment variables (see the module table).
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("EMAIL_HOST").unwrap_or_else(|_| default_host()),
            port: std::env::var("EMAIL_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            username: std::env::var("EMAIL_USERNAME").unwrap_or_default(),
            password: std::env::var("EMAIL_PASSWORD").unwrap_or_default(),
            use_tls: std::env::var("EMAIL_USE_TLS")
                .map(|v| v.to_lowercase() == "true")
                .unwrap_or(true),
            from_email: std::env::var("EMAIL_FROM").unwrap_or_default(),
            to_emails: std::env::var("EMAIL_TO")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    /// Load from a JSON file, falling back to the environment when the
    /// file is absent or malformed.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(raw) => match serde_json::from_str::<MailConfig>(&raw) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Malformed mail config file, falling back to environment");
                    }
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Unreadable mail config file, falling back to environment");
                }
            }
        }
        Self::from_env()
    }

    /// The effective sender address.
    pub fn sender(&self) -> &str {
        if self.from_email.is_empty() {
            &self.username
        } else {
            &self.from_email
        }
    }

    /// Whether credentials are present. Without them most relays will
    /// reject the send, so callers log a warning up front.
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

// ---------------------------------------------------------------------------
// DispatchConfig
// ---------------------------------------------------------------------------

/// Retry and timeout budget for one notification job.
#[derive(Debug, Clone, Copy)]
pub struct DispatchConfig {
    /// Total attempts per job.
    pub max_retries: u32,
    /// Fixed delay between attempts. Deliberately not exponential:
    /// transient SMTP hiccups recover quickly and more attempts would
    /// only add latency.
    pub retry_delay: Duration,
    /// Overall wall-clock ceiling per job, inter-attempt delays and
    /// lock waits included.
    pub send_timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(5),
            send_timeout: Duration::from_secs(30),
        }
    }
}

impl DispatchConfig {
    /// Load from environment variables, keeping defaults for anything
    /// unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_retries: env_u64("EMAIL_MAX_RETRIES").unwrap_or(defaults.max_retries as u64) as u32,
            retry_delay: env_u64("EMAIL_RETRY_DELAY_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.retry_delay),
            send_timeout: env_u64("EMAIL_SEND_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.send_timeout),
        }
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_falls_back_to_username() {
        let mut config = MailConfig {
            host: default_host(),
            port: default_port(),
            username: "ops@example.com".into(),
            password: "secret".into(),
            use_tls: true,
            from_email: String::new(),
            to_emails: vec!["alerts@example.com".into()],
        };
        assert_eq!(config.sender(), "ops@example.com");

        config.from_email = "noreply@example.com".into();
        assert_eq!(config.sender(), "noreply@example.com");
    }

    #[test]
    fn config_file_parses_with_partial_fields() {
        let config: MailConfig = serde_json::from_str(
            r#"{"username": "ops@example.com", "password": "pw", "to_emails": ["a@b.c"]}"#,
        )
        .expect("partial config should parse");
        assert_eq!(config.host, DEFAULT_SMTP_HOST);
        assert_eq!(config.port, DEFAULT_SMTP_PORT);
        assert!(config.use_tls);
        assert!(config.has_credentials());
        assert_eq!(config.to_emails, vec!["a@b.c".to_string()]);
    }

    #[test]
    fn load_missing_file_falls_back_to_env() {
        let config = MailConfig::load("/nonexistent/email_config.json");
        // Environment defaults apply.
        assert_eq!(config.port, DEFAULT_SMTP_PORT);
    }

    #[test]
    fn dispatch_defaults_match_contract() {
        let config = DispatchConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay, Duration::from_secs(5));
        assert_eq!(config.send_timeout, Duration::from_secs(30));
    }
}
