//! Alert notification dispatch for the gas-supply monitor.
//!
//! - [`MailConfig`] / [`DispatchConfig`] — SMTP and retry settings,
//!   loaded once at startup from a JSON file or the environment.
//! - [`MailTransport`] / [`SmtpMailer`] — the mail seam and its
//!   production `lettre` implementation.
//! - [`Dispatcher`] — retrying, timeout-bounded delivery of composed
//!   alerts, serialized through one shared transmission lock and
//!   supervised via a task tracker.

pub mod config;
pub mod dispatcher;
pub mod mailer;

pub use config::{DispatchConfig, MailConfig};
pub use dispatcher::{DispatchOutcome, Dispatcher, NotificationJob};
pub use mailer::{MailError, MailTransport, SmtpMailer};
