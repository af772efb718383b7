//! Retrying, timeout-bounded notification dispatch.
//!
//! Each job gets up to `max_retries` attempts with a fixed delay in
//! between, all inside one overall wall-clock ceiling. Transmission is
//! serialized across *all* jobs through a single async mutex: there is
//! one mailbox credential and the provider rate-limits parallel
//! connections, so jobs queue behind the lock while their worker tasks
//! stay independent.
//!
//! Background dispatches are supervised by a [`TaskTracker`] so the
//! process can drain outstanding sends on shutdown instead of
//! abandoning them.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio_util::task::TaskTracker;

use crate::config::DispatchConfig;
use crate::mailer::MailTransport;

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// One outbound message attempt, owned by the dispatcher that runs it.
///
/// A job's retry budget is final: once it ends `Sent`, `Failed`, or
/// `TimedOut`, only a *new* finding creates a new job.
#[derive(Debug, Clone)]
pub struct NotificationJob {
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl NotificationJob {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            created_at: Utc::now(),
        }
    }
}

/// Terminal result of one dispatch job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// One attempt succeeded.
    Sent,
    /// Every attempt in the budget failed.
    Failed,
    /// The overall ceiling elapsed first. The attempt in flight may
    /// still complete on the transport; we only stop waiting for it.
    TimedOut,
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Sends composed alerts through a [`MailTransport`] with retry,
/// timeout, and global transmission serialization.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn MailTransport>,
    config: DispatchConfig,
    /// Shared by every job; guards the actual transmission section.
    send_lock: Arc<Mutex<()>>,
    tracker: TaskTracker,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn MailTransport>, config: DispatchConfig) -> Self {
        Self {
            transport,
            config,
            send_lock: Arc::new(Mutex::new(())),
            tracker: TaskTracker::new(),
        }
    }

    /// Run a job to its terminal outcome.
    ///
    /// The ceiling covers everything: waiting for the transmission
    /// lock, the attempts themselves, and the delays between them.
    pub async fn dispatch(&self, job: NotificationJob) -> DispatchOutcome {
        match tokio::time::timeout(self.config.send_timeout, self.send_with_retry(&job)).await {
            Ok(true) => DispatchOutcome::Sent,
            Ok(false) => {
                tracing::error!(
                    title = %job.title,
                    attempts = self.config.max_retries,
                    "All send attempts failed"
                );
                DispatchOutcome::Failed
            }
            Err(_) => {
                tracing::error!(
                    title = %job.title,
                    timeout_secs = self.config.send_timeout.as_secs(),
                    "Send abandoned after overall timeout"
                );
                DispatchOutcome::TimedOut
            }
        }
    }

    /// Dispatch on a supervised background task, fire-and-forget.
    ///
    /// The caller returns immediately; the outcome is logged, never
    /// escalated back into the ingestion path.
    pub fn spawn(&self, job: NotificationJob) {
        let dispatcher = self.clone();
        self.tracker.spawn(async move {
            let title = job.title.clone();
            let outcome = dispatcher.dispatch(job).await;
            tracing::debug!(?outcome, title = %title, "Background dispatch finished");
        });
    }

    /// Stop accepting new background jobs and wait for outstanding
    /// dispatches to reach a terminal state.
    pub async fn shutdown(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }

    /// The attempt loop. Holds the global transmission lock for the
    /// whole loop so retries of one job are not interleaved with
    /// another job's attempts.
    async fn send_with_retry(&self, job: &NotificationJob) -> bool {
        let _guard = self.send_lock.lock().await;

        for attempt in 1..=self.config.max_retries {
            tracing::info!(attempt, title = %job.title, "Sending alert email");

            match self.transport.send(&job.title, &job.body).await {
                Ok(()) => return true,
                Err(e) => {
                    tracing::warn!(attempt, title = %job.title, error = %e, "Send attempt failed");
                    if attempt < self.config.max_retries {
                        tokio::time::sleep(self.config.retry_delay).await;
                    }
                }
            }
        }

        false
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
