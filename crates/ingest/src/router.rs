//! Message routing: the ingestion path.
//!
//! One [`MessageRouter::route`] call per inbound frame. The router
//! persists, evaluates, gates, and hands composed alerts to the
//! dispatcher as fire-and-forget background jobs, so ingestion
//! throughput is never bounded by mail-server latency. The single
//! exception is a disconnection notice, which is sent synchronously
//! and unconditionally: it signals loss of the telemetry channel
//! itself and must not be rate-limited or silently dropped.
//!
//! Per-message isolation: every failure in here is logged and
//! contained; one bad message never stops the next one.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;

use gasmon_core::{compose, evaluator, AlertGate, Reading};
use gasmon_notify::{Dispatcher, NotificationJob};

use crate::codec::{self, InboundMessage};
use crate::directory::EntityDirectory;
use crate::store::ReadingStore;

/// Title of the unconditional disconnection alert.
const DISCONNECTION_TITLE: &str = "ALERTA: Conexão do Dispositivo!";

/// Orchestrates decode → persist → evaluate → gate → dispatch.
pub struct MessageRouter {
    store: Arc<dyn ReadingStore>,
    directory: Option<Arc<dyn EntityDirectory>>,
    /// Locked across the check-and-record so two concurrent
    /// evaluations of the same entity cannot both pass the gate.
    gate: Mutex<AlertGate>,
    dispatcher: Dispatcher,
}

impl MessageRouter {
    pub fn new(
        store: Arc<dyn ReadingStore>,
        directory: Option<Arc<dyn EntityDirectory>>,
        gate: AlertGate,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            store,
            directory,
            gate: Mutex::new(gate),
            dispatcher,
        }
    }

    /// Process one inbound frame. Never fails from the transport's
    /// point of view.
    pub async fn route(&self, topic: &str, payload: &[u8]) {
        match codec::decode(topic, payload) {
            Ok(InboundMessage::Reading(reading)) => self.handle_reading(reading).await,
            Ok(InboundMessage::DisconnectionNotice(text)) => {
                self.handle_disconnection(text).await
            }
            Err(e) => {
                tracing::error!(topic, error = %e, "Dropping undecodable message");
            }
        }
    }

    async fn handle_reading(&self, reading: Reading) {
        tracing::debug!(
            entity = %reading.entity_id,
            class = reading.device_class().label(),
            "Processing reading"
        );

        match self.store.store(&reading).await {
            Ok(()) => {
                if let Some(directory) = &self.directory {
                    if let Err(e) = directory.ensure_registered(&reading.entity_id).await {
                        tracing::warn!(entity = %reading.entity_id, error = %e, "Directory sync failed");
                    }
                }
            }
            Err(e) => {
                // Evaluation still runs: a broken store must not cost
                // the operators an alert.
                tracing::error!(entity = %reading.entity_id, error = %e, "Failed to persist reading");
            }
        }

        let findings = evaluator::evaluate(&reading);
        if findings.is_empty() {
            tracing::debug!(entity = %reading.entity_id, "Reading healthy");
            return;
        }

        tracing::info!(
            entity = %reading.entity_id,
            count = findings.len(),
            "Threshold breaches detected"
        );

        if !self
            .gate
            .lock()
            .await
            .should_send(&reading.entity_id, Utc::now())
        {
            return;
        }

        let message = compose::compose(&reading, &findings);
        self.dispatcher
            .spawn(NotificationJob::new(message.title, message.body));
    }

    /// Disconnection notices block the router until the dispatch
    /// reaches a terminal outcome (or times out); the retry loop still
    /// applies.
    async fn handle_disconnection(&self, text: String) {
        tracing::warn!("Device disconnection reported, sending unconditional alert");
        let outcome = self
            .dispatcher
            .dispatch(NotificationJob::new(DISCONNECTION_TITLE, text))
            .await;
        tracing::info!(?outcome, "Disconnection alert dispatched");
    }

    /// Drain outstanding background dispatches (shutdown path).
    pub async fn shutdown(&self) {
        self.dispatcher.shutdown().await;
    }
}
