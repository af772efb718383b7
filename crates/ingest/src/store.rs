//! Last-reading persistence.
//!
//! The dashboard reads the most recent sample per entity out of a
//! Redis hash (`Usina` for plants, `Central` for hospital centrals,
//! field = entity name, value = the raw `Data` JSON). The pipeline
//! only ever writes; a store failure is logged by the router and never
//! blocks evaluation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde_json::{json, Value};

use gasmon_core::{DeviceClass, Reading, ReadingData};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for last-reading persistence failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// ReadingStore
// ---------------------------------------------------------------------------

/// Write-only adapter for the last-known-reading store.
#[async_trait]
pub trait ReadingStore: Send + Sync {
    async fn store(&self, reading: &Reading) -> Result<(), StoreError>;
}

/// Redis hash key per device class. Hospital centrals have always
/// lived under `Central`; the dashboard depends on these exact keys.
pub fn hash_key(class: DeviceClass) -> &'static str {
    match class {
        DeviceClass::Hospital => "Central",
        DeviceClass::GenerationPlant => "Usina",
    }
}

/// Reassemble the wire `Data` object for storage.
fn data_json(reading: &Reading) -> Value {
    match &reading.data {
        ReadingData::Hospital { hospital } => Value::Object(hospital.clone()),
        ReadingData::GenerationPlant { plant, central } => {
            json!({ "usina": plant, "central": central })
        }
    }
}

// ---------------------------------------------------------------------------
// RedisStore
// ---------------------------------------------------------------------------

/// Production store on a Redis connection manager (auto-reconnecting,
/// cheap to clone per operation).
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect to Redis at `url` (e.g. `redis://127.0.0.1/`).
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        tracing::info!(url, "Connected to reading store");
        Ok(Self { conn })
    }
}

#[async_trait]
impl ReadingStore for RedisStore {
    async fn store(&self, reading: &Reading) -> Result<(), StoreError> {
        let payload = serde_json::to_string(&data_json(reading))?;
        let mut conn = self.conn.clone();
        let _: () = conn
            .hset(hash_key(reading.device_class()), &reading.entity_id, payload)
            .await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-memory store for tests and local development.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<(String, String), String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last stored `Data` JSON for an entity, if any.
    pub fn get(&self, class: DeviceClass, entity_id: &str) -> Option<String> {
        self.inner
            .lock()
            .expect("memory store lock")
            .get(&(hash_key(class).to_string(), entity_id.to_string()))
            .cloned()
    }
}

#[async_trait]
impl ReadingStore for MemoryStore {
    async fn store(&self, reading: &Reading) -> Result<(), StoreError> {
        let payload = serde_json::to_string(&data_json(reading))?;
        self.inner.lock().expect("memory store lock").insert(
            (
                hash_key(reading.device_class()).to_string(),
                reading.entity_id.clone(),
            ),
            payload,
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gasmon_core::Section;
    use serde_json::json;

    fn to_map(v: Value) -> Section {
        match v {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn memory_store_keeps_latest_reading_per_entity() {
        let store = MemoryStore::new();
        let mut reading = Reading {
            entity_id: "Santa Casa".into(),
            data: ReadingData::Hospital {
                hospital: to_map(json!({"pressure": 6.0})),
            },
            received_at: Utc::now(),
        };

        store.store(&reading).await.expect("store should succeed");
        reading.data = ReadingData::Hospital {
            hospital: to_map(json!({"pressure": 3.0})),
        };
        store.store(&reading).await.expect("store should succeed");

        let stored = store
            .get(DeviceClass::Hospital, "Santa Casa")
            .expect("entity should be stored");
        assert!(stored.contains("3.0"));
        assert!(!stored.contains("6.0"));
    }

    #[tokio::test]
    async fn plant_readings_reassemble_the_wire_data_object() {
        let store = MemoryStore::new();
        let reading = Reading {
            entity_id: "Usina Norte".into(),
            data: ReadingData::GenerationPlant {
                plant: to_map(json!({"Purity": 95.0})),
                central: to_map(json!({"pressure": 6.0})),
            },
            received_at: Utc::now(),
        };

        store.store(&reading).await.expect("store should succeed");

        let stored = store
            .get(DeviceClass::GenerationPlant, "Usina Norte")
            .expect("entity should be stored");
        let parsed: Value = serde_json::from_str(&stored).expect("stored JSON should parse");
        assert_eq!(parsed["usina"]["Purity"], 95.0);
        assert_eq!(parsed["central"]["pressure"], 6.0);
    }

    #[test]
    fn hash_keys_match_dashboard_expectations() {
        assert_eq!(hash_key(DeviceClass::Hospital), "Central");
        assert_eq!(hash_key(DeviceClass::GenerationPlant), "Usina");
    }
}
