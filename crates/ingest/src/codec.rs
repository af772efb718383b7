//! Inbound payload decoding.
//!
//! The transport delivers `(topic, payload)` frames. Everything duck-
//! typed about the wire format is resolved here, once: a frame is
//! either a telemetry [`Reading`] or a [`DisconnectionNotice`] from the
//! broker's last-will topic, and the rest of the pipeline only ever
//! sees the tagged [`InboundMessage`].

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

use gasmon_core::{Reading, ReadingData, Section};

/// Topic carrying broker last-will payloads when a device drops off.
pub const DISCONNECTION_TOPIC: &str = "desconnection/topic";

/// Wire discriminator value marking a generation-plant reading.
const PLANT_DISCRIMINATOR: &str = "usina";

/// Entity id used when the payload carries none.
const UNKNOWN_ENTITY: &str = "Unknown";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// A frame that could not be decoded. Logged and dropped by the
/// router; never propagated to the transport.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// InboundMessage
// ---------------------------------------------------------------------------

/// One decoded frame.
#[derive(Debug, Clone)]
pub enum InboundMessage {
    /// A periodic telemetry sample.
    Reading(Reading),
    /// The telemetry channel itself is gone; carries the raw payload
    /// text. Bypasses evaluation and the alert gate entirely.
    DisconnectionNotice(String),
}

/// Raw JSON shape of a telemetry payload.
#[derive(Debug, Deserialize)]
struct WirePayload {
    /// Entity name (historic wire name, also used for plants).
    #[serde(rename = "Hospital")]
    hospital: Option<String>,
    /// Device-class discriminator; `"usina"` marks a plant.
    tipo: Option<String>,
    #[serde(rename = "Data", default)]
    data: Value,
}

/// Decode one frame.
pub fn decode(topic: &str, payload: &[u8]) -> Result<InboundMessage, DecodeError> {
    if topic == DISCONNECTION_TOPIC {
        return Ok(InboundMessage::DisconnectionNotice(
            String::from_utf8_lossy(payload).into_owned(),
        ));
    }

    let text = std::str::from_utf8(payload)?;
    let wire: WirePayload = serde_json::from_str(text)?;

    let entity_id = wire
        .hospital
        .unwrap_or_else(|| UNKNOWN_ENTITY.to_string());

    let data = if wire.tipo.as_deref() == Some(PLANT_DISCRIMINATOR) {
        ReadingData::GenerationPlant {
            plant: section_of(&wire.data, "usina"),
            central: section_of(&wire.data, "central"),
        }
    } else {
        ReadingData::Hospital {
            hospital: into_section(wire.data),
        }
    };

    Ok(InboundMessage::Reading(Reading {
        entity_id,
        data,
        received_at: Utc::now(),
    }))
}

/// Pull a named sub-object out of `Data`, empty when missing or not an
/// object (the evaluator's defaults take over from there).
fn section_of(data: &Value, key: &str) -> Section {
    match data.get(key) {
        Some(Value::Object(map)) => map.clone(),
        _ => Section::new(),
    }
}

fn into_section(data: Value) -> Section {
    match data {
        Value::Object(map) => map,
        _ => Section::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use gasmon_core::DeviceClass;

    #[test]
    fn hospital_payload_decodes_to_hospital_reading() {
        let payload = br#"{
            "Hospital": "Santa Casa",
            "tipo": "hospital",
            "Data": {"pressure": 6.5, "rede": 7.0, "RST": "OK"}
        }"#;

        let message = decode("telemetry/santa-casa", payload).expect("should decode");
        let reading = assert_matches!(message, InboundMessage::Reading(r) => r);
        assert_eq!(reading.entity_id, "Santa Casa");
        assert_eq!(reading.device_class(), DeviceClass::Hospital);
        let section = assert_matches!(reading.data, ReadingData::Hospital { hospital } => hospital);
        assert_eq!(section["pressure"], 6.5);
    }

    #[test]
    fn usina_discriminator_selects_plant_reading() {
        let payload = br#"{
            "Hospital": "Usina Norte",
            "tipo": "usina",
            "Data": {
                "usina": {"Purity": 95.0, "product_pressure": 6.0},
                "central": {"pressure": 6.0, "dew_point": -60.0}
            }
        }"#;

        let message = decode("telemetry/usina-norte", payload).expect("should decode");
        let reading = assert_matches!(message, InboundMessage::Reading(r) => r);
        assert_eq!(reading.device_class(), DeviceClass::GenerationPlant);
        let (plant, central) = assert_matches!(
            reading.data,
            ReadingData::GenerationPlant { plant, central } => (plant, central)
        );
        assert_eq!(plant["Purity"], 95.0);
        assert_eq!(central["dew_point"], -60.0);
    }

    #[test]
    fn disconnection_topic_bypasses_json_decoding() {
        let message = decode(DISCONNECTION_TOPIC, b"Dispositivo Santa Casa desconectado")
            .expect("should decode");
        let text = assert_matches!(message, InboundMessage::DisconnectionNotice(t) => t);
        assert_eq!(text, "Dispositivo Santa Casa desconectado");
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        let err = decode("telemetry/x", b"{not json").unwrap_err();
        assert_matches!(err, DecodeError::Json(_));
    }

    #[test]
    fn missing_entity_name_falls_back_to_unknown() {
        let message = decode("telemetry/x", br#"{"Data": {}}"#).expect("should decode");
        let reading = assert_matches!(message, InboundMessage::Reading(r) => r);
        assert_eq!(reading.entity_id, "Unknown");
    }

    #[test]
    fn missing_plant_sections_decode_as_empty() {
        let payload = br#"{"Hospital": "Usina Sul", "tipo": "usina", "Data": {}}"#;
        let message = decode("telemetry/x", payload).expect("should decode");
        let reading = assert_matches!(message, InboundMessage::Reading(r) => r);
        let (plant, central) = assert_matches!(
            reading.data,
            ReadingData::GenerationPlant { plant, central } => (plant, central)
        );
        assert!(plant.is_empty());
        assert!(central.is_empty());
    }
}
