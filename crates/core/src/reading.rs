//! Telemetry reading model.
//!
//! A [`Reading`] is constructed once per inbound message, evaluated,
//! and discarded. Persistence of last-known readings is the store
//! adapter's concern, not this crate's.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Raw field section of a reading, keyed by wire field name
/// (`pressure`, `rede`, `dew_point`, `RST`, `BE`, ...).
///
/// Values may be numbers, numeric strings, status strings, or null;
/// the evaluator copes with all of them.
pub type Section = Map<String, Value>;

/// Kind of monitored installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    /// Hospital air/oxygen central.
    Hospital,
    /// Oxygen generation plant (wire discriminator `tipo == "usina"`).
    GenerationPlant,
}

impl DeviceClass {
    /// Operator-facing label used in alert titles and store keys.
    pub fn label(&self) -> &'static str {
        match self {
            DeviceClass::Hospital => "Hospital",
            DeviceClass::GenerationPlant => "Usina",
        }
    }
}

/// Field sections of a reading, tagged by device class.
///
/// A generation plant reports two related structures on every reading:
/// the plant itself (purity, product pressure) and its distribution
/// central. A hospital reports a single structure.
#[derive(Debug, Clone)]
pub enum ReadingData {
    Hospital { hospital: Section },
    GenerationPlant { plant: Section, central: Section },
}

/// One ingested telemetry sample.
#[derive(Debug, Clone)]
pub struct Reading {
    /// Device/site identifier, unique per source.
    pub entity_id: String,
    /// Raw field sections, tagged by device class.
    pub data: ReadingData,
    /// When the sample was decoded (UTC).
    pub received_at: DateTime<Utc>,
}

impl Reading {
    pub fn device_class(&self) -> DeviceClass {
        match self.data {
            ReadingData::Hospital { .. } => DeviceClass::Hospital,
            ReadingData::GenerationPlant { .. } => DeviceClass::GenerationPlant,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_class_follows_data_variant() {
        let hospital = Reading {
            entity_id: "Santa Casa".into(),
            data: ReadingData::Hospital {
                hospital: Section::new(),
            },
            received_at: Utc::now(),
        };
        assert_eq!(hospital.device_class(), DeviceClass::Hospital);
        assert_eq!(hospital.device_class().label(), "Hospital");

        let plant = Reading {
            entity_id: "Usina Norte".into(),
            data: ReadingData::GenerationPlant {
                plant: Section::new(),
                central: Section::new(),
            },
            received_at: Utc::now(),
        };
        assert_eq!(plant.device_class(), DeviceClass::GenerationPlant);
        assert_eq!(plant.device_class().label(), "Usina");
    }
}
