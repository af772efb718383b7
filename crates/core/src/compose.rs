//! Alert message composition.
//!
//! Turns a reading plus its findings into the email title and body the
//! operators receive. The body always ends with a pretty-printed dump
//! of the raw section values — operators want the exact numbers, not
//! just which rule fired.

use crate::evaluator::Finding;
use crate::reading::{Reading, ReadingData, Section};

/// A composed outbound alert, ready for the dispatcher.
#[derive(Debug, Clone)]
pub struct AlertMessage {
    pub title: String,
    pub body: String,
}

/// Compose the alert email for a reading with one or more findings.
pub fn compose(reading: &Reading, findings: &[Finding]) -> AlertMessage {
    let entity = &reading.entity_id;
    let problems = bullet_list(findings);

    match &reading.data {
        ReadingData::Hospital { hospital } => AlertMessage {
            title: format!("ALERTA Hospital {entity}"),
            body: format!(
                "ALERTA: Problemas detectados no Hospital {entity}\n\n\
                 Problemas identificados:\n{problems}\n\n\
                 Dados completos:\n{}",
                pretty(hospital)
            ),
        },
        ReadingData::GenerationPlant { plant, central } => AlertMessage {
            title: format!("ALERTA Usina {entity}"),
            body: format!(
                "ALERTA: Problemas detectados na Usina {entity}\n\n\
                 Problemas identificados:\n{problems}\n\n\
                 Dados completos da usina:\n{}\n\n\
                 Dados completos da central:\n{}",
                pretty(plant),
                pretty(central)
            ),
        },
    }
}

fn bullet_list(findings: &[Finding]) -> String {
    findings
        .iter()
        .map(|f| format!("- {}", f.description))
        .collect::<Vec<_>>()
        .join("\n")
}

fn pretty(section: &Section) -> String {
    serde_json::to_string_pretty(section).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn finding(text: &str) -> Finding {
        Finding {
            description: text.to_string(),
        }
    }

    #[test]
    fn hospital_message_has_title_bullets_and_raw_dump() {
        let hospital = match json!({"pressure": 3.0, "rede": 15.0}) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };
        let reading = Reading {
            entity_id: "Santa Casa".into(),
            data: ReadingData::Hospital { hospital },
            received_at: Utc::now(),
        };

        let msg = compose(&reading, &[finding("Pressão baixa: 3")]);

        assert_eq!(msg.title, "ALERTA Hospital Santa Casa");
        assert!(msg.body.contains("Problemas detectados no Hospital Santa Casa"));
        assert!(msg.body.contains("- Pressão baixa: 3"));
        assert!(msg.body.contains("Dados completos:"));
        // Raw values survive into the dump.
        assert!(msg.body.contains("\"pressure\": 3.0"));
        assert!(msg.body.contains("\"rede\": 15.0"));
    }

    #[test]
    fn plant_message_dumps_both_sections() {
        let to_map = |v: serde_json::Value| match v {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };
        let reading = Reading {
            entity_id: "Usina Norte".into(),
            data: ReadingData::GenerationPlant {
                plant: to_map(json!({"Purity": 85.5})),
                central: to_map(json!({"pressure": 6.0})),
            },
            received_at: Utc::now(),
        };

        let msg = compose(&reading, &[finding("Pureza baixa: 85.5%")]);

        assert_eq!(msg.title, "ALERTA Usina Usina Norte");
        assert!(msg.body.contains("Dados completos da usina:"));
        assert!(msg.body.contains("Dados completos da central:"));
        assert!(msg.body.contains("\"Purity\": 85.5"));
        assert!(msg.body.contains("\"pressure\": 6.0"));
    }

    #[test]
    fn multiple_findings_become_one_bullet_each() {
        let reading = Reading {
            entity_id: "Santa Casa".into(),
            data: ReadingData::Hospital {
                hospital: Section::new(),
            },
            received_at: Utc::now(),
        };
        let msg = compose(
            &reading,
            &[finding("Pressão baixa: 2"), finding("Falha RST detectada")],
        );
        assert!(msg.body.contains("- Pressão baixa: 2\n- Falha RST detectada"));
    }
}
