//! Threshold evaluation rules for gas-supply readings.
//!
//! Pure logic — no I/O, no clock, no shared state. The caller decides
//! what to do with the returned findings (gate + notify).
//!
//! Every numeric field that is missing or not parseable as a number
//! falls back to a per-field default chosen on the *non-fault* side of
//! its threshold, so type noise from a flaky PLC never triggers or
//! suppresses an alert on its own.

use serde_json::Value;

use crate::reading::{Reading, ReadingData, Section};

/// Minimum acceptable oxygen purity (%).
const MIN_PURITY: f64 = 90.0;
/// Minimum acceptable pressure, shared by product, central, hospital
/// and network pressure rules (bar).
const MIN_PRESSURE: f64 = 5.0;
/// Maximum acceptable dew point (°C).
const MAX_DEW_POINT: f64 = -45.0;

/// Sentinel value reported by the device for a failed RST relay or a
/// pressed emergency button.
const FAULT_SENTINEL: &str = "FALHA";

/// Fallback defaults, all on the non-fault side of their rule.
const DEFAULT_PURITY: f64 = 200.0;
const DEFAULT_PRESSURE: f64 = 20.0;
const DEFAULT_DEW_POINT: f64 = -100.0;
const DEFAULT_STATUS: &str = "Default";

/// A single detected threshold breach, ready for operator eyes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// Human-readable description, including the offending value.
    pub description: String,
}

impl Finding {
    fn new(description: String) -> Self {
        Self { description }
    }
}

/// Evaluate a reading against the rules for its device class.
///
/// Returns findings in a fixed rule-check order (relevant only for
/// message readability). An empty vec means the reading is healthy.
pub fn evaluate(reading: &Reading) -> Vec<Finding> {
    match &reading.data {
        ReadingData::GenerationPlant { plant, central } => evaluate_plant(plant, central),
        ReadingData::Hospital { hospital } => evaluate_hospital(hospital),
    }
}

fn evaluate_plant(plant: &Section, central: &Section) -> Vec<Finding> {
    let mut findings = Vec::new();

    let purity = numeric_or(plant, "Purity", DEFAULT_PURITY);
    if purity < MIN_PURITY {
        findings.push(Finding::new(format!("Pureza baixa: {purity}%")));
    }

    let product_pressure = numeric_or(plant, "product_pressure", DEFAULT_PRESSURE);
    if product_pressure < MIN_PRESSURE {
        findings.push(Finding::new(format!(
            "Pressão do produto baixa: {product_pressure}"
        )));
    }

    let pressure = numeric_or(central, "pressure", DEFAULT_PRESSURE);
    if pressure < MIN_PRESSURE {
        findings.push(Finding::new(format!("Pressão central baixa: {pressure}")));
    }

    let dew_point = numeric_or(central, "dew_point", DEFAULT_DEW_POINT);
    if dew_point > MAX_DEW_POINT {
        findings.push(Finding::new(format!("Ponto de orvalho alto: {dew_point}")));
    }

    let network = numeric_or(central, "rede", DEFAULT_PRESSURE);
    if network < MIN_PRESSURE {
        findings.push(Finding::new(format!("Pressão da rede baixa: {network}")));
    }

    if status_or(central, "RST", DEFAULT_STATUS) == FAULT_SENTINEL {
        findings.push(Finding::new("Falha RST detectada".to_string()));
    }

    if status_or(central, "BE", DEFAULT_STATUS) == FAULT_SENTINEL {
        findings.push(Finding::new("Botão de emergência acionado".to_string()));
    }

    findings
}

fn evaluate_hospital(hospital: &Section) -> Vec<Finding> {
    let mut findings = Vec::new();

    let pressure = numeric_or(hospital, "pressure", DEFAULT_PRESSURE);
    if pressure < MIN_PRESSURE {
        findings.push(Finding::new(format!("Pressão baixa: {pressure}")));
    }

    let network = numeric_or(hospital, "rede", DEFAULT_PRESSURE);
    if network < MIN_PRESSURE {
        findings.push(Finding::new(format!("Pressão da rede baixa: {network}")));
    }

    let dew_point = numeric_or(hospital, "dew_point", DEFAULT_DEW_POINT);
    if dew_point > MAX_DEW_POINT {
        findings.push(Finding::new(format!("Ponto de orvalho alto: {dew_point}")));
    }

    if status_or(hospital, "RST", DEFAULT_STATUS) == FAULT_SENTINEL {
        findings.push(Finding::new("Falha RST detectada".to_string()));
    }

    if status_or(hospital, "BE", DEFAULT_STATUS) == FAULT_SENTINEL {
        findings.push(Finding::new("Botão de emergência acionado".to_string()));
    }

    findings
}

/// Read a numeric field, falling back to `default` when the field is
/// missing, null, or not parseable as a number. Numeric strings
/// ("3.5") count as numbers.
fn numeric_or(section: &Section, key: &str, default: f64) -> f64 {
    match section.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(default),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
        _ => default,
    }
}

/// Read a status string field, falling back to `default` when missing
/// or not a string. Comparison against the fault sentinel is exact and
/// case-sensitive.
fn status_or<'a>(section: &'a Section, key: &str, default: &'a str) -> &'a str {
    match section.get(key) {
        Some(Value::String(s)) => s,
        _ => default,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
