//! Rendering a run's aggregate for stdout
//!
//! The JSON field names are consumed by downstream scripts and must stay
//! stable.

use crate::aggregate::Aggregate;
use crate::error::Result;
use crate::reading::Reading;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Structured output of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Status page URL the readings came from
    pub source: String,
    pub timestamp: DateTime<FixedOffset>,
    pub received_count: u32,
    pub expected_count: Option<u32>,
    pub total_watts_raw: i64,
    pub total_watts_estimated: Option<i64>,
    pub total_watts_for_output: i64,
    pub avg_volt_v: Option<f64>,
    pub avg_temp_c: Option<f64>,
    pub panels: BTreeMap<String, Option<i64>>,
    pub scaled_due_to_missing: bool,
}

impl Report {
    pub fn new(source: &str, timestamp: DateTime<FixedOffset>, aggregate: &Aggregate) -> Self {
        Self {
            source: source.to_string(),
            timestamp,
            received_count: aggregate.received_count,
            expected_count: aggregate.expected_count,
            total_watts_raw: aggregate.total_raw,
            total_watts_estimated: aggregate.estimated_total,
            total_watts_for_output: aggregate.total_for_output,
            avg_volt_v: aggregate.avg_volt,
            avg_temp_c: aggregate.avg_temp,
            panels: aggregate.panels.clone(),
            scaled_due_to_missing: aggregate.scaled(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

fn watts(value: Option<i64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |w| format!("{} W", w))
}

/// Human-readable report. Panels are listed in page order.
pub fn render_text(report: &Report, readings: &[Reading]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Data source: {}", report.source);
    let _ = writeln!(out);
    let _ = writeln!(out, "Panel readings:");
    for r in readings {
        let _ = writeln!(out, "  {}: {}", r.id, watts(r.watts));
    }
    let _ = writeln!(out);

    match report.expected_count {
        Some(expected) => {
            let _ = writeln!(
                out,
                "Panels reporting: {} of {}",
                report.received_count, expected
            );
        }
        None => {
            let _ = writeln!(out, "Panels reporting: {}", report.received_count);
        }
    }
    let _ = writeln!(out, "Total power: {} W", report.total_watts_raw);
    if let Some(estimated) = report.total_watts_estimated {
        let _ = writeln!(out, "Estimated total (scaled for missing panels): {} W", estimated);
    }
    if let Some(v) = report.avg_volt_v {
        let _ = writeln!(out, "Avg voltage: {:.1} V", v);
    }
    if let Some(t) = report.avg_temp_c {
        let _ = writeln!(out, "Avg temp: {:.1} °C", t);
    }
    out
}
