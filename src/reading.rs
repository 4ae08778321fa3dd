//! Per-inverter readings from the status page
//!
//! Columns are taken by position. The ECU firmware renders
//! `Inverter ID | Current Power | Grid Frequency | Grid Voltage | Temperature | Date`,
//! and the header labels are only checked to log a warning when they drift.

use crate::error::{HeliosError, Result};
use crate::extract::{Field, FieldExtractor};
use crate::locator::{HEADER_MARKER, data_rows, find_inverter_table};
use crate::logging::get_logger;
use crate::markup::{Row, Table, tabulate};
use serde::{Deserialize, Serialize};

pub const ID_COLUMN: usize = 0;
pub const POWER_COLUMN: usize = 1;
pub const VOLTAGE_COLUMN: usize = 3;
pub const TEMPERATURE_COLUMN: usize = 4;

/// Rows with fewer cells than this are layout filler, not inverters.
const MIN_ROW_CELLS: usize = 2;

/// One inverter's measurements from a single page read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub id: String,
    pub watts: Option<i64>,
    pub volt: Option<f64>,
    pub temp: Option<f64>,
}

impl Reading {
    /// Build a reading from one data row. `None` for rows too short to carry one.
    pub fn from_row(row: &Row, extractor: &FieldExtractor) -> Option<Self> {
        if row.len() < MIN_ROW_CELLS {
            return None;
        }
        let id = row[ID_COLUMN].trim().to_string();
        let cell = |i: usize| row.get(i).map(String::as_str);
        Some(Self {
            watts: cell(POWER_COLUMN).and_then(|c| extractor.power(c)),
            volt: cell(VOLTAGE_COLUMN).and_then(|c| measured(extractor, Field::Voltage, &id, c)),
            temp: cell(TEMPERATURE_COLUMN)
                .and_then(|c| measured(extractor, Field::Temperature, &id, c)),
            id,
        })
    }
}

fn measured(extractor: &FieldExtractor, field: Field, id: &str, text: &str) -> Option<f64> {
    let extracted = extractor.extract(field, text);
    if extracted.is_fallback() {
        get_logger("reading").debug(&format!(
            "{}: {:?} cell {:?} has no unit, using its first number",
            id, field, text
        ));
    }
    extracted.value()
}

/// Readings for every data row of the inverter table.
pub fn extract_readings(table: &Table, extractor: &FieldExtractor) -> Vec<Reading> {
    data_rows(table)
        .iter()
        .filter_map(|row| Reading::from_row(row, extractor))
        .collect()
}

/// Warn when the header no longer labels the columns we read by position.
fn check_header_layout(table: &Table) {
    let Some(header) = table.first() else {
        return;
    };
    let expected = [
        (POWER_COLUMN, "power"),
        (VOLTAGE_COLUMN, "volt"),
        (TEMPERATURE_COLUMN, "temp"),
    ];
    for (column, label) in expected {
        // Headers shorter than the column are common (voltage/temperature are optional).
        if let Some(text) = header.get(column)
            && !text.to_lowercase().contains(label)
        {
            get_logger("reading").warn(&format!(
                "Header column {} is {:?}, expected it to mention {:?}; values may be misread",
                column, text, label
            ));
        }
    }
}

/// Tabulate the page, locate the inverter table and read its rows.
pub fn read_inverter_page(html: &str, extractor: &FieldExtractor) -> Result<Vec<Reading>> {
    let logger = get_logger("reading");
    let tables = tabulate(html);
    logger.debug(&format!("Found {} table(s) in page", tables.len()));

    let table = find_inverter_table(&tables)?;
    check_header_layout(table);

    let readings = extract_readings(table, extractor);
    if readings.is_empty() {
        return Err(HeliosError::empty_result(format!(
            "table headed {:?} has {} data row(s), none with an inverter reading",
            HEADER_MARKER,
            data_rows(table).len()
        )));
    }
    logger.debug(&format!("Extracted {} reading(s)", readings.len()));
    Ok(readings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|c| (*c).to_string()).collect()
    }

    #[test]
    fn reads_fixed_columns() {
        let x = FieldExtractor::new().unwrap();
        let r = Reading::from_row(
            &row(&[" 801-1 ", "120 W", "50.0 Hz", "236 V", "31°C", "2024-06-01"]),
            &x,
        )
        .unwrap();
        assert_eq!(r.id, "801-1");
        assert_eq!(r.watts, Some(120));
        assert_eq!(r.volt, Some(236.0));
        assert_eq!(r.temp, Some(31.0));
    }

    #[test]
    fn short_rows_give_absent_fields() {
        let x = FieldExtractor::new().unwrap();
        let r = Reading::from_row(&row(&["801-2", "80 W"]), &x).unwrap();
        assert_eq!(r.watts, Some(80));
        assert_eq!(r.volt, None);
        assert_eq!(r.temp, None);

        let r = Reading::from_row(&row(&["801-3", "-", "x", "230"]), &x).unwrap();
        assert_eq!(r.watts, None);
        assert_eq!(r.volt, Some(230.0));
        assert_eq!(r.temp, None);

        assert!(Reading::from_row(&row(&["only one"]), &x).is_none());
        assert!(Reading::from_row(&row(&[]), &x).is_none());
    }

    #[test]
    fn extract_skips_header_and_filler_rows() {
        let x = FieldExtractor::new().unwrap();
        let table = vec![
            row(&["Inverter ID", "Current Power"]),
            row(&["A", "10 W"]),
            row(&["spacer"]),
            row(&["B", "20 W"]),
        ];
        let readings = extract_readings(&table, &x);
        let ids: Vec<_> = readings.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["A", "B"]);
    }

    #[test]
    fn header_only_table_is_empty_result() {
        let x = FieldExtractor::new().unwrap();
        let html = "<table><tr><td>Inverter ID</td><td>Current Power</td></tr></table>";
        let err = read_inverter_page(html, &x).unwrap_err();
        assert!(matches!(err, HeliosError::EmptyResult { .. }));
    }

    #[test]
    fn page_without_marker_is_table_not_found() {
        let x = FieldExtractor::new().unwrap();
        let html = "<table><tr><td>Lifetime generation</td></tr></table>";
        let err = read_inverter_page(html, &x).unwrap_err();
        assert!(matches!(err, HeliosError::TableNotFound { .. }));
    }
}
