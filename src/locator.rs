//! Picks the inverter table out of everything the page contains.

use crate::error::{HeliosError, Result};
use crate::markup::{Row, Table};

/// Text the header row of the inverter table always carries
pub const HEADER_MARKER: &str = "Current Power";

/// Whether the first row of `table` carries the inverter header marker.
pub fn is_inverter_table(table: &Table) -> bool {
    table
        .first()
        .is_some_and(|header| header.join(" ").contains(HEADER_MARKER))
}

/// First table, in document order, whose header row contains [`HEADER_MARKER`].
pub fn find_inverter_table(tables: &[Table]) -> Result<&Table> {
    tables
        .iter()
        .find(|t| is_inverter_table(t))
        .ok_or_else(|| HeliosError::table_not_found(HEADER_MARKER))
}

/// Rows after the header row.
pub fn data_rows(table: &Table) -> &[Row] {
    table.get(1..).unwrap_or(&[])
}
