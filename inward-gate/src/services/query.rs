//! Entry search and CSV export
//!
//! CSV fields are written with the `csv` crate: text fields are always quoted
//! and embedded quotes are doubled, so remarks and names round-trip intact.

use chrono::NaiveDate;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use inward_common::models::Entry;
use inward_common::{Error, Result};
use serde::Deserialize;

const CSV_HEADERS: [&str; 11] = [
    "Date", "Code", "Vehicle", "Client", "Product", "Lot", "Bags", "Weight", "Total", "Status",
    "Remarks",
];

/// Free-text and date filter; empty parts match everything
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EntryFilter {
    pub search: String,
    /// Exact `YYYY-MM-DD` match against the entry's date string
    pub date: String,
}

impl EntryFilter {
    pub fn new(search: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            date: date.into(),
        }
    }

    pub fn matches(&self, entry: &Entry) -> bool {
        self.matches_search(entry) && (self.date.is_empty() || entry.date_string == self.date)
    }

    fn matches_search(&self, entry: &Entry) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        [
            &entry.client_name,
            &entry.product_name,
            &entry.vehicle_no,
            &entry.entry_code,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Keep matching entries, preserving order
pub fn filter(entries: &[Entry], search: &str, date: &str) -> Vec<Entry> {
    let filter = EntryFilter::new(search, date);
    entries.iter().filter(|e| filter.matches(e)).cloned().collect()
}

/// Header row plus one row per entry, `\n` separated
pub fn export_csv(entries: &[Entry]) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::NonNumeric)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADERS).map_err(csv_error)?;
    for entry in entries {
        writer
            .write_record([
                entry.date_string.clone(),
                entry.entry_code.clone(),
                entry.vehicle_no.clone(),
                entry.client_name.clone(),
                entry.product_name.clone(),
                entry.lot_no.clone().unwrap_or_default(),
                entry.bags.map(|b| b.to_string()).unwrap_or_default(),
                entry.bag_weight.map(|w| w.to_string()).unwrap_or_default(),
                entry.total_weight.to_string(),
                entry.qc_status.to_string(),
                entry.remarks.clone().unwrap_or_default(),
            ])
            .map_err(csv_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Internal(format!("CSV flush failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| Error::Internal(format!("CSV is not UTF-8: {}", e)))
}

/// `Register_<YYYY-MM-DD>.csv`
pub fn export_filename(date: NaiveDate) -> String {
    format!("Register_{}.csv", date.format("%Y-%m-%d"))
}

fn csv_error(e: csv::Error) -> Error {
    Error::Internal(format!("CSV write failed: {}", e))
}
