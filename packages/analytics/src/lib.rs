#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Per-day frequency aggregation over normalized events.
//!
//! Pure in-memory computation: the aggregate feeds both the frequency
//! table drawn onto the rendered map and the `daily_counts` field of the
//! API response.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use quake_map_event_models::NormalizedEvent;
use serde::{Deserialize, Serialize};

/// Label of the synthetic summary row appended after the date rows.
pub const TOTAL_LABEL: &str = "Total";

/// Event count for one local calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    /// Local calendar date the events fall on.
    pub date: NaiveDate,
    /// Number of events on that date.
    pub count: u64,
}

/// Per-day counts in ascending date order, plus the window total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyTable {
    /// One row per distinct local date, ascending.
    pub rows: Vec<DailyCount>,
    /// Sum of all row counts.
    pub total: u64,
}

impl FrequencyTable {
    /// Whether the table has no date rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in display form: `YYYY-MM-DD` labels followed by one
    /// [`TOTAL_LABEL`] row. An empty table stays empty; the summary row
    /// only appears when there is something to summarize.
    #[must_use]
    pub fn display_rows(&self) -> Vec<(String, u64)> {
        if self.rows.is_empty() {
            return Vec::new();
        }

        let mut rows: Vec<(String, u64)> = self
            .rows
            .iter()
            .map(|row| (row.date.format("%Y-%m-%d").to_string(), row.count))
            .collect();
        rows.push((TOTAL_LABEL.to_string(), self.total));
        rows
    }
}

/// Groups events by their local calendar date.
///
/// Empty input yields an empty table with a total of zero.
#[must_use]
pub fn daily_frequency(events: &[NormalizedEvent]) -> FrequencyTable {
    let mut per_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for event in events {
        *per_day.entry(event.local_date()).or_insert(0) += 1;
    }

    let rows: Vec<DailyCount> = per_day
        .into_iter()
        .map(|(date, count)| DailyCount { date, count })
        .collect();
    let total = rows.iter().map(|row| row.count).sum();

    FrequencyTable { rows, total }
}
