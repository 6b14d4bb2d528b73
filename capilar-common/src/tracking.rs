//! Harvest-progress summaries
//!
//! Independent of the product pipeline: works only on the tracking entries
//! supplied by the harvester.

use crate::records::{TrackingEntry, TrackingStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wildcard accepted by the tracking status filter
pub const ALL_STATUSES: &str = "all";

/// Counts by status plus the total product count
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrackingSummary {
    pub total_sources: usize,
    pub scraped: usize,
    pub pending: usize,
    pub js_required: usize,
    pub other: usize,
    /// Sum of product counts across all entries regardless of status
    pub total_products: u64,
}

/// Status filter of the tracking table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StatusFilter {
    #[default]
    All,
    Only(TrackingStatus),
}

impl From<String> for StatusFilter {
    fn from(s: String) -> Self {
        if s == ALL_STATUSES {
            StatusFilter::All
        } else {
            StatusFilter::Only(TrackingStatus::from(s))
        }
    }
}

impl From<&str> for StatusFilter {
    fn from(s: &str) -> Self {
        StatusFilter::from(s.to_string())
    }
}

impl From<StatusFilter> for String {
    fn from(filter: StatusFilter) -> Self {
        match filter {
            StatusFilter::All => ALL_STATUSES.to_string(),
            StatusFilter::Only(status) => status.into(),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str(ALL_STATUSES),
            StatusFilter::Only(status) => write!(f, "{}", status),
        }
    }
}

/// Reduce the tracking entries to per-status counts
pub fn summarize(entries: &[TrackingEntry]) -> TrackingSummary {
    entries.iter().fold(
        TrackingSummary {
            total_sources: entries.len(),
            ..Default::default()
        },
        |mut summary, entry| {
            match entry.status {
                TrackingStatus::Scraped => summary.scraped += 1,
                TrackingStatus::Pending => summary.pending += 1,
                TrackingStatus::JsRequired => summary.js_required += 1,
                TrackingStatus::Other(_) => summary.other += 1,
            }
            summary.total_products += entry.product_count;
            summary
        },
    )
}

/// Entries matching `filter`, in input order
pub fn filter_by_status<'a>(
    entries: &'a [TrackingEntry],
    filter: &StatusFilter,
) -> Vec<&'a TrackingEntry> {
    match filter {
        StatusFilter::All => entries.iter().collect(),
        StatusFilter::Only(status) => entries.iter().filter(|e| &e.status == status).collect(),
    }
}
