//! Per-source-domain health report
//!
//! Records are grouped by the hostname of their `source_url`. URLs without a
//! host (`mailto:`, `data:`) share the empty hostname. Records whose URL does
//! not parse are left out of this view only.

use crate::completeness::is_incomplete;
use crate::merge::MergedRecord;
use serde::Serialize;
use std::collections::HashMap;
use url::Url;

/// Placeholder shown where a hostname cannot be derived
pub const INVALID_URL_LABEL: &str = "invalid URL";

/// Aggregate for one hostname
#[derive(Debug, Clone, Default, Serialize)]
pub struct DomainStat<'a> {
    pub count: usize,
    pub incomplete_count: usize,
    pub records: Vec<&'a MergedRecord>,
}

/// Hostname of `source_url`, empty when it has none, `None` if it does not parse
pub fn hostname(source_url: &str) -> Option<String> {
    let url = Url::parse(source_url).ok()?;
    Some(url.host_str().unwrap_or_default().to_string())
}

/// Hostname for display, falling back to [`INVALID_URL_LABEL`]
pub fn hostname_label(source_url: &str) -> String {
    hostname(source_url).unwrap_or_else(|| INVALID_URL_LABEL.to_string())
}

/// Group the merged view by hostname. Map order carries no meaning.
pub fn aggregate_by_domain(records: &[MergedRecord]) -> HashMap<String, DomainStat<'_>> {
    let mut by_domain: HashMap<String, DomainStat<'_>> = HashMap::new();

    for record in records {
        let Some(host) = hostname(record.source_url()) else {
            continue;
        };
        let stat = by_domain.entry(host).or_default();
        stat.count += 1;
        if is_incomplete(record) {
            stat.incomplete_count += 1;
        }
        stat.records.push(record);
    }

    by_domain
}
