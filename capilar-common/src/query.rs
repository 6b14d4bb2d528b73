//! Product search and filtering over the merged view
//!
//! Three independent predicates combined with AND. Results keep input order
//! and are never paginated here; slicing for display is the caller's job.

use crate::completeness::is_incomplete;
use crate::merge::MergedRecord;
use crate::records::EditableField;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Wildcard accepted by the brand filter
pub const ALL_BRANDS: &str = "All";

/// Brand predicate: either the wildcard or an exact brand name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BrandFilter {
    #[default]
    All,
    Exact(String),
}

impl BrandFilter {
    pub fn matches(&self, brand: Option<&str>) -> bool {
        match self {
            BrandFilter::All => true,
            BrandFilter::Exact(wanted) => brand == Some(wanted.as_str()),
        }
    }
}

impl From<String> for BrandFilter {
    fn from(s: String) -> Self {
        if s == ALL_BRANDS {
            BrandFilter::All
        } else {
            BrandFilter::Exact(s)
        }
    }
}

impl From<&str> for BrandFilter {
    fn from(s: &str) -> Self {
        BrandFilter::from(s.to_string())
    }
}

impl From<BrandFilter> for String {
    fn from(filter: BrandFilter) -> Self {
        match filter {
            BrandFilter::All => ALL_BRANDS.to_string(),
            BrandFilter::Exact(brand) => brand,
        }
    }
}

impl fmt::Display for BrandFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrandFilter::All => f.write_str(ALL_BRANDS),
            BrandFilter::Exact(brand) => f.write_str(brand),
        }
    }
}

/// Current product filter selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQuery {
    #[serde(default)]
    pub search_text: String,
    #[serde(default)]
    pub brand: BrandFilter,
    #[serde(default)]
    pub only_incomplete: bool,
}

impl ProductQuery {
    /// Case-insensitive substring match on name, description or URL
    pub fn matches_text(&self, record: &MergedRecord) -> bool {
        if self.search_text.is_empty() {
            return true;
        }
        let needle = self.search_text.to_lowercase();
        [
            record.field(EditableField::ProductName),
            record.field(EditableField::Description),
            Some(record.source_url()),
        ]
        .into_iter()
        .flatten()
        .any(|haystack| haystack.to_lowercase().contains(&needle))
    }

    pub fn matches(&self, record: &MergedRecord) -> bool {
        self.matches_text(record)
            && self.brand.matches(record.field(EditableField::Brand))
            && (!self.only_incomplete || is_incomplete(record))
    }
}

/// Records passing every predicate of `q`, in input order
pub fn query<'a>(records: &'a [MergedRecord], q: &ProductQuery) -> Vec<&'a MergedRecord> {
    records.iter().filter(|record| q.matches(record)).collect()
}

/// `"All"` followed by the sorted distinct brands
pub fn distinct_brands(records: &[MergedRecord]) -> Vec<String> {
    let brands: BTreeSet<&str> = records
        .iter()
        .filter_map(|record| record.field(EditableField::Brand))
        .filter(|brand| *brand != ALL_BRANDS)
        .collect();

    std::iter::once(ALL_BRANDS.to_string())
        .chain(brands.into_iter().map(str::to_string))
        .collect()
}

/// Number of incomplete records in the merged view
pub fn incomplete_count(records: &[MergedRecord]) -> usize {
    records.iter().filter(|record| is_incomplete(record)).count()
}
