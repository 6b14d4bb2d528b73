//! Harvested record and tracking-entry models
//!
//! Both collections are produced by the external scraper and loaded once at
//! startup. Nothing in this module mutates them after load; corrections live
//! in the edit overlay (see [`crate::overlay`]).

use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

/// Attributes an operator may override through the edit overlay.
///
/// `source_url` is not editable: it is the record identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditableField {
    ProductName,
    Brand,
    ProductType,
    HairTypeDeclared,
    Description,
    IngredientsList,
    UsageInstructions,
}

impl EditableField {
    /// All editable fields, in detail-view order
    pub const ALL: [EditableField; 7] = [
        EditableField::ProductName,
        EditableField::Brand,
        EditableField::ProductType,
        EditableField::HairTypeDeclared,
        EditableField::Description,
        EditableField::IngredientsList,
        EditableField::UsageInstructions,
    ];

    /// Attribute name as written in the harvest and overlay documents
    pub fn as_str(self) -> &'static str {
        match self {
            EditableField::ProductName => "product_name",
            EditableField::Brand => "brand",
            EditableField::ProductType => "product_type",
            EditableField::HairTypeDeclared => "hair_type_declared",
            EditableField::Description => "description",
            EditableField::IngredientsList => "ingredients_list",
            EditableField::UsageInstructions => "usage_instructions",
        }
    }
}

impl fmt::Display for EditableField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EditableField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        EditableField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown editable field: {}", s)))
    }
}

/// One harvested product.
///
/// Only the attributes the core reasons about are typed; claims and other
/// scraper metadata are carried verbatim in `attributes` for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseRecord {
    /// Identity key shared with the overlay
    pub source_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hair_type_declared: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients_list: Option<String>,
    /// Kept as read so integers stay integers on export
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ph: Option<Number>,

    /// Claims (`claim_*`), cronograma scores, image URLs, parser tag, ...
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

impl BaseRecord {
    /// Record with only an identity, every other attribute absent
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            brand: None,
            product_name: None,
            product_type: None,
            description: None,
            hair_type_declared: None,
            usage_instructions: None,
            ingredients_list: None,
            ph: None,
            attributes: BTreeMap::new(),
        }
    }

    /// Builder-style setter used by loaders and tests
    pub fn with_field(mut self, field: EditableField, value: impl Into<String>) -> Self {
        self.set_field(field, value.into());
        self
    }

    pub fn field(&self, field: EditableField) -> Option<&str> {
        let slot = match field {
            EditableField::ProductName => &self.product_name,
            EditableField::Brand => &self.brand,
            EditableField::ProductType => &self.product_type,
            EditableField::HairTypeDeclared => &self.hair_type_declared,
            EditableField::Description => &self.description,
            EditableField::IngredientsList => &self.ingredients_list,
            EditableField::UsageInstructions => &self.usage_instructions,
        };
        slot.as_deref()
    }

    pub fn set_field(&mut self, field: EditableField, value: String) {
        let slot = match field {
            EditableField::ProductName => &mut self.product_name,
            EditableField::Brand => &mut self.brand,
            EditableField::ProductType => &mut self.product_type,
            EditableField::HairTypeDeclared => &mut self.hair_type_declared,
            EditableField::Description => &mut self.description,
            EditableField::IngredientsList => &mut self.ingredients_list,
            EditableField::UsageInstructions => &mut self.usage_instructions,
        };
        *slot = Some(value);
    }

    /// True if the field is absent or whitespace-only
    pub fn is_blank(&self, field: EditableField) -> bool {
        self.field(field).map_or(true, |v| v.trim().is_empty())
    }

    /// Boolean claim flags (`claim_*` attributes set to `true`), display only
    pub fn active_claims(&self) -> Vec<&str> {
        self.attributes
            .iter()
            .filter(|(key, value)| key.starts_with("claim_") && value.as_bool() == Some(true))
            .map(|(key, _)| key.as_str())
            .collect()
    }
}

/// Harvest progress of one source site
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TrackingStatus {
    Scraped,
    Pending,
    JsRequired,
    /// Any status the harvester reports that the dashboard has no bucket for
    Other(String),
}

impl TrackingStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TrackingStatus::Scraped => "scraped",
            TrackingStatus::Pending => "pending",
            TrackingStatus::JsRequired => "js_required",
            TrackingStatus::Other(s) => s,
        }
    }
}

impl From<String> for TrackingStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "scraped" => TrackingStatus::Scraped,
            "pending" => TrackingStatus::Pending,
            "js_required" => TrackingStatus::JsRequired,
            _ => TrackingStatus::Other(s),
        }
    }
}

impl From<TrackingStatus> for String {
    fn from(status: TrackingStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for TrackingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One source site in the harvest tracking document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingEntry {
    pub name: String,
    pub url: String,
    pub status: TrackingStatus,
    #[serde(rename = "products", default, deserialize_with = "null_as_zero")]
    pub product_count: u64,
    #[serde(default)]
    pub has_ingredients: bool,
}

/// Tracking document as written by the harvester
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackingDocument {
    /// Number of brands the harvester was asked to cover
    #[serde(default)]
    pub total_brands: u64,
    #[serde(default)]
    pub brands: Vec<TrackingEntry>,
}

fn null_as_zero<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or(0))
}

/// Parse the products document (JSON array of records)
pub fn parse_products(bytes: &[u8]) -> Result<Vec<BaseRecord>> {
    let records: Vec<BaseRecord> = serde_json::from_slice(bytes)?;

    let mut seen = HashSet::with_capacity(records.len());
    for record in &records {
        if !seen.insert(record.source_url.as_str()) {
            warn!(source_url = %record.source_url, "Duplicate record identity in harvest");
        }
    }

    Ok(records)
}

/// Parse the tracking document
pub fn parse_tracking(bytes: &[u8]) -> Result<TrackingDocument> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Load the products document from disk
pub fn load_products(path: &Path) -> Result<Vec<BaseRecord>> {
    let bytes = std::fs::read(path)
        .map_err(|e| Error::Config(format!("Cannot read products {}: {}", path.display(), e)))?;
    let records = parse_products(&bytes)?;
    info!("Loaded {} products from {}", records.len(), path.display());
    Ok(records)
}

/// Load the tracking document from disk
pub fn load_tracking(path: &Path) -> Result<TrackingDocument> {
    let bytes = std::fs::read(path)
        .map_err(|e| Error::Config(format!("Cannot read tracking {}: {}", path.display(), e)))?;
    let document = parse_tracking(&bytes)?;
    info!(
        "Loaded {} tracking entries from {}",
        document.brands.len(),
        path.display()
    );
    Ok(document)
}
