//! Completeness scoring and status classification
//!
//! Pure functions over merged records. A field counts as filled when it is
//! present and not whitespace-only.

use crate::merge::MergedRecord;
use crate::records::EditableField;
use serde::Serialize;

/// Fields whose absence marks a record incomplete
pub const CRITICAL_FIELDS: [EditableField; 3] = [
    EditableField::ProductName,
    EditableField::Description,
    EditableField::IngredientsList,
];

/// Fields counted by [`completion_percent`], in scoring order
pub const SCORED_FIELDS: [EditableField; 6] = [
    EditableField::ProductName,
    EditableField::Description,
    EditableField::IngredientsList,
    EditableField::UsageInstructions,
    EditableField::Brand,
    EditableField::ProductType,
];

/// Card/row color of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusClass {
    /// All critical fields present
    Green,
    /// Missing description
    Yellow,
    /// Missing ingredients
    Orange,
    /// Missing product name
    Red,
    /// Manually edited
    Blue,
}

/// True if any critical field is absent or blank
pub fn is_incomplete(record: &MergedRecord) -> bool {
    CRITICAL_FIELDS.iter().any(|field| record.is_blank(*field))
}

/// Share of scored fields that are filled, rounded half-up to 0..=100
pub fn completion_percent(record: &MergedRecord) -> u8 {
    let filled = SCORED_FIELDS
        .iter()
        .filter(|field| !record.is_blank(**field))
        .count();
    let percent = (100.0 * filled as f64 / SCORED_FIELDS.len() as f64).round();
    percent as u8
}

/// First matching rule wins: edited, then name, description, ingredients
pub fn status_class(record: &MergedRecord) -> StatusClass {
    if record.has_edits {
        StatusClass::Blue
    } else if record.is_blank(EditableField::ProductName) {
        StatusClass::Red
    } else if record.is_blank(EditableField::Description) {
        StatusClass::Yellow
    } else if record.is_blank(EditableField::IngredientsList) {
        StatusClass::Orange
    } else {
        StatusClass::Green
    }
}

/// Editable fields that are currently blank (detail view "empty" markers)
pub fn empty_fields(record: &MergedRecord) -> Vec<EditableField> {
    EditableField::ALL
        .into_iter()
        .filter(|field| record.is_blank(*field))
        .collect()
}
