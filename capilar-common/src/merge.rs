//! Merge of harvested records with the edit overlay
//!
//! Merge strategy: overlay values overwrite base values field by field,
//! base values are kept for every field the overlay does not mention.

use crate::overlay::{Overlay, OverlayEntry};
use crate::records::{BaseRecord, EditableField};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A base record with its overlay entry applied
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedRecord {
    #[serde(flatten)]
    pub record: BaseRecord,

    /// True when an overlay entry exists for this identity
    #[serde(rename = "_hasEdits", skip_serializing_if = "std::ops::Not::not")]
    pub has_edits: bool,

    /// Timestamp of the last saved correction
    #[serde(rename = "_editedAt", skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<DateTime<Utc>>,
}

impl MergedRecord {
    /// Merged record without an overlay entry
    pub fn unedited(record: BaseRecord) -> Self {
        Self {
            record,
            has_edits: false,
            edited_at: None,
        }
    }

    /// Apply an overlay entry on top of `base`
    pub fn with_entry(mut record: BaseRecord, entry: &OverlayEntry) -> Self {
        for (field, value) in &entry.fields {
            record.set_field(*field, value.clone());
        }
        Self {
            record,
            has_edits: true,
            edited_at: entry.edited_at,
        }
    }

    pub fn source_url(&self) -> &str {
        &self.record.source_url
    }

    pub fn field(&self, field: EditableField) -> Option<&str> {
        self.record.field(field)
    }

    pub fn is_blank(&self, field: EditableField) -> bool {
        self.record.is_blank(field)
    }
}

/// Produce the merged view, one output record per base record, in input order
pub fn merge(base: &[BaseRecord], overlay: &Overlay) -> Vec<MergedRecord> {
    base.iter()
        .map(|record| match overlay.get(&record.source_url) {
            Some(entry) => MergedRecord::with_entry(record.clone(), entry),
            None => MergedRecord::unedited(record.clone()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::FieldOverrides;
    use chrono::TimeZone;

    fn entry(pairs: &[(EditableField, &str)]) -> OverlayEntry {
        OverlayEntry::new(
            pairs
                .iter()
                .map(|(f, v)| (*f, v.to_string()))
                .collect::<FieldOverrides>(),
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        )
    }

    fn base() -> Vec<BaseRecord> {
        vec![
            BaseRecord::new("https://a.com/1")
                .with_field(EditableField::Brand, "X")
                .with_field(EditableField::ProductName, "Shampoo"),
            BaseRecord::new("https://b.com/2")
                .with_field(EditableField::Brand, "Y")
                .with_field(EditableField::Description, "base desc"),
        ]
    }

    #[test]
    fn test_empty_overlay_passes_records_through() {
        let base = base();
        let merged = merge(&base, &Overlay::new());

        assert_eq!(merged.len(), base.len());
        for (m, b) in merged.iter().zip(&base) {
            assert_eq!(&m.record, b);
            assert!(!m.has_edits);
            assert!(m.edited_at.is_none());
        }
    }

    #[test]
    fn test_overlay_precedence() {
        let base = base();
        let mut overlay = Overlay::new();
        overlay.insert(
            "https://b.com/2",
            entry(&[
                (EditableField::Description, "fixed desc"),
                (EditableField::IngredientsList, "aqua"),
            ]),
        );

        let merged = merge(&base, &overlay);
        let edited = &merged[1];
        assert!(edited.has_edits);
        assert_eq!(edited.field(EditableField::Description), Some("fixed desc"));
        assert_eq!(edited.field(EditableField::IngredientsList), Some("aqua"));
        assert_eq!(edited.field(EditableField::Brand), Some("Y"));
        assert_eq!(merged[0].record, base[0]);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let base = base();
        let mut overlay = Overlay::new();
        overlay.insert("https://a.com/1", entry(&[(EditableField::Brand, "Z")]));

        let first = merge(&base, &overlay);
        let second = merge(&base, &overlay);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }

    #[test]
    fn test_empty_entry_changes_no_field() {
        let base = base();
        let mut overlay = Overlay::new();
        overlay.insert("https://a.com/1", entry(&[]));

        let merged = merge(&base, &overlay);
        assert_eq!(merged[0].record, base[0]);
        assert!(merged[0].has_edits);
    }

    #[test]
    fn test_overlay_for_unknown_identity_is_ignored() {
        let base = base();
        let mut overlay = Overlay::new();
        overlay.insert("https://gone.com/9", entry(&[(EditableField::Brand, "Z")]));

        let merged = merge(&base, &overlay);
        assert_eq!(merged.len(), 2);
        assert!(merged.iter().all(|m| !m.has_edits));
    }

    #[test]
    fn test_serialized_markers_only_on_edited_records() {
        let base = base();
        let mut overlay = Overlay::new();
        overlay.insert("https://a.com/1", entry(&[(EditableField::Brand, "Z")]));

        let merged = merge(&base, &overlay);
        let edited = serde_json::to_value(&merged[0]).unwrap();
        let plain = serde_json::to_value(&merged[1]).unwrap();

        assert_eq!(edited["_hasEdits"], true);
        assert_eq!(edited["brand"], "Z");
        assert!(edited["_editedAt"].is_string());
        assert!(plain.get("_hasEdits").is_none());
        assert_eq!(plain, serde_json::to_value(&base[1]).unwrap());
    }

    #[test]
    fn test_unstamped_entry_is_applied() {
        let base = base();
        let mut unstamped = entry(&[(EditableField::Description, "operator fix")]);
        unstamped.edited_at = None;
        let mut overlay = Overlay::new();
        overlay.insert("https://a.com/1", unstamped);

        let merged = merge(&base, &overlay);
        assert!(merged[0].has_edits);
        assert_eq!(merged[0].field(EditableField::Description), Some("operator fix"));

        let value = serde_json::to_value(&merged[0]).unwrap();
        assert_eq!(value["_hasEdits"], true);
        assert!(value.get("_editedAt").is_none());
    }
}
