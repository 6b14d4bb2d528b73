//! Dashboard facade
//!
//! Owns the loaded inputs, the overlay store, the edit session and the
//! current filter selection. Operator actions arrive as [`Intent`] values
//! and are applied one at a time. Derived views are computed from the
//! merged-view cache, which is rebuilt whenever the overlay version moves.

use crate::domains::{aggregate_by_domain, DomainStat};
use crate::export::{self, Snapshot};
use crate::merge::{merge, MergedRecord};
use crate::overlay::{KeyValueStore, OverlayStore};
use crate::query::{self, BrandFilter, ProductQuery};
use crate::records::{BaseRecord, EditableField, TrackingDocument, TrackingEntry, TrackingStatus};
use crate::session::EditSession;
use crate::tracking::{self, StatusFilter, TrackingSummary};
use crate::{time, Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// Product list layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Grid,
    Table,
}

/// Top-level tab
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Products,
    Tracking,
}

/// One operator action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Intent {
    SelectRecord { source_url: String },
    Search { text: String },
    FilterBrand { brand: BrandFilter },
    ToggleIncompleteOnly { enabled: bool },
    SwitchView { view: ViewMode },
    BeginEdit,
    SetField { field: EditableField, value: String },
    CommitEdit,
    CancelEdit,
    CloseDetail,
    /// Destroys every overlay entry; ignored unless `confirm` is set
    ClearAllEdits {
        #[serde(default)]
        confirm: bool,
    },
    SwitchTab { tab: Tab },
    FilterTracking { status: StatusFilter },
}

/// Result of a successfully applied intent
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IntentOutcome {
    Applied,
    Saved {
        source_url: String,
        edited_at: Option<DateTime<Utc>>,
    },
    Cleared {
        removed: usize,
    },
    /// Clear-all without confirmation
    Declined,
}

/// Figures shown in the page header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HeaderFigures {
    pub total_products: usize,
    /// Brands the harvester was asked to cover
    pub total_brands: u64,
    pub scraped_sources: usize,
    pub edited_records: usize,
}

/// Serializable view state for the presentation layer
#[derive(Debug, Clone, Serialize)]
pub struct ViewState {
    pub tab: Tab,
    pub view: ViewMode,
    pub query: ProductQuery,
    pub tracking_filter: StatusFilter,
    pub selected: Option<String>,
    pub editing: bool,
    pub header: HeaderFigures,
}

pub struct Dashboard<S> {
    base: Vec<BaseRecord>,
    tracking: TrackingDocument,
    store: OverlayStore<S>,
    session: EditSession,
    query: ProductQuery,
    view: ViewMode,
    tab: Tab,
    tracking_filter: StatusFilter,
    merged: Vec<MergedRecord>,
    merged_version: u64,
}

impl<S: KeyValueStore> Dashboard<S> {
    pub fn new(base: Vec<BaseRecord>, tracking: TrackingDocument, store: OverlayStore<S>) -> Self {
        let merged = merge(&base, store.overlay());
        let merged_version = store.version();
        info!(
            products = base.len(),
            sources = tracking.brands.len(),
            edited = store.overlay().len(),
            "Dashboard ready"
        );
        Self {
            base,
            tracking,
            store,
            session: EditSession::new(),
            query: ProductQuery::default(),
            view: ViewMode::default(),
            tab: Tab::default(),
            tracking_filter: StatusFilter::default(),
            merged,
            merged_version,
        }
    }

    /// Apply one operator action
    pub fn apply(&mut self, intent: Intent) -> Result<IntentOutcome> {
        debug!(?intent, "Applying intent");
        match intent {
            Intent::SelectRecord { source_url } => {
                self.select_record(&source_url)?;
            }
            Intent::Search { text } => self.query.search_text = text,
            Intent::FilterBrand { brand } => self.query.brand = brand,
            Intent::ToggleIncompleteOnly { enabled } => self.query.only_incomplete = enabled,
            Intent::SwitchView { view } => self.view = view,
            Intent::BeginEdit => self.session.begin_edit()?,
            Intent::SetField { field, value } => self.session.set_field(field, value)?,
            Intent::CommitEdit => return self.commit_edit(),
            Intent::CancelEdit => self.session.cancel_edit()?,
            Intent::CloseDetail => self.session.close(),
            Intent::ClearAllEdits { confirm } => return self.clear_all_edits(confirm),
            Intent::SwitchTab { tab } => self.tab = tab,
            Intent::FilterTracking { status } => self.tracking_filter = status,
        }
        Ok(IntentOutcome::Applied)
    }

    /// Open the detail view for the first merged record with this identity
    pub fn select_record(&mut self, source_url: &str) -> Result<()> {
        let record = self
            .merged
            .iter()
            .find(|record| record.source_url() == source_url)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("No product with source_url {}", source_url)))?;
        self.session.select(record);
        Ok(())
    }

    fn commit_edit(&mut self) -> Result<IntentOutcome> {
        let entry = self.session.commit_edit(&mut self.store)?;
        self.sync_merged();
        let source_url = self
            .session
            .selected()
            .map(|record| record.source_url().to_string())
            .unwrap_or_default();
        Ok(IntentOutcome::Saved {
            source_url,
            edited_at: entry.edited_at,
        })
    }

    fn clear_all_edits(&mut self, confirm: bool) -> Result<IntentOutcome> {
        if !confirm {
            info!("Clear-all declined");
            return Ok(IntentOutcome::Declined);
        }
        let removed = self.store.clear()?;
        self.sync_merged();

        let refreshed = self.session.selected().and_then(|selected| {
            self.merged
                .iter()
                .find(|record| record.source_url() == selected.source_url())
                .cloned()
        });
        if let Some(record) = refreshed {
            self.session.refresh(record);
        }
        Ok(IntentOutcome::Cleared { removed })
    }

    /// Rebuild the merged view if the overlay changed since the last build
    fn sync_merged(&mut self) {
        if self.merged_version != self.store.version() {
            self.merged = merge(&self.base, self.store.overlay());
            self.merged_version = self.store.version();
            debug!(version = self.merged_version, "Merged view rebuilt");
        }
    }

    pub fn merged(&self) -> &[MergedRecord] {
        &self.merged
    }

    /// Merged records passing the current product query
    pub fn filtered(&self) -> Vec<&MergedRecord> {
        query::query(&self.merged, &self.query)
    }

    pub fn incomplete_count(&self) -> usize {
        query::incomplete_count(&self.merged)
    }

    pub fn brands(&self) -> Vec<String> {
        query::distinct_brands(&self.merged)
    }

    pub fn domains(&self) -> HashMap<String, DomainStat<'_>> {
        aggregate_by_domain(&self.merged)
    }

    pub fn tracking_summary(&self) -> TrackingSummary {
        tracking::summarize(&self.tracking.brands)
    }

    pub fn filtered_tracking(&self) -> Vec<&TrackingEntry> {
        tracking::filter_by_status(&self.tracking.brands, &self.tracking_filter)
    }

    /// Snapshot of the merged view dated today
    pub fn export_snapshot(&self) -> Result<Snapshot> {
        self.export_snapshot_on(time::today())
    }

    pub fn export_snapshot_on(&self, date: NaiveDate) -> Result<Snapshot> {
        let snapshot = export::snapshot(&self.merged, date)?;
        info!(
            records = self.merged.len(),
            bytes = snapshot.bytes.len(),
            name = %snapshot.suggested_name,
            "Snapshot exported"
        );
        Ok(snapshot)
    }

    pub fn header(&self) -> HeaderFigures {
        HeaderFigures {
            total_products: self.merged.len(),
            total_brands: self.tracking.total_brands,
            scraped_sources: self
                .tracking
                .brands
                .iter()
                .filter(|entry| entry.status == TrackingStatus::Scraped)
                .count(),
            edited_records: self.merged.iter().filter(|record| record.has_edits).count(),
        }
    }

    pub fn view_state(&self) -> ViewState {
        ViewState {
            tab: self.tab,
            view: self.view,
            query: self.query.clone(),
            tracking_filter: self.tracking_filter.clone(),
            selected: self
                .session
                .selected()
                .map(|record| record.source_url().to_string()),
            editing: self.session.is_editing(),
            header: self.header(),
        }
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn query(&self) -> &ProductQuery {
        &self.query
    }

    pub fn view(&self) -> ViewMode {
        self.view
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn tracking_filter(&self) -> &StatusFilter {
        &self.tracking_filter
    }

    pub fn tracking(&self) -> &TrackingDocument {
        &self.tracking
    }

    pub fn store(&self) -> &OverlayStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut OverlayStore<S> {
        &mut self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completeness::{completion_percent, status_class, StatusClass};
    use crate::overlay::MemoryStore;

    const KEY: &str = "scraper_product_edits";

    fn dashboard() -> Dashboard<MemoryStore> {
        let base = vec![BaseRecord::new("https://a.com/1")
            .with_field(EditableField::Brand, "X")
            .with_field(EditableField::ProductName, "Shampoo")];
        Dashboard::new(
            base,
            TrackingDocument::default(),
            OverlayStore::open(MemoryStore::new(), KEY),
        )
    }

    #[test]
    fn test_edit_flow_updates_merged_view() {
        let mut dash = dashboard();
        let before = &dash.merged()[0];
        assert_eq!(status_class(before), StatusClass::Yellow);
        assert_eq!(completion_percent(before), 33);

        dash.apply(Intent::SelectRecord { source_url: "https://a.com/1".into() }).unwrap();
        dash.apply(Intent::BeginEdit).unwrap();
        dash.apply(Intent::SetField {
            field: EditableField::Description,
            value: "desc".into(),
        })
        .unwrap();
        let outcome = dash.apply(Intent::CommitEdit).unwrap();
        assert!(matches!(outcome, IntentOutcome::Saved { ref source_url, .. } if source_url == "https://a.com/1"));

        let after = &dash.merged()[0];
        assert!(after.has_edits);
        assert_eq!(status_class(after), StatusClass::Blue);
        assert_eq!(completion_percent(after), 50);
        assert_eq!(dash.header().edited_records, 1);
    }

    #[test]
    fn test_unknown_record_is_not_found() {
        let mut dash = dashboard();
        let result = dash.apply(Intent::SelectRecord { source_url: "https://nope".into() });
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert!(dash.session().selected().is_none());
    }

    #[test]
    fn test_clear_all_requires_confirmation() {
        let mut dash = dashboard();
        dash.select_record("https://a.com/1").unwrap();
        dash.apply(Intent::BeginEdit).unwrap();
        dash.apply(Intent::SetField { field: EditableField::Brand, value: "Y".into() }).unwrap();
        dash.apply(Intent::CommitEdit).unwrap();

        let declined = dash.apply(Intent::ClearAllEdits { confirm: false }).unwrap();
        assert_eq!(declined, IntentOutcome::Declined);
        assert_eq!(dash.store().overlay().len(), 1);

        let cleared = dash.apply(Intent::ClearAllEdits { confirm: true }).unwrap();
        assert_eq!(cleared, IntentOutcome::Cleared { removed: 1 });
        assert!(!dash.merged()[0].has_edits);
        assert_eq!(dash.merged()[0].field(EditableField::Brand), Some("X"));

        let selected = dash.session().selected().unwrap();
        assert!(!selected.has_edits);
        assert_eq!(selected.field(EditableField::Brand), Some("X"));
    }

    #[test]
    fn test_intent_wire_format() {
        let intent: Intent = serde_json::from_str(
            r#"{"action": "set_field", "field": "ingredients_list", "value": "aqua"}"#,
        )
        .unwrap();
        assert_eq!(
            intent,
            Intent::SetField { field: EditableField::IngredientsList, value: "aqua".into() }
        );

        let intent: Intent = serde_json::from_str(r#"{"action": "clear_all_edits"}"#).unwrap();
        assert_eq!(intent, Intent::ClearAllEdits { confirm: false });

        let intent: Intent =
            serde_json::from_str(r#"{"action": "filter_tracking", "status": "all"}"#).unwrap();
        assert_eq!(intent, Intent::FilterTracking { status: StatusFilter::All });

        assert!(serde_json::from_str::<Intent>(r#"{"action": "set_field", "field": "source_url", "value": "x"}"#).is_err());
    }

    #[test]
    fn test_view_state_reflects_filters() {
        let mut dash = dashboard();
        dash.apply(Intent::Search { text: "sham".into() }).unwrap();
        dash.apply(Intent::SwitchView { view: ViewMode::Table }).unwrap();
        dash.apply(Intent::SwitchTab { tab: Tab::Tracking }).unwrap();

        let state = serde_json::to_value(dash.view_state()).unwrap();
        assert_eq!(state["tab"], "tracking");
        assert_eq!(state["view"], "table");
        assert_eq!(state["query"]["search_text"], "sham");
        assert_eq!(state["query"]["brand"], "All");
        assert_eq!(state["tracking_filter"], "all");
        assert!(state["selected"].is_null());
    }
}
