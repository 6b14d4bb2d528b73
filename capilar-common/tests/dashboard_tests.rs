//! End-to-end dashboard scenarios over parsed harvest documents

use capilar_common::completeness::{completion_percent, status_class, StatusClass};
use capilar_common::dashboard::{Tab, ViewMode};
use capilar_common::query::BrandFilter;
use capilar_common::records::{parse_products, parse_tracking};
use capilar_common::tracking::StatusFilter;
use capilar_common::{
    Dashboard, EditableField, Error, Intent, IntentOutcome, MemoryStore, OverlayStore,
};
use chrono::NaiveDate;
use serde_json::Value;

const KEY: &str = "scraper_product_edits";

const PRODUCTS: &str = r#"[
    {"source_url": "https://a.com/1", "brand": "X", "product_name": "Shampoo"},
    {"source_url": "https://a.com/2", "brand": "X", "product_name": "Condicionador",
     "description": "Hidrata", "ingredients_list": "aqua, cetearyl alcohol", "claim_vegano": true},
    {"source_url": "https://b.com/p/3", "brand": "Y", "product_name": "Máscara",
     "description": "Reconstrução"},
    {"source_url": "not a url", "brand": "Z", "product_name": "Óleo"}
]"#;

const TRACKING: &str = r#"{
    "total_brands": 4,
    "brands": [
        {"name": "X", "url": "https://a.com", "status": "scraped", "products": 2, "has_ingredients": true},
        {"name": "Y", "url": "https://b.com", "status": "pending", "products": 1},
        {"name": "Z", "url": "https://z.com", "status": "js_required", "products": 0},
        {"name": "W", "url": "https://w.com", "status": "scraped", "products": 5}
    ]
}"#;

fn dashboard_with(store: MemoryStore) -> Dashboard<MemoryStore> {
    Dashboard::new(
        parse_products(PRODUCTS.as_bytes()).unwrap(),
        parse_tracking(TRACKING.as_bytes()).unwrap(),
        OverlayStore::open(store, KEY),
    )
}

fn dashboard() -> Dashboard<MemoryStore> {
    dashboard_with(MemoryStore::new())
}

fn edit(dash: &mut Dashboard<MemoryStore>, url: &str, field: EditableField, value: &str) {
    dash.apply(Intent::SelectRecord { source_url: url.into() }).unwrap();
    dash.apply(Intent::BeginEdit).unwrap();
    dash.apply(Intent::SetField { field, value: value.into() }).unwrap();
    dash.apply(Intent::CommitEdit).unwrap();
}

#[test]
fn test_initial_header_figures() {
    let dash = dashboard();
    let header = dash.header();
    assert_eq!(header.total_products, 4);
    assert_eq!(header.total_brands, 4);
    assert_eq!(header.scraped_sources, 2);
    assert_eq!(header.edited_records, 0);
}

#[test]
fn test_persisted_overlay_applies_on_open() {
    let doc = r#"{"https://a.com/1": {"description": "desc", "_editedAt": "2024-05-01T10:00:00.000Z"}}"#;
    let dash = dashboard_with(MemoryStore::with_bytes(KEY, doc));

    let record = &dash.merged()[0];
    assert!(record.has_edits);
    assert_eq!(status_class(record), StatusClass::Blue);
    assert_eq!(completion_percent(record), 50);
    assert_eq!(dash.header().edited_records, 1);
}

#[test]
fn test_corrupt_overlay_starts_clean() {
    let dash = dashboard_with(MemoryStore::with_bytes(KEY, "\u{0}garbage"));
    assert!(dash.merged().iter().all(|r| !r.has_edits));
}

#[test]
fn test_filters_combine() {
    let mut dash = dashboard();
    assert_eq!(dash.filtered().len(), 4);
    assert_eq!(dash.incomplete_count(), 3);

    dash.apply(Intent::FilterBrand { brand: BrandFilter::from("X") }).unwrap();
    assert_eq!(dash.filtered().len(), 2);

    dash.apply(Intent::ToggleIncompleteOnly { enabled: true }).unwrap();
    let urls: Vec<&str> = dash.filtered().iter().map(|r| r.source_url()).collect();
    assert_eq!(urls, vec!["https://a.com/1"]);

    dash.apply(Intent::FilterBrand { brand: BrandFilter::All }).unwrap();
    dash.apply(Intent::Search { text: "B.COM".into() }).unwrap();
    let urls: Vec<&str> = dash.filtered().iter().map(|r| r.source_url()).collect();
    assert_eq!(urls, vec!["https://b.com/p/3"]);
}

#[test]
fn test_commit_is_reflected_in_every_view() {
    let mut dash = dashboard();
    edit(&mut dash, "https://a.com/1", EditableField::Description, "Limpeza");
    edit(&mut dash, "https://a.com/1", EditableField::IngredientsList, "aqua");

    let record = &dash.merged()[0];
    assert_eq!(record.field(EditableField::Description), Some("Limpeza"));
    assert_eq!(record.field(EditableField::IngredientsList), Some("aqua"));
    assert_eq!(dash.incomplete_count(), 2);

    let domains = dash.domains();
    assert_eq!(domains["a.com"].count, 2);
    assert_eq!(domains["a.com"].incomplete_count, 0);

    let entry = dash.store().overlay().get("https://a.com/1").unwrap();
    assert_eq!(entry.fields.len(), 2);
}

#[test]
fn test_commit_failure_leaves_record_unchanged() {
    let mut dash = dashboard();
    dash.apply(Intent::SelectRecord { source_url: "https://a.com/1".into() }).unwrap();
    dash.apply(Intent::BeginEdit).unwrap();
    dash.apply(Intent::SetField {
        field: EditableField::Description,
        value: "never saved".into(),
    })
    .unwrap();

    dash.store_mut().backend_mut().fail_on_write = true;
    let result = dash.apply(Intent::CommitEdit);

    assert!(matches!(result, Err(Error::Persistence(_))));
    assert!(dash.session().is_editing());
    let selected = dash.session().selected().unwrap();
    assert!(!selected.has_edits);
    assert!(selected.field(EditableField::Description).is_none());
    assert!(!dash.merged()[0].has_edits);
    assert!(dash.store().overlay().is_empty());
}

#[test]
fn test_clear_all_restores_base_view() {
    let mut dash = dashboard();
    let pristine = dash.merged().to_vec();

    edit(&mut dash, "https://a.com/1", EditableField::Brand, "Renamed");
    edit(&mut dash, "https://b.com/p/3", EditableField::IngredientsList, "aqua");
    assert_ne!(dash.merged(), pristine.as_slice());

    let outcome = dash.apply(Intent::ClearAllEdits { confirm: true }).unwrap();
    assert_eq!(outcome, IntentOutcome::Cleared { removed: 2 });
    assert_eq!(dash.merged(), pristine.as_slice());
    assert_eq!(dash.brands(), vec!["All", "X", "Y", "Z"]);
}

#[test]
fn test_invalid_url_only_missing_from_domains() {
    let dash = dashboard();
    let domains = dash.domains();
    assert_eq!(domains.len(), 2);
    assert!(domains
        .values()
        .all(|stat| stat.records.iter().all(|r| r.source_url() != "not a url")));
    assert!(dash.merged().iter().any(|r| r.source_url() == "not a url"));
}

#[test]
fn test_tracking_tab() {
    let mut dash = dashboard();
    dash.apply(Intent::SwitchTab { tab: Tab::Tracking }).unwrap();
    assert_eq!(dash.tab(), Tab::Tracking);
    assert_eq!(dash.filtered_tracking().len(), 4);

    dash.apply(Intent::FilterTracking { status: StatusFilter::from("scraped") }).unwrap();
    let names: Vec<&str> = dash.filtered_tracking().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["X", "W"]);

    let summary = dash.tracking_summary();
    assert_eq!(summary.scraped, 2);
    assert_eq!(summary.pending, 1);
    assert_eq!(summary.js_required, 1);
    assert_eq!(summary.total_products, 8);

    // Product pipeline is untouched by the tracking filter
    assert_eq!(dash.filtered().len(), 4);
}

#[test]
fn test_export_snapshot_of_merged_view() {
    let mut dash = dashboard();
    dash.apply(Intent::SwitchView { view: ViewMode::Table }).unwrap();
    edit(&mut dash, "https://a.com/2", EditableField::ProductType, "Condicionador");

    let date = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
    let snapshot = dash.export_snapshot_on(date).unwrap();
    assert_eq!(snapshot.suggested_name, "produtos_capilares_editados_2025-01-31.json");

    let doc: Value = serde_json::from_slice(&snapshot.bytes).unwrap();
    let rows = doc.as_array().unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[1]["product_type"], "Condicionador");
    assert_eq!(rows[1]["_hasEdits"], true);
    assert_eq!(rows[1]["claim_vegano"], true);
    assert!(rows[0].get("_hasEdits").is_none());
}

#[test]
fn test_close_discards_uncommitted_edits() {
    let mut dash = dashboard();
    dash.apply(Intent::SelectRecord { source_url: "https://a.com/1".into() }).unwrap();
    dash.apply(Intent::BeginEdit).unwrap();
    dash.apply(Intent::SetField { field: EditableField::Brand, value: "lost".into() }).unwrap();
    dash.apply(Intent::CloseDetail).unwrap();

    assert!(dash.session().selected().is_none());
    assert_eq!(dash.store().version(), 0);
    assert!(matches!(dash.apply(Intent::BeginEdit), Err(Error::InvalidState(_))));
}
