//! # Capilar Common Library
//!
//! Core of the catalog dashboard, shared by the service crate:
//! - Harvested record and tracking-entry models
//! - Edit overlay persistence and merge
//! - Completeness scoring and status classification
//! - Product queries, per-domain and tracking aggregation
//! - Edit session state machine and snapshot export
//! - Configuration loading and timestamp utilities

pub mod completeness;
pub mod config;
pub mod dashboard;
pub mod domains;
pub mod error;
pub mod export;
pub mod merge;
pub mod overlay;
pub mod query;
pub mod records;
pub mod session;
pub mod time;
pub mod tracking;

pub use dashboard::{Dashboard, Intent, IntentOutcome};
pub use error::{Error, Result};
pub use merge::MergedRecord;
pub use overlay::{FileStore, KeyValueStore, MemoryStore, Overlay, OverlayEntry, OverlayStore};
pub use records::{BaseRecord, EditableField, TrackingEntry, TrackingStatus};
