//! Edit session for the record shown in the detail view
//!
//! Two states: Viewing and Editing. The buffer only exists while Editing and
//! is discarded by select, cancel and close. Commit persists through the
//! overlay store before the selected record reflects the change.

use crate::merge::MergedRecord;
use crate::overlay::{FieldOverrides, KeyValueStore, OverlayEntry, OverlayStore};
use crate::records::EditableField;
use crate::{Error, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Session state
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Viewing,
    Editing { buffer: FieldOverrides },
}

impl SessionState {
    pub fn is_editing(&self) -> bool {
        matches!(self, SessionState::Editing { .. })
    }
}

/// Selected record plus the in-progress edit buffer
#[derive(Debug, Clone, Default, Serialize)]
pub struct EditSession {
    selected: Option<MergedRecord>,
    state: SessionState,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<&MergedRecord> {
        self.selected.as_ref()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_editing(&self) -> bool {
        self.state.is_editing()
    }

    /// Show `record` in the detail view, dropping any pending buffer
    pub fn select(&mut self, record: MergedRecord) {
        if self.state.is_editing() {
            debug!("Discarding uncommitted edits on reselect");
        }
        self.selected = Some(record);
        self.state = SessionState::Viewing;
    }

    /// Viewing -> Editing with an empty buffer
    pub fn begin_edit(&mut self) -> Result<()> {
        if self.selected.is_none() {
            return Err(Error::InvalidState("No record selected".to_string()));
        }
        if self.state.is_editing() {
            return Err(Error::InvalidState("Already editing".to_string()));
        }
        self.state = SessionState::Editing {
            buffer: FieldOverrides::new(),
        };
        Ok(())
    }

    /// Write one value into the buffer. The overlay store is not touched.
    pub fn set_field(&mut self, field: EditableField, value: impl Into<String>) -> Result<()> {
        match &mut self.state {
            SessionState::Editing { buffer } => {
                buffer.insert(field, value.into());
                Ok(())
            }
            SessionState::Viewing => Err(Error::InvalidState("Not editing".to_string())),
        }
    }

    /// Editing -> Viewing, discarding the buffer
    pub fn cancel_edit(&mut self) -> Result<()> {
        if !self.state.is_editing() {
            return Err(Error::InvalidState("Not editing".to_string()));
        }
        self.state = SessionState::Viewing;
        Ok(())
    }

    /// Persist the buffer as an overlay upsert, then reflect it locally.
    ///
    /// On failure nothing changes: the session stays in Editing with the
    /// same buffer and the selected record keeps its prior values.
    pub fn commit_edit<S: KeyValueStore>(
        &mut self,
        store: &mut OverlayStore<S>,
    ) -> Result<OverlayEntry> {
        let SessionState::Editing { buffer } = &self.state else {
            return Err(Error::InvalidState("Not editing".to_string()));
        };
        let Some(record) = self.selected.as_mut() else {
            return Err(Error::InvalidState("No record selected".to_string()));
        };

        let entry = match store.upsert(record.source_url(), buffer.clone()) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(source_url = %record.source_url(), error = %e, "Commit failed, edits kept in buffer");
                return Err(e);
            }
        };

        for (field, value) in buffer {
            record.record.set_field(*field, value.clone());
        }
        record.has_edits = true;
        record.edited_at = entry.edited_at;
        info!(source_url = %record.source_url(), fields = buffer.len(), "Edits committed");

        self.state = SessionState::Viewing;
        Ok(entry)
    }

    /// Deselect the record from either state, discarding any buffer
    pub fn close(&mut self) {
        self.selected = None;
        self.state = SessionState::Viewing;
    }

    /// Value shown for `field`: the buffered value while editing, else the record's
    pub fn pending_value(&self, field: EditableField) -> Option<&str> {
        if let SessionState::Editing { buffer } = &self.state {
            if let Some(value) = buffer.get(&field) {
                return Some(value.as_str());
            }
        }
        self.selected.as_ref().and_then(|record| record.field(field))
    }

    /// Replace the selected record after an external overlay change.
    ///
    /// The buffer, if any, is left alone.
    pub fn refresh(&mut self, record: MergedRecord) {
        if let Some(selected) = self.selected.as_mut() {
            *selected = record;
        }
    }
}
