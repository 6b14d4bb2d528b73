//! Edit overlay persistence
//!
//! The overlay is the sparse set of operator corrections, keyed by record
//! identity (`source_url`). It is the only mutable state the dashboard
//! persists. Every mutation is written to the key-value store first and
//! mirrored into memory only once the write succeeded, so the in-memory
//! overlay never claims a save that did not happen.

use crate::records::EditableField;
use crate::{time, Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Field overrides of one overlay entry
pub type FieldOverrides = BTreeMap<EditableField, String>;

// ============================================================================
// Key-value store (persistence provider)
// ============================================================================

/// Scoped key-value byte store holding the persisted overlay.
///
/// `write` must be atomic from the caller's perspective: when it returns an
/// error, a later `read` still yields the previous value.
pub trait KeyValueStore {
    /// Read the bytes stored under `key`, `None` if absent
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Replace the bytes stored under `key`
    fn write(&mut self, key: &str, bytes: &[u8]) -> Result<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).read(key)
    }

    fn write(&mut self, key: &str, bytes: &[u8]) -> Result<()> {
        (**self).write(key, bytes)
    }
}

/// File-backed store: one `<key>.json` document per key under a root folder.
///
/// Writes go to `<key>.json.tmp`, are synced, then renamed over the target.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `root`, creating the folder if needed
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the document holding `key`
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
            && !key.starts_with('.');
        if !valid {
            return Err(Error::InvalidInput(format!("Invalid storage key: {:?}", key)));
        }
        Ok(self.root.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }

    fn write(&mut self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");

        let result = (|| -> std::io::Result<()> {
            let mut file = File::create(&tmp)?;
            file.write_all(bytes)?;
            file.sync_all()?;
            fs::rename(&tmp, &path)
        })();

        if let Err(e) = result {
            // Previous document is untouched; drop the partial temp file
            let _ = fs::remove_file(&tmp);
            return Err(Error::Persistence(format!(
                "Failed to write {}: {}",
                path.display(),
                e
            )));
        }

        debug!(path = %path.display(), bytes = bytes.len(), "Overlay document written");
        Ok(())
    }
}

/// In-process store for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Vec<u8>>,
    /// When true, simulate a persistence failure
    pub fail_on_write: bool,
    /// Count of successful writes
    pub write_count: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with raw bytes under `key`
    pub fn with_bytes(key: &str, bytes: impl Into<Vec<u8>>) -> Self {
        let mut store = Self::default();
        store.entries.insert(key.to_string(), bytes.into());
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, bytes: &[u8]) -> Result<()> {
        if self.fail_on_write {
            return Err(Error::Persistence("simulated persistence failure".to_string()));
        }
        self.write_count += 1;
        self.entries.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}

// ============================================================================
// Overlay model
// ============================================================================

/// Corrections for one record.
///
/// Persisted as `{ "<field>": "<value>", ..., "_editedAt": "<RFC3339>" }`.
/// Keys this build does not interpret are kept in `extra` and written back
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct OverlayEntry {
    pub fields: FieldOverrides,
    /// `None` when the persisted entry carries no usable stamp
    pub edited_at: Option<DateTime<Utc>>,
    pub extra: Map<String, Value>,
}

const EDITED_AT_KEY: &str = "_editedAt";
const EDITED_AT_ALIAS: &str = "editedAt";

impl OverlayEntry {
    pub fn new(fields: FieldOverrides, edited_at: DateTime<Utc>) -> Self {
        Self {
            fields,
            edited_at: Some(edited_at),
            extra: Map::new(),
        }
    }
}

fn parse_stamp(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

impl From<Map<String, Value>> for OverlayEntry {
    fn from(map: Map<String, Value>) -> Self {
        let mut fields = FieldOverrides::new();
        let mut edited_at = None;
        let mut extra = Map::new();

        for (name, value) in map {
            if name == EDITED_AT_KEY || name == EDITED_AT_ALIAS {
                match parse_stamp(&value) {
                    Some(stamp) if edited_at.is_none() || name == EDITED_AT_KEY => {
                        edited_at = Some(stamp);
                    }
                    Some(_) => {}
                    None => {
                        warn!(key = %name, value = %value, "Unreadable overlay stamp kept as is");
                        extra.insert(name, value);
                    }
                }
                continue;
            }
            match (name.parse::<EditableField>(), value) {
                (Ok(field), Value::String(s)) => {
                    fields.insert(field, s);
                }
                (Ok(_), value) => {
                    warn!(field = %name, value = %value, "Non-string overlay value kept as is");
                    extra.insert(name, value);
                }
                (Err(_), value) => {
                    debug!(field = %name, "Unknown overlay field kept as is");
                    extra.insert(name, value);
                }
            }
        }

        Self {
            fields,
            edited_at,
            extra,
        }
    }
}

impl From<OverlayEntry> for Map<String, Value> {
    fn from(entry: OverlayEntry) -> Self {
        let mut map = entry.extra;
        for (field, value) in entry.fields {
            map.insert(field.as_str().to_string(), Value::String(value));
        }
        if let Some(edited_at) = entry.edited_at {
            map.remove(EDITED_AT_ALIAS);
            map.insert(
                EDITED_AT_KEY.to_string(),
                Value::String(edited_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
            );
        }
        map
    }
}

/// Sparse map of corrections keyed by record identity.
///
/// Backed by `BTreeMap`s so the persisted document is deterministic. Values
/// that are not entry objects are held in `retained` and written back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlay {
    entries: BTreeMap<String, OverlayEntry>,
    retained: BTreeMap<String, Value>,
}

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, source_url: &str) -> Option<&OverlayEntry> {
        self.entries.get(source_url)
    }

    pub fn insert(&mut self, source_url: impl Into<String>, entry: OverlayEntry) {
        let source_url = source_url.into();
        self.retained.remove(&source_url);
        self.entries.insert(source_url, entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &OverlayEntry)> {
        self.entries.iter()
    }

    /// Decode a persisted overlay.
    ///
    /// Returns `None` when the bytes are not a JSON mapping. Values that are
    /// not objects are not applied but survive the next save.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let document: Map<String, Value> = serde_json::from_slice(bytes).ok()?;

        let mut overlay = Overlay::new();
        for (source_url, value) in document {
            match value {
                Value::Object(map) => {
                    overlay.entries.insert(source_url, OverlayEntry::from(map));
                }
                other => {
                    warn!(source_url = %source_url, "Overlay entry is not an object, not applied");
                    overlay.retained.insert(source_url, other);
                }
            }
        }
        Some(overlay)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

impl Serialize for Overlay {
    fn serialize<Se: Serializer>(&self, serializer: Se) -> std::result::Result<Se::Ok, Se::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len() + self.retained.len()))?;
        for (source_url, value) in &self.retained {
            map.serialize_entry(source_url, value)?;
        }
        for (source_url, entry) in &self.entries {
            map.serialize_entry(source_url, entry)?;
        }
        map.end()
    }
}

// ============================================================================
// Overlay store
// ============================================================================

/// Persisted overlay plus its in-memory mirror.
///
/// `version` increases on every successful mutation so derived views can
/// tell when they are stale.
pub struct OverlayStore<S> {
    backend: S,
    key: String,
    overlay: Overlay,
    version: u64,
}

impl<S: KeyValueStore> OverlayStore<S> {
    /// Open the store and load the persisted overlay under `key`
    pub fn open(backend: S, key: impl Into<String>) -> Self {
        let mut store = Self {
            backend,
            key: key.into(),
            overlay: Overlay::new(),
            version: 0,
        };
        store.overlay = store.load();
        info!(
            key = %store.key,
            entries = store.overlay.len(),
            "Edit overlay loaded"
        );
        store
    }

    /// Read the persisted overlay.
    ///
    /// Absent, unreadable or corrupt storage yields an empty overlay.
    pub fn load(&self) -> Overlay {
        match self.backend.read(&self.key) {
            Ok(Some(bytes)) => Overlay::from_bytes(&bytes).unwrap_or_else(|| {
                warn!(key = %self.key, "Persisted overlay is not a mapping, starting empty");
                Overlay::new()
            }),
            Ok(None) => Overlay::new(),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Could not read persisted overlay, starting empty");
                Overlay::new()
            }
        }
    }

    /// Persist `overlay` and adopt it as the current overlay
    pub fn save(&mut self, overlay: Overlay) -> Result<()> {
        let bytes = overlay.to_bytes()?;
        self.backend.write(&self.key, &bytes)?;
        self.overlay = overlay;
        self.version += 1;
        Ok(())
    }

    /// Merge `fields` into the entry for `source_url`, stamped with the current time
    pub fn upsert(&mut self, source_url: &str, fields: FieldOverrides) -> Result<OverlayEntry> {
        self.upsert_at(source_url, fields, time::now())
    }

    /// Merge `fields` into the entry for `source_url` (field-by-field overwrite)
    pub fn upsert_at(
        &mut self,
        source_url: &str,
        fields: FieldOverrides,
        now: DateTime<Utc>,
    ) -> Result<OverlayEntry> {
        let mut entry = self
            .overlay
            .get(source_url)
            .cloned()
            .unwrap_or_else(|| OverlayEntry::new(FieldOverrides::new(), now));
        entry.fields.extend(fields);
        entry.edited_at = Some(now);

        let mut next = self.overlay.clone();
        next.insert(source_url, entry.clone());
        self.save(next)?;

        debug!(source_url, fields = entry.fields.len(), "Overlay entry saved");
        Ok(entry)
    }

    /// Remove every entry and persist the empty overlay
    pub fn clear(&mut self) -> Result<usize> {
        let removed = self.overlay.len();
        self.save(Overlay::new())?;
        info!(removed, "Edit overlay cleared");
        Ok(removed)
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut S {
        &mut self.backend
    }
}
