//! Export of the merged view as a portable snapshot

use crate::merge::MergedRecord;
use crate::time::iso_date;
use crate::Result;
use chrono::NaiveDate;

/// Filename prefix of exported snapshots
pub const EXPORT_PREFIX: &str = "produtos_capilares_editados";

/// Serialized merged view plus the name it should be saved under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub bytes: Vec<u8>,
    pub suggested_name: String,
}

/// Filename for a snapshot taken on `date`
pub fn suggested_name(date: NaiveDate) -> String {
    format!("{}_{}.json", EXPORT_PREFIX, iso_date(date))
}

/// Serialize the full merged view as pretty-printed JSON.
///
/// Edited records carry `_hasEdits` and `_editedAt`.
pub fn snapshot(records: &[MergedRecord], date: NaiveDate) -> Result<Snapshot> {
    let bytes = serde_json::to_vec_pretty(records)?;
    Ok(Snapshot {
        bytes,
        suggested_name: suggested_name(date),
    })
}
