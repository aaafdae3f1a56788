//! JSON file ledger implementation

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};
use workpulse_api::DailySnapshot;
use workpulse_util::ElapsedTime;

use crate::{DailyWorkRecord, Ledger, StoreError, StoreResult};

type Records = BTreeMap<NaiveDate, DailyWorkRecord>;

/// Ledger persisted as a single JSON object keyed by `YYYY-MM-DD`
pub struct JsonLedger {
    path: Option<PathBuf>,
    records: Mutex<Records>,
    healthy: AtomicBool,
}

impl JsonLedger {
    /// Open the ledger at `path`.
    ///
    /// A missing or unreadable file starts an empty ledger; the file is
    /// (re)written on the first recorded session.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let records = load_records(&path);
        info!(
            path = %path.display(),
            days = records.len(),
            "Ledger loaded"
        );

        Self {
            path: Some(path),
            records: Mutex::new(records),
            healthy: AtomicBool::new(true),
        }
    }

    /// Create an in-memory ledger (for testing)
    pub fn in_memory() -> Self {
        Self {
            path: None,
            records: Mutex::new(BTreeMap::new()),
            healthy: AtomicBool::new(true),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Records> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn persist(&self, records: &Records) -> StoreResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let bytes = serde_json::to_vec_pretty(records)?;
        let result = write_atomic(path, &bytes).map_err(|source| StoreError::Persist {
            path: path.clone(),
            source,
        });
        self.healthy.store(result.is_ok(), Ordering::Relaxed);
        result
    }
}

impl Ledger for JsonLedger {
    fn record_session(&self, day: NaiveDate, duration: ElapsedTime) -> StoreResult<DailySnapshot> {
        let mut records = self.lock();
        let record = records.entry(day).or_default();
        record.count += 1;
        record.total_duration += duration.as_secs();
        let snapshot = record.snapshot(day);

        debug!(
            date = %day,
            count = snapshot.today_count,
            total = %snapshot.today_duration,
            "Session recorded"
        );

        self.persist(&records)?;
        Ok(snapshot)
    }

    fn today_stats(&self, day: NaiveDate) -> DailySnapshot {
        self.lock()
            .get(&day)
            .map(|r| r.snapshot(day))
            .unwrap_or_else(|| DailySnapshot::empty(day))
    }

    fn get_record(&self, day: NaiveDate) -> Option<DailyWorkRecord> {
        self.lock().get(&day).copied()
    }

    fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }
}

fn load_records(path: &Path) -> Records {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Records::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read ledger, starting empty");
            return Records::new();
        }
    };

    match serde_json::from_str(&content) {
        Ok(records) => records,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ledger is corrupt, starting empty");
            Records::new()
        }
    }
}

/// Write to a sibling temp file, then rename over the target
fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp_path, path)
}
