//! Storage layer for rollcall.
//!
//! Attendance records live in a single JSON file holding an array of
//! [`AttendanceRecord`] objects. The file is re-read on every load and
//! replaced wholesale on every save, so the file is the only source of
//! truth and several processes can share it.
//!
//! Every save writes its own uniquely named temporary file in the same
//! directory and renames it over the attendance file, so readers only ever
//! see a complete array, even while several saves run at once.
//!
//! [`RecordStore::append`] is a plain load + push + save. Two appends that
//! interleave can lose one record (last save wins); there is no locking.

pub mod memory;

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::record::AttendanceRecord;

pub use memory::MemoryStore;

/// Suffix of in-flight save files.
const TEMP_SUFFIX: &str = ".tmp";

/// Persistence capability for attendance records.
///
/// Implementations must keep insertion order and must never expose a
/// partially written sequence.
pub trait RecordStore: Send + Sync + std::fmt::Debug {
    /// Load all records.
    ///
    /// Never fails: a missing backing store reads as empty, and unreadable
    /// or malformed data is logged and also reads as empty.
    fn load(&self) -> Vec<AttendanceRecord>;

    /// Replace the stored sequence with `records`.
    ///
    /// # Errors
    ///
    /// Returns an error if the records could not be durably written. The
    /// previously stored sequence is left untouched in that case.
    fn save(&self, records: &[AttendanceRecord]) -> Result<()>;

    /// Append one record and persist the whole sequence.
    ///
    /// # Errors
    ///
    /// Returns an error if the save fails.
    fn append(&self, record: AttendanceRecord) -> Result<()> {
        let mut records = self.load();
        records.push(record);
        self.save(&records)
    }
}

/// Summary of the attendance file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    /// Total number of records.
    pub total_records: usize,
    /// Number of distinct sessions.
    pub total_sessions: usize,
    /// Size of the attendance file in bytes (0 when absent).
    pub file_size_bytes: u64,
}

/// Record store backed by a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    /// Path to the attendance file.
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store for the given file. Nothing is touched on disk until
    /// the first load or save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the path to the attendance file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all records, reporting read and parse failures.
    ///
    /// A missing file still reads as an empty sequence.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not contain a
    /// JSON array of records.
    pub fn load_strict(&self) -> Result<Vec<AttendanceRecord>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(source) if source.kind() == ErrorKind::NotFound => {
                debug!("No attendance file at {}", self.path.display());
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(Error::StoreRead {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_slice(&bytes).map_err(|source| Error::StoreCorrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Get statistics about the attendance file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn stats(&self) -> Result<StoreStats> {
        let records = self.load_strict()?;
        let total_sessions = crate::query::group_by_session(&records).len();
        let file_size_bytes = fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0);

        Ok(StoreStats {
            total_records: records.len(),
            total_sessions,
            file_size_bytes,
        })
    }

    /// Directory holding the attendance file and its in-flight saves.
    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        let parent = self.parent_dir();
        fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
            path: parent.to_path_buf(),
            source,
        })
    }

    /// Write `records` to a fresh temporary file next to the attendance file
    /// and rename it into place.
    ///
    /// The temporary file is removed again if any step fails.
    fn replace_with_temp(&self, records: &[AttendanceRecord]) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(records)?;
        let write_error = |source: std::io::Error| Error::StoreWrite {
            path: self.path.clone(),
            source,
        };

        let prefix = match self.path.file_name() {
            Some(name) => format!(".{}.", name.to_string_lossy()),
            None => ".attendance.".to_string(),
        };
        let mut temp = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(self.parent_dir())
            .map_err(write_error)?;

        temp.write_all(&bytes).map_err(write_error)?;
        temp.as_file().sync_all().map_err(write_error)?;
        temp.persist(&self.path)
            .map_err(|err| write_error(err.error))?;
        Ok(())
    }
}

impl RecordStore for JsonFileStore {
    fn load(&self) -> Vec<AttendanceRecord> {
        match self.load_strict() {
            Ok(records) => records,
            Err(err) => {
                error!("Error loading attendance records: {err}");
                Vec::new()
            }
        }
    }

    fn save(&self, records: &[AttendanceRecord]) -> Result<()> {
        self.ensure_parent_dir()?;

        if let Err(err) = self.replace_with_temp(records) {
            error!("Error saving attendance records: {err}");
            return Err(err);
        }

        debug!(
            "Saved {} attendance records to {}",
            records.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::SessionKey;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;

    fn create_test_record(roll_no: &str) -> AttendanceRecord {
        AttendanceRecord::new(
            &SessionKey::new("Math", "2024-01-01", "10:00"),
            format!("Student {roll_no}"),
            roll_no,
            format!("uploads/student_{roll_no}.jpg"),
        )
    }

    fn create_test_store() -> (TempDir, JsonFileStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("data").join("attendance.json"));
        (dir, store)
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let (_dir, store) = create_test_store();
        assert!(!store.path().exists());
        assert!(store.load().is_empty());
        assert!(store.load_strict().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let (_dir, store) = create_test_store();
        let records = vec![
            create_test_record("1"),
            create_test_record("2"),
            create_test_record("1"),
        ];

        store.save(&records).unwrap();
        assert_eq!(store.load(), records);
    }

    #[test]
    fn test_save_empty_roundtrip() {
        let (_dir, store) = create_test_store();
        store.save(&[]).unwrap();

        assert!(store.path().exists());
        assert!(store.load().is_empty());
        assert_eq!(fs::read_to_string(store.path()).unwrap().trim(), "[]");
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let (dir, store) = create_test_store();
        assert!(!dir.path().join("data").exists());

        store.save(&[create_test_record("7")]).unwrap();
        assert!(dir.path().join("data").is_dir());

        // Second save with the directory already present
        store.save(&[create_test_record("8")]).unwrap();
        assert_eq!(store.load(), vec![create_test_record("8")]);
    }

    fn dir_entries(store: &JsonFileStore) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(store.path().parent().unwrap())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let (_dir, store) = create_test_store();
        store.save(&[create_test_record("1")]).unwrap();
        store.save(&[create_test_record("2")]).unwrap();

        assert_eq!(dir_entries(&store), vec!["attendance.json"]);
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let (_dir, store) = create_test_store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "[{\"lecture_name\": \"Math\",").unwrap();

        assert!(store.load().is_empty());
        assert!(matches!(
            store.load_strict(),
            Err(Error::StoreCorrupt { .. })
        ));
    }

    #[test]
    fn test_wrong_shape_loads_empty() {
        let (_dir, store) = create_test_store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), r#"{"records": []}"#).unwrap();

        assert!(store.load().is_empty());
    }

    #[test]
    fn test_empty_file_loads_empty() {
        let (_dir, store) = create_test_store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "").unwrap();

        assert!(store.load().is_empty());
    }

    #[test]
    fn test_failed_save_removes_temp_file() {
        let (_dir, store) = create_test_store();

        // A non-empty directory on the target path makes the rename fail
        fs::create_dir_all(store.path().join("blocker")).unwrap();

        let result = store.save(&[create_test_record("1")]);
        assert!(result.is_err());
        assert!(result.unwrap_err().is_storage_error());

        assert_eq!(dir_entries(&store), vec!["attendance.json"]);
        assert!(store.path().join("blocker").is_dir());
    }

    #[test]
    fn test_stale_temp_file_does_not_affect_load() {
        let (_dir, store) = create_test_store();
        let original = vec![create_test_record("1"), create_test_record("2")];
        store.save(&original).unwrap();

        // Leftover of a crash mid-save
        let stale = store.path().with_file_name(".attendance.json.crashed.tmp");
        fs::write(&stale, "[{\"lecture_na").unwrap();

        assert_eq!(store.load(), original);

        let updated = vec![create_test_record("3")];
        store.save(&updated).unwrap();
        assert_eq!(store.load(), updated);
    }

    #[test]
    fn test_concurrent_saves_never_expose_partial_file() {
        let (_dir, store) = create_test_store();
        store.save(&[]).unwrap();

        let batch = |prefix: &str| -> Vec<AttendanceRecord> {
            (0..500)
                .map(|i| create_test_record(&format!("{prefix}{i}")))
                .collect()
        };
        let first = batch("a");
        let second = batch("b");

        let store = &store;
        let done = &AtomicBool::new(false);
        let (failed_saves, unreadable) = std::thread::scope(|scope| {
            let reader = scope.spawn(move || {
                let mut unreadable = 0;
                while !done.load(Ordering::SeqCst) {
                    if store.load_strict().is_err() {
                        unreadable += 1;
                    }
                }
                unreadable
            });

            let writers: Vec<_> = [&first, &second]
                .into_iter()
                .map(|records| {
                    scope.spawn(move || (0..100).filter(|_| store.save(records).is_err()).count())
                })
                .collect();

            let failed_saves: usize = writers.into_iter().map(|w| w.join().unwrap()).sum();
            done.store(true, Ordering::SeqCst);
            (failed_saves, reader.join().unwrap())
        });

        assert_eq!(failed_saves, 0);
        assert_eq!(unreadable, 0);

        let last = store.load();
        assert!(last == first || last == second);
        assert_eq!(dir_entries(store), vec!["attendance.json"]);
    }

    #[test]
    fn test_append_preserves_order_and_duplicates() {
        let (_dir, store) = create_test_store();

        store.append(create_test_record("1")).unwrap();
        store.append(create_test_record("2")).unwrap();
        store.append(create_test_record("1")).unwrap();

        let roll_nos: Vec<_> = store.load().into_iter().map(|r| r.roll_no).collect();
        assert_eq!(roll_nos, vec!["1", "2", "1"]);
    }

    #[test]
    fn test_append_recovers_from_corrupt_file() {
        let (_dir, store) = create_test_store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "not json").unwrap();

        store.append(create_test_record("9")).unwrap();
        assert_eq!(store.load(), vec![create_test_record("9")]);
    }

    #[test]
    fn test_unicode_roundtrip() {
        let (_dir, store) = create_test_store();
        let mut record = create_test_record("5");
        record.student_name = "Zoë Ångström 李".to_string();

        store.save(std::slice::from_ref(&record)).unwrap();
        assert_eq!(store.load(), vec![record]);

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("Zoë Ångström 李"));
    }

    #[test]
    fn test_stats() {
        let (_dir, store) = create_test_store();
        let empty = store.stats().unwrap();
        assert_eq!(empty.total_records, 0);
        assert_eq!(empty.file_size_bytes, 0);

        let mut other = create_test_record("3");
        other.time = "11:00".to_string();
        store
            .save(&[create_test_record("1"), create_test_record("2"), other])
            .unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.total_records, 3);
        assert_eq!(stats.total_sessions, 2);
        assert!(stats.file_size_bytes > 0);
    }

    #[test]
    fn test_stats_corrupt_file_errors() {
        let (_dir, store) = create_test_store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "{").unwrap();

        assert!(store.stats().is_err());
    }
}
