//! Read-side views over the attendance records.
//!
//! Everything here is a linear scan over an already loaded slice; no
//! indexing and no pagination.

use std::collections::HashMap;

use serde::Serialize;

use crate::record::{AttendanceRecord, SessionKey};

/// All records of one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionGroup {
    /// The session.
    #[serde(flatten)]
    pub key: SessionKey,
    /// Records for the session, in insertion order.
    pub records: Vec<AttendanceRecord>,
}

/// Record count for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    /// The session.
    #[serde(flatten)]
    pub key: SessionKey,
    /// Number of records, duplicates included.
    pub count: usize,
}

/// Records belonging to `key`, in their original relative order.
#[must_use]
pub fn filter_by_session(records: &[AttendanceRecord], key: &SessionKey) -> Vec<AttendanceRecord> {
    records
        .iter()
        .filter(|record| key.matches(record))
        .cloned()
        .collect()
}

/// Group records by session.
///
/// Groups are ordered by the first appearance of their session in
/// `records`.
#[must_use]
pub fn group_by_session(records: &[AttendanceRecord]) -> Vec<SessionGroup> {
    let mut index: HashMap<SessionKey, usize> = HashMap::new();
    let mut groups: Vec<SessionGroup> = Vec::new();

    for record in records {
        let key = record.session_key();
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push(SessionGroup {
                key,
                records: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].records.push(record.clone());
    }

    groups
}

/// Per-session record counts, in first-seen order.
#[must_use]
pub fn sessions(records: &[AttendanceRecord]) -> Vec<SessionSummary> {
    group_by_session(records)
        .into_iter()
        .map(|group| SessionSummary {
            count: group.records.len(),
            key: group.key,
        })
        .collect()
}
