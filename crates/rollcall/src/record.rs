//! Core attendance types.
//!
//! An [`AttendanceRecord`] is one student's submission for one lecture
//! occurrence. The occurrence itself is identified by a [`SessionKey`],
//! which is never stored on its own and is always derived from records.

use serde::{Deserialize, Serialize};

/// A single attendance submission.
///
/// Records are immutable once created. The store does not enforce
/// uniqueness, so the same roll number may appear several times for the
/// same session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Name of the lecture.
    pub lecture_name: String,
    /// Date of the lecture occurrence, as entered by the organizer.
    pub date: String,
    /// Time of the lecture occurrence, as entered by the organizer.
    pub time: String,
    /// Name the student submitted.
    pub student_name: String,
    /// Roll number the student submitted.
    pub roll_no: String,
    /// Photo location relative to the data directory.
    pub photo: String,
}

impl AttendanceRecord {
    /// Create a record for the given session.
    #[must_use]
    pub fn new(
        session: &SessionKey,
        student_name: impl Into<String>,
        roll_no: impl Into<String>,
        photo: impl Into<String>,
    ) -> Self {
        Self {
            lecture_name: session.lecture_name.clone(),
            date: session.date.clone(),
            time: session.time.clone(),
            student_name: student_name.into(),
            roll_no: roll_no.into(),
            photo: photo.into(),
        }
    }

    /// The session this record belongs to.
    #[must_use]
    pub fn session_key(&self) -> SessionKey {
        SessionKey::new(&self.lecture_name, &self.date, &self.time)
    }
}

/// Identifies a lecture occurrence.
///
/// All three parts are opaque strings compared by exact equality; no date
/// parsing or timezone normalization takes place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionKey {
    /// Name of the lecture.
    pub lecture_name: String,
    /// Date of the occurrence.
    pub date: String,
    /// Time of the occurrence.
    pub time: String,
}

impl SessionKey {
    /// Create a session key.
    #[must_use]
    pub fn new(
        lecture_name: impl Into<String>,
        date: impl Into<String>,
        time: impl Into<String>,
    ) -> Self {
        Self {
            lecture_name: lecture_name.into(),
            date: date.into(),
            time: time.into(),
        }
    }

    /// Check whether a record belongs to this session.
    #[must_use]
    pub fn matches(&self, record: &AttendanceRecord) -> bool {
        record.lecture_name == self.lecture_name
            && record.date == self.date
            && record.time == self.time
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} {})", self.lecture_name, self.date, self.time)
    }
}
