//! Handling of student attendance submissions.
//!
//! A submission is validated, its photo written, a record appended to the
//! store and, once the store has persisted it, broadcast to live viewers.
//! Validation happens before anything touches the disk.
//!
//! Photos are keyed by roll number while records are append-only: a second
//! submission with the same roll number replaces the stored photo but adds
//! a second record.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::broadcast::Broadcaster;
use crate::error::Error;
use crate::photos::PhotoStore;
use crate::record::{AttendanceRecord, SessionKey};
use crate::storage::RecordStore;

/// Message returned for a stored submission.
pub const SUCCESS_MESSAGE: &str = "Attendance submitted successfully";

/// An uploaded photo.
#[derive(Clone, PartialEq, Eq)]
pub struct PhotoUpload {
    /// File name as sent by the client.
    pub file_name: String,
    /// Raw file content.
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for PhotoUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoUpload")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// A complete submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Session the student is checking into.
    pub session: SessionKey,
    /// Student name.
    pub student_name: String,
    /// Student roll number.
    pub roll_no: String,
    /// Uploaded photo, if any.
    pub photo: Option<PhotoUpload>,
}

/// Submission fields collected one at a time, e.g. from a multipart body.
///
/// Field names follow the submission form: `lecture_name`, `date`, `time`,
/// `name` and `roll_no`. Unknown fields are ignored.
#[derive(Debug, Clone, Default)]
pub struct SubmissionForm {
    lecture_name: Option<String>,
    date: Option<String>,
    time: Option<String>,
    name: Option<String>,
    roll_no: Option<String>,
    photo: Option<PhotoUpload>,
}

impl SubmissionForm {
    /// Create an empty form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a text field.
    pub fn set_field(&mut self, name: &str, value: String) {
        let slot = match name {
            "lecture_name" => &mut self.lecture_name,
            "date" => &mut self.date,
            "time" => &mut self.time,
            "name" => &mut self.name,
            "roll_no" => &mut self.roll_no,
            _ => return,
        };
        *slot = Some(value);
    }

    /// Set the uploaded photo.
    pub fn set_photo(&mut self, file_name: String, bytes: Vec<u8>) {
        self.photo = Some(PhotoUpload { file_name, bytes });
    }

    /// The session fields that were sent, for redisplaying the form.
    #[must_use]
    pub fn session_hint(&self) -> SessionKey {
        SessionKey::new(
            self.lecture_name.clone().unwrap_or_default(),
            self.date.clone().unwrap_or_default(),
            self.time.clone().unwrap_or_default(),
        )
    }

    /// Turn the collected fields into a submission.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionError::MissingField`] for the first required
    /// text field that was not sent.
    pub fn into_submission(self) -> Result<Submission, SubmissionError> {
        fn required(value: Option<String>, field: &'static str) -> Result<String, SubmissionError> {
            value.ok_or(SubmissionError::MissingField { field })
        }

        Ok(Submission {
            session: SessionKey::new(
                required(self.lecture_name, "lecture_name")?,
                required(self.date, "date")?,
                required(self.time, "time")?,
            ),
            student_name: required(self.name, "name")?,
            roll_no: required(self.roll_no, "roll_no")?,
            photo: self.photo,
        })
    }
}

/// Why a submission was not recorded.
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// A required form field was not sent.
    #[error("Missing required field: {field}")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// No photo was uploaded.
    #[error("No photo uploaded")]
    MissingPhoto,

    /// The request body could not be decoded as a submission form.
    #[error("Malformed upload: {0}")]
    MalformedUpload(String),

    /// The photo's extension is not accepted.
    #[error("Invalid file type. Only {allowed} allowed")]
    InvalidFileType {
        /// Accepted extensions, for the message.
        allowed: String,
    },

    /// The photo could not be written.
    #[error("Failed to save photo")]
    PhotoStorage(#[source] Error),

    /// The record could not be persisted.
    #[error("Failed to save attendance data")]
    Persistence(#[source] Error),

    /// Unexpected failure while handling the submission.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SubmissionError {
    /// Machine-readable failure reason.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingField { .. } => "missing_field",
            Self::MissingPhoto => "missing_photo",
            Self::MalformedUpload(_) => "malformed_upload",
            Self::InvalidFileType { .. } => "invalid_file_type",
            Self::PhotoStorage(_) => "photo_storage_failed",
            Self::Persistence(_) => "storage_failed",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Whether the client can fix the problem by resubmitting.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingField { .. }
                | Self::MissingPhoto
                | Self::MalformedUpload(_)
                | Self::InvalidFileType { .. }
        )
    }
}

/// Validates, stores and broadcasts submissions.
#[derive(Debug, Clone)]
pub struct SubmissionHandler {
    store: Arc<dyn RecordStore>,
    photos: PhotoStore,
    broadcaster: Broadcaster,
}

impl SubmissionHandler {
    /// Create a handler.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, photos: PhotoStore, broadcaster: Broadcaster) -> Self {
        Self {
            store,
            photos,
            broadcaster,
        }
    }

    /// The record store submissions are appended to.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Record a submission.
    ///
    /// On success the appended record has been persisted and published
    /// exactly once.
    ///
    /// # Errors
    ///
    /// Returns a client error when the photo is missing or has a rejected
    /// extension (nothing is written in that case), and a server error when
    /// the photo or the record could not be stored (nothing is published).
    pub fn submit(&self, submission: Submission) -> Result<AttendanceRecord, SubmissionError> {
        let Submission {
            session,
            student_name,
            roll_no,
            photo,
        } = submission;

        let photo = photo
            .filter(|photo| !photo.file_name.is_empty())
            .ok_or(SubmissionError::MissingPhoto)?;

        if !self.photos.is_allowed(&photo.file_name) {
            warn!(
                "Rejected photo {:?} from roll number {roll_no}",
                photo.file_name
            );
            return Err(SubmissionError::InvalidFileType {
                allowed: self.allowed_label(),
            });
        }

        let photo_path = self
            .photos
            .save(&roll_no, &photo.bytes)
            .map_err(SubmissionError::PhotoStorage)?;

        let record = AttendanceRecord::new(&session, student_name, roll_no, photo_path);
        self.store
            .append(record.clone())
            .map_err(SubmissionError::Persistence)?;

        info!("Recorded attendance for {} in {session}", record.roll_no);
        self.broadcaster.publish(&record);
        Ok(record)
    }

    fn allowed_label(&self) -> String {
        self.photos
            .allowed_extensions()
            .iter()
            .map(|ext| ext.to_ascii_uppercase())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
