//! Storage of uploaded student photos.
//!
//! Uploads are accepted on file name extension alone; the bytes are not
//! inspected. The stored name depends only on the roll number, so a later
//! upload for the same roll number replaces the earlier photo.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};

/// Extension every stored photo gets, whatever was uploaded.
const STORED_EXTENSION: &str = "jpg";

/// Characters allowed in a stored file name.
fn unsafe_chars() -> &'static Regex {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    UNSAFE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("static pattern compiles"))
}

/// Reduce `name` to a single safe path component.
///
/// Path separators and whitespace runs become `_`, every other character
/// outside `[A-Za-z0-9_.-]` is dropped, and leading or trailing `.`/`_`
/// are trimmed.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let spaced = name.replace(['/', '\\'], " ");
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = unsafe_chars().replace_all(&joined, "");
    cleaned.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Stored file name for a roll number.
#[must_use]
pub fn photo_file_name(roll_no: &str) -> String {
    sanitize_file_name(&format!("student_{roll_no}.{STORED_EXTENSION}"))
}

/// Writes photos into the uploads directory.
#[derive(Debug, Clone)]
pub struct PhotoStore {
    /// Directory holding stored photos.
    dir: PathBuf,
    /// Prefix recorded in attendance records, relative to the data dir.
    public_prefix: String,
    /// Accepted upload extensions, lowercase.
    allowed_extensions: Vec<String>,
}

impl PhotoStore {
    /// Create a photo store.
    ///
    /// `public_prefix` is the directory name recorded in each record's
    /// `photo` field (e.g. `uploads`).
    #[must_use]
    pub fn new(
        dir: impl Into<PathBuf>,
        public_prefix: impl Into<String>,
        allowed_extensions: Vec<String>,
    ) -> Self {
        Self {
            dir: dir.into(),
            public_prefix: public_prefix.into(),
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|ext| ext.to_ascii_lowercase())
                .collect(),
        }
    }

    /// Directory holding stored photos.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Accepted upload extensions.
    #[must_use]
    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    /// Check an uploaded file name against the allowed extensions.
    #[must_use]
    pub fn is_allowed(&self, file_name: &str) -> bool {
        Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                let ext = ext.to_ascii_lowercase();
                self.allowed_extensions.iter().any(|allowed| *allowed == ext)
            })
    }

    /// Write the photo for `roll_no`, replacing any earlier one.
    ///
    /// Returns the path to record, relative to the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the uploads directory cannot be created or the
    /// file cannot be written.
    pub fn save(&self, roll_no: &str, bytes: &[u8]) -> Result<String> {
        fs::create_dir_all(&self.dir).map_err(|source| Error::DirectoryCreate {
            path: self.dir.clone(),
            source,
        })?;

        let file_name = photo_file_name(roll_no);
        let path = self.dir.join(&file_name);
        fs::write(&path, bytes).map_err(|source| Error::PhotoWrite {
            path: path.clone(),
            source,
        })?;

        debug!("Stored {} byte photo at {}", bytes.len(), path.display());
        Ok(format!("{}/{file_name}", self.public_prefix))
    }
}
