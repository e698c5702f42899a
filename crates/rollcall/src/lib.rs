//! `rollcall` - Lecture attendance collector with live updates
//!
//! Students submit their attendance for a lecture session through a form
//! linked from a QR code. Each submission stores a photo and appends a record
//! to a JSON file, and connected viewers are notified as it happens.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod broadcast;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod photos;
pub mod qr;
pub mod query;
pub mod record;
pub mod server;
pub mod storage;
pub mod submission;

pub use broadcast::{Broadcaster, LiveEvent, Subscription};
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use photos::PhotoStore;
pub use query::{filter_by_session, group_by_session, SessionGroup, SessionSummary};
pub use record::{AttendanceRecord, SessionKey};
pub use storage::{JsonFileStore, MemoryStore, RecordStore, StoreStats};
pub use submission::{Submission, SubmissionError, SubmissionHandler};
