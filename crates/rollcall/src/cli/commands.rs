//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use chrono::{DateTime, Local, TimeZone};
use clap::{Args, Subcommand};

use crate::record::{AttendanceRecord, SessionKey};

/// Serve command arguments.
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Address to bind, overriding the configuration
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind, overriding the configuration
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Session command arguments.
#[derive(Debug, Args)]
pub struct SessionCommand {
    /// Lecture name
    pub lecture: String,

    /// Lecture date (defaults to today, YYYY-MM-DD)
    pub date: Option<String>,

    /// Lecture time (defaults to now, HH:MM)
    pub time: Option<String>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

impl SessionCommand {
    /// The session to open, filling a missing date or time from `now`.
    #[must_use]
    pub fn session_key<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> SessionKey
    where
        Tz::Offset: std::fmt::Display,
    {
        SessionKey::new(
            self.lecture.clone(),
            self.date
                .clone()
                .unwrap_or_else(|| now.format("%Y-%m-%d").to_string()),
            self.time
                .clone()
                .unwrap_or_else(|| now.format("%H:%M").to_string()),
        )
    }

    /// The session to open, relative to the local clock.
    #[must_use]
    pub fn session_key_now(&self) -> SessionKey {
        self.session_key(&Local::now())
    }
}

/// Record inspection commands.
#[derive(Debug, Subcommand)]
pub enum RecordsCommand {
    /// List stored records
    List(ListCommand),

    /// Show every session with its record count
    Sessions {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Check that the attendance file parses
    Verify,
}

/// Filters for listing records; every given filter must match exactly.
#[derive(Debug, Default, Args)]
pub struct ListCommand {
    /// Only records of this lecture
    #[arg(short, long)]
    pub lecture: Option<String>,

    /// Only records of this date
    #[arg(short, long)]
    pub date: Option<String>,

    /// Only records of this time
    #[arg(short, long)]
    pub time: Option<String>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

impl ListCommand {
    /// Whether `record` passes every given filter.
    #[must_use]
    pub fn matches(&self, record: &AttendanceRecord) -> bool {
        let check = |filter: Option<&str>, value: &str| {
            !matches!(filter, Some(wanted) if wanted != value)
        };

        check(self.lecture.as_deref(), &record.lecture_name)
            && check(self.date.as_deref(), &record.date)
            && check(self.time.as_deref(), &record.time)
    }
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn session_command(date: Option<&str>, time: Option<&str>) -> SessionCommand {
        SessionCommand {
            lecture: "Math".to_string(),
            date: date.map(str::to_string),
            time: time.map(str::to_string),
            json: false,
        }
    }

    #[test]
    fn test_session_key_defaults_to_now() {
        let now = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 5, 9, 7, 0)
            .unwrap();

        let key = session_command(None, None).session_key(&now);
        assert_eq!(key, SessionKey::new("Math", "2024-03-05", "09:07"));
    }

    #[test]
    fn test_session_key_keeps_given_values() {
        let now = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 5, 9, 7, 0)
            .unwrap();

        let key = session_command(Some("2024-01-01"), Some("10:00")).session_key(&now);
        assert_eq!(key, SessionKey::new("Math", "2024-01-01", "10:00"));
    }

    #[test]
    fn test_list_filters() {
        let record = AttendanceRecord::new(
            &SessionKey::new("Math", "2024-01-01", "10:00"),
            "Ada",
            "1",
            "uploads/student_1.jpg",
        );

        assert!(ListCommand::default().matches(&record));

        let by_lecture = ListCommand {
            lecture: Some("Math".to_string()),
            ..ListCommand::default()
        };
        assert!(by_lecture.matches(&record));

        let other_time = ListCommand {
            lecture: Some("Math".to_string()),
            time: Some("11:00".to_string()),
            ..ListCommand::default()
        };
        assert!(!other_time.matches(&record));
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Show"));
    }
}
