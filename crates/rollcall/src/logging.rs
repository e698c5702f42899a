//! Log output for the `rollcall` binary.
//!
//! Everything goes to stderr through one `fmt` layer. Application events
//! log under the `rollcall` target; per-request spans from the HTTP
//! `TraceLayer` log under `tower_http` and are only switched on with `-v`.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// How much the binary logs, picked with `-q` and `-v`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only (`-q`).
    Quiet,
    /// Startup, sessions, submissions and viewer connects.
    #[default]
    Normal,
    /// Adds store saves and one line per HTTP request (`-v`).
    Verbose,
    /// Everything, including broadcast internals (`-vv`).
    Trace,
}

impl Verbosity {
    /// Map the CLI flags; `quiet` wins over any number of `-v`.
    #[must_use]
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, 0) => Self::Normal,
            (false, 1) => Self::Verbose,
            (false, _) => Self::Trace,
        }
    }

    /// Maximum level logged under the `rollcall` target.
    #[must_use]
    pub fn to_level_filter(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// Filter directives used when `RUST_LOG` is unset.
    #[must_use]
    pub fn default_directives(&self) -> String {
        let level = self.to_level_filter();
        match self {
            Self::Quiet | Self::Normal => format!("rollcall={level}"),
            Self::Verbose | Self::Trace => format!("rollcall={level},tower_http={level}"),
        }
    }

    fn env_filter(self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.default_directives()))
    }
}

/// Install the global subscriber for the binary.
///
/// A `RUST_LOG` value replaces the directives derived from `verbosity`
/// entirely, so `RUST_LOG=tower_http=debug` traces requests without any
/// `rollcall` events. Calling this again after a subscriber is installed
/// does nothing.
///
/// ```no_run
/// use rollcall::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::from_flags(false, 1));
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let output = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let _ = tracing_subscriber::registry()
        .with(verbosity.env_filter())
        .with(output)
        .try_init();
}

/// Route warnings from code under test to the test harness output.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
