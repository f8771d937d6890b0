//! Failures while writing LKH inputs, running the executable and reading
//! tours back.

use std::{path::PathBuf, process::ExitStatus};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LkhError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// TSPLIB or tour text that does not parse, or parses to something
    /// inconsistent.
    #[error("invalid data: {0}")]
    InvalidData(String),
    /// The executable could not be started.
    #[error("cannot start LKH at {}: {source}", exe.display())]
    Spawn {
        exe: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// LKH started but did not exit cleanly. Both streams are kept since
    /// LKH reports most problems on stdout.
    #[error("{context}: LKH {status}\n--- stdout ---\n{stdout}\n--- stderr ---\n{stderr}")]
    Exited {
        context: String,
        status: ExitStatus,
        stdout: String,
        stderr: String,
    },
}

pub type LkhResult<T> = std::result::Result<T, LkhError>;

impl LkhError {
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData(message.into())
    }
}
