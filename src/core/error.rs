use std::fmt;
use thiserror::Error;

/// An external command exited with a non-zero status.
///
/// Carries everything needed to diagnose the failure from the log alone:
/// the full argv, the exit code and the trimmed output streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandError {
    pub command: Vec<String>,
    /// `None` when the process was killed by a signal.
    pub rc: Option<i32>,
    pub out: String,
    pub err: String,
}

impl CommandError {
    pub fn new(command: &[String], rc: Option<i32>, out: String, err: String) -> Self {
        Self {
            command: command.to_vec(),
            rc,
            out,
            err,
        }
    }

    /// Name of the program that failed (first argv element).
    pub fn program(&self) -> &str {
        self.command.first().map(String::as_str).unwrap_or("")
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command {:?} failed rc=", self.command)?;
        match self.rc {
            Some(rc) => write!(f, "{}", rc)?,
            None => f.write_str("signal")?,
        }
        write!(f, " out={:?} err={:?}", self.out, self.err)
    }
}

impl std::error::Error for CommandError {}

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Step '{phase}' failed for {lv}: {source}")]
    Step {
        phase: &'static str,
        lv: String,
        #[source]
        source: Box<HarnessError>,
    },

    #[error("Unexpected output from '{program}': {output:?}")]
    UnexpectedOutput { program: String, output: String },

    #[error("Empty command")]
    EmptyCommand,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Cannot get LVM version from output {0:?}")]
    LvmVersion(String),
}

impl HarnessError {
    /// Returns the command failure when this error came from a non-zero exit.
    pub fn as_command_error(&self) -> Option<&CommandError> {
        match self {
            Self::Command(err) => Some(err),
            Self::Step { source, .. } => source.as_command_error(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, HarnessError>;
