use crate::blast_tab::ParseErr;
use std::io;

/// Failure kinds of a bridge-assembly run.
///
/// Only `ExternalToolFailure` on setup-critical steps, `Io` and `InvalidInput`
/// are meant to stop a batch; every other kind degrades the current site to a
/// failed insertion.
#[derive(Debug)]
pub enum BridgeError {
    ExternalToolFailure { tool: String, message: String },
    NoAlignmentFound,
    NoBridgingPath,
    NoTreePath,
    MergeBelowMinimumLength { length: usize, minimum: usize },
    ConsensusAlignmentFailed,
    Io(io::Error),
    Parse(ParseErr),
    InvalidInput(String),
}

impl std::fmt::Display for BridgeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BridgeError::ExternalToolFailure { tool, message } => {
                write!(f, "{} failed: {}", tool, message)
            }
            BridgeError::NoAlignmentFound => write!(f, "No alignment found"),
            BridgeError::NoBridgingPath => write!(f, "No path between the flanks"),
            BridgeError::NoTreePath => write!(f, "No overlapping chain from the flank"),
            BridgeError::MergeBelowMinimumLength { length, minimum } => write!(
                f,
                "Merged sequence of {} bp is below the minimum of {} bp",
                length, minimum
            ),
            BridgeError::ConsensusAlignmentFailed => write!(f, "Scaffold not aligned to consensus"),
            BridgeError::Io(e) => write!(f, "IO error: {}", e),
            BridgeError::Parse(e) => write!(f, "Parse error: {}", e),
            BridgeError::InvalidInput(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for BridgeError {}

impl From<io::Error> for BridgeError {
    fn from(e: io::Error) -> Self {
        BridgeError::Io(e)
    }
}

impl From<ParseErr> for BridgeError {
    fn from(e: ParseErr) -> Self {
        BridgeError::Parse(e)
    }
}

impl From<BridgeError> for io::Error {
    fn from(e: BridgeError) -> Self {
        match e {
            BridgeError::Io(inner) => inner,
            BridgeError::InvalidInput(msg) => io::Error::new(io::ErrorKind::InvalidInput, msg),
            other => io::Error::other(other.to_string()),
        }
    }
}

impl BridgeError {
    /// Whether the error should stop the whole batch rather than one site
    pub fn is_fatal(&self) -> bool {
        matches!(self, BridgeError::Io(_) | BridgeError::InvalidInput(_))
    }
}
