use std::fmt::{self, Display};
use std::io;

/// Provides `OutbreakError` and maps other errors to
/// convert to an `OutbreakError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum OutbreakError {
    /// A grid was requested with a side shorter than two cells.
    InvalidDimension {
        width: usize,
        height: usize,
    },
    /// A cell outside `[0, width-1] x [0, height-1]` was read or written.
    OutOfBounds { x: i32, y: i32 },
    /// No agent in the population has this id.
    UnknownAgent { id: u64 },
    InvalidParameter(String),
    IoError(io::Error),
    JsonError(serde_json::Error),
}

impl From<io::Error> for OutbreakError {
    fn from(error: io::Error) -> Self {
        OutbreakError::IoError(error)
    }
}

impl From<serde_json::Error> for OutbreakError {
    fn from(error: serde_json::Error) -> Self {
        OutbreakError::JsonError(error)
    }
}

impl From<String> for OutbreakError {
    fn from(error: String) -> Self {
        OutbreakError::InvalidParameter(error)
    }
}

impl From<&str> for OutbreakError {
    fn from(error: &str) -> Self {
        OutbreakError::InvalidParameter(error.to_string())
    }
}

impl std::error::Error for OutbreakError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OutbreakError::IoError(error) => Some(error),
            OutbreakError::JsonError(error) => Some(error),
            _ => None,
        }
    }
}

impl Display for OutbreakError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OutbreakError::InvalidDimension { width, height } => write!(
                f,
                "Error: grid dimensions must be at least 2x2, got {width}x{height}"
            ),
            OutbreakError::OutOfBounds { x, y } => {
                write!(f, "Error: cell ({x}, {y}) is outside the grid")
            }
            OutbreakError::UnknownAgent { id } => write!(f, "Error: no agent with id {id}"),
            OutbreakError::InvalidParameter(message) => write!(f, "Error: {message}"),
            OutbreakError::IoError(error) => write!(f, "Error: {error}"),
            OutbreakError::JsonError(error) => write!(f, "Error: {error}"),
        }
    }
}
