//! Errors at the crate's fallible edges
//!
//! Rendering itself never fails (it degrades to no-ops); only bootstrap and
//! decoding of externally supplied JSON can.

use std::fmt;

#[derive(Debug)]
pub enum CurveError {
    /// A required browser object (window, document, canvas, 2d context) is missing
    MissingHost(&'static str),
    /// A round event payload could not be decoded
    InvalidEvent(serde_json::Error),
    /// A settings payload could not be decoded
    InvalidSettings(serde_json::Error),
}

impl fmt::Display for CurveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingHost(what) => write!(f, "host object unavailable: {}", what),
            Self::InvalidEvent(e) => write!(f, "invalid round event: {}", e),
            Self::InvalidSettings(e) => write!(f, "invalid settings: {}", e),
        }
    }
}

impl std::error::Error for CurveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MissingHost(_) => None,
            Self::InvalidEvent(e) | Self::InvalidSettings(e) => Some(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, CurveError>;
