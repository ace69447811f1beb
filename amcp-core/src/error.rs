//! Domain-specific error types for the AMCP client.
//!
//! All fallible operations return `Result<T, AmcpError>`.
//! Malformed server output never panics; every fault is typed.

use std::time::Duration;
use thiserror::Error;

/// The canonical error type for the AMCP client.
#[derive(Debug, Error)]
pub enum AmcpError {
    // ── Encoding Errors ──────────────────────────────────────────
    /// An operation carries a parameter outside its documented range.
    #[error("encoding fault: {0}")]
    Encoding(String),

    // ── Decoding Errors ──────────────────────────────────────────
    /// A response row does not have the shape expected for its command.
    #[error("malformed response row ({reason}): {line:?}")]
    FrameShape { line: String, reason: &'static str },

    /// A frame-rate fraction was zero or could not be parsed.
    #[error("timecode fault: {0}")]
    Timecode(&'static str),

    /// A single protocol line exceeded the codec limit.
    #[error("line too long: {size} bytes (max {max})")]
    LineTooLong { size: usize, max: usize },

    /// UTF-8 conversion failed.
    #[error("invalid utf-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    // ── State Errors ─────────────────────────────────────────────
    /// The request/response discipline was violated by the caller.
    #[error("protocol state violation: {0}")]
    ProtocolState(&'static str),

    // ── Connection Errors ────────────────────────────────────────
    /// The TCP/IO layer reported an error.
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// The host name did not resolve to any address.
    #[error("could not resolve host {0:?}")]
    Unresolved(String),

    /// An mpsc channel was closed unexpectedly.
    #[error("channel closed")]
    ChannelClosed,

    /// An operation exceeded its deadline.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// Catch-all for errors that do not fit another variant.
    #[error("{0}")]
    Other(String),
}

// ── RowFault ──────────────────────────────────────────────────────

/// A single response row that could not be decoded.
///
/// Row faults are collected next to the decoded records instead of
/// aborting the whole frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFault {
    /// The offending line, verbatim.
    pub line: String,
    /// Short description of what was missing.
    pub reason: &'static str,
}

impl RowFault {
    pub fn new(line: impl Into<String>, reason: &'static str) -> Self {
        Self {
            line: line.into(),
            reason,
        }
    }
}

impl std::fmt::Display for RowFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {:?}", self.reason, self.line)
    }
}

impl From<RowFault> for AmcpError {
    fn from(fault: RowFault) -> Self {
        AmcpError::FrameShape {
            line: fault.line,
            reason: fault.reason,
        }
    }
}

// ── Convenient From implementations ──────────────────────────────

impl From<String> for AmcpError {
    fn from(s: String) -> Self {
        AmcpError::Other(s)
    }
}

impl From<&str> for AmcpError {
    fn from(s: &str) -> Self {
        AmcpError::Other(s.to_string())
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for AmcpError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        AmcpError::ChannelClosed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = AmcpError::ProtocolState("dispatch while idle");
        assert!(e.to_string().contains("dispatch while idle"));

        let e = AmcpError::LineTooLong {
            size: 2000,
            max: 1024,
        };
        assert!(e.to_string().contains("2000"));
        assert!(e.to_string().contains("1024"));
    }

    #[test]
    fn row_fault_converts_to_frame_shape() {
        let e: AmcpError = RowFault::new("garbage", "missing quote boundary").into();
        match e {
            AmcpError::FrameShape { line, reason } => {
                assert_eq!(line, "garbage");
                assert_eq!(reason, "missing quote boundary");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn from_string() {
        let e: AmcpError = "something broke".into();
        assert!(matches!(e, AmcpError::Other(_)));
    }

    #[test]
    fn from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broke");
        let e: AmcpError = io_err.into();
        assert!(matches!(e, AmcpError::Connection(_)));
    }
}
