// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpoutError {
    #[error("endpoint is not bound to a channel")]
    NotBound,

    #[error("endpoint is already bound to channel '{0}'")]
    AlreadyBound(String),

    #[error("invalid channel name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("invalid frame dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error(
        "frame is {width}x{height} but channel '{channel}' is {expected_width}x{expected_height}"
    )]
    DimensionMismatch {
        channel: String,
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },

    #[error("pixel buffer holds {actual} bytes, {required} required")]
    BufferTooSmall { required: usize, actual: usize },

    #[error("texture name 0 cannot be sent")]
    InvalidTexture,

    #[error("transport refused {operation}")]
    TransportRefused { operation: &'static str },

    #[error("no sender named '{0}' is available")]
    ChannelNotFound(String),

    #[error("no frame available from '{0}'")]
    NoFrame(String),

    #[error("channel '{channel}' changed resolution to {width}x{height}")]
    ResolutionChanged {
        channel: String,
        width: u32,
        height: u32,
    },

    #[error("transport library unavailable: {0}")]
    Library(String),

    #[error("the Spout transport is only available on Windows")]
    Unsupported,

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of a failure, as seen by a host that only gets a
/// boolean back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The call was illegal; nothing reached the transport.
    Precondition,
    /// The transport was asked and said no.
    TransportRefusal,
    /// Nothing to read right now; retrying later may succeed.
    Transient,
    /// The transport could not be reached at all (library, platform, config).
    Environment,
}

impl SpoutError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SpoutError::NotBound
            | SpoutError::AlreadyBound(_)
            | SpoutError::InvalidName { .. }
            | SpoutError::InvalidDimensions { .. }
            | SpoutError::DimensionMismatch { .. }
            | SpoutError::BufferTooSmall { .. }
            | SpoutError::InvalidTexture => ErrorCategory::Precondition,
            SpoutError::TransportRefused { .. } | SpoutError::ChannelNotFound(_) => {
                ErrorCategory::TransportRefusal
            }
            SpoutError::NoFrame(_) | SpoutError::ResolutionChanged { .. } => {
                ErrorCategory::Transient
            }
            SpoutError::Library(_)
            | SpoutError::Unsupported
            | SpoutError::Configuration(_)
            | SpoutError::Io(_) => ErrorCategory::Environment,
        }
    }
}

pub type Result<T> = std::result::Result<T, SpoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(SpoutError::NotBound.category(), ErrorCategory::Precondition);
        assert_eq!(
            SpoutError::BufferTooSmall {
                required: 16,
                actual: 4
            }
            .category(),
            ErrorCategory::Precondition
        );
        assert_eq!(
            SpoutError::ChannelNotFound("prod-1".into()).category(),
            ErrorCategory::TransportRefusal
        );
        assert_eq!(
            SpoutError::NoFrame("prod-1".into()).category(),
            ErrorCategory::Transient
        );
        assert_eq!(SpoutError::Unsupported.category(), ErrorCategory::Environment);
    }

    #[test]
    fn test_display() {
        let err = SpoutError::DimensionMismatch {
            channel: "c".into(),
            width: 640,
            height: 480,
            expected_width: 1280,
            expected_height: 720,
        };
        assert_eq!(
            err.to_string(),
            "frame is 640x480 but channel 'c' is 1280x720"
        );
    }
}
