// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Receiver call results and the error-to-boolean fold.

use pyo3::prelude::*;
use spoutlib::{ChannelInfo, ErrorCategory, SpoutError};

/// Outcome of a Receiver call.
///
/// Truthy iff the call succeeded. On success `name`, `width` and `height`
/// describe the channel the receiver is now reading. On failure they carry
/// the dimensions the receiver last learned for the requested channel when
/// those differ from what the caller passed in, so the caller can resize
/// and retry; otherwise they echo the caller's values.
///
/// Example:
///     status = receiver.receive_image(name, w, h, pixels)
///     if not status and (status.width, status.height) != (w, h):
///         pixels = bytearray(status.width * status.height * 4)
#[pyclass(name = "ChannelStatus", frozen, get_all)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PyChannelStatus {
    pub ok: bool,
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Whether the channel is carried through shared memory rather than a
    /// shared GPU texture. Only filled in by `get_image_size`.
    pub memory_mode: bool,
}

impl PyChannelStatus {
    pub(crate) fn success(channel: &ChannelInfo, memory_mode: bool) -> Self {
        Self {
            ok: true,
            name: channel.name.clone(),
            width: channel.width,
            height: channel.height,
            memory_mode,
        }
    }

    /// `known` is the receiver's record for the requested channel, if any.
    pub(crate) fn failure(
        operation: &str,
        err: &SpoutError,
        known: Option<&ChannelInfo>,
        name: &str,
        width: u32,
        height: u32,
    ) -> Self {
        log_failure(operation, err);
        match err {
            SpoutError::ResolutionChanged {
                channel,
                width,
                height,
            } => Self {
                ok: false,
                name: channel.clone(),
                width: *width,
                height: *height,
                memory_mode: false,
            },
            _ => match known {
                Some(channel) if channel.dimensions() != (width, height) => Self {
                    ok: false,
                    name: channel.name.clone(),
                    width: channel.width,
                    height: channel.height,
                    memory_mode: false,
                },
                _ => Self {
                    ok: false,
                    name: name.to_owned(),
                    width,
                    height,
                    memory_mode: false,
                },
            },
        }
    }
}

#[pymethods]
impl PyChannelStatus {
    fn __bool__(&self) -> bool {
        self.ok
    }

    fn __repr__(&self) -> String {
        format!(
            "ChannelStatus(ok={}, name='{}', width={}, height={}, memory_mode={})",
            if self.ok { "True" } else { "False" },
            self.name,
            self.width,
            self.height,
            if self.memory_mode { "True" } else { "False" }
        )
    }
}

/// Turn a core result into the host's boolean, logging why it was `false`.
pub(crate) fn succeeded(operation: &str, result: spoutlib::Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            log_failure(operation, &e);
            false
        }
    }
}

fn log_failure(operation: &str, err: &SpoutError) {
    match err.category() {
        ErrorCategory::Environment => tracing::warn!("{} failed: {}", operation, err),
        ErrorCategory::Transient => tracing::trace!("{}: {}", operation, err),
        ErrorCategory::Precondition | ErrorCategory::TransportRefusal => {
            tracing::debug!("{} failed: {}", operation, err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_echoes_caller_values() {
        let status = PyChannelStatus::failure(
            "ReceiveImage",
            &SpoutError::NoFrame("cam".into()),
            Some(&ChannelInfo::new("cam", 640, 480)),
            "cam",
            640,
            480,
        );
        assert!(!status.ok);
        assert_eq!((status.name.as_str(), status.width, status.height), ("cam", 640, 480));
    }

    #[test]
    fn test_resolution_change_reports_new_dimensions() {
        let status = PyChannelStatus::failure(
            "ReceiveImage",
            &SpoutError::ResolutionChanged {
                channel: "cam".into(),
                width: 1280,
                height: 720,
            },
            None,
            "",
            640,
            480,
        );
        assert!(!status.ok);
        assert_eq!((status.name.as_str(), status.width, status.height), ("cam", 1280, 720));
    }

    #[test]
    fn test_failure_reports_known_dimensions_over_stale_request() {
        let status = PyChannelStatus::failure(
            "ReceiveImage",
            &SpoutError::BufferTooSmall {
                required: 8,
                actual: 4,
            },
            Some(&ChannelInfo::new("cam", 2, 1)),
            "cam",
            1,
            1,
        );
        assert!(!status.ok);
        assert_eq!((status.name.as_str(), status.width, status.height), ("cam", 2, 1));
    }

    #[test]
    fn test_succeeded() {
        assert!(succeeded("SendImage", Ok(())));
        assert!(!succeeded("SendImage", Err(SpoutError::NotBound)));
    }
}
