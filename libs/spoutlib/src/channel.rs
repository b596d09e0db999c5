// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Channel identity records and argument validation.

use crate::error::{Result, SpoutError};

/// Longest channel name the transport accepts, in bytes. The native name
/// buffer is 256 bytes including the terminating NUL.
pub const MAX_NAME_LEN: usize = 255;

/// Identity of a channel as last reported by the transport.
///
/// Stands in for the native `(name, &width, &height)` out-parameter triple.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChannelInfo {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

impl ChannelInfo {
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Result of a successful receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiveOutcome {
    pub channel: ChannelInfo,
    /// The producer's resolution differs from what this endpoint saw last.
    pub resized: bool,
}

/// Result of [`Receiver::get_image_size`](crate::Receiver::get_image_size).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSize {
    pub channel: ChannelInfo,
    /// `true` when the channel is carried through shared memory rather than
    /// a shared GPU texture.
    pub memory_mode: bool,
}

pub(crate) fn validate_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        "name is empty"
    } else if name.len() > MAX_NAME_LEN {
        "name is longer than 255 bytes"
    } else if name.as_bytes().contains(&0) {
        "name contains a NUL byte"
    } else {
        return Ok(());
    };
    Err(SpoutError::InvalidName {
        name: name.to_owned(),
        reason,
    })
}

pub(crate) fn validate_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(SpoutError::InvalidDimensions { width, height });
    }
    Ok(())
}
