// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Lifecycle-managed endpoints.
//!
//! An endpoint is Unbound until its first successful `create` and Bound
//! until `release` or drop. A Bound endpoint owns exactly one live transport
//! object; an Unbound one owns none. Dropping a Bound endpoint releases its
//! transport exactly once.
//!
//! Endpoints are not `Sync` and are not meant to be: calls on one endpoint
//! must be serialized by the caller, and texture calls must run on the
//! thread whose GL context owns the texture.

mod receiver;
mod sender;

pub use receiver::Receiver;
pub use sender::Sender;

use crate::channel::ChannelInfo;
use crate::error::{Result, SpoutError};
use crate::gl::GlFormat;

/// A transport object together with the channel it is bound to.
struct Bound<T> {
    transport: T,
    channel: ChannelInfo,
}

/// Reject a buffer shorter than one frame.
fn check_buffer_len(len: usize, format: GlFormat, width: u32, height: u32) -> Result<()> {
    let required = format.min_buffer_len(width, height);
    if len < required {
        return Err(SpoutError::BufferTooSmall {
            required,
            actual: len,
        });
    }
    Ok(())
}
