// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Python bindings for spoutlib.
//!
//! Exposes `Sender` and `Receiver` to Python with the host contract of the
//! original Spout binding: fallible calls answer `True`/`False` (or a truthy
//! `ChannelStatus` on the receiver side) instead of raising. The reason for a
//! `False` is logged through Python's `logging` module.

use pyo3::prelude::*;

mod backend;
mod channel_status_binding;
mod loopback_binding;
mod pixel_view;
mod receiver_binding;
mod sender_binding;

pub use channel_status_binding::PyChannelStatus;
pub use loopback_binding::PyLoopbackBus;
pub use receiver_binding::PyReceiver;
pub use sender_binding::PySender;

/// Spout native bindings module.
#[pymodule]
fn _spout(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Route Rust logs into Python `logging`
    pyo3_log::init();

    m.add_class::<sender_binding::PySender>()?;
    m.add_class::<receiver_binding::PyReceiver>()?;
    m.add_class::<channel_status_binding::PyChannelStatus>()?;
    m.add_class::<loopback_binding::PyLoopbackBus>()?;

    use spoutlib::gl_constants::*;
    m.add("GL_RGBA", GL_RGBA)?;
    m.add("GL_BGRA", GL_BGRA)?;
    m.add("GL_RGB", GL_RGB)?;
    m.add("GL_BGR", GL_BGR)?;
    m.add("GL_RED", GL_RED)?;
    m.add("GL_LUMINANCE", GL_LUMINANCE)?;
    m.add("GL_TEXTURE_2D", GL_TEXTURE_2D)?;
    m.add("GL_TEXTURE_RECTANGLE", GL_TEXTURE_RECTANGLE)?;

    Ok(())
}
