// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Python binding for the producer endpoint.

use pyo3::prelude::*;
use spoutlib::{Backend, GlFormat, Sender};

use crate::backend;
use crate::channel_status_binding::succeeded;
use crate::loopback_binding::PyLoopbackBus;
use crate::pixel_view::PixelView;

/// Publishes frames into one named Spout channel.
///
/// Every fallible method returns `True` on success and `False` otherwise;
/// the reason for a `False` goes to the `spoutlib` logger. The channel is
/// released when the object is garbage-collected.
///
/// Example:
///     sender = Sender()
///     sender.create("preview", 1920, 1080)
///     sender.send_image(frame, 1920, 1080, GL_RGBA)
///
/// Note: Marked unsendable because texture calls are bound to the thread
/// owning the GL context.
#[pyclass(name = "Sender", unsendable)]
pub struct PySender {
    inner: Sender<Backend>,
}

#[pymethods]
impl PySender {
    /// Create an Unbound sender on `bus`, or on the configured backend.
    #[new]
    #[pyo3(signature = (bus=None))]
    pub fn new(bus: Option<PyRef<'_, PyLoopbackBus>>) -> Self {
        Self {
            inner: Sender::new(backend::resolve(bus)),
        }
    }

    /// Register the channel `name` at `width` x `height`.
    pub fn create(&mut self, name: &str, width: u32, height: u32) -> bool {
        succeeded("CreateSender", self.inner.create(name, width, height))
    }

    /// Rename and/or resize the bound channel. `False` while Unbound.
    pub fn update(&mut self, name: &str, width: u32, height: u32) -> bool {
        succeeded("UpdateSender", self.inner.update(name, width, height))
    }

    /// Release the channel. Safe to call more than once.
    pub fn release(&mut self) {
        self.inner.release();
    }

    /// Publish one frame from a buffer-protocol object.
    ///
    /// `pixels` is read in place and must hold at least
    /// `width * height * bytes_per_pixel(gl_format)` bytes.
    #[pyo3(signature = (pixels, width, height, gl_format, invert=false, host_fbo=0))]
    #[allow(clippy::too_many_arguments)]
    pub fn send_image(
        &mut self,
        py: Python<'_>,
        pixels: &Bound<'_, PyAny>,
        width: u32,
        height: u32,
        gl_format: u32,
        invert: bool,
        host_fbo: u32,
    ) -> PyResult<bool> {
        let view = PixelView::readable(pixels)?;
        let result = self.inner.send_image(
            view.as_slice(py),
            width,
            height,
            GlFormat(gl_format),
            invert,
            host_fbo,
        );
        Ok(succeeded("SendImage", result))
    }

    /// Publish the contents of an existing GL texture.
    ///
    /// The texture's GL context must be current on this thread.
    #[pyo3(signature = (texture_id, texture_target, width, height, invert=true, host_fbo=0))]
    pub fn send_texture(
        &mut self,
        texture_id: u32,
        texture_target: u32,
        width: u32,
        height: u32,
        invert: bool,
        host_fbo: u32,
    ) -> bool {
        let result = self.inner.send_texture(
            texture_id,
            texture_target,
            width,
            height,
            invert,
            host_fbo,
        );
        succeeded("SendTexture", result)
    }

    #[getter]
    pub fn is_bound(&self) -> bool {
        self.inner.is_bound()
    }

    /// Channel name, or `None` while Unbound.
    #[getter]
    pub fn name(&self) -> Option<String> {
        self.inner.channel().map(|c| c.name.clone())
    }

    #[getter]
    pub fn width(&self) -> Option<u32> {
        self.inner.channel().map(|c| c.width)
    }

    #[getter]
    pub fn height(&self) -> Option<u32> {
        self.inner.channel().map(|c| c.height)
    }

    fn __repr__(&self) -> String {
        match self.inner.channel() {
            Some(c) => format!("Sender('{}', {}x{})", c.name, c.width, c.height),
            None => "Sender(unbound)".to_string(),
        }
    }
}
