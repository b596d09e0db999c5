// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Python binding for the consumer endpoint.

use pyo3::prelude::*;
use spoutlib::{Backend, GlFormat, GlTexture, Receiver};

use crate::backend;
use crate::channel_status_binding::PyChannelStatus;
use crate::loopback_binding::PyLoopbackBus;
use crate::pixel_view::PixelView;

/// Pulls frames from a Spout channel.
///
/// Calls take the caller's idea of the channel (`sender_name`, `width`,
/// `height`) and return a `ChannelStatus` with the transport's answer. An
/// empty `sender_name` means the channel this receiver is bound to.
///
/// Example:
///     receiver = Receiver()
///     status = receiver.create("preview")
///     pixels = bytearray(status.width * status.height * 4)
///     status = receiver.receive_image(status.name, status.width, status.height, pixels)
///
/// Note: Marked unsendable because texture calls are bound to the thread
/// owning the GL context.
#[pyclass(name = "Receiver", unsendable)]
pub struct PyReceiver {
    inner: Receiver<Backend>,
}

#[pymethods]
impl PyReceiver {
    /// Create an Unbound receiver on `bus`, or on the configured backend.
    #[new]
    #[pyo3(signature = (bus=None))]
    pub fn new(bus: Option<PyRef<'_, PyLoopbackBus>>) -> Self {
        Self {
            inner: Receiver::new(backend::resolve(bus)),
        }
    }

    /// Attach to `sender_name`, or to the active sender with `use_active`.
    #[pyo3(signature = (sender_name, width=0, height=0, use_active=false))]
    pub fn create(
        &mut self,
        sender_name: &str,
        width: u32,
        height: u32,
        use_active: bool,
    ) -> PyChannelStatus {
        match self.inner.create(sender_name, use_active) {
            Ok(channel) => PyChannelStatus::success(&channel, false),
            Err(e) => PyChannelStatus::failure("CreateReceiver", &e, None, sender_name, width, height),
        }
    }

    /// Pull the current frame into a GL texture.
    ///
    /// `texture_id=0` polls: the status reports the producer's presence and
    /// dimensions without writing anything.
    #[pyo3(signature = (sender_name, width=0, height=0, texture_id=0, texture_target=0, invert=false, host_fbo=0))]
    #[allow(clippy::too_many_arguments)]
    pub fn receive_texture(
        &mut self,
        sender_name: &str,
        width: u32,
        height: u32,
        texture_id: u32,
        texture_target: u32,
        invert: bool,
        host_fbo: u32,
    ) -> PyChannelStatus {
        let texture = GlTexture::new(texture_id, texture_target);
        match self
            .inner
            .receive_texture(sender_name, texture, invert, host_fbo)
        {
            Ok(outcome) => PyChannelStatus::success(&outcome.channel, false),
            Err(e) => PyChannelStatus::failure(
                "ReceiveTexture",
                &e,
                self.inner.known_channel(sender_name),
                sender_name,
                width,
                height,
            ),
        }
    }

    /// Copy the current frame into a writable buffer-protocol object.
    ///
    /// A falsy status whose dimensions differ from `width`/`height` means the
    /// producer changed resolution: resize `pixels` and call again. Calling
    /// again with the old size keeps reporting the new one.
    #[pyo3(signature = (sender_name, width, height, pixels, gl_format=spoutlib::gl_constants::GL_RGBA, invert=false, host_fbo=0))]
    #[allow(clippy::too_many_arguments)]
    pub fn receive_image(
        &mut self,
        py: Python<'_>,
        sender_name: &str,
        width: u32,
        height: u32,
        pixels: &Bound<'_, PyAny>,
        gl_format: u32,
        invert: bool,
        host_fbo: u32,
    ) -> PyResult<PyChannelStatus> {
        let mut view = PixelView::writable(pixels)?;
        let result = self.inner.receive_image(
            sender_name,
            view.as_mut_slice(py),
            GlFormat(gl_format),
            invert,
            host_fbo,
        );
        Ok(match result {
            Ok(outcome) => PyChannelStatus::success(&outcome.channel, false),
            Err(e) => PyChannelStatus::failure(
                "ReceiveImage",
                &e,
                self.inner.known_channel(sender_name),
                sender_name,
                width,
                height,
            ),
        })
    }

    /// Dimensions and memory mode of a channel, without a transfer.
    #[pyo3(signature = (sender_name, width=0, height=0))]
    pub fn get_image_size(&mut self, sender_name: &str, width: u32, height: u32) -> PyChannelStatus {
        match self.inner.get_image_size(sender_name) {
            Ok(size) => PyChannelStatus::success(&size.channel, size.memory_mode),
            Err(e) => PyChannelStatus::failure(
                "GetImageSize",
                &e,
                self.inner.known_channel(sender_name),
                sender_name,
                width,
                height,
            ),
        }
    }

    /// Detach. Safe to call more than once.
    pub fn release(&mut self) {
        self.inner.release();
    }

    #[getter]
    pub fn is_bound(&self) -> bool {
        self.inner.is_bound()
    }

    /// Name of the channel currently read, or `None` while Unbound.
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
            Some(c) => format!("Receiver('{}', {}x{})", c.name, c.width, c.height),
            None => "Receiver(unbound)".to_string(),
        }
    }
}
