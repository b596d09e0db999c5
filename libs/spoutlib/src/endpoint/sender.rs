// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use super::{Bound, check_buffer_len};
use crate::channel::{ChannelInfo, validate_dimensions, validate_name};
use crate::error::{Result, SpoutError};
use crate::gl::{GlFormat, GlTexture};
use crate::transport::{SenderTransport, TransportBackend};

/// Producer endpoint: owns one outbound channel.
pub struct Sender<B: TransportBackend> {
    backend: B,
    bound: Option<Bound<B::Sender>>,
}

impl<B: TransportBackend> Sender<B> {
    /// An Unbound sender. No transport object is opened until `create`.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            bound: None,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.bound.is_some()
    }

    /// Name and dimensions of the bound channel; `None` while Unbound.
    pub fn channel(&self) -> Option<&ChannelInfo> {
        self.bound.as_ref().map(|b| &b.channel)
    }

    /// Register a channel named `name` at `width` x `height`.
    ///
    /// On error the sender is left exactly as it was.
    pub fn create(&mut self, name: &str, width: u32, height: u32) -> Result<()> {
        if let Some(bound) = &self.bound {
            return Err(SpoutError::AlreadyBound(bound.channel.name.clone()));
        }
        validate_name(name)?;
        validate_dimensions(width, height)?;

        let mut transport = self.backend.open_sender()?;
        if !transport.create_sender(name, width, height) {
            tracing::debug!("Sender '{}' {}x{} refused by transport", name, width, height);
            return Err(SpoutError::TransportRefused {
                operation: "CreateSender",
            });
        }

        tracing::debug!("Sender '{}' created at {}x{}", name, width, height);
        self.bound = Some(Bound {
            transport,
            channel: ChannelInfo::new(name, width, height),
        });
        Ok(())
    }

    /// Change the bound channel's name and/or dimensions in place.
    ///
    /// Only valid while Bound; an Unbound sender is not created implicitly.
    pub fn update(&mut self, name: &str, width: u32, height: u32) -> Result<()> {
        let bound = self.bound.as_mut().ok_or(SpoutError::NotBound)?;
        validate_name(name)?;
        validate_dimensions(width, height)?;

        if !bound.transport.update_sender(name, width, height) {
            tracing::debug!(
                "Sender '{}' update to '{}' {}x{} refused",
                bound.channel.name,
                name,
                width,
                height
            );
            return Err(SpoutError::TransportRefused {
                operation: "UpdateSender",
            });
        }

        tracing::debug!(
            "Sender '{}' updated to '{}' {}x{}",
            bound.channel.name,
            name,
            width,
            height
        );
        bound.channel = ChannelInfo::new(name, width, height);
        Ok(())
    }

    /// Release the channel. Does nothing when already Unbound.
    pub fn release(&mut self) {
        if let Some(mut bound) = self.bound.take() {
            bound.transport.release_sender();
            tracing::debug!("Sender '{}' released", bound.channel.name);
        }
    }

    /// Publish one frame of pixels.
    ///
    /// `width` and `height` must equal the channel's current dimensions and
    /// `pixels` must hold a full frame in `format`. `pixels` is only read
    /// for the duration of the call.
    pub fn send_image(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        format: GlFormat,
        invert: bool,
        host_fbo: u32,
    ) -> Result<()> {
        let bound = self.bound.as_mut().ok_or(SpoutError::NotBound)?;
        check_frame_dimensions(&bound.channel, width, height)?;
        check_buffer_len(pixels.len(), format, width, height)?;

        if !bound
            .transport
            .send_image(pixels, width, height, format, invert, host_fbo)
        {
            return Err(SpoutError::TransportRefused {
                operation: "SendImage",
            });
        }
        tracing::trace!(
            "Sender '{}' sent {} byte image ({}x{}, format=0x{:X})",
            bound.channel.name,
            pixels.len(),
            width,
            height,
            format.as_raw()
        );
        Ok(())
    }

    /// Publish the contents of an existing GL texture.
    ///
    /// `texture_id` 0 is rejected. The texture's GL context must be current
    /// on the calling thread.
    pub fn send_texture(
        &mut self,
        texture_id: u32,
        texture_target: u32,
        width: u32,
        height: u32,
        invert: bool,
        host_fbo: u32,
    ) -> Result<()> {
        let bound = self.bound.as_mut().ok_or(SpoutError::NotBound)?;
        let texture = GlTexture::new(texture_id, texture_target).ok_or(SpoutError::InvalidTexture)?;
        check_frame_dimensions(&bound.channel, width, height)?;

        if !bound
            .transport
            .send_texture(texture, width, height, invert, host_fbo)
        {
            return Err(SpoutError::TransportRefused {
                operation: "SendTexture",
            });
        }
        tracing::trace!(
            "Sender '{}' sent texture {} (target=0x{:X}, {}x{})",
            bound.channel.name,
            texture_id,
            texture_target,
            width,
            height
        );
        Ok(())
    }
}

impl<B: TransportBackend> Drop for Sender<B> {
    fn drop(&mut self) {
        self.release();
    }
}

fn check_frame_dimensions(channel: &ChannelInfo, width: u32, height: u32) -> Result<()> {
    validate_dimensions(width, height)?;
    if channel.dimensions() != (width, height) {
        return Err(SpoutError::DimensionMismatch {
            channel: channel.name.clone(),
            width,
            height,
            expected_width: channel.width,
            expected_height: channel.height,
        });
    }
    Ok(())
}
