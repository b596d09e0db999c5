// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use super::{Bound, check_buffer_len};
use crate::channel::{ChannelInfo, ImageSize, ReceiveOutcome, validate_name};
use crate::error::{Result, SpoutError};
use crate::gl::{GlFormat, GlTexture};
use crate::transport::{ReceiverTransport, TransportBackend};

/// Consumer endpoint: owns one inbound subscription.
///
/// Transfer calls take a `sender_name`; an empty name means the channel the
/// receiver is currently bound to. The transport may follow a different
/// channel than the one asked for (the requested sender vanished, or the
/// active sender was requested). The receiver then rebinds to whatever the
/// transport reports, but only once a transfer from that channel succeeds.
pub struct Receiver<B: TransportBackend> {
    backend: B,
    bound: Option<Bound<B::Receiver>>,
    /// Size the transport last reported for a channel other than the bound
    /// one, so a resized retry against that channel can succeed.
    reported: Option<ChannelInfo>,
}

impl<B: TransportBackend> Receiver<B> {
    /// An Unbound receiver. No transport object is opened until `create`.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            bound: None,
            reported: None,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.bound.is_some()
    }

    /// The channel as of the last successful bind or transfer; `None` while
    /// Unbound.
    pub fn channel(&self) -> Option<&ChannelInfo> {
        self.bound.as_ref().map(|b| &b.channel)
    }

    /// What this receiver last learned about `sender_name` (`""` meaning the
    /// bound channel): the record the next transfer from it is checked
    /// against. `None` while Unbound or for a channel not seen yet.
    pub fn known_channel(&self, sender_name: &str) -> Option<&ChannelInfo> {
        let bound = self.bound.as_ref()?;
        known(&bound.channel, self.reported.as_ref(), sender_name)
    }

    /// Attach to `sender_name`, or to the active sender when `use_active`
    /// is set (in which case `sender_name` may be empty).
    ///
    /// Returns the channel actually attached to, with its dimensions.
    pub fn create(&mut self, sender_name: &str, use_active: bool) -> Result<ChannelInfo> {
        if let Some(bound) = &self.bound {
            return Err(SpoutError::AlreadyBound(bound.channel.name.clone()));
        }
        if !(use_active && sender_name.is_empty()) {
            validate_name(sender_name)?;
        }

        let mut transport = self.backend.open_receiver()?;
        let mut channel = ChannelInfo::new(sender_name, 0, 0);
        if !transport.create_receiver(&mut channel, use_active) {
            tracing::debug!(
                "Receiver found no sender '{}' (use_active={})",
                sender_name,
                use_active
            );
            return Err(SpoutError::ChannelNotFound(sender_name.to_owned()));
        }

        tracing::debug!(
            "Receiver attached to '{}' at {}x{}",
            channel.name,
            channel.width,
            channel.height
        );
        self.bound = Some(Bound {
            transport,
            channel: channel.clone(),
        });
        Ok(channel)
    }

    /// Pull the current frame into `texture`, or poll when `texture` is
    /// `None`.
    ///
    /// A poll refreshes the channel's dimensions and reports whether the
    /// producer is alive without writing anything. The texture's GL context
    /// must be current on the calling thread. When `resized` is set the
    /// caller's texture no longer matches the producer and should be
    /// reallocated.
    pub fn receive_texture(
        &mut self,
        sender_name: &str,
        texture: Option<GlTexture>,
        invert: bool,
        host_fbo: u32,
    ) -> Result<ReceiveOutcome> {
        let bound = self.bound.as_mut().ok_or(SpoutError::NotBound)?;
        let mut channel = request(&bound.channel, self.reported.as_ref(), sender_name)?;

        let ok = bound
            .transport
            .receive_texture(&mut channel, texture, invert, host_fbo);
        if !ok {
            return Err(SpoutError::NoFrame(channel.name));
        }
        Ok(commit(bound, &mut self.reported, channel))
    }

    /// Copy the current frame into `pixels`.
    ///
    /// `pixels` must hold a full frame at the dimensions this receiver last
    /// saw for that channel. If the producer has since changed resolution
    /// nothing is written, the new dimensions are remembered and
    /// `ResolutionChanged` tells the caller to resize and retry. A failed
    /// call never moves the receiver to a different channel.
    pub fn receive_image(
        &mut self,
        sender_name: &str,
        pixels: &mut [u8],
        format: GlFormat,
        invert: bool,
        host_fbo: u32,
    ) -> Result<ReceiveOutcome> {
        let bound = self.bound.as_mut().ok_or(SpoutError::NotBound)?;
        let mut channel = request(&bound.channel, self.reported.as_ref(), sender_name)?;
        check_buffer_len(pixels.len(), format, channel.width, channel.height)?;

        let expected = channel.dimensions();
        let ok = bound
            .transport
            .receive_image(&mut channel, pixels, format, invert, host_fbo);
        if !ok {
            if channel.dimensions() != expected {
                tracing::debug!(
                    "Receiver '{}' resolution changed to {}x{}",
                    channel.name,
                    channel.width,
                    channel.height
                );
                let err = SpoutError::ResolutionChanged {
                    channel: channel.name.clone(),
                    width: channel.width,
                    height: channel.height,
                };
                if channel.name == bound.channel.name {
                    bound.channel = channel;
                } else {
                    self.reported = Some(channel);
                }
                return Err(err);
            }
            return Err(SpoutError::NoFrame(channel.name));
        }
        Ok(commit(bound, &mut self.reported, channel))
    }

    /// Ask for a channel's dimensions and memory mode without transferring
    /// a frame. Leaves the receiver's own state untouched.
    pub fn get_image_size(&mut self, sender_name: &str) -> Result<ImageSize> {
        let bound = self.bound.as_mut().ok_or(SpoutError::NotBound)?;
        let mut channel = request(&bound.channel, self.reported.as_ref(), sender_name)?;
        let mut memory_mode = false;

        if !bound
            .transport
            .get_image_size(&mut channel, &mut memory_mode)
        {
            return Err(SpoutError::ChannelNotFound(channel.name));
        }
        Ok(ImageSize {
            channel,
            memory_mode,
        })
    }

    /// Detach. Does nothing when already Unbound.
    pub fn release(&mut self) {
        self.reported = None;
        if let Some(mut bound) = self.bound.take() {
            bound.transport.release_receiver();
            tracing::debug!("Receiver detached from '{}'", bound.channel.name);
        }
    }
}

impl<B: TransportBackend> Drop for Receiver<B> {
    fn drop(&mut self) {
        self.release();
    }
}

fn known<'a>(
    bound: &'a ChannelInfo,
    reported: Option<&'a ChannelInfo>,
    sender_name: &str,
) -> Option<&'a ChannelInfo> {
    if sender_name.is_empty() || sender_name == bound.name {
        return Some(bound);
    }
    reported.filter(|c| c.name == sender_name)
}

/// The in/out record handed to the transport for one call. A channel seen
/// for the first time is asked for at the bound channel's dimensions.
fn request(
    bound: &ChannelInfo,
    reported: Option<&ChannelInfo>,
    sender_name: &str,
) -> Result<ChannelInfo> {
    if let Some(channel) = known(bound, reported, sender_name) {
        return Ok(channel.clone());
    }
    validate_name(sender_name)?;
    Ok(ChannelInfo::new(sender_name, bound.width, bound.height))
}

/// Adopt what the transport reported after a successful transfer.
fn commit<T>(
    bound: &mut Bound<T>,
    reported: &mut Option<ChannelInfo>,
    channel: ChannelInfo,
) -> ReceiveOutcome {
    if reported.as_ref().is_some_and(|r| r.name == channel.name) {
        *reported = None;
    }
    if channel.name != bound.channel.name {
        tracing::info!(
            "Receiver rebound from '{}' to '{}'",
            bound.channel.name,
            channel.name
        );
    }
    let resized = channel.dimensions() != bound.channel.dimensions();
    bound.channel = channel.clone();
    ReceiveOutcome { channel, resized }
}
