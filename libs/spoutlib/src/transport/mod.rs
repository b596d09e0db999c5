// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! The downstream seam: what an endpoint needs from the video bus.
//!
//! The two transport traits mirror the native object API call for call. They
//! keep its boolean results and its in/out name-and-dimension parameters
//! (as `&mut ChannelInfo`); turning those into `Result`s, validating
//! arguments and tracking state is the endpoint's job, not the transport's.

pub mod loopback;
pub mod native;

use crate::channel::ChannelInfo;
use crate::config::{BackendKind, SpoutConfig};
use crate::error::Result;
use crate::gl::{GlFormat, GlTexture};

use loopback::{LoopbackBus, LoopbackReceiver, LoopbackSender};
use native::{NativeBackend, NativeReceiver, NativeSender};

/// Producer side of one channel.
pub trait SenderTransport {
    fn create_sender(&mut self, name: &str, width: u32, height: u32) -> bool;

    fn update_sender(&mut self, name: &str, width: u32, height: u32) -> bool;

    fn release_sender(&mut self);

    fn send_image(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        format: GlFormat,
        invert: bool,
        host_fbo: u32,
    ) -> bool;

    fn send_texture(
        &mut self,
        texture: GlTexture,
        width: u32,
        height: u32,
        invert: bool,
        host_fbo: u32,
    ) -> bool;
}

/// Consumer side of one channel.
///
/// `channel` is in/out on every call: the transport may rename it (active
/// sender, sender gone) and rewrites the dimensions whenever it learns new
/// ones, whether or not the call succeeds.
pub trait ReceiverTransport {
    fn create_receiver(&mut self, channel: &mut ChannelInfo, use_active: bool) -> bool;

    fn receive_image(
        &mut self,
        channel: &mut ChannelInfo,
        pixels: &mut [u8],
        format: GlFormat,
        invert: bool,
        host_fbo: u32,
    ) -> bool;

    /// `texture == None` polls: refreshes `channel` without writing a texture.
    fn receive_texture(
        &mut self,
        channel: &mut ChannelInfo,
        texture: Option<GlTexture>,
        invert: bool,
        host_fbo: u32,
    ) -> bool;

    fn get_image_size(&mut self, channel: &mut ChannelInfo, memory_mode: &mut bool) -> bool;

    fn release_receiver(&mut self);
}

/// Opens fresh transport objects, one per endpoint bind.
///
/// Clones share the underlying bus or library.
pub trait TransportBackend: Clone {
    type Sender: SenderTransport;
    type Receiver: ReceiverTransport;

    fn open_sender(&self) -> Result<Self::Sender>;

    fn open_receiver(&self) -> Result<Self::Receiver>;
}

// =============================================================================
// Backend selection
// =============================================================================

/// Either backend behind one concrete type, for hosts that pick at runtime.
#[derive(Clone)]
pub enum Backend {
    Native(NativeBackend),
    Loopback(LoopbackBus),
}

impl Backend {
    pub fn from_config(config: &SpoutConfig) -> Self {
        match config.backend {
            BackendKind::Native => Backend::Native(NativeBackend::new(config.library_path())),
            BackendKind::Loopback => {
                Backend::Loopback(LoopbackBus::with_memory_share(config.memory_share))
            }
        }
    }
}

impl From<LoopbackBus> for Backend {
    fn from(bus: LoopbackBus) -> Self {
        Backend::Loopback(bus)
    }
}

impl From<NativeBackend> for Backend {
    fn from(backend: NativeBackend) -> Self {
        Backend::Native(backend)
    }
}

pub enum BackendSender {
    Native(NativeSender),
    Loopback(LoopbackSender),
}

pub enum BackendReceiver {
    Native(NativeReceiver),
    Loopback(LoopbackReceiver),
}

impl TransportBackend for Backend {
    type Sender = BackendSender;
    type Receiver = BackendReceiver;

    fn open_sender(&self) -> Result<BackendSender> {
        Ok(match self {
            Backend::Native(b) => BackendSender::Native(b.open_sender()?),
            Backend::Loopback(b) => BackendSender::Loopback(b.open_sender()?),
        })
    }

    fn open_receiver(&self) -> Result<BackendReceiver> {
        Ok(match self {
            Backend::Native(b) => BackendReceiver::Native(b.open_receiver()?),
            Backend::Loopback(b) => BackendReceiver::Loopback(b.open_receiver()?),
        })
    }
}

impl SenderTransport for BackendSender {
    fn create_sender(&mut self, name: &str, width: u32, height: u32) -> bool {
        match self {
            BackendSender::Native(t) => t.create_sender(name, width, height),
            BackendSender::Loopback(t) => t.create_sender(name, width, height),
        }
    }

    fn update_sender(&mut self, name: &str, width: u32, height: u32) -> bool {
        match self {
            BackendSender::Native(t) => t.update_sender(name, width, height),
            BackendSender::Loopback(t) => t.update_sender(name, width, height),
        }
    }

    fn release_sender(&mut self) {
        match self {
            BackendSender::Native(t) => t.release_sender(),
            BackendSender::Loopback(t) => t.release_sender(),
        }
    }

    fn send_image(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        format: GlFormat,
        invert: bool,
        host_fbo: u32,
    ) -> bool {
        match self {
            BackendSender::Native(t) => t.send_image(pixels, width, height, format, invert, host_fbo),
            BackendSender::Loopback(t) => {
                t.send_image(pixels, width, height, format, invert, host_fbo)
            }
        }
    }

    fn send_texture(
        &mut self,
        texture: GlTexture,
        width: u32,
        height: u32,
        invert: bool,
        host_fbo: u32,
    ) -> bool {
        match self {
            BackendSender::Native(t) => t.send_texture(texture, width, height, invert, host_fbo),
            BackendSender::Loopback(t) => t.send_texture(texture, width, height, invert, host_fbo),
        }
    }
}

impl ReceiverTransport for BackendReceiver {
    fn create_receiver(&mut self, channel: &mut ChannelInfo, use_active: bool) -> bool {
        match self {
            BackendReceiver::Native(t) => t.create_receiver(channel, use_active),
            BackendReceiver::Loopback(t) => t.create_receiver(channel, use_active),
        }
    }

    fn receive_image(
        &mut self,
        channel: &mut ChannelInfo,
        pixels: &mut [u8],
        format: GlFormat,
        invert: bool,
        host_fbo: u32,
    ) -> bool {
        match self {
            BackendReceiver::Native(t) => t.receive_image(channel, pixels, format, invert, host_fbo),
            BackendReceiver::Loopback(t) => {
                t.receive_image(channel, pixels, format, invert, host_fbo)
            }
        }
    }

    fn receive_texture(
        &mut self,
        channel: &mut ChannelInfo,
        texture: Option<GlTexture>,
        invert: bool,
        host_fbo: u32,
    ) -> bool {
        match self {
            BackendReceiver::Native(t) => t.receive_texture(channel, texture, invert, host_fbo),
            BackendReceiver::Loopback(t) => t.receive_texture(channel, texture, invert, host_fbo),
        }
    }

    fn get_image_size(&mut self, channel: &mut ChannelInfo, memory_mode: &mut bool) -> bool {
        match self {
            BackendReceiver::Native(t) => t.get_image_size(channel, memory_mode),
            BackendReceiver::Loopback(t) => t.get_image_size(channel, memory_mode),
        }
    }

    fn release_receiver(&mut self) {
        match self {
            BackendReceiver::Native(t) => t.release_receiver(),
            BackendReceiver::Loopback(t) => t.release_receiver(),
        }
    }
}
