// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! In-process video bus.
//!
//! Behaves like the native transport as far as the endpoints can tell: a
//! name registry with collision refusal, an active-sender slot, latest-frame
//! semantics, resolution-change reporting and a memory-mode flag. Frames are
//! plain byte copies; textures are recorded, never touched. Every downstream
//! call is counted in [`TransportStats`].

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{ReceiverTransport, SenderTransport, TransportBackend};
use crate::channel::ChannelInfo;
use crate::error::Result;
use crate::gl::{GlFormat, GlTexture};

/// Number of times each downstream operation reached the bus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportStats {
    pub create_sender: u64,
    pub update_sender: u64,
    pub release_sender: u64,
    pub send_image: u64,
    pub send_texture: u64,
    pub create_receiver: u64,
    pub receive_image: u64,
    pub receive_texture: u64,
    pub get_image_size: u64,
    pub release_receiver: u64,
}

impl TransportStats {
    pub fn total(&self) -> u64 {
        self.create_sender
            + self.update_sender
            + self.release_sender
            + self.send_image
            + self.send_texture
            + self.create_receiver
            + self.receive_image
            + self.receive_texture
            + self.get_image_size
            + self.release_receiver
    }
}

enum Frame {
    Image { pixels: Vec<u8>, format: GlFormat },
    Texture(GlTexture),
}

struct Channel {
    owner: u64,
    width: u32,
    height: u32,
    frame: Option<Frame>,
}

#[derive(Default)]
struct BusState {
    channels: BTreeMap<String, Channel>,
    active: Option<String>,
    memory_share: bool,
    next_sender_id: u64,
    stats: TransportStats,
}

impl BusState {
    fn remove_channel(&mut self, name: &str) {
        self.channels.remove(name);
        if self.active.as_deref() == Some(name) {
            self.active = self.channels.keys().next().cloned();
        }
    }

    /// Name a receiver request resolves to, without falling back.
    fn resolve(&self, requested: &str, use_active: bool) -> Option<String> {
        if use_active || requested.is_empty() {
            return self.active.clone();
        }
        self.channels
            .contains_key(requested)
            .then(|| requested.to_owned())
    }

    /// Like [`resolve`](Self::resolve), but a vanished channel falls back to
    /// the active one.
    fn resolve_or_active(&self, requested: &str) -> Option<String> {
        self.resolve(requested, false)
            .or_else(|| self.active.clone())
    }
}

/// Shared handle to an in-process bus. Clones see the same registry.
#[derive(Clone, Default)]
pub struct LoopbackBus {
    state: Arc<Mutex<BusState>>,
}

impl LoopbackBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bus whose channels report shared-memory mode from GetImageSize.
    pub fn with_memory_share(memory_share: bool) -> Self {
        let bus = Self::default();
        bus.state.lock().memory_share = memory_share;
        bus
    }

    pub fn stats(&self) -> TransportStats {
        self.state.lock().stats
    }

    /// The channel receivers attach to when asked for the active sender.
    pub fn active_channel(&self) -> Option<String> {
        self.state.lock().active.clone()
    }

    /// The texture most recently published on `channel`, if its current
    /// frame came from `send_texture`.
    pub fn published_texture(&self, channel: &str) -> Option<GlTexture> {
        match &self.state.lock().channels.get(channel)?.frame {
            Some(Frame::Texture(texture)) => Some(*texture),
            _ => None,
        }
    }
}

impl TransportBackend for LoopbackBus {
    type Sender = LoopbackSender;
    type Receiver = LoopbackReceiver;

    fn open_sender(&self) -> Result<LoopbackSender> {
        let id = {
            let mut state = self.state.lock();
            state.next_sender_id += 1;
            state.next_sender_id
        };
        Ok(LoopbackSender {
            bus: self.clone(),
            id,
            name: None,
        })
    }

    fn open_receiver(&self) -> Result<LoopbackReceiver> {
        Ok(LoopbackReceiver {
            bus: self.clone(),
            attached: None,
        })
    }
}

// =============================================================================
// Sender
// =============================================================================

pub struct LoopbackSender {
    bus: LoopbackBus,
    id: u64,
    name: Option<String>,
}

impl LoopbackSender {
    fn registered_channel<'a>(&self, state: &'a mut BusState) -> Option<&'a mut Channel> {
        let name = self.name.as_deref()?;
        state.channels.get_mut(name).filter(|ch| ch.owner == self.id)
    }
}

impl SenderTransport for LoopbackSender {
    fn create_sender(&mut self, name: &str, width: u32, height: u32) -> bool {
        let mut state = self.bus.state.lock();
        state.stats.create_sender += 1;
        if self.name.is_some() || state.channels.contains_key(name) {
            return false;
        }
        state.channels.insert(
            name.to_owned(),
            Channel {
                owner: self.id,
                width,
                height,
                frame: None,
            },
        );
        if state.active.is_none() {
            state.active = Some(name.to_owned());
        }
        self.name = Some(name.to_owned());
        true
    }

    fn update_sender(&mut self, name: &str, width: u32, height: u32) -> bool {
        let mut state = self.bus.state.lock();
        state.stats.update_sender += 1;
        let Some(current) = self.name.clone() else {
            return false;
        };
        if current != name && state.channels.contains_key(name) {
            return false;
        }
        let Some(mut channel) = state.channels.remove(&current) else {
            return false;
        };
        if (channel.width, channel.height) != (width, height) {
            channel.frame = None;
        }
        channel.width = width;
        channel.height = height;
        state.channels.insert(name.to_owned(), channel);
        if state.active.as_deref() == Some(current.as_str()) {
            state.active = Some(name.to_owned());
        }
        self.name = Some(name.to_owned());
        true
    }

    fn release_sender(&mut self) {
        let mut state = self.bus.state.lock();
        state.stats.release_sender += 1;
        if let Some(name) = self.name.take() {
            state.remove_channel(&name);
        }
    }

    fn send_image(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        format: GlFormat,
        invert: bool,
        _host_fbo: u32,
    ) -> bool {
        let mut state = self.bus.state.lock();
        state.stats.send_image += 1;
        let Some(channel) = self.registered_channel(&mut state) else {
            return false;
        };
        if (channel.width, channel.height) != (width, height) {
            return false;
        }
        let Some(len) = format.frame_len(width, height) else {
            return false;
        };
        if pixels.len() < len {
            return false;
        }
        let row_len = len / height as usize;
        let mut stored = vec![0u8; len];
        copy_rows(&pixels[..len], &mut stored, row_len, invert);
        channel.frame = Some(Frame::Image {
            pixels: stored,
            format,
        });
        true
    }

    fn send_texture(
        &mut self,
        texture: GlTexture,
        width: u32,
        height: u32,
        _invert: bool,
        _host_fbo: u32,
    ) -> bool {
        let mut state = self.bus.state.lock();
        state.stats.send_texture += 1;
        let Some(channel) = self.registered_channel(&mut state) else {
            return false;
        };
        if (channel.width, channel.height) != (width, height) {
            return false;
        }
        channel.frame = Some(Frame::Texture(texture));
        true
    }
}

impl Drop for LoopbackSender {
    fn drop(&mut self) {
        if let Some(name) = self.name.take() {
            let mut state = self.bus.state.lock();
            let owned = state.channels.get(&name).is_some_and(|ch| ch.owner == self.id);
            if owned {
                state.remove_channel(&name);
            }
        }
    }
}

// =============================================================================
// Receiver
// =============================================================================

pub struct LoopbackReceiver {
    bus: LoopbackBus,
    attached: Option<String>,
}

impl ReceiverTransport for LoopbackReceiver {
    fn create_receiver(&mut self, channel: &mut ChannelInfo, use_active: bool) -> bool {
        let mut state = self.bus.state.lock();
        state.stats.create_receiver += 1;
        let Some(name) = state.resolve(&channel.name, use_active) else {
            return false;
        };
        let Some(found) = state.channels.get(&name) else {
            return false;
        };
        channel.width = found.width;
        channel.height = found.height;
        channel.name = name.clone();
        self.attached = Some(name);
        true
    }

    fn receive_image(
        &mut self,
        channel: &mut ChannelInfo,
        pixels: &mut [u8],
        format: GlFormat,
        invert: bool,
        _host_fbo: u32,
    ) -> bool {
        let mut state = self.bus.state.lock();
        state.stats.receive_image += 1;
        let Some(name) = state.resolve_or_active(&channel.name) else {
            return false;
        };
        let Some(found) = state.channels.get(&name) else {
            return false;
        };
        let stale = (channel.width, channel.height) != (found.width, found.height);
        channel.name = name.clone();
        channel.width = found.width;
        channel.height = found.height;
        self.attached = Some(name);
        if stale {
            return false;
        }

        let Some(Frame::Image {
            pixels: src,
            format: src_format,
        }) = &found.frame
        else {
            return false;
        };
        let Some(len) = format.frame_len(found.width, found.height) else {
            return false;
        };
        if pixels.len() < len || src.len() != len {
            return false;
        }
        let row_len = len / found.height as usize;
        let dst = &mut pixels[..len];
        if *src_format == format {
            copy_rows(src, dst, row_len, invert);
        } else if swaps_red_blue(*src_format, format) {
            copy_rows(src, dst, row_len, invert);
            let bpp = len / (found.width as usize * found.height as usize);
            for px in dst.chunks_exact_mut(bpp) {
                px.swap(0, 2);
            }
        } else {
            return false;
        }
        true
    }

    fn receive_texture(
        &mut self,
        channel: &mut ChannelInfo,
        texture: Option<GlTexture>,
        _invert: bool,
        _host_fbo: u32,
    ) -> bool {
        let mut state = self.bus.state.lock();
        state.stats.receive_texture += 1;
        let Some(name) = state.resolve_or_active(&channel.name) else {
            return false;
        };
        let Some(found) = state.channels.get(&name) else {
            return false;
        };
        channel.name = name.clone();
        channel.width = found.width;
        channel.height = found.height;
        let has_frame = found.frame.is_some();
        self.attached = Some(name);
        texture.is_none() || has_frame
    }

    fn get_image_size(&mut self, channel: &mut ChannelInfo, memory_mode: &mut bool) -> bool {
        let mut state = self.bus.state.lock();
        state.stats.get_image_size += 1;
        let Some(name) = state.resolve(&channel.name, false) else {
            return false;
        };
        let Some(found) = state.channels.get(&name) else {
            return false;
        };
        channel.width = found.width;
        channel.height = found.height;
        channel.name = name;
        *memory_mode = state.memory_share;
        true
    }

    fn release_receiver(&mut self) {
        let mut state = self.bus.state.lock();
        state.stats.release_receiver += 1;
        if let Some(name) = self.attached.take() {
            tracing::trace!("Loopback receiver left '{}'", name);
        }
    }
}

fn swaps_red_blue(a: GlFormat, b: GlFormat) -> bool {
    matches!(
        (a, b),
        (GlFormat::RGBA, GlFormat::BGRA)
            | (GlFormat::BGRA, GlFormat::RGBA)
            | (GlFormat::RGB, GlFormat::BGR)
            | (GlFormat::BGR, GlFormat::RGB)
    )
}

/// Copy `src` into `dst` row by row, bottom-up when `invert` is set.
fn copy_rows(src: &[u8], dst: &mut [u8], row_len: usize, invert: bool) {
    if !invert {
        dst.copy_from_slice(src);
        return;
    }
    for (dst_row, src_row) in dst
        .chunks_exact_mut(row_len)
        .zip(src.chunks_exact(row_len).rev())
    {
        dst_row.copy_from_slice(src_row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender(bus: &LoopbackBus, name: &str, width: u32, height: u32) -> LoopbackSender {
        let mut s = bus.open_sender().unwrap();
        assert!(s.create_sender(name, width, height));
        s
    }

    #[test]
    fn test_name_collision_is_refused() {
        let bus = LoopbackBus::new();
        let _a = sender(&bus, "cam", 4, 4);
        let mut b = bus.open_sender().unwrap();
        assert!(!b.create_sender("cam", 4, 4));
        assert_eq!(bus.stats().create_sender, 2);
    }

    #[test]
    fn test_first_sender_becomes_active_and_is_replaced_on_release() {
        let bus = LoopbackBus::new();
        let mut a = sender(&bus, "b-cam", 4, 4);
        let _b = sender(&bus, "a-cam", 4, 4);
        assert_eq!(bus.active_channel().as_deref(), Some("b-cam"));
        a.release_sender();
        assert_eq!(bus.active_channel().as_deref(), Some("a-cam"));
    }

    #[test]
    fn test_dropping_sender_unregisters_channel() {
        let bus = LoopbackBus::new();
        {
            let _a = sender(&bus, "cam", 4, 4);
        }
        assert_eq!(bus.active_channel(), None);
        let _again = sender(&bus, "cam", 4, 4);
    }

    #[test]
    fn test_update_renames_and_resizes() {
        let bus = LoopbackBus::new();
        let mut a = sender(&bus, "cam", 2, 2);
        assert!(a.send_image(&[1; 16], 2, 2, GlFormat::RGBA, false, 0));
        assert!(a.update_sender("cam2", 4, 4));
        assert_eq!(bus.active_channel().as_deref(), Some("cam2"));

        let mut r = bus.open_receiver().unwrap();
        let mut info = ChannelInfo::new("cam2", 0, 0);
        assert!(r.create_receiver(&mut info, false));
        assert_eq!(info.dimensions(), (4, 4));

        // Resizing dropped the old frame.
        let mut buf = [0u8; 64];
        assert!(!r.receive_image(&mut info, &mut buf, GlFormat::RGBA, false, 0));
    }

    #[test]
    fn test_receive_image_reports_new_dimensions() {
        let bus = LoopbackBus::new();
        let mut a = sender(&bus, "cam", 2, 1);
        assert!(a.send_image(&[9; 8], 2, 1, GlFormat::RGBA, false, 0));

        let mut r = bus.open_receiver().unwrap();
        let mut info = ChannelInfo::new("cam", 1, 1);
        let mut buf = [0u8; 4];
        assert!(!r.receive_image(&mut info, &mut buf, GlFormat::RGBA, false, 0));
        assert_eq!(info.dimensions(), (2, 1));

        let mut buf = [0u8; 8];
        assert!(r.receive_image(&mut info, &mut buf, GlFormat::RGBA, false, 0));
        assert_eq!(buf, [9; 8]);
    }

    #[test]
    fn test_receive_image_swaps_red_and_blue() {
        let bus = LoopbackBus::new();
        let mut a = sender(&bus, "cam", 1, 1);
        assert!(a.send_image(&[1, 2, 3, 4], 1, 1, GlFormat::RGBA, false, 0));

        let mut r = bus.open_receiver().unwrap();
        let mut info = ChannelInfo::new("cam", 1, 1);
        let mut buf = [0u8; 4];
        assert!(r.receive_image(&mut info, &mut buf, GlFormat::BGRA, false, 0));
        assert_eq!(buf, [3, 2, 1, 4]);
        let mut rgb = [0u8; 3];
        assert!(!r.receive_image(&mut info, &mut rgb, GlFormat::RGB, false, 0));
    }

    #[test]
    fn test_invert_flips_rows() {
        let bus = LoopbackBus::new();
        let mut a = sender(&bus, "cam", 1, 2);
        assert!(a.send_image(&[1, 1, 1, 1, 2, 2, 2, 2], 1, 2, GlFormat::RGBA, true, 0));

        let mut r = bus.open_receiver().unwrap();
        let mut info = ChannelInfo::new("cam", 1, 2);
        let mut buf = [0u8; 8];
        assert!(r.receive_image(&mut info, &mut buf, GlFormat::RGBA, false, 0));
        assert_eq!(buf, [2, 2, 2, 2, 1, 1, 1, 1]);
    }

    #[test]
    fn test_texture_frames_poll_and_receive() {
        let bus = LoopbackBus::new();
        let mut a = sender(&bus, "cam", 8, 8);
        let tex = GlTexture::new(3, crate::gl_constants::GL_TEXTURE_2D).unwrap();

        let mut r = bus.open_receiver().unwrap();
        let mut info = ChannelInfo::new("cam", 0, 0);
        assert!(r.receive_texture(&mut info, None, false, 0));
        assert_eq!(info.dimensions(), (8, 8));
        assert!(!r.receive_texture(&mut info, Some(tex), false, 0));

        assert_eq!(bus.published_texture("cam"), None);
        assert!(a.send_texture(tex, 8, 8, true, 0));
        assert_eq!(bus.published_texture("cam"), Some(tex));
        assert!(r.receive_texture(&mut info, Some(tex), false, 0));

        // Texture frames have no CPU copy.
        let mut buf = vec![0u8; 8 * 8 * 4];
        assert!(!r.receive_image(&mut info, &mut buf, GlFormat::RGBA, false, 0));

        // An image frame replaces the recorded texture.
        assert!(a.send_image(&buf, 8, 8, GlFormat::RGBA, false, 0));
        assert_eq!(bus.published_texture("cam"), None);
    }

    #[test]
    fn test_vanished_channel_falls_back_to_active() {
        let bus = LoopbackBus::new();
        let _a = sender(&bus, "main", 2, 2);
        let mut b = sender(&bus, "side", 4, 4);

        let mut r = bus.open_receiver().unwrap();
        let mut info = ChannelInfo::new("side", 0, 0);
        assert!(r.create_receiver(&mut info, false));
        b.release_sender();

        assert!(r.receive_texture(&mut info, None, false, 0));
        assert_eq!(info, ChannelInfo::new("main", 2, 2));
    }

    #[test]
    fn test_get_image_size_reports_memory_mode() {
        let bus = LoopbackBus::with_memory_share(true);
        let _a = sender(&bus, "cam", 5, 6);
        let mut r = bus.open_receiver().unwrap();
        let mut info = ChannelInfo::new("cam", 0, 0);
        let mut memory_mode = false;
        assert!(r.get_image_size(&mut info, &mut memory_mode));
        assert!(memory_mode);
        assert_eq!(info.dimensions(), (5, 6));

        let mut missing = ChannelInfo::new("nope", 1, 1);
        assert!(!r.get_image_size(&mut missing, &mut memory_mode));
        assert_eq!(missing, ChannelInfo::new("nope", 1, 1));
    }
}
