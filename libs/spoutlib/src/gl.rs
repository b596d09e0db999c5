// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! OpenGL tokens accepted by the endpoints.
//!
//! Texture names, texture targets, framebuffer names and pixel-format enums
//! are opaque to this crate: they are forwarded to the transport as given.
//! The only thing read out of them is the byte size of a pixel, so that an
//! undersized buffer is rejected before the transport copies out of it.

/// OpenGL constants used with Spout.
pub mod gl_constants {
    /// GL_TEXTURE_2D - standard 2D texture.
    pub const GL_TEXTURE_2D: u32 = 0x0DE1;
    /// GL_TEXTURE_RECTANGLE - non-normalized texture coordinates.
    pub const GL_TEXTURE_RECTANGLE: u32 = 0x84F5;
    /// GL_RGBA8 - 8-bit RGBA internal format.
    pub const GL_RGBA8: u32 = 0x8058;

    pub const GL_RED: u32 = 0x1903;
    pub const GL_RGB: u32 = 0x1907;
    pub const GL_RGBA: u32 = 0x1908;
    pub const GL_LUMINANCE: u32 = 0x1909;
    pub const GL_LUMINANCE_ALPHA: u32 = 0x190A;
    pub const GL_BGR: u32 = 0x80E0;
    pub const GL_BGRA: u32 = 0x80E1;
    pub const GL_RG: u32 = 0x8227;
}

use gl_constants::*;

/// A pixel-format token (`GLenum`) for image transfers.
///
/// Any value is accepted and forwarded. Component type is assumed to be
/// `GL_UNSIGNED_BYTE`, which is what the transport uses for image copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlFormat(pub u32);

impl GlFormat {
    pub const RED: GlFormat = GlFormat(GL_RED);
    pub const RG: GlFormat = GlFormat(GL_RG);
    pub const RGB: GlFormat = GlFormat(GL_RGB);
    pub const BGR: GlFormat = GlFormat(GL_BGR);
    pub const RGBA: GlFormat = GlFormat(GL_RGBA);
    pub const BGRA: GlFormat = GlFormat(GL_BGRA);
    pub const LUMINANCE: GlFormat = GlFormat(GL_LUMINANCE);
    pub const LUMINANCE_ALPHA: GlFormat = GlFormat(GL_LUMINANCE_ALPHA);

    #[inline]
    pub const fn as_raw(self) -> u32 {
        self.0
    }

    /// Bytes per pixel, or `None` for a token this crate does not know.
    pub const fn bytes_per_pixel(self) -> Option<usize> {
        match self.0 {
            GL_RED | GL_LUMINANCE => Some(1),
            GL_RG | GL_LUMINANCE_ALPHA => Some(2),
            GL_RGB | GL_BGR => Some(3),
            GL_RGBA | GL_BGRA => Some(4),
            _ => None,
        }
    }

    /// Byte length of one tightly packed `width` x `height` frame.
    ///
    /// Saturates instead of overflowing, so an absurd size can never pass a
    /// `len >= frame_len` check.
    pub fn frame_len(self, width: u32, height: u32) -> Option<usize> {
        let bpp = self.bytes_per_pixel()?;
        Some(
            (width as usize)
                .saturating_mul(height as usize)
                .saturating_mul(bpp),
        )
    }

    /// Smallest buffer the transport may touch for one frame.
    ///
    /// Unknown tokens are still forwarded, but sized as 4 bytes per pixel so
    /// the transport can never read or write past the caller's buffer.
    pub fn min_buffer_len(self, width: u32, height: u32) -> usize {
        self.frame_len(width, height).unwrap_or_else(|| {
            (width as usize)
                .saturating_mul(height as usize)
                .saturating_mul(4)
        })
    }
}

impl Default for GlFormat {
    fn default() -> Self {
        GlFormat::RGBA
    }
}

impl From<u32> for GlFormat {
    fn from(raw: u32) -> Self {
        GlFormat(raw)
    }
}

/// An existing OpenGL texture owned by the caller.
///
/// Texture name 0 is the GL default texture and never a valid transfer
/// source, so it cannot be represented here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlTexture {
    id: u32,
    target: u32,
}

impl GlTexture {
    pub fn new(id: u32, target: u32) -> Option<Self> {
        (id != 0).then_some(Self { id, target })
    }

    /// The OpenGL texture name.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// The OpenGL texture target (usually GL_TEXTURE_2D).
    pub fn target(&self) -> u32 {
        self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_per_pixel() {
        assert_eq!(GlFormat::RGBA.bytes_per_pixel(), Some(4));
        assert_eq!(GlFormat::BGRA.bytes_per_pixel(), Some(4));
        assert_eq!(GlFormat::RGB.bytes_per_pixel(), Some(3));
        assert_eq!(GlFormat::LUMINANCE.bytes_per_pixel(), Some(1));
        assert_eq!(GlFormat(0x1234).bytes_per_pixel(), None);
    }

    #[test]
    fn test_frame_len() {
        assert_eq!(GlFormat::RGBA.frame_len(1920, 1080), Some(1920 * 1080 * 4));
        assert_eq!(GlFormat(0x1234).frame_len(2, 2), None);
        assert_eq!(GlFormat(0x1234).min_buffer_len(2, 2), 16);
        assert_eq!(GlFormat::LUMINANCE.min_buffer_len(2, 2), 4);
        assert_eq!(
            GlFormat::RGBA.frame_len(u32::MAX, u32::MAX),
            Some((u32::MAX as usize).saturating_mul(u32::MAX as usize).saturating_mul(4))
        );
    }

    #[test]
    fn test_texture_zero_is_rejected() {
        assert!(GlTexture::new(0, gl_constants::GL_TEXTURE_2D).is_none());
        let tex = GlTexture::new(7, gl_constants::GL_TEXTURE_2D).unwrap();
        assert_eq!(tex.id(), 7);
        assert_eq!(tex.target(), gl_constants::GL_TEXTURE_2D);
    }
}
