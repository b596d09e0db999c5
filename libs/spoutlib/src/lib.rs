// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Sender and Receiver endpoints for the Spout inter-application video bus.
//!
//! The bus itself (shared GPU textures, the shared-memory fallback, the
//! machine-wide sender registry) lives in an external native library. This
//! crate is the adapter in front of it: each endpoint owns exactly one
//! transport object, binds it to a named channel, forwards pixel or texture
//! frames, and releases it on every exit path, including drop.
//!
//! Endpoints are generic over a [`TransportBackend`]:
//! - [`NativeBackend`] loads the bridge library at runtime (Windows only).
//! - [`LoopbackBus`] is an in-process bus with the same semantics, used for
//!   tests and for hosts that want to exercise the API without a GPU.
//!
//! ```ignore
//! use spoutlib::{GlFormat, LoopbackBus, Receiver, Sender};
//!
//! let bus = LoopbackBus::new();
//! let mut sender = Sender::new(bus.clone());
//! sender.create("preview", 640, 480)?;
//! sender.send_image(&pixels, 640, 480, GlFormat::RGBA, false, 0)?;
//!
//! let mut receiver = Receiver::new(bus);
//! receiver.create("preview", false)?;
//! let outcome = receiver.receive_image("", &mut buffer, GlFormat::RGBA, false, 0)?;
//! ```

pub mod channel;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod gl;
pub mod transport;

pub use channel::{ChannelInfo, ImageSize, ReceiveOutcome};
pub use config::{BackendKind, SpoutConfig};
pub use endpoint::{Receiver, Sender};
pub use error::{ErrorCategory, Result, SpoutError};
pub use gl::{GlFormat, GlTexture, gl_constants};
pub use transport::loopback::{LoopbackBus, TransportStats};
pub use transport::native::NativeBackend;
pub use transport::{Backend, ReceiverTransport, SenderTransport, TransportBackend};
