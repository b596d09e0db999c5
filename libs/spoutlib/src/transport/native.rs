// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Native transport, reached through a C ABI bridge library.
//!
//! The Spout SDK exposes its sender/receiver as C++ objects. The bridge
//! library wraps one such object per handle behind flat `extern "C"`
//! functions, which this module resolves at runtime with `libloading`:
//!
//! ```text
//! const uint32_t SPOUT_BRIDGE_ABI_VERSION;            // must be 1
//!
//! void* spout_sender_new(void);
//! void  spout_sender_free(void* h);
//! bool  spout_create_sender(void* h, const char* name, uint32_t w, uint32_t h);
//! bool  spout_update_sender(void* h, const char* name, uint32_t w, uint32_t h);
//! void  spout_release_sender(void* h);
//! bool  spout_send_image(void* h, const uint8_t* px, uint32_t w, uint32_t h,
//!                        uint32_t gl_format, bool invert, uint32_t host_fbo);
//! bool  spout_send_texture(void* h, uint32_t tex, uint32_t target, uint32_t w,
//!                          uint32_t h, bool invert, uint32_t host_fbo);
//!
//! void* spout_receiver_new(void);
//! void  spout_receiver_free(void* h);
//! bool  spout_create_receiver(void* h, char name[256], uint32_t* w, uint32_t* h,
//!                             bool use_active);
//! bool  spout_receive_image(void* h, char name[256], uint32_t* w, uint32_t* h,
//!                           uint8_t* px, uint32_t gl_format, bool invert,
//!                           uint32_t host_fbo);
//! bool  spout_receive_texture(void* h, char name[256], uint32_t* w, uint32_t* h,
//!                             uint32_t tex, uint32_t target, bool invert,
//!                             uint32_t host_fbo);
//! bool  spout_get_image_size(void* h, char name[256], uint32_t* w, uint32_t* h,
//!                            bool* memory_mode);
//! void  spout_release_receiver(void* h);
//! ```
//!
//! Pixel buffers are passed straight through; their size has already been
//! checked by the endpoint against the `w`/`h` passed in. When the sender's
//! resolution differs, `spout_receive_image` must report the new size and
//! return false without copying.

use std::ffi::{CStr, CString, c_char, c_void};
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::sync::Arc;

use libloading::Library;
use parking_lot::Mutex;

use super::{ReceiverTransport, SenderTransport, TransportBackend};
use crate::channel::{ChannelInfo, MAX_NAME_LEN};
use crate::error::{Result, SpoutError};
use crate::gl::{GlFormat, GlTexture};

/// Bridge ABI version this crate speaks.
pub const SPOUT_BRIDGE_ABI_VERSION: u32 = 1;

/// Size of the in/out name buffer, terminator included.
const NAME_CAPACITY: usize = MAX_NAME_LEN + 1;

type HandleNewFn = unsafe extern "C" fn() -> *mut c_void;
type HandleFreeFn = unsafe extern "C" fn(*mut c_void);
type SenderIdentityFn = unsafe extern "C" fn(*mut c_void, *const c_char, u32, u32) -> bool;
type ReleaseFn = unsafe extern "C" fn(*mut c_void);
type SendImageFn =
    unsafe extern "C" fn(*mut c_void, *const u8, u32, u32, u32, bool, u32) -> bool;
type SendTextureFn = unsafe extern "C" fn(*mut c_void, u32, u32, u32, u32, bool, u32) -> bool;
type CreateReceiverFn =
    unsafe extern "C" fn(*mut c_void, *mut c_char, *mut u32, *mut u32, bool) -> bool;
type ReceiveImageFn = unsafe extern "C" fn(
    *mut c_void,
    *mut c_char,
    *mut u32,
    *mut u32,
    *mut u8,
    u32,
    bool,
    u32,
) -> bool;
type ReceiveTextureFn = unsafe extern "C" fn(
    *mut c_void,
    *mut c_char,
    *mut u32,
    *mut u32,
    u32,
    u32,
    bool,
    u32,
) -> bool;
type GetImageSizeFn =
    unsafe extern "C" fn(*mut c_void, *mut c_char, *mut u32, *mut u32, *mut bool) -> bool;

/// Resolved bridge entry points. Holding the `Library` keeps them valid.
struct BridgeApi {
    sender_new: HandleNewFn,
    sender_free: HandleFreeFn,
    create_sender: SenderIdentityFn,
    update_sender: SenderIdentityFn,
    release_sender: ReleaseFn,
    send_image: SendImageFn,
    send_texture: SendTextureFn,
    receiver_new: HandleNewFn,
    receiver_free: HandleFreeFn,
    create_receiver: CreateReceiverFn,
    receive_image: ReceiveImageFn,
    receive_texture: ReceiveTextureFn,
    get_image_size: GetImageSizeFn,
    release_receiver: ReleaseFn,
    _library: Library,
}

/// Copy a function pointer out of `library`.
///
/// # Safety
/// `T` must match the symbol's real signature.
unsafe fn symbol<T: Copy>(library: &Library, name: &'static [u8]) -> Result<T> {
    let sym = unsafe { library.get::<T>(name) }.map_err(|e| {
        SpoutError::Library(format!(
            "missing symbol {}: {}",
            String::from_utf8_lossy(name.strip_suffix(b"\0").unwrap_or(name)),
            e
        ))
    })?;
    Ok(*sym)
}

impl BridgeApi {
    fn load(path: &Path) -> Result<Self> {
        let library = unsafe { Library::new(path) }.map_err(|e| {
            SpoutError::Library(format!("failed to load {}: {}", path.display(), e))
        })?;

        let version = unsafe {
            let sym = library
                .get::<*const u32>(b"SPOUT_BRIDGE_ABI_VERSION\0")
                .map_err(|e| {
                    SpoutError::Library(format!(
                        "'{}' is not a Spout bridge (no SPOUT_BRIDGE_ABI_VERSION): {}",
                        path.display(),
                        e
                    ))
                })?;
            **sym
        };
        if version != SPOUT_BRIDGE_ABI_VERSION {
            return Err(SpoutError::Library(format!(
                "ABI version mismatch for '{}': bridge has v{}, expected v{}",
                path.display(),
                version,
                SPOUT_BRIDGE_ABI_VERSION
            )));
        }

        unsafe {
            Ok(Self {
                sender_new: symbol(&library, b"spout_sender_new\0")?,
                sender_free: symbol(&library, b"spout_sender_free\0")?,
                create_sender: symbol(&library, b"spout_create_sender\0")?,
                update_sender: symbol(&library, b"spout_update_sender\0")?,
                release_sender: symbol(&library, b"spout_release_sender\0")?,
                send_image: symbol(&library, b"spout_send_image\0")?,
                send_texture: symbol(&library, b"spout_send_texture\0")?,
                receiver_new: symbol(&library, b"spout_receiver_new\0")?,
                receiver_free: symbol(&library, b"spout_receiver_free\0")?,
                create_receiver: symbol(&library, b"spout_create_receiver\0")?,
                receive_image: symbol(&library, b"spout_receive_image\0")?,
                receive_texture: symbol(&library, b"spout_receive_texture\0")?,
                get_image_size: symbol(&library, b"spout_get_image_size\0")?,
                release_receiver: symbol(&library, b"spout_release_receiver\0")?,
                _library: library,
            })
        }
    }
}

/// Backend that opens native transport objects from the bridge library.
///
/// The library is loaded on the first `open_*` call and shared by every
/// clone and every handle opened from it.
#[derive(Clone)]
pub struct NativeBackend {
    library_path: PathBuf,
    api: Arc<Mutex<Option<Arc<BridgeApi>>>>,
}

impl NativeBackend {
    pub fn new(library_path: impl Into<PathBuf>) -> Self {
        Self {
            library_path: library_path.into(),
            api: Arc::new(Mutex::new(None)),
        }
    }

    pub fn library_path(&self) -> &Path {
        &self.library_path
    }

    fn api(&self) -> Result<Arc<BridgeApi>> {
        if !cfg!(target_os = "windows") {
            return Err(SpoutError::Unsupported);
        }
        let mut slot = self.api.lock();
        if let Some(api) = slot.as_ref() {
            return Ok(Arc::clone(api));
        }
        let api = BridgeApi::load(&self.library_path).inspect_err(|e| {
            tracing::warn!("Spout bridge unavailable: {}", e);
        })?;
        tracing::debug!("Loaded Spout bridge from {}", self.library_path.display());
        let api = Arc::new(api);
        *slot = Some(Arc::clone(&api));
        Ok(api)
    }
}

impl TransportBackend for NativeBackend {
    type Sender = NativeSender;
    type Receiver = NativeReceiver;

    fn open_sender(&self) -> Result<NativeSender> {
        let api = self.api()?;
        let handle = NonNull::new(unsafe { (api.sender_new)() })
            .ok_or_else(|| SpoutError::Library("spout_sender_new returned null".into()))?;
        Ok(NativeSender { api, handle })
    }

    fn open_receiver(&self) -> Result<NativeReceiver> {
        let api = self.api()?;
        let handle = NonNull::new(unsafe { (api.receiver_new)() })
            .ok_or_else(|| SpoutError::Library("spout_receiver_new returned null".into()))?;
        Ok(NativeReceiver { api, handle })
    }
}

// =============================================================================
// Sender
// =============================================================================

/// One native sender object. Freed on drop.
pub struct NativeSender {
    api: Arc<BridgeApi>,
    handle: NonNull<c_void>,
}

impl SenderTransport for NativeSender {
    fn create_sender(&mut self, name: &str, width: u32, height: u32) -> bool {
        let Ok(name) = CString::new(name) else {
            return false;
        };
        unsafe { (self.api.create_sender)(self.handle.as_ptr(), name.as_ptr(), width, height) }
    }

    fn update_sender(&mut self, name: &str, width: u32, height: u32) -> bool {
        let Ok(name) = CString::new(name) else {
            return false;
        };
        unsafe { (self.api.update_sender)(self.handle.as_ptr(), name.as_ptr(), width, height) }
    }

    fn release_sender(&mut self) {
        unsafe { (self.api.release_sender)(self.handle.as_ptr()) }
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
        unsafe {
            (self.api.send_image)(
                self.handle.as_ptr(),
                pixels.as_ptr(),
                width,
                height,
                format.as_raw(),
                invert,
                host_fbo,
            )
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
        unsafe {
            (self.api.send_texture)(
                self.handle.as_ptr(),
                texture.id(),
                texture.target(),
                width,
                height,
                invert,
                host_fbo,
            )
        }
    }
}

impl Drop for NativeSender {
    fn drop(&mut self) {
        unsafe { (self.api.sender_free)(self.handle.as_ptr()) }
    }
}

// =============================================================================
// Receiver
// =============================================================================

/// One native receiver object. Freed on drop.
pub struct NativeReceiver {
    api: Arc<BridgeApi>,
    handle: NonNull<c_void>,
}

impl NativeReceiver {
    fn with_channel(
        &mut self,
        channel: &mut ChannelInfo,
        call: impl FnOnce(&BridgeApi, *mut c_void, *mut c_char, *mut u32, *mut u32) -> bool,
    ) -> bool {
        let api = &*self.api;
        let handle = self.handle.as_ptr();
        marshal_channel(channel, |name, width, height| {
            call(api, handle, name, width, height)
        })
    }
}

/// Run `call` with the in/out name buffer and dimension pointers, then copy
/// whatever it wrote back into `channel`.
///
/// Names longer than the buffer are truncated on the way in. The reported
/// name is read up to the first NUL (the last byte is always forced to NUL)
/// and converted lossily.
fn marshal_channel(
    channel: &mut ChannelInfo,
    call: impl FnOnce(*mut c_char, *mut u32, *mut u32) -> bool,
) -> bool {
    let mut name = [0 as c_char; NAME_CAPACITY];
    let bytes = channel.name.as_bytes();
    let len = bytes.len().min(MAX_NAME_LEN);
    for (dst, src) in name.iter_mut().zip(&bytes[..len]) {
        *dst = *src as c_char;
    }
    let mut width = channel.width;
    let mut height = channel.height;

    let ok = call(name.as_mut_ptr(), &mut width, &mut height);

    // Force termination in case the bridge filled the whole buffer.
    name[MAX_NAME_LEN] = 0;
    let reported = unsafe { CStr::from_ptr(name.as_ptr()) };
    channel.name = reported.to_string_lossy().into_owned();
    channel.width = width;
    channel.height = height;
    ok
}

impl ReceiverTransport for NativeReceiver {
    fn create_receiver(&mut self, channel: &mut ChannelInfo, use_active: bool) -> bool {
        self.with_channel(channel, |api, handle, name, width, height| unsafe {
            (api.create_receiver)(handle, name, width, height, use_active)
        })
    }

    fn receive_image(
        &mut self,
        channel: &mut ChannelInfo,
        pixels: &mut [u8],
        format: GlFormat,
        invert: bool,
        host_fbo: u32,
    ) -> bool {
        let buffer = pixels.as_mut_ptr();
        self.with_channel(channel, |api, handle, name, width, height| unsafe {
            (api.receive_image)(
                handle,
                name,
                width,
                height,
                buffer,
                format.as_raw(),
                invert,
                host_fbo,
            )
        })
    }

    fn receive_texture(
        &mut self,
        channel: &mut ChannelInfo,
        texture: Option<GlTexture>,
        invert: bool,
        host_fbo: u32,
    ) -> bool {
        let (id, target) = texture.map_or((0, 0), |t| (t.id(), t.target()));
        self.with_channel(channel, |api, handle, name, width, height| unsafe {
            (api.receive_texture)(handle, name, width, height, id, target, invert, host_fbo)
        })
    }

    fn get_image_size(&mut self, channel: &mut ChannelInfo, memory_mode: &mut bool) -> bool {
        self.with_channel(channel, |api, handle, name, width, height| unsafe {
            (api.get_image_size)(handle, name, width, height, std::ptr::from_mut(memory_mode))
        })
    }

    fn release_receiver(&mut self) {
        unsafe { (self.api.release_receiver)(self.handle.as_ptr()) }
    }
}

impl Drop for NativeReceiver {
    fn drop(&mut self) {
        unsafe { (self.api.receiver_free)(self.handle.as_ptr()) }
    }
}
