// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Zero-copy access to Python pixel buffers.
//!
//! Anything exporting the buffer protocol with byte items works: `bytes`,
//! `bytearray`, `memoryview`, `uint8` numpy arrays. The memory must be
//! C-contiguous; writes additionally need a writable export.

use pyo3::buffer::PyBuffer;
use pyo3::prelude::*;

pub(crate) struct PixelView {
    buffer: PyBuffer<u8>,
}

impl PixelView {
    /// Borrow `obj` for reading.
    pub fn readable(obj: &Bound<'_, PyAny>) -> PyResult<Self> {
        let buffer = PyBuffer::<u8>::get(obj)?;
        if !buffer.is_c_contiguous() {
            return Err(pyo3::exceptions::PyValueError::new_err(
                "pixel buffer must be C-contiguous",
            ));
        }
        Ok(Self { buffer })
    }

    /// Borrow `obj` for writing.
    pub fn writable(obj: &Bound<'_, PyAny>) -> PyResult<Self> {
        let view = Self::readable(obj)?;
        if view.buffer.readonly() {
            return Err(pyo3::exceptions::PyValueError::new_err(
                "pixel buffer is read-only; pass a bytearray or writable array",
            ));
        }
        Ok(view)
    }

    /// The exported bytes.
    ///
    /// Taking `py` ties the borrow to a held GIL, so Python code cannot
    /// resize or free the exporter while Rust reads it.
    pub fn as_slice(&self, _py: Python<'_>) -> &[u8] {
        let len = self.buffer.len_bytes();
        if len == 0 {
            return &[];
        }
        // SAFETY: the export is C-contiguous, `len` bytes long and pinned
        // until `self.buffer` is released.
        unsafe { std::slice::from_raw_parts(self.buffer.buf_ptr() as *const u8, len) }
    }

    /// Mutable access to the exported bytes. See [`as_slice`](Self::as_slice).
    pub fn as_mut_slice(&mut self, _py: Python<'_>) -> &mut [u8] {
        let len = self.buffer.len_bytes();
        if len == 0 {
            return &mut [];
        }
        // SAFETY: as for `as_slice`; the export is writable and `&mut self`
        // keeps this the only Rust view of it.
        unsafe { std::slice::from_raw_parts_mut(self.buffer.buf_ptr() as *mut u8, len) }
    }
}
