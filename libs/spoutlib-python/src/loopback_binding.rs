// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Python handle to an in-process bus.

use pyo3::prelude::*;
use spoutlib::LoopbackBus;

/// An in-process video bus.
///
/// Pass it to `Sender(bus=...)` and `Receiver(bus=...)` to exercise the API
/// without the native library or a GPU. Endpoints sharing a bus see each
/// other's channels.
///
/// Example:
///     bus = LoopbackBus()
///     sender = Sender(bus=bus)
///     receiver = Receiver(bus=bus)
#[pyclass(name = "LoopbackBus")]
pub struct PyLoopbackBus {
    inner: LoopbackBus,
}

impl PyLoopbackBus {
    pub fn bus(&self) -> &LoopbackBus {
        &self.inner
    }
}

#[pymethods]
impl PyLoopbackBus {
    #[new]
    #[pyo3(signature = (memory_mode=false))]
    pub fn new(memory_mode: bool) -> Self {
        Self {
            inner: LoopbackBus::with_memory_share(memory_mode),
        }
    }

    /// Name of the channel receivers attach to with `use_active=True`.
    #[getter]
    fn active_channel(&self) -> Option<String> {
        self.inner.active_channel()
    }

    /// Total number of transport calls that reached this bus.
    #[getter]
    fn call_count(&self) -> u64 {
        self.inner.stats().total()
    }

    fn __repr__(&self) -> String {
        match self.inner.active_channel() {
            Some(name) => format!("LoopbackBus(active='{}')", name),
            None => "LoopbackBus(active=None)".to_string(),
        }
    }
}
