// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Process-wide backend selection for endpoints created from Python.

use std::sync::OnceLock;

use pyo3::prelude::*;
use spoutlib::{Backend, SpoutConfig};

use crate::loopback_binding::PyLoopbackBus;

static DEFAULT_BACKEND: OnceLock<Backend> = OnceLock::new();

/// Backend used when an endpoint is constructed without an explicit bus.
///
/// Chosen once, from `SpoutConfig::load()`. A broken config file is logged
/// and replaced by the defaults rather than failing every constructor.
pub(crate) fn default_backend() -> Backend {
    DEFAULT_BACKEND
        .get_or_init(|| {
            let config = SpoutConfig::load().unwrap_or_else(|e| {
                tracing::warn!(
                    "Ignoring {}: {}; using default configuration",
                    SpoutConfig::ENV_VAR,
                    e
                );
                SpoutConfig::default()
            });
            tracing::debug!("Spout backend: {:?}", config.backend);
            Backend::from_config(&config)
        })
        .clone()
}

pub(crate) fn resolve(bus: Option<PyRef<'_, PyLoopbackBus>>) -> Backend {
    match bus {
        Some(bus) => Backend::from(bus.bus().clone()),
        None => default_backend(),
    }
}
