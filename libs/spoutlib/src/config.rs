// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Backend configuration.
//!
//! ```toml
//! backend = "native"                 # or "loopback"
//! library_path = "C:/spout/spout_bridge.dll"
//! memory_share = false               # loopback only
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, SpoutError};

/// Which transport backend endpoints are opened against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// The Spout bridge library (Windows).
    #[default]
    Native,
    /// The in-process bus.
    Loopback,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpoutConfig {
    pub backend: BackendKind,
    /// Bridge library to load. Defaults to `spout_bridge.dll`, resolved by
    /// the platform's library search order.
    pub library_path: Option<PathBuf>,
    /// Whether loopback channels report shared-memory mode.
    pub memory_share: bool,
}

impl SpoutConfig {
    /// Environment variable naming a TOML config file.
    pub const ENV_VAR: &'static str = "SPOUTLIB_CONFIG";

    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| SpoutError::Configuration(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Read the file named by `SPOUTLIB_CONFIG`, or fall back to defaults.
    pub fn load() -> Result<Self> {
        match std::env::var_os(Self::ENV_VAR) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn library_path(&self) -> PathBuf {
        self.library_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(libloading::library_filename("spout_bridge")))
    }
}
