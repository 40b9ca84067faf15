//! Export configuration (meshweld.toml)
//!
//! Every section and key is optional:
//!
//! ```toml
//! [parse]
//! flip_v = true
//!
//! [build]
//! winding = "counter-clockwise"   # or "clockwise"
//! smoothing = "per-shape"         # or "per-group"
//! ```

use anyhow::{Context, Result};
use meshweld_core::BuildOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::obj::ParseOptions;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default)]
    pub parse: ParseOptions,
    #[serde(default)]
    pub build: BuildOptions,
}

impl ExportConfig {
    /// Load a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config: {:?}", path))
    }

    /// Load `path` if given, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
