//! Mirroring configuration
//!
//! Mirroring only happens in worklet mode and can be switched off as a whole
//! with `prevent_mirroring`, or per wrap with [`WrapOptions::suppressed`].
//! The config is a plain value handed to [`Mirror::new`](super::Mirror::new).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::snapshot::DEFAULT_SNAPSHOT_DEPTH;
use crate::error::{Result, UgenError};

/// Where audio processing runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Same context as the authoring code; nothing to mirror
    #[default]
    Local,
    /// Separate audio context fed through the mirror channel
    Worklet,
}

/// Process-level mirroring switches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    pub mode: ExecutionMode,
    pub prevent_mirroring: bool,
    /// Nesting limit for full sequence-producer snapshots
    pub max_depth: usize,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Local,
            prevent_mirroring: false,
            max_depth: DEFAULT_SNAPSHOT_DEPTH,
        }
    }
}

impl MirrorConfig {
    /// Mirroring enabled
    pub fn worklet() -> Self {
        Self {
            mode: ExecutionMode::Worklet,
            ..Self::default()
        }
    }

    /// Mirroring disabled
    pub fn local() -> Self {
        Self::default()
    }

    pub fn with_prevent_mirroring(mut self, prevent: bool) -> Self {
        self.prevent_mirroring = prevent;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Whether wrapping sends messages
    pub fn is_active(&self) -> bool {
        self.mode == ExecutionMode::Worklet && !self.prevent_mirroring
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(UgenError::Config {
                reason: "max_depth must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Parse and validate a JSON config; missing fields take defaults
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: MirrorConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

/// Per-wrap override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WrapOptions {
    pub suppress: bool,
}

impl WrapOptions {
    /// Wrap without mirroring regardless of mode
    pub fn suppressed() -> Self {
        Self { suppress: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_activation() {
        assert!(!MirrorConfig::local().is_active());
        assert!(MirrorConfig::worklet().is_active());
        assert!(!MirrorConfig::worklet().with_prevent_mirroring(true).is_active());
    }

    #[test]
    fn test_json_defaults() {
        let config = MirrorConfig::from_json_str(r#"{ "mode": "worklet" }"#).unwrap();
        assert_eq!(config.mode, ExecutionMode::Worklet);
        assert!(!config.prevent_mirroring);
        assert_eq!(config.max_depth, DEFAULT_SNAPSHOT_DEPTH);
    }

    #[test]
    fn test_zero_depth_rejected() {
        let err = MirrorConfig::from_json_str(r#"{ "max_depth": 0 }"#).unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_unknown_mode_rejected() {
        assert!(MirrorConfig::from_json_str(r#"{ "mode": "remote" }"#).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mirror.json");
        std::fs::write(&path, r#"{ "mode": "worklet", "prevent_mirroring": true }"#).unwrap();

        let config = MirrorConfig::load(&path).unwrap();
        assert_eq!(config.mode, ExecutionMode::Worklet);
        assert!(!config.is_active());

        assert!(MirrorConfig::load(&dir.path().join("missing.json")).is_err());
    }
}
