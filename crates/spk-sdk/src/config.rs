//! Serializer configuration, loadable from TOML.
//!
//! ```toml
//! max_batch_bytes = 500000
//!
//! [traverse]
//! default_chunk_size = 5000
//! strategy = "work-stack"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use spk_batch::DEFAULT_MAX_BATCH_BYTES;
use spk_traverse::TraverseConfig;

use crate::error::{SdkError, SdkResult};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializerConfig {
    pub traverse: TraverseConfig,
    /// Upper bound on the byte length of one transmission batch.
    pub max_batch_bytes: usize,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            traverse: TraverseConfig::default(),
            max_batch_bytes: DEFAULT_MAX_BATCH_BYTES,
        }
    }
}

impl SerializerConfig {
    pub fn from_toml_str(text: &str) -> SdkResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| SdkError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file.
    pub fn load(path: &Path) -> SdkResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> SdkResult<()> {
        self.traverse
            .validate()
            .map_err(|e| SdkError::Config(e.to_string()))?;
        if self.max_batch_bytes == 0 {
            return Err(SdkError::Config("max_batch_bytes must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spk_traverse::TraversalStrategy;

    #[test]
    fn empty_toml_is_default() {
        let config = SerializerConfig::from_toml_str("").unwrap();
        assert_eq!(config, SerializerConfig::default());
        assert_eq!(config.max_batch_bytes, 1_000_000);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = SerializerConfig::from_toml_str(
            "max_batch_bytes = 4096\n[traverse]\nstrategy = \"work-stack\"\n",
        )
        .unwrap();
        assert_eq!(config.max_batch_bytes, 4096);
        assert_eq!(config.traverse.strategy, TraversalStrategy::WorkStack);
        assert_eq!(config.traverse.default_chunk_size, 1000);
    }

    #[test]
    fn invalid_values_are_rejected() {
        for text in [
            "max_batch_bytes = 0",
            "[traverse]\ndefault_chunk_size = 0",
            "[traverse]\nstrategy = \"sideways\"",
        ] {
            assert!(
                matches!(SerializerConfig::from_toml_str(text), Err(SdkError::Config(_))),
                "{text} should be rejected"
            );
        }
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spk.toml");
        std::fs::write(&path, "[traverse]\nmax_depth = 64\n").unwrap();
        assert_eq!(SerializerConfig::load(&path).unwrap().traverse.max_depth, 64);

        let missing = SerializerConfig::load(&dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(SdkError::Io(_))));
    }
}
