use serde::{Deserialize, Serialize};

use crate::error::{TraverseError, TraverseResult};

/// How the traverser walks nested values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TraversalStrategy {
    /// Native recursion, one call per nested object or array.
    #[default]
    Recursive,
    /// Explicit task stack; nesting depth is not bounded by the thread stack.
    WorkStack,
}

/// Configuration for one traversal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraverseConfig {
    /// Elements per chunk for `@()name` properties.
    pub default_chunk_size: u32,
    /// Maximum number of simultaneously open object and array frames.
    pub max_depth: usize,
    pub strategy: TraversalStrategy,
    /// Add `totalChildrenCount` (the closure size) to every object before
    /// hashing.
    pub emit_total_children_count: bool,
}

impl Default for TraverseConfig {
    fn default() -> Self {
        Self {
            default_chunk_size: 1000,
            max_depth: 256,
            strategy: TraversalStrategy::Recursive,
            emit_total_children_count: false,
        }
    }
}

impl TraverseConfig {
    /// Default settings driven by an explicit task stack.
    pub fn work_stack() -> Self {
        Self {
            strategy: TraversalStrategy::WorkStack,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> TraverseResult<()> {
        if self.default_chunk_size == 0 {
            return Err(TraverseError::InvalidConfig(
                "default_chunk_size must be positive".into(),
            ));
        }
        if self.max_depth == 0 {
            return Err(TraverseError::InvalidConfig("max_depth must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = TraverseConfig::default();
        assert_eq!(c.default_chunk_size, 1000);
        assert_eq!(c.max_depth, 256);
        assert_eq!(c.strategy, TraversalStrategy::Recursive);
        assert!(!c.emit_total_children_count);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn zero_chunk_size_is_invalid() {
        let c = TraverseConfig {
            default_chunk_size: 0,
            ..Default::default()
        };
        assert!(matches!(c.validate(), Err(TraverseError::InvalidConfig(_))));
    }

    #[test]
    fn strategy_uses_kebab_case() {
        let json = serde_json::to_string(&TraversalStrategy::WorkStack).unwrap();
        assert_eq!(json, "\"work-stack\"");
    }

    #[test]
    fn missing_fields_take_defaults() {
        let c: TraverseConfig = serde_json::from_str(r#"{ "strategy": "work-stack" }"#).unwrap();
        assert_eq!(c, TraverseConfig::work_stack());
    }
}
