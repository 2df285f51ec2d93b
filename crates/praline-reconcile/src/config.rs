//! Binding configuration
//!
//! Controls how keyed-children bindings reconcile a changed list.

use serde::{Deserialize, Serialize};

/// How a keyed-children binding turns the new list into host-tree mutations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReconcileStrategy {
    /// Walk the new list once, reusing nodes by key and repositioning in place
    #[default]
    Inline,
    /// Compute an edit script with [`diff`](crate::diff) and apply it with
    /// [`apply_edits`](crate::apply_edits)
    Diff,
}

/// Configuration for keyed-children bindings
///
/// # Example
///
/// ```
/// use praline_reconcile::{BindingConfig, ReconcileStrategy};
///
/// let config = BindingConfig::default();
/// assert_eq!(config.strategy, ReconcileStrategy::Inline);
/// assert!(config.memoize);
///
/// let config = BindingConfig::with_strategy(ReconcileStrategy::Diff).without_memoization();
/// assert_eq!(config.strategy, ReconcileStrategy::Diff);
/// assert!(!config.memoize);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingConfig {
    /// Reconciliation strategy
    pub strategy: ReconcileStrategy,
    /// Reuse built nodes for list items seen before (by `Rc` identity)
    pub memoize: bool,
}

impl BindingConfig {
    /// Default configuration with the given strategy
    pub fn with_strategy(strategy: ReconcileStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// Disable the per-item node cache
    pub fn without_memoization(mut self) -> Self {
        self.memoize = false;
        self
    }
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            strategy: ReconcileStrategy::Inline,
            memoize: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BindingConfig::default();
        assert_eq!(config.strategy, ReconcileStrategy::Inline);
        assert!(config.memoize);
    }

    #[test]
    fn test_config_from_ron() {
        let config: BindingConfig = ron::from_str("(strategy: Diff)").expect("deserialize");
        assert_eq!(config.strategy, ReconcileStrategy::Diff);
        assert!(config.memoize);

        let config: BindingConfig = ron::from_str("(memoize: false)").expect("deserialize");
        assert_eq!(config, BindingConfig::default().without_memoization());
    }

    #[test]
    fn test_config_roundtrip() {
        let config = BindingConfig::with_strategy(ReconcileStrategy::Diff);
        let serialized = ron::to_string(&config).expect("serialize");
        let deserialized: BindingConfig = ron::from_str(&serialized).expect("deserialize");
        assert_eq!(deserialized, config);
    }
}
