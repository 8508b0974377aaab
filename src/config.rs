//! Engine configuration.
//!
//! The engine reads no environment variables or command-line flags; hosts
//! build a [`PipelineConfig`] directly or deserialize one from any serde
//! format. Missing fields take their defaults.

use serde::{Deserialize, Serialize};

use crate::pipeline::extent_translator::SplitMode;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Axis selection used when translating pieces into sub-extents.
    pub split_mode: SplitMode,
    /// Initial release-data flag of every output port.
    pub release_data: bool,
    /// Panic instead of returning when a contract violation is detected.
    pub abort_on_contract_violation: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            split_mode: SplitMode::Block,
            release_data: false,
            abort_on_contract_violation: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let cfg: PipelineConfig = serde_json::from_str(r#"{ "release_data": true }"#).unwrap();
        assert!(cfg.release_data);
        assert_eq!(cfg.split_mode, SplitMode::Block);
        assert!(!cfg.abort_on_contract_violation);
    }
}
