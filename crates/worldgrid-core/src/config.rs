use crate::depletion::ResourceKind;
use crate::random::DeterministicRandom;
use crate::supply::SupplySelection;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Game settings the depletion decision reads. Passed explicitly into every
/// decision; nothing is read from global state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// No deposit of any kind is ever depleted.
    pub inexhaustible_mines: bool,
    /// Granite deposits are never depleted.
    pub inexhaustible_granite: bool,
    pub supply: SupplySelection,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            inexhaustible_mines: false,
            inexhaustible_granite: false,
            supply: SupplySelection::BASELINE,
        }
    }
}

impl ResourceConfig {
    pub fn is_inexhaustible(&self, kind: ResourceKind) -> bool {
        self.inexhaustible_mines || (kind == ResourceKind::Granite && self.inexhaustible_granite)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Shared by every replica of a game.
    pub seed: u64,
    /// Draw records kept for desync diagnosis; 0 disables the history.
    pub history_capacity: usize,
    pub resources: ResourceConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            history_capacity: DeterministicRandom::DEFAULT_HISTORY_CAPACITY,
            resources: ResourceConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("history_capacity ({actual}) exceeds supported maximum ({max})")]
    HistoryCapacityTooLarge { max: usize, actual: usize },
    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineConfig {
    pub const MAX_HISTORY_CAPACITY: usize = 1 << 20;

    /// Rejects values the engine cannot run with. Settings that merely have no
    /// effect are logged and accepted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_capacity > Self::MAX_HISTORY_CAPACITY {
            return Err(ConfigError::HistoryCapacityTooLarge {
                max: Self::MAX_HISTORY_CAPACITY,
                actual: self.history_capacity,
            });
        }
        let supply = self.resources.supply;
        if !supply.is_known() {
            warn!(
                selection = supply.0,
                "unknown mine supply selection, using default consumption"
            );
        } else if self.resources.inexhaustible_mines && supply != SupplySelection::BASELINE {
            warn!(
                selection = supply.0,
                "mine supply selection has no effect while mines are inexhaustible"
            );
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
