//! Deployment configuration for the auction ledger.
//!
//! Fixed when the ledger instance is initialized; there is no governance
//! path to change it afterwards.

use serde::{Deserialize, Serialize};

use auction_types::LedgerId;

/// Configuration for one ledger deployment.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Identity of this deployment. Input proofs must bind to it, so sealed
    /// bids cannot be replayed onto a different ledger.
    pub ledger_id: LedgerId,

    /// Maximum accepted title length in bytes.
    pub max_title_len: usize,

    /// Maximum accepted description length in bytes.
    pub max_description_len: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            ledger_id: LedgerId::default(),
            max_title_len: 100,
            max_description_len: 1000,
        }
    }
}

impl LedgerConfig {
    /// Create a config with the given ledger identity and default bounds.
    pub fn with_ledger_id(ledger_id: LedgerId) -> Self {
        Self {
            ledger_id,
            ..Default::default()
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.max_title_len == 0 {
            return Err(ConfigValidationError::ZeroTitleBound);
        }
        if self.max_description_len == 0 {
            return Err(ConfigValidationError::ZeroDescriptionBound);
        }
        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Maximum title length cannot be zero")]
    ZeroTitleBound,

    #[error("Maximum description length cannot be zero")]
    ZeroDescriptionBound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = LedgerConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_bounds_are_rejected() {
        let mut config = LedgerConfig::default();
        config.max_title_len = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::ZeroTitleBound)
        ));

        let mut config = LedgerConfig::default();
        config.max_description_len = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::ZeroDescriptionBound)
        ));
    }
}
