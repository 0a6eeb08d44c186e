// 6.0 config.rs: desk settings in one place. engine options, listed assets, opening balances.
// 6.1 loads from TOML. genesis amounts are whole-token units, converted with each asset's decimals.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

use crate::engine::{EngineConfig, EscrowEngine};
use crate::ledger::{AssetInfo, InMemoryLedger, MAX_DECIMALS};
use crate::types::AccountId;

// an asset the desk lists. ids are assigned in list order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetConfig {
    pub symbol: String,
    pub decimals: u32,
}

// opening balance minted before the engine starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisBalance {
    pub account: AccountId,
    pub asset: String,
    pub units: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeskConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    pub assets: Vec<AssetConfig>,
    #[serde(default)]
    pub genesis: Vec<GenesisBalance>,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self::local()
    }
}

impl DeskConfig {
    // two-token desk: account 1 holds 2 WETH, account 2 holds 50 USDC
    pub fn local() -> Self {
        Self {
            engine: EngineConfig::default(),
            assets: vec![
                AssetConfig { symbol: "WETH".to_string(), decimals: 18 },
                AssetConfig { symbol: "USDC".to_string(), decimals: 18 },
            ],
            genesis: vec![
                GenesisBalance { account: AccountId(1), asset: "WETH".to_string(), units: dec!(2) },
                GenesisBalance { account: AccountId(2), asset: "USDC".to_string(), units: dec!(50) },
            ],
        }
    }

    // same listings with no opening balances
    pub fn empty_books() -> Self {
        Self {
            genesis: Vec::new(),
            ..Self::local()
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: DeskConfig = toml::from_str(content).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            reason: format!("{}: {}", path.display(), e),
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!(path = %path.display(), assets = config.assets.len(), "loaded desk config");
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })
    }

    fn asset_info(&self, symbol: &str) -> Option<AssetInfo> {
        self.assets
            .iter()
            .find(|a| a.symbol == symbol)
            .map(|a| AssetInfo::new(a.symbol.clone(), a.decimals))
    }

    // internal consistency only. says nothing about whether trades will succeed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.max_events == 0 {
            return Err(ConfigError::InvalidEngine {
                reason: "max_events must be positive".to_string(),
            });
        }

        if self.assets.is_empty() {
            return Err(ConfigError::InvalidAsset {
                reason: "Need at least 1 asset".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for asset in &self.assets {
            if asset.symbol.is_empty() {
                return Err(ConfigError::InvalidAsset {
                    reason: "Asset symbol must not be empty".to_string(),
                });
            }
            if !seen.insert(asset.symbol.as_str()) {
                return Err(ConfigError::InvalidAsset {
                    reason: format!("Duplicate asset {}", asset.symbol),
                });
            }
            if asset.decimals > MAX_DECIMALS {
                return Err(ConfigError::InvalidAsset {
                    reason: format!("{} has {} decimals, max is {}", asset.symbol, asset.decimals, MAX_DECIMALS),
                });
            }
        }

        for balance in &self.genesis {
            if balance.account == self.engine.escrow_account {
                return Err(ConfigError::InvalidGenesis {
                    reason: format!("{} is the escrow account", balance.account),
                });
            }
            let info = self.asset_info(&balance.asset).ok_or_else(|| ConfigError::InvalidGenesis {
                reason: format!("Unknown asset {}", balance.asset),
            })?;
            if info.to_base_units(balance.units).is_none() {
                return Err(ConfigError::InvalidGenesis {
                    reason: format!("{} {} is not representable", balance.units, balance.asset),
                });
            }
        }

        Ok(())
    }

    pub fn build_ledger(&self) -> Result<InMemoryLedger, ConfigError> {
        self.validate()?;

        let mut ledger = InMemoryLedger::new();
        for asset in &self.assets {
            ledger.register_asset(AssetInfo::new(asset.symbol.clone(), asset.decimals));
        }

        for balance in &self.genesis {
            let invalid = || ConfigError::InvalidGenesis {
                reason: format!("{} {} for {}", balance.units, balance.asset, balance.account),
            };
            let asset = ledger.find_asset(&balance.asset).ok_or_else(invalid)?;
            let amount = ledger
                .asset_info(asset)
                .and_then(|info| info.to_base_units(balance.units))
                .ok_or_else(invalid)?;
            ledger.mint(asset, balance.account, amount).map_err(|e| ConfigError::InvalidGenesis {
                reason: e.to_string(),
            })?;
        }

        Ok(ledger)
    }

    pub fn build_engine(&self) -> Result<EscrowEngine<InMemoryLedger>, ConfigError> {
        let ledger = self.build_ledger()?;
        Ok(EscrowEngine::new(self.engine.clone(), ledger))
    }
}

// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Cannot read config: {reason}")]
    Io { reason: String },
    #[error("Cannot parse config: {reason}")]
    Parse { reason: String },
    #[error("Invalid engine settings: {reason}")]
    InvalidEngine { reason: String },
    #[error("Invalid asset listing: {reason}")]
    InvalidAsset { reason: String },
    #[error("Invalid genesis balance: {reason}")]
    InvalidGenesis { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::AssetLedger;
    use crate::types::Amount;

    #[test]
    fn test_default_config_valid() {
        let config = DeskConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.assets.len(), 2);
    }

    #[test]
    fn test_build_ledger_mints_genesis() {
        let ledger = DeskConfig::local().build_ledger().unwrap();
        let weth = ledger.find_asset("WETH").unwrap();
        let usdc = ledger.find_asset("USDC").unwrap();
        assert_eq!(
            ledger.balance_of(weth, AccountId(1)),
            Amount::new(2_000_000_000_000_000_000)
        );
        assert_eq!(
            ledger.balance_of(usdc, AccountId(2)),
            Amount::new(50_000_000_000_000_000_000)
        );
    }

    #[test]
    fn test_empty_books_preset() {
        let config = DeskConfig::empty_books();
        assert!(config.genesis.is_empty());
        let ledger = config.build_ledger().unwrap();
        assert_eq!(ledger.assets().count(), 2);
    }

    #[test]
    fn test_duplicate_asset() {
        let mut config = DeskConfig::local();
        config.assets.push(AssetConfig { symbol: "WETH".to_string(), decimals: 8 });
        assert!(matches!(config.validate(), Err(ConfigError::InvalidAsset { .. })));
    }

    #[test]
    fn test_too_many_decimals() {
        let mut config = DeskConfig::local();
        config.assets[0].decimals = 24;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidAsset { .. })));
    }

    #[test]
    fn test_genesis_unknown_asset() {
        let mut config = DeskConfig::local();
        config.genesis.push(GenesisBalance {
            account: AccountId(3),
            asset: "DAI".to_string(),
            units: dec!(1),
        });
        assert!(matches!(config.validate(), Err(ConfigError::InvalidGenesis { .. })));
    }

    #[test]
    fn test_genesis_to_escrow_rejected() {
        let mut config = DeskConfig::local();
        config.genesis[0].account = config.engine.escrow_account;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidGenesis { .. })));
    }

    #[test]
    fn test_zero_max_events() {
        let mut config = DeskConfig::local();
        config.engine.max_events = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidEngine { .. })));
    }

    #[test]
    fn test_from_toml() {
        let content = r#"
            [engine]
            escrow_account = 900
            max_events = 10

            [[assets]]
            symbol = "WBTC"
            decimals = 8

            [[genesis]]
            account = 1
            asset = "WBTC"
            units = "0.5"
        "#;
        let config = DeskConfig::from_toml_str(content).unwrap();
        assert_eq!(config.engine.escrow_account, AccountId(900));
        assert_eq!(config.engine.max_events, 10);

        let engine = config.build_engine().unwrap();
        let wbtc = engine.ledger().find_asset("WBTC").unwrap();
        assert_eq!(engine.balance_of(wbtc, AccountId(1)), Amount::new(50_000_000));
        assert_eq!(engine.escrow_account(), AccountId(900));
    }

    #[test]
    fn test_from_toml_defaults_engine() {
        let content = r#"
            [[assets]]
            symbol = "USDC"
            decimals = 6
        "#;
        let config = DeskConfig::from_toml_str(content).unwrap();
        assert_eq!(config.engine, EngineConfig::default());
        assert!(config.genesis.is_empty());
    }

    #[test]
    fn test_bad_toml() {
        let result = DeskConfig::from_toml_str("assets = 5");
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = DeskConfig::local();
        let text = config.to_toml_string().unwrap();
        let back = DeskConfig::from_toml_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_config_json_round_trip() {
        let config = DeskConfig::local();
        let json = serde_json::to_string(&config).unwrap();
        let back: DeskConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.assets, config.assets);
    }
}
