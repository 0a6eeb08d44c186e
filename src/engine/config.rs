//! Engine configuration options.

use crate::types::AccountId;
use serde::{Deserialize, Serialize};

/// Account the engine holds escrow under unless configured otherwise.
pub const DEFAULT_ESCROW_ACCOUNT: AccountId = AccountId(0);

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Principal that holds escrowed balances and is the spender on every allowance.
    pub escrow_account: AccountId,
    /// Maximum number of events to retain in memory.
    pub max_events: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            escrow_account: DEFAULT_ESCROW_ACCOUNT,
            max_events: 100_000,
        }
    }
}
