// otc-core: escrowed, partially fillable OTC swap engine.
// owners escrow a give asset and ask for a want asset; fillers pay in pieces and receive
// a proportional share. all computation is deterministic, the ledger is injected.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: AccountId, AssetId, TradeId, Amount, Timestamp
//   2.x  ledger.rs: AssetLedger trait, in-memory token ledger, unit conversion
//   2.5  trade.rs: trade record + id-indexed store
//   3.x  settlement.rs: pro-rata math, fill plans, transfer legs
//   4.x  events.rs: state transition events for audit
//   5.x  engine/: escrow engine: create, fill, cancel, shared handle
//   6.x  config.rs: desk listings, genesis balances, TOML loading

// core modules
pub mod engine;
pub mod ledger;
pub mod settlement;
pub mod trade;
pub mod types;

// integration modules
pub mod config;
pub mod events;

// re exports for convenience
pub use engine::*;
pub use events::*;
pub use ledger::*;
pub use settlement::*;
pub use trade::*;
pub use types::*;
pub use config::{AssetConfig, ConfigError, DeskConfig, GenesisBalance};
