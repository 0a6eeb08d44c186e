// 5.0: escrow engine. validates create/fill/cancel against the ledger and the trade store,
// then issues the transfers. every check runs before the first transfer, so a rejected call
// changes nothing.

mod cancel;
mod config;
mod core;
mod create;
mod fill;
mod results;
mod shared;

pub use config::{EngineConfig, DEFAULT_ESCROW_ACCOUNT};
pub use self::core::EscrowEngine;
pub use results::{CancelResult, ErrorCode, EscrowError, FillResult};
pub use shared::SharedEngine;
