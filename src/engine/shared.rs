//! Thread-safe engine handle.
//!
//! Every operation takes the same lock, so calls from any number of threads run one at a time.
//! That serializes read-modify-write on a trade's remaining amounts and the ledger's
//! balance/allowance checks together: a filler cannot spend the same balance on two trades.

use super::core::EscrowEngine;
use super::results::{CancelResult, EscrowError, FillResult};
use crate::ledger::AssetLedger;
use crate::trade::Trade;
use crate::types::{AccountId, Amount, AssetId, TradeId};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug)]
pub struct SharedEngine<L: AssetLedger> {
    inner: Arc<Mutex<EscrowEngine<L>>>,
}

impl<L: AssetLedger> Clone for SharedEngine<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L: AssetLedger> SharedEngine<L> {
    pub fn new(engine: EscrowEngine<L>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    pub fn create_trade(
        &self,
        give_asset: AssetId,
        give_amount: Amount,
        want_asset: AssetId,
        want_amount: Amount,
        caller: AccountId,
    ) -> Result<TradeId, EscrowError> {
        self.inner
            .lock()
            .create_trade(give_asset, give_amount, want_asset, want_amount, caller)
    }

    pub fn fill_trade(
        &self,
        trade_id: TradeId,
        provided_asset: AssetId,
        fill_amount: Amount,
        filler: AccountId,
    ) -> Result<FillResult, EscrowError> {
        self.inner
            .lock()
            .fill_trade(trade_id, provided_asset, fill_amount, filler)
    }

    pub fn cancel_trade(&self, trade_id: TradeId, caller: AccountId) -> Result<CancelResult, EscrowError> {
        self.inner.lock().cancel_trade(trade_id, caller)
    }

    pub fn total_trades(&self) -> u64 {
        self.inner.lock().total_trades()
    }

    pub fn trade(&self, trade_id: TradeId) -> Option<Trade> {
        self.inner.lock().trade(trade_id)
    }

    /// Runs `f` with the lock held, e.g. an approve followed by a fill as one unit.
    pub fn with<R>(&self, f: impl FnOnce(&mut EscrowEngine<L>) -> R) -> R {
        f(&mut self.inner.lock())
    }

    pub fn read<R>(&self, f: impl FnOnce(&EscrowEngine<L>) -> R) -> R {
        f(&self.inner.lock())
    }
}
