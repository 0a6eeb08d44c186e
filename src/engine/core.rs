// 5.0 engine/core.rs: main engine. holds the injected ledger, the trade store, and the event log.

use super::config::EngineConfig;
use super::results::EscrowError;
use crate::events::{Event, EventId, EventPayload};
use crate::ledger::{AssetLedger, InMemoryLedger};
use crate::settlement::TransferLeg;
use crate::trade::{Trade, TradeStore};
use crate::types::{AccountId, Amount, AssetId, Timestamp, TradeId};
use tracing::{debug, warn};

/** 5.1: main engine struct. all state lives here, the ledger is whatever the caller hands in */
#[derive(Debug)]
pub struct EscrowEngine<L: AssetLedger> {
    pub(super) config: EngineConfig,
    pub(super) ledger: L,
    pub(super) trades: TradeStore,
    pub(super) events: Vec<Event>,
    pub(super) next_event_id: u64,
    pub(super) current_time: Timestamp,
}

impl<L: AssetLedger> EscrowEngine<L> {
    pub fn new(config: EngineConfig, ledger: L) -> Self {
        Self {
            config,
            ledger,
            trades: TradeStore::new(),
            events: Vec::new(),
            next_event_id: 1,
            current_time: Timestamp::from_millis(0),
        }
    }

    pub fn with_ledger(ledger: L) -> Self {
        Self::new(EngineConfig::default(), ledger)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn set_time(&mut self, timestamp: Timestamp) {
        self.current_time = timestamp;
    }

    pub fn time(&self) -> Timestamp {
        self.current_time
    }

    pub fn advance_time(&mut self, millis: i64) {
        self.current_time = Timestamp::from_millis(self.current_time.as_millis().saturating_add(millis));
    }

    pub fn escrow_account(&self) -> AccountId {
        self.config.escrow_account
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Grants the engine's escrow account an allowance of `amount` over `owner`'s `asset`.
    pub fn approve(&mut self, asset: AssetId, owner: AccountId, amount: Amount) -> Result<(), EscrowError> {
        self.ensure_not_escrow(owner)?;
        let spender = self.escrow_account();
        self.ledger.approve(asset, owner, spender, amount)?;
        Ok(())
    }

    /// Push transfer between two principals. The escrow account is off limits on both sides,
    /// its balance only moves through trade operations.
    pub fn transfer(&mut self, asset: AssetId, from: AccountId, to: AccountId, amount: Amount) -> Result<(), EscrowError> {
        self.ensure_not_escrow(from)?;
        self.ensure_not_escrow(to)?;
        self.ledger.transfer(asset, from, to, amount)?;
        Ok(())
    }

    pub fn balance_of(&self, asset: AssetId, owner: AccountId) -> Amount {
        self.ledger.balance_of(asset, owner)
    }

    /// Monotonic trade counter. Every id below it was issued at some point.
    pub fn total_trades(&self) -> u64 {
        self.trades.total_count()
    }

    /// Snapshot of an active trade. Never-issued, filled and cancelled ids all read as `None`.
    pub fn trade(&self, trade_id: TradeId) -> Option<Trade> {
        self.trades.get(trade_id)
    }

    pub fn active_trades(&self) -> Vec<Trade> {
        self.trades.active().cloned().collect()
    }

    pub fn trades_by_owner(&self, owner: AccountId) -> Vec<Trade> {
        self.trades.by_owner(owner).cloned().collect()
    }

    /// Sum of remaining give amounts over active trades escrowing `asset`.
    /// Equals the escrow account's ledger balance of `asset` at all times.
    pub fn escrowed_total(&self, asset: AssetId) -> Amount {
        self.trades
            .active()
            .filter(|t| t.give_asset == asset)
            .map(|t| t.remaining_give_amount)
            .sum()
    }

    pub fn recent_events(&self, count: usize) -> &[Event] {
        let start = self.events.len().saturating_sub(count);
        &self.events[start..]
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub(super) fn ensure_not_escrow(&self, account: AccountId) -> Result<(), EscrowError> {
        if account == self.escrow_account() {
            return Err(EscrowError::ReservedAccount(account));
        }
        Ok(())
    }

    // balance first, then allowance to the escrow account. same order as the reason codes.
    pub(super) fn check_funds(&self, asset: AssetId, account: AccountId, amount: Amount) -> Result<(), EscrowError> {
        let available = self.ledger.balance_of(asset, account);
        if available < amount {
            return Err(EscrowError::InsufficientBalance {
                account,
                asset,
                available,
                requested: amount,
            });
        }

        let approved = self.ledger.allowance(asset, account, self.escrow_account());
        if approved < amount {
            return Err(EscrowError::InsufficientAllowance {
                account,
                asset,
                available: approved,
                requested: amount,
            });
        }
        Ok(())
    }

    // the escrow account must still hold what a payout or refund is about to release
    pub(super) fn check_escrow_covers(&self, trade_id: TradeId, asset: AssetId, owed: Amount) -> Result<(), EscrowError> {
        let held = self.ledger.balance_of(asset, self.escrow_account());
        if held < owed {
            return Err(EscrowError::EscrowShortfall {
                trade_id,
                asset,
                held,
                owed,
            });
        }
        Ok(())
    }

    pub(super) fn execute_leg(&mut self, leg: &TransferLeg) -> Result<(), EscrowError> {
        debug!(
            asset = %leg.asset,
            from = %leg.from,
            to = %leg.to,
            amount = %leg.amount,
            reason = ?leg.reason,
            "transfer"
        );
        if leg.is_pull() {
            let spender = self.escrow_account();
            self.ledger
                .transfer_from(leg.asset, leg.from, spender, leg.to, leg.amount)?;
        } else {
            self.ledger.transfer(leg.asset, leg.from, leg.to, leg.amount)?;
        }
        Ok(())
    }

    pub(super) fn emit_event(&mut self, payload: EventPayload) {
        let event = Event::new(EventId(self.next_event_id), self.current_time, payload);
        self.next_event_id += 1;

        debug!(event_id = event.id.0, payload = ?event.payload, "event");

        self.events.push(event);

        if self.events.len() > self.config.max_events {
            let drain_count = self.events.len() - self.config.max_events;
            self.events.drain(0..drain_count);
        }
    }
}

impl EscrowEngine<InMemoryLedger> {
    /// Issues new supply to `to`. Minting into escrow would back no trade, so it is refused.
    pub fn mint(&mut self, asset: AssetId, to: AccountId, amount: Amount) -> Result<(), EscrowError> {
        self.ensure_not_escrow(to)?;
        self.ledger.mint(asset, to, amount)?;
        Ok(())
    }
}

// logs a rejected operation and hands the error back for `?`
pub(super) fn rejected(operation: &'static str, err: EscrowError) -> EscrowError {
    warn!(operation, reason = err.reason(), error = %err, "operation rejected");
    err
}
