//! Trade creation.

use super::core::{rejected, EscrowEngine};
use super::results::EscrowError;
use crate::events::{EventPayload, TradeCreatedEvent};
use crate::ledger::AssetLedger;
use crate::settlement::{TransferLeg, TransferReason};
use crate::trade::Trade;
use crate::types::{AccountId, Amount, AssetId, TradeId};
use tracing::info;

impl<L: AssetLedger> EscrowEngine<L> {
    /// Escrow `give_amount` of `give_asset` from `caller` and open a trade asking for
    /// `want_amount` of `want_asset`. Give and want may be the same asset.
    pub fn create_trade(
        &mut self,
        give_asset: AssetId,
        give_amount: Amount,
        want_asset: AssetId,
        want_amount: Amount,
        caller: AccountId,
    ) -> Result<TradeId, EscrowError> {
        self.validate_create(give_asset, give_amount, want_amount, caller)
            .map_err(|e| rejected("create_trade", e))?;

        let deposit = TransferLeg {
            asset: give_asset,
            from: caller,
            to: self.escrow_account(),
            amount: give_amount,
            reason: TransferReason::EscrowDeposit,
        };
        self.execute_leg(&deposit)?;

        let next_id = self.trades.next_id();
        let trade_id = self.trades.create(Trade {
            id: next_id,
            owner: caller,
            give_asset,
            remaining_give_amount: give_amount,
            want_asset,
            remaining_want_amount: want_amount,
            created_at: self.current_time,
        });

        info!(
            trade_id = %trade_id,
            owner = %caller,
            give_asset = %give_asset,
            give_amount = %give_amount,
            want_asset = %want_asset,
            want_amount = %want_amount,
            "trade created"
        );

        self.emit_event(EventPayload::TradeCreated(TradeCreatedEvent {
            trade_id,
            owner: caller,
            give_asset,
            give_amount,
            want_asset,
            want_amount,
        }));

        Ok(trade_id)
    }

    fn validate_create(
        &self,
        give_asset: AssetId,
        give_amount: Amount,
        want_amount: Amount,
        caller: AccountId,
    ) -> Result<(), EscrowError> {
        self.ensure_not_escrow(caller)?;

        // a zero side would leave an active trade that can never settle
        if give_amount.is_zero() || want_amount.is_zero() {
            return Err(EscrowError::InvalidAmount {
                give: give_amount,
                want: want_amount,
            });
        }

        self.check_funds(give_asset, caller, give_amount)
    }
}
