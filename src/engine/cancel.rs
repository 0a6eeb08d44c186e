//! Owner cancellation.

use super::core::{rejected, EscrowEngine};
use super::results::{CancelResult, EscrowError};
use crate::events::{EventPayload, TradeCancelledEvent};
use crate::ledger::AssetLedger;
use crate::settlement::{TransferLeg, TransferReason};
use crate::types::{AccountId, TradeId};
use tracing::info;

impl<L: AssetLedger> EscrowEngine<L> {
    /// Return whatever give asset is still escrowed to the owner and remove the trade.
    pub fn cancel_trade(&mut self, trade_id: TradeId, caller: AccountId) -> Result<CancelResult, EscrowError> {
        let trade = self
            .trades
            .get(trade_id)
            .ok_or(EscrowError::TradeNotFound(trade_id))
            .and_then(|trade| {
                if trade.owner != caller {
                    return Err(EscrowError::NotOwner { trade_id, caller });
                }
                self.check_escrow_covers(trade_id, trade.give_asset, trade.remaining_give_amount)?;
                Ok(trade)
            })
            .map_err(|e| rejected("cancel_trade", e))?;

        let refund = TransferLeg {
            asset: trade.give_asset,
            from: self.escrow_account(),
            to: trade.owner,
            amount: trade.remaining_give_amount,
            reason: TransferReason::CancelRefund,
        };
        self.execute_leg(&refund)?;
        self.trades.delete(trade_id);

        info!(
            trade_id = %trade_id,
            owner = %trade.owner,
            refunded = %trade.remaining_give_amount,
            "trade cancelled"
        );

        self.emit_event(EventPayload::TradeCancelled(TradeCancelledEvent {
            trade_id,
            owner: trade.owner,
            give_asset: trade.give_asset,
            refunded: trade.remaining_give_amount,
        }));

        Ok(CancelResult {
            trade_id,
            owner: trade.owner,
            give_asset: trade.give_asset,
            refunded: trade.remaining_give_amount,
        })
    }
}
