//! Partial and full fills.

use super::core::{rejected, EscrowEngine};
use super::results::{EscrowError, FillResult};
use crate::events::{EventPayload, TradeClosedEvent, TradeFilledEvent};
use crate::ledger::AssetLedger;
use crate::settlement::FillPlan;
use crate::trade::Trade;
use crate::types::{AccountId, Amount, AssetId, TradeId};
use tracing::info;

impl<L: AssetLedger> EscrowEngine<L> {
    /// Fill `trade_id` with `fill_amount` of `provided_asset` from `filler`.
    ///
    /// The whole `fill_amount` is pulled into escrow first. The filler then receives give asset
    /// in proportion to the want consumed, the owner receives the consumed want, and anything
    /// beyond the remaining want goes back to the filler. The trade is removed once nothing is
    /// owed on it.
    pub fn fill_trade(
        &mut self,
        trade_id: TradeId,
        provided_asset: AssetId,
        fill_amount: Amount,
        filler: AccountId,
    ) -> Result<FillResult, EscrowError> {
        let (trade, plan) = self
            .validate_fill(trade_id, provided_asset, fill_amount, filler)
            .map_err(|e| rejected("fill_trade", e))?;

        let legs = plan.legs(&trade, filler, self.escrow_account());
        for leg in &legs {
            self.execute_leg(leg)?;
        }

        if plan.closes_trade() {
            self.trades.delete(trade_id);
        } else if let Some(stored) = self.trades.get_mut(trade_id) {
            stored.remaining_give_amount = plan.remaining_give_after;
            stored.remaining_want_amount = plan.remaining_want_after;
        }

        info!(
            trade_id = %trade_id,
            filler = %filler,
            fill_amount = %fill_amount,
            actual_fill = %plan.actual_fill,
            give_transferred = %plan.give_transferred,
            refunded = %plan.refund,
            closed = plan.closes_trade(),
            "trade filled"
        );

        self.emit_event(EventPayload::TradeFilled(TradeFilledEvent {
            trade_id,
            owner: trade.owner,
            filler,
            fill_amount,
            actual_fill: plan.actual_fill,
            give_transferred: plan.give_transferred,
            refunded: plan.refund,
            remaining_give: plan.remaining_give_after,
            remaining_want: plan.remaining_want_after,
        }));

        if plan.closes_trade() {
            self.emit_event(EventPayload::TradeClosed(TradeClosedEvent {
                trade_id,
                owner: trade.owner,
                final_filler: filler,
            }));
        }

        Ok(FillResult {
            trade_id,
            actual_fill: plan.actual_fill,
            give_transferred: plan.give_transferred,
            refunded: plan.refund,
            remaining_give: plan.remaining_give_after,
            remaining_want: plan.remaining_want_after,
            closed: plan.closes_trade(),
            legs,
        })
    }

    // every check runs before any leg executes
    fn validate_fill(
        &self,
        trade_id: TradeId,
        provided_asset: AssetId,
        fill_amount: Amount,
        filler: AccountId,
    ) -> Result<(Trade, FillPlan), EscrowError> {
        self.ensure_not_escrow(filler)?;

        let trade = self
            .trades
            .get(trade_id)
            .ok_or(EscrowError::TradeNotFound(trade_id))?;

        if provided_asset != trade.want_asset {
            return Err(EscrowError::IncorrectAsset {
                trade_id,
                expected: trade.want_asset,
                provided: provided_asset,
            });
        }

        self.check_funds(provided_asset, filler, fill_amount)?;

        // only a store holding a zero-want trade gets here, and create_trade never makes one
        let plan = FillPlan::compute(&trade, fill_amount).ok_or(EscrowError::InvalidAmount {
            give: trade.remaining_give_amount,
            want: trade.remaining_want_amount,
        })?;

        // proceeds and refund come out of the pulled amount, only the payout leans on escrow
        self.check_escrow_covers(trade_id, trade.give_asset, plan.give_transferred)?;

        Ok((trade, plan))
    }
}
