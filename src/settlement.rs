// 3.0 settlement.rs: proportional fill math and the transfer legs that carry it out.
// everything here is pure. the engine computes a plan, validates, then executes the legs.

use num_bigint::BigUint;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::trade::Trade;
use crate::types::{AccountId, Amount, AssetId};

// 3.1: floor(amount * numerator / denominator). None only for a zero denominator.
// the product is widened when it doesn't fit a u128, so nothing wraps.
pub fn pro_rata(amount: Amount, numerator: Amount, denominator: Amount) -> Option<Amount> {
    if denominator.is_zero() {
        return None;
    }
    match amount.value().checked_mul(numerator.value()) {
        Some(product) => Some(Amount::new(product / denominator.value())),
        None => {
            let product = BigUint::from(amount.value()) * BigUint::from(numerator.value());
            (product / BigUint::from(denominator.value()))
                .to_u128()
                .map(Amount::new)
        }
    }
}

// why a leg moves value. kept on receipts and in debug logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferReason {
    // owner's give asset pulled into escrow at creation
    EscrowDeposit,
    // filler's full fill amount pulled into escrow
    FillDeposit,
    // give asset released to the filler
    Payout,
    // want asset forwarded to the owner
    Proceeds,
    // unused part of the fill amount returned to the filler
    ExcessRefund,
    // remaining give asset returned to the owner on cancel
    CancelRefund,
}

// 3.2: a single ledger movement. pulls go through transfer_from, the rest are pushes
// out of the escrow account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferLeg {
    pub asset: AssetId,
    pub from: AccountId,
    pub to: AccountId,
    pub amount: Amount,
    pub reason: TransferReason,
}

impl TransferLeg {
    pub fn is_pull(&self) -> bool {
        matches!(
            self.reason,
            TransferReason::EscrowDeposit | TransferReason::FillDeposit
        )
    }
}

/// 3.3: outcome of filling `trade` with `fill_amount` of its want asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillPlan {
    pub fill_amount: Amount,
    // min(fill_amount, remaining want)
    pub actual_fill: Amount,
    pub give_transferred: Amount,
    pub refund: Amount,
    pub remaining_give_after: Amount,
    pub remaining_want_after: Amount,
}

impl FillPlan {
    // None when the trade violates the active invariant (zero remaining want).
    pub fn compute(trade: &Trade, fill_amount: Amount) -> Option<Self> {
        let remaining_want = trade.remaining_want_amount;
        let remaining_give = trade.remaining_give_amount;

        let actual_fill = fill_amount.min(remaining_want);
        let give_transferred = pro_rata(remaining_give, actual_fill, remaining_want)?;
        let refund = fill_amount.saturating_sub(actual_fill);

        let remaining_give_after = remaining_give.checked_sub(give_transferred)?;
        let remaining_want_after = remaining_want.checked_sub(actual_fill)?;

        // closing fill consumes the whole remainder, so the escrow is fully released
        debug_assert!(!remaining_want_after.is_zero() || remaining_give_after.is_zero());

        Some(Self {
            fill_amount,
            actual_fill,
            give_transferred,
            refund,
            remaining_give_after,
            remaining_want_after,
        })
    }

    pub fn closes_trade(&self) -> bool {
        self.remaining_want_after.is_zero()
    }

    // ordered legs: pull, payout, proceeds, refund. zero-amount legs are dropped.
    pub fn legs(&self, trade: &Trade, filler: AccountId, escrow: AccountId) -> Vec<TransferLeg> {
        let legs = [
            TransferLeg {
                asset: trade.want_asset,
                from: filler,
                to: escrow,
                amount: self.fill_amount,
                reason: TransferReason::FillDeposit,
            },
            TransferLeg {
                asset: trade.give_asset,
                from: escrow,
                to: filler,
                amount: self.give_transferred,
                reason: TransferReason::Payout,
            },
            TransferLeg {
                asset: trade.want_asset,
                from: escrow,
                to: trade.owner,
                amount: self.actual_fill,
                reason: TransferReason::Proceeds,
            },
            TransferLeg {
                asset: trade.want_asset,
                from: escrow,
                to: filler,
                amount: self.refund,
                reason: TransferReason::ExcessRefund,
            },
        ];
        legs.into_iter().filter(|l| !l.amount.is_zero()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Timestamp, TradeId};

    const E18: u128 = 1_000_000_000_000_000_000;

    fn trade(give: u128, want: u128) -> Trade {
        Trade {
            id: TradeId(0),
            owner: AccountId(1),
            give_asset: AssetId(0),
            remaining_give_amount: Amount::new(give),
            want_asset: AssetId(1),
            remaining_want_amount: Amount::new(want),
            created_at: Timestamp::from_millis(0),
        }
    }

    #[test]
    fn test_pro_rata_floors() {
        assert_eq!(pro_rata(Amount::new(10), Amount::new(1), Amount::new(3)), Some(Amount::new(3)));
        assert_eq!(pro_rata(Amount::new(1), Amount::new(1), Amount::new(2)), Some(Amount::zero()));
        assert_eq!(pro_rata(Amount::new(1), Amount::new(1), Amount::zero()), None);
    }

    #[test]
    fn test_pro_rata_wide_product() {
        // product overflows u128 but the quotient fits
        let big = Amount::new(u128::MAX / 2);
        assert_eq!(pro_rata(big, Amount::new(4), Amount::new(4)), Some(big));
        assert_eq!(
            pro_rata(Amount::new(u128::MAX), Amount::new(u128::MAX - 1), Amount::new(u128::MAX)),
            Some(Amount::new(u128::MAX - 1))
        );
    }

    #[test]
    fn test_partial_fill_plan() {
        // 1 G for 25 W, fill 10 W
        let t = trade(E18, 25 * E18);
        let plan = FillPlan::compute(&t, Amount::new(10 * E18)).unwrap();
        assert_eq!(plan.actual_fill.value(), 10 * E18);
        assert_eq!(plan.give_transferred.value(), 4 * E18 / 10);
        assert_eq!(plan.refund, Amount::zero());
        assert_eq!(plan.remaining_give_after.value(), 6 * E18 / 10);
        assert_eq!(plan.remaining_want_after.value(), 15 * E18);
        assert!(!plan.closes_trade());
    }

    #[test]
    fn test_overfill_plan_refunds_excess() {
        let t = trade(E18, 25 * E18);
        let plan = FillPlan::compute(&t, Amount::new(30 * E18)).unwrap();
        assert_eq!(plan.actual_fill.value(), 25 * E18);
        assert_eq!(plan.give_transferred.value(), E18);
        assert_eq!(plan.refund.value(), 5 * E18);
        assert!(plan.closes_trade());
        assert_eq!(plan.remaining_give_after, Amount::zero());
    }

    #[test]
    fn test_closing_fill_leaves_no_dust() {
        // 7 for 3: every partial fill truncates
        let mut t = trade(7, 3);
        let first = FillPlan::compute(&t, Amount::new(1)).unwrap();
        assert_eq!(first.give_transferred, Amount::new(2));
        t.remaining_give_amount = first.remaining_give_after;
        t.remaining_want_amount = first.remaining_want_after;

        let last = FillPlan::compute(&t, Amount::new(2)).unwrap();
        assert_eq!(last.give_transferred, Amount::new(5));
        assert!(last.closes_trade());
        assert_eq!(last.remaining_give_after, Amount::zero());
    }

    #[test]
    fn test_zero_want_is_rejected() {
        let t = trade(10, 0);
        assert!(FillPlan::compute(&t, Amount::new(1)).is_none());
    }

    #[test]
    fn test_legs_order_and_zero_filtering() {
        let t = trade(E18, 25 * E18);
        let filler = AccountId(2);
        let escrow = AccountId(0);

        let exact = FillPlan::compute(&t, Amount::new(25 * E18)).unwrap();
        let reasons: Vec<_> = exact.legs(&t, filler, escrow).iter().map(|l| l.reason).collect();
        assert_eq!(
            reasons,
            vec![TransferReason::FillDeposit, TransferReason::Payout, TransferReason::Proceeds]
        );

        let over = FillPlan::compute(&t, Amount::new(30 * E18)).unwrap();
        let legs = over.legs(&t, filler, escrow);
        assert_eq!(legs.len(), 4);
        assert!(legs[0].is_pull());
        assert_eq!(legs[0].amount.value(), 30 * E18);
        assert_eq!(legs[3].reason, TransferReason::ExcessRefund);
        assert_eq!(legs[3].to, filler);
    }
}
