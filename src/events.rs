// 4.0: every successful state change produces an event. used for audit trails and notifying
// external systems. rejected operations leave no event behind since they change nothing.

use crate::types::{AccountId, Amount, AssetId, Timestamp, TradeId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, timestamp: Timestamp, payload: EventPayload) -> Self {
        Self {
            id,
            timestamp,
            payload,
        }
    }

    pub fn trade_id(&self) -> TradeId {
        match &self.payload {
            EventPayload::TradeCreated(e) => e.trade_id,
            EventPayload::TradeFilled(e) => e.trade_id,
            EventPayload::TradeClosed(e) => e.trade_id,
            EventPayload::TradeCancelled(e) => e.trade_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    TradeCreated(TradeCreatedEvent),
    TradeFilled(TradeFilledEvent),
    // emitted right after the fill that drained the trade
    TradeClosed(TradeClosedEvent),
    TradeCancelled(TradeCancelledEvent),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeCreatedEvent {
    pub trade_id: TradeId,
    pub owner: AccountId,
    pub give_asset: AssetId,
    pub give_amount: Amount,
    pub want_asset: AssetId,
    pub want_amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeFilledEvent {
    pub trade_id: TradeId,
    pub owner: AccountId,
    pub filler: AccountId,
    pub fill_amount: Amount,
    pub actual_fill: Amount,
    pub give_transferred: Amount,
    pub refunded: Amount,
    pub remaining_give: Amount,
    pub remaining_want: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeClosedEvent {
    pub trade_id: TradeId,
    pub owner: AccountId,
    pub final_filler: AccountId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeCancelledEvent {
    pub trade_id: TradeId,
    pub owner: AccountId,
    pub give_asset: AssetId,
    pub refunded: Amount,
}
