//! Trade records and the tombstoning trade store.
//!
//! The store is a plain indexed collection: slot `n` holds trade `n` until it is filled or
//! cancelled, after which the slot stays empty forever. The number of slots is the trade
//! counter. No business rules live here; the engine decides when a record may change.

use crate::types::{AccountId, Amount, AssetId, Timestamp, TradeId};
use serde::{Deserialize, Serialize};

/// One active escrowed offer: `owner` gives `remaining_give_amount` of `give_asset` in exchange
/// for `remaining_want_amount` of `want_asset`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub owner: AccountId,
    pub give_asset: AssetId,
    pub remaining_give_amount: Amount,
    pub want_asset: AssetId,
    pub remaining_want_amount: Amount,
    pub created_at: Timestamp,
}

impl Trade {
    pub fn is_same_asset(&self) -> bool {
        self.give_asset == self.want_asset
    }
}

/// Insert-only id assignment over tombstoned slots.
#[derive(Debug, Clone, Default)]
pub struct TradeStore {
    slots: Vec<Option<Trade>>,
}

impl TradeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The id the next `create` will assign.
    pub fn next_id(&self) -> TradeId {
        TradeId(self.slots.len() as u64)
    }

    /// Stores the trade under the next id, overwriting whatever id the caller put on it.
    pub fn create(&mut self, mut trade: Trade) -> TradeId {
        let id = self.next_id();
        trade.id = id;
        self.slots.push(Some(trade));
        id
    }

    pub fn get(&self, id: TradeId) -> Option<Trade> {
        self.get_ref(id).cloned()
    }

    pub(crate) fn get_ref(&self, id: TradeId) -> Option<&Trade> {
        let slot = usize::try_from(id.0).ok()?;
        self.slots.get(slot)?.as_ref()
    }

    pub(crate) fn get_mut(&mut self, id: TradeId) -> Option<&mut Trade> {
        let slot = usize::try_from(id.0).ok()?;
        self.slots.get_mut(slot)?.as_mut()
    }

    /// Tombstones the slot. Returns the removed record, `None` if it was already absent.
    pub fn delete(&mut self, id: TradeId) -> Option<Trade> {
        let slot = usize::try_from(id.0).ok()?;
        self.slots.get_mut(slot)?.take()
    }

    pub fn total_count(&self) -> u64 {
        self.slots.len() as u64
    }

    pub fn active(&self) -> impl Iterator<Item = &Trade> {
        self.slots.iter().flatten()
    }

    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    pub fn by_owner(&self, owner: AccountId) -> impl Iterator<Item = &Trade> {
        self.active().filter(move |t| t.owner == owner)
    }
}
