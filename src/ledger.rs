// 2.0 ledger.rs: the fungible asset ledger the engine settles against.
// the engine only sees the AssetLedger trait. InMemoryLedger is the bundled implementation:
// one TokenLedger (balances + allowances) per registered asset.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::types::{AccountId, Amount, AssetId};

// largest decimals we can scale with a u64 power of ten
pub const MAX_DECIMALS: u32 = 18;

// 2.1: asset metadata. the engine never scales amounts, this is for the edges only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetInfo {
    pub symbol: String,
    pub decimals: u32,
}

impl AssetInfo {
    pub fn new(symbol: impl Into<String>, decimals: u32) -> Self {
        Self {
            symbol: symbol.into(),
            decimals,
        }
    }

    fn scale(&self) -> Option<Decimal> {
        10u64.checked_pow(self.decimals).map(Decimal::from)
    }

    // whole-token units -> base units. None if negative, too precise, or out of range.
    pub fn to_base_units(&self, units: Decimal) -> Option<Amount> {
        if units.is_sign_negative() {
            return None;
        }
        let raw = units.checked_mul(self.scale()?)?;
        if !raw.fract().is_zero() {
            return None;
        }
        raw.to_u128().map(Amount::new)
    }

    // base units -> whole-token units. None when the raw value doesn't fit a Decimal.
    pub fn to_units(&self, amount: Amount) -> Option<Decimal> {
        let raw = i128::try_from(amount.value()).ok()?;
        Decimal::try_from_i128_with_scale(raw, self.decimals)
            .ok()
            .map(|d| d.normalize())
    }

    pub fn format(&self, amount: Amount) -> String {
        match self.to_units(amount) {
            Some(units) => format!("{} {}", units, self.symbol),
            None => format!("{} raw {}", amount, self.symbol),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Insufficient balance: {owner} holds {available} of {asset}, needs {requested}")]
    InsufficientBalance {
        asset: AssetId,
        owner: AccountId,
        available: Amount,
        requested: Amount,
    },

    #[error("Insufficient allowance: {spender} may pull {available} of {asset} from {owner}, needs {requested}")]
    InsufficientAllowance {
        asset: AssetId,
        owner: AccountId,
        spender: AccountId,
        available: Amount,
        requested: Amount,
    },

    #[error("Unknown asset {0}")]
    UnknownAsset(AssetId),

    #[error("Supply overflow minting {asset}")]
    SupplyOverflow { asset: AssetId },
}

// 2.2: the seam between the engine and whatever holds the balances.
// implement this for a chain client, a database, or use InMemoryLedger.
// every transfer is all-or-nothing: on Err nothing moved.
pub trait AssetLedger {
    fn balance_of(&self, asset: AssetId, owner: AccountId) -> Amount;

    fn allowance(&self, asset: AssetId, owner: AccountId, spender: AccountId) -> Amount;

    // sets (not adds to) the amount `spender` may pull from `owner`
    fn approve(
        &mut self,
        asset: AssetId,
        owner: AccountId,
        spender: AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError>;

    // push transfer, signed by `from`
    fn transfer(
        &mut self,
        asset: AssetId,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError>;

    // pull transfer by `spender`, consumes allowance
    fn transfer_from(
        &mut self,
        asset: AssetId,
        owner: AccountId,
        spender: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError>;
}

// 2.3: balances and allowances for a single asset.
#[derive(Debug, Clone)]
pub struct TokenLedger {
    asset: AssetId,
    info: AssetInfo,
    balances: HashMap<AccountId, Amount>,
    // (owner, spender) -> remaining allowance
    allowances: HashMap<(AccountId, AccountId), Amount>,
    total_supply: Amount,
}

impl TokenLedger {
    pub fn new(asset: AssetId, info: AssetInfo) -> Self {
        Self {
            asset,
            info,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            total_supply: Amount::zero(),
        }
    }

    pub fn asset(&self) -> AssetId {
        self.asset
    }

    pub fn info(&self) -> &AssetInfo {
        &self.info
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn mint(&mut self, to: AccountId, amount: Amount) -> Result<(), LedgerError> {
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::SupplyOverflow { asset: self.asset })?;
        self.total_supply = supply;
        // cannot overflow: a single balance never exceeds total supply
        let balance = self.balances.entry(to).or_default();
        *balance = Amount::new(balance.value() + amount.value());
        Ok(())
    }

    pub fn balance_of(&self, owner: AccountId) -> Amount {
        self.balances.get(&owner).copied().unwrap_or_default()
    }

    pub fn allowance(&self, owner: AccountId, spender: AccountId) -> Amount {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    pub fn approve(&mut self, owner: AccountId, spender: AccountId, amount: Amount) {
        if amount.is_zero() {
            self.allowances.remove(&(owner, spender));
        } else {
            self.allowances.insert((owner, spender), amount);
        }
    }

    fn check_balance(&self, owner: AccountId, amount: Amount) -> Result<(), LedgerError> {
        let available = self.balance_of(owner);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                asset: self.asset,
                owner,
                available,
                requested: amount,
            });
        }
        Ok(())
    }

    // caller has checked the balance. from == to is a no-op on the books.
    fn move_balance(&mut self, from: AccountId, to: AccountId, amount: Amount) {
        if amount.is_zero() || from == to {
            return;
        }
        let from_balance = self.balances.entry(from).or_default();
        *from_balance = from_balance.saturating_sub(amount);
        let to_balance = self.balances.entry(to).or_default();
        *to_balance = Amount::new(to_balance.value() + amount.value());
    }

    pub fn transfer(&mut self, from: AccountId, to: AccountId, amount: Amount) -> Result<(), LedgerError> {
        self.check_balance(from, amount)?;
        self.move_balance(from, to, amount);
        Ok(())
    }

    pub fn transfer_from(
        &mut self,
        owner: AccountId,
        spender: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.check_balance(owner, amount)?;

        let available = self.allowance(owner, spender);
        let Some(left) = available.checked_sub(amount) else {
            return Err(LedgerError::InsufficientAllowance {
                asset: self.asset,
                owner,
                spender,
                available,
                requested: amount,
            });
        };

        self.approve(owner, spender, left);
        self.move_balance(owner, to, amount);
        Ok(())
    }
}

// 2.4: multi-asset ledger. asset ids are handed out in registration order starting at 0.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    tokens: Vec<TokenLedger>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_asset(&mut self, info: AssetInfo) -> AssetId {
        let id = AssetId(self.tokens.len() as u32);
        self.tokens.push(TokenLedger::new(id, info));
        id
    }

    pub fn token(&self, asset: AssetId) -> Option<&TokenLedger> {
        self.tokens.get(asset.0 as usize)
    }

    fn token_mut(&mut self, asset: AssetId) -> Result<&mut TokenLedger, LedgerError> {
        self.tokens
            .get_mut(asset.0 as usize)
            .ok_or(LedgerError::UnknownAsset(asset))
    }

    pub fn asset_info(&self, asset: AssetId) -> Option<&AssetInfo> {
        self.token(asset).map(TokenLedger::info)
    }

    pub fn find_asset(&self, symbol: &str) -> Option<AssetId> {
        self.tokens
            .iter()
            .find(|t| t.info.symbol == symbol)
            .map(TokenLedger::asset)
    }

    pub fn assets(&self) -> impl Iterator<Item = &TokenLedger> {
        self.tokens.iter()
    }

    pub fn mint(&mut self, asset: AssetId, to: AccountId, amount: Amount) -> Result<(), LedgerError> {
        self.token_mut(asset)?.mint(to, amount)
    }

    pub fn total_supply(&self, asset: AssetId) -> Amount {
        self.token(asset).map(TokenLedger::total_supply).unwrap_or_default()
    }
}

impl AssetLedger for InMemoryLedger {
    fn balance_of(&self, asset: AssetId, owner: AccountId) -> Amount {
        self.token(asset).map(|t| t.balance_of(owner)).unwrap_or_default()
    }

    fn allowance(&self, asset: AssetId, owner: AccountId, spender: AccountId) -> Amount {
        self.token(asset)
            .map(|t| t.allowance(owner, spender))
            .unwrap_or_default()
    }

    fn approve(
        &mut self,
        asset: AssetId,
        owner: AccountId,
        spender: AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.token_mut(asset)?.approve(owner, spender, amount);
        Ok(())
    }

    fn transfer(
        &mut self,
        asset: AssetId,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.token_mut(asset)?.transfer(from, to, amount)
    }

    fn transfer_from(
        &mut self,
        asset: AssetId,
        owner: AccountId,
        spender: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.token_mut(asset)?.transfer_from(owner, spender, to, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const ALICE: AccountId = AccountId(1);
    const BOB: AccountId = AccountId(2);
    const SPENDER: AccountId = AccountId(99);

    fn ledger_with_weth() -> (InMemoryLedger, AssetId) {
        let mut ledger = InMemoryLedger::new();
        let weth = ledger.register_asset(AssetInfo::new("WETH", 18));
        ledger.mint(weth, ALICE, Amount::new(1_000)).unwrap();
        (ledger, weth)
    }

    #[test]
    fn test_mint_and_transfer() {
        let (mut ledger, weth) = ledger_with_weth();
        assert_eq!(ledger.total_supply(weth), Amount::new(1_000));

        ledger.transfer(weth, ALICE, BOB, Amount::new(400)).unwrap();
        assert_eq!(ledger.balance_of(weth, ALICE), Amount::new(600));
        assert_eq!(ledger.balance_of(weth, BOB), Amount::new(400));
        assert_eq!(ledger.total_supply(weth), Amount::new(1_000));
    }

    #[test]
    fn test_transfer_insufficient_balance_moves_nothing() {
        let (mut ledger, weth) = ledger_with_weth();
        let result = ledger.transfer(weth, BOB, ALICE, Amount::new(1));
        assert!(matches!(result, Err(LedgerError::InsufficientBalance { .. })));
        assert_eq!(ledger.balance_of(weth, ALICE), Amount::new(1_000));
    }

    #[test]
    fn test_transfer_from_consumes_allowance() {
        let (mut ledger, weth) = ledger_with_weth();
        ledger.approve(weth, ALICE, SPENDER, Amount::new(300)).unwrap();

        ledger
            .transfer_from(weth, ALICE, SPENDER, SPENDER, Amount::new(200))
            .unwrap();
        assert_eq!(ledger.allowance(weth, ALICE, SPENDER), Amount::new(100));
        assert_eq!(ledger.balance_of(weth, SPENDER), Amount::new(200));

        let result = ledger.transfer_from(weth, ALICE, SPENDER, SPENDER, Amount::new(150));
        assert!(matches!(result, Err(LedgerError::InsufficientAllowance { .. })));
        assert_eq!(ledger.balance_of(weth, ALICE), Amount::new(800));
        assert_eq!(ledger.allowance(weth, ALICE, SPENDER), Amount::new(100));
    }

    #[test]
    fn test_transfer_from_checks_balance_before_allowance() {
        let (mut ledger, weth) = ledger_with_weth();
        let result = ledger.transfer_from(weth, BOB, SPENDER, SPENDER, Amount::new(1));
        assert!(matches!(result, Err(LedgerError::InsufficientBalance { .. })));
    }

    #[test]
    fn test_self_transfer_keeps_balance() {
        let (mut ledger, weth) = ledger_with_weth();
        ledger.transfer(weth, ALICE, ALICE, Amount::new(500)).unwrap();
        assert_eq!(ledger.balance_of(weth, ALICE), Amount::new(1_000));
    }

    #[test]
    fn test_unknown_asset() {
        let (mut ledger, _) = ledger_with_weth();
        let ghost = AssetId(42);
        assert_eq!(ledger.balance_of(ghost, ALICE), Amount::zero());
        let result = ledger.transfer(ghost, ALICE, BOB, Amount::new(1));
        assert_eq!(result, Err(LedgerError::UnknownAsset(ghost)));
    }

    #[test]
    fn test_mint_supply_overflow() {
        let (mut ledger, weth) = ledger_with_weth();
        let result = ledger.mint(weth, BOB, Amount::new(u128::MAX));
        assert_eq!(result, Err(LedgerError::SupplyOverflow { asset: weth }));
        assert_eq!(ledger.balance_of(weth, BOB), Amount::zero());
    }

    #[test]
    fn test_find_asset_by_symbol() {
        let mut ledger = InMemoryLedger::new();
        let weth = ledger.register_asset(AssetInfo::new("WETH", 18));
        let usdc = ledger.register_asset(AssetInfo::new("USDC", 18));
        assert_eq!(ledger.find_asset("USDC"), Some(usdc));
        assert_eq!(ledger.find_asset("WETH"), Some(weth));
        assert_eq!(ledger.find_asset("DAI"), None);
    }

    #[test]
    fn test_unit_conversion() {
        let weth = AssetInfo::new("WETH", 18);
        let raw = weth.to_base_units(dec!(0.4)).unwrap();
        assert_eq!(raw.value(), 400_000_000_000_000_000);
        assert_eq!(weth.to_units(raw), Some(dec!(0.4)));
        assert_eq!(weth.format(raw), "0.4 WETH");

        let usd = AssetInfo::new("USD", 2);
        assert_eq!(usd.to_base_units(dec!(12.345)), None);
        assert_eq!(usd.to_base_units(dec!(-1)), None);
        assert_eq!(usd.to_base_units(dec!(12.34)), Some(Amount::new(1234)));
    }

    #[test]
    fn test_format_falls_back_to_raw() {
        let weth = AssetInfo::new("WETH", 18);
        let huge = Amount::new(u128::MAX);
        assert!(weth.format(huge).ends_with("raw WETH"));
    }
}
