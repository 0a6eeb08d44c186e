// 5.0.2: result types and errors for engine operations.

use crate::ledger::LedgerError;
use crate::settlement::TransferLeg;
use crate::types::{AccountId, Amount, AssetId, TradeId};
use serde::{Deserialize, Serialize};

/// Receipt for a successful fill. Callers are free to ignore it and read the ledger instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillResult {
    pub trade_id: TradeId,
    pub actual_fill: Amount,
    pub give_transferred: Amount,
    pub refunded: Amount,
    pub remaining_give: Amount,
    pub remaining_want: Amount,
    pub closed: bool,
    pub legs: Vec<TransferLeg>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelResult {
    pub trade_id: TradeId,
    pub owner: AccountId,
    pub give_asset: AssetId,
    pub refunded: Amount,
}

// stable codes for callers that branch on the failure kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    InsufficientBalance,
    InsufficientAllowance,
    TradeNotFound,
    IncorrectAsset,
    NotOwner,
    InvalidAmount,
    ReservedAccount,
    EscrowShortfall,
    Ledger,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EscrowError {
    #[error("Insufficient balance: {account} holds {available} of {asset}, needs {requested}")]
    InsufficientBalance {
        account: AccountId,
        asset: AssetId,
        available: Amount,
        requested: Amount,
    },

    #[error("Insufficient allowance: {account} approved {available} of {asset}, needs {requested}")]
    InsufficientAllowance {
        account: AccountId,
        asset: AssetId,
        available: Amount,
        requested: Amount,
    },

    #[error("Trade {0} does not exist")]
    TradeNotFound(TradeId),

    #[error("Incorrect asset for {trade_id}: wants {expected}, got {provided}")]
    IncorrectAsset {
        trade_id: TradeId,
        expected: AssetId,
        provided: AssetId,
    },

    #[error("{caller} is not the owner of {trade_id}")]
    NotOwner { trade_id: TradeId, caller: AccountId },

    #[error("Trade amounts must be non-zero (give {give}, want {want})")]
    InvalidAmount { give: Amount, want: Amount },

    #[error("{0} is the escrow account and cannot trade")]
    ReservedAccount(AccountId),

    #[error("Escrow holds {held} of {asset} for {trade_id}, owes {owed}")]
    EscrowShortfall {
        trade_id: TradeId,
        asset: AssetId,
        held: Amount,
        owed: Amount,
    },

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl EscrowError {
    pub fn code(&self) -> ErrorCode {
        match self {
            EscrowError::InsufficientBalance { .. } => ErrorCode::InsufficientBalance,
            EscrowError::InsufficientAllowance { .. } => ErrorCode::InsufficientAllowance,
            EscrowError::TradeNotFound(_) => ErrorCode::TradeNotFound,
            EscrowError::IncorrectAsset { .. } => ErrorCode::IncorrectAsset,
            EscrowError::NotOwner { .. } => ErrorCode::NotOwner,
            EscrowError::InvalidAmount { .. } => ErrorCode::InvalidAmount,
            EscrowError::ReservedAccount(_) => ErrorCode::ReservedAccount,
            EscrowError::EscrowShortfall { .. } => ErrorCode::EscrowShortfall,
            EscrowError::Ledger(_) => ErrorCode::Ledger,
        }
    }

    // short literal reason, the same text regardless of the ids involved
    pub fn reason(&self) -> &'static str {
        match self.code() {
            ErrorCode::InsufficientBalance => "Insufficient balance",
            ErrorCode::InsufficientAllowance => "Insufficient allowance",
            ErrorCode::TradeNotFound => "Trade does not exist",
            ErrorCode::IncorrectAsset => "Incorrect token",
            ErrorCode::NotOwner => "Not trade owner",
            ErrorCode::InvalidAmount => "Invalid amount",
            ErrorCode::ReservedAccount => "Reserved account",
            ErrorCode::EscrowShortfall => "Escrow shortfall",
            ErrorCode::Ledger => "Ledger failure",
        }
    }
}
