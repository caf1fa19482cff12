//! Wallet ledger models

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::pricing::{EXPRESS_FEE_BPS, STANDARD_FEE_BPS};

/// One append-only ledger row. Positive amounts flow into the wallet,
/// negative amounts flow out.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct WalletTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: TransactionKind,
    pub amount_cents: i64,
    pub description: String,
    pub status: TransactionStatus,
    pub related_request_id: Option<Uuid>,
    pub from_user_id: Option<Uuid>,
    pub to_user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "transaction_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Lender's side of a paid borrow request
    PaymentReceived,
    /// Provider's side of a completed service booking
    ServicePayment,
    /// Payer's record of an outgoing card payment
    PaymentSent,
    Withdrawal,
    WithdrawalFee,
    Deposit,
}

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "transaction_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// Per-user running aggregate, moved only by atomic increments in the
/// same transaction as the ledger rows it summarizes.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct UserWallet {
    pub user_id: Uuid,
    pub available_cents: i64,
    pub pending_cents: i64,
    pub total_earned_cents: i64,
    pub total_spent_cents: i64,
    pub updated_at: DateTime<Utc>,
}

/// Withdrawal speed tiers
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalSpeed {
    Standard,
    Express,
}

impl WithdrawalSpeed {
    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawalSpeed::Standard => "standard",
            WithdrawalSpeed::Express => "express",
        }
    }

    /// Fee in basis points of the withdrawn amount
    pub fn fee_bps(&self) -> i64 {
        match self {
            WithdrawalSpeed::Standard => STANDARD_FEE_BPS,
            WithdrawalSpeed::Express => EXPRESS_FEE_BPS,
        }
    }

    /// Ledger status of the withdrawal rows while in flight
    pub fn ledger_status(&self) -> TransactionStatus {
        match self {
            WithdrawalSpeed::Standard => TransactionStatus::Pending,
            WithdrawalSpeed::Express => TransactionStatus::Processing,
        }
    }

    pub fn estimated_completion(&self) -> &'static str {
        match self {
            WithdrawalSpeed::Standard => "1-3 business days",
            WithdrawalSpeed::Express => "15-30 minutes",
        }
    }
}

/// Request DTO for withdrawing funds
#[derive(Debug, Deserialize)]
pub struct WithdrawRequest {
    pub amount_cents: i64,
    pub speed: WithdrawalSpeed,
}

/// Request DTO for the simulated deposit top-up
#[derive(Debug, Deserialize)]
pub struct DepositRequest {
    pub amount_cents: i64,
    pub description: Option<String>,
}

/// Response DTO for a withdrawal
#[derive(Debug, Serialize)]
pub struct WithdrawalReceipt {
    pub transaction_id: Uuid,
    pub amount_cents: i64,
    pub fee_cents: i64,
    pub net_cents: i64,
    pub speed: WithdrawalSpeed,
    pub status: TransactionStatus,
    pub estimated_completion: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_tiers() {
        assert_eq!(WithdrawalSpeed::Standard.fee_bps(), 50);
        assert_eq!(WithdrawalSpeed::Express.fee_bps(), 150);
        assert_eq!(
            WithdrawalSpeed::Standard.ledger_status(),
            TransactionStatus::Pending
        );
        assert_eq!(
            WithdrawalSpeed::Express.ledger_status(),
            TransactionStatus::Processing
        );
    }
}
