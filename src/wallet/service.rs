//! Wallet ledger service layer
//!
//! Every balance movement is a ledger insert plus atomic increments on
//! the per-user aggregate, committed together. Balances are never read,
//! modified and written back from application code.

use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{PaginatedResponse, PaginationParams};
use crate::pricing::withdrawal_fee_cents;
use crate::wallet::model::{
    DepositRequest, TransactionKind, TransactionStatus, UserWallet, WalletTransaction,
    WithdrawRequest, WithdrawalReceipt,
};

/// Wallet service errors
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Insufficient funds: available {available_cents}, requested {requested_cents}")]
    InsufficientFunds {
        available_cents: i64,
        requested_cents: i64,
    },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

impl From<sqlx::Error> for WalletError {
    fn from(e: sqlx::Error) -> Self {
        WalletError::DatabaseError(e.to_string())
    }
}

impl From<WalletError> for ApiError {
    fn from(e: WalletError) -> Self {
        match e {
            WalletError::InsufficientFunds {
                available_cents,
                requested_cents,
            } => ApiError::InsufficientFunds {
                available_cents,
                requested_cents,
            },
            WalletError::InvalidAmount(msg) => ApiError::BadRequest(msg),
            WalletError::DatabaseError(msg) => ApiError::DatabaseError(msg),
        }
    }
}

/// Wallet ledger service
#[derive(Clone)]
pub struct WalletService {
    db_pool: PgPool,
}

impl WalletService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Credit a user's wallet inside an existing transaction.
    ///
    /// Used by the borrow and booking services so the credit commits (or
    /// rolls back) together with the state transition that earned it.
    /// `kind` should be `PaymentReceived` or `ServicePayment`.
    pub async fn credit_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        amount_cents: i64,
        kind: TransactionKind,
        description: &str,
        related_request_id: Option<Uuid>,
        from_user_id: Option<Uuid>,
    ) -> Result<WalletTransaction, sqlx::Error> {
        let now = Utc::now();

        let transaction = sqlx::query_as::<_, WalletTransaction>(
            r#"
            INSERT INTO wallet_transactions (
                id, user_id, kind, amount_cents, description, status,
                related_request_id, from_user_id, to_user_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NULL, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(kind)
        .bind(amount_cents)
        .bind(description)
        .bind(TransactionStatus::Completed)
        .bind(related_request_id)
        .bind(from_user_id)
        .bind(now)
        .fetch_one(&mut **tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO user_wallets (user_id, available_cents, total_earned_cents, updated_at)
            VALUES ($1, $2, $2, $3)
            ON CONFLICT (user_id) DO UPDATE SET
                available_cents = user_wallets.available_cents + EXCLUDED.available_cents,
                total_earned_cents = user_wallets.total_earned_cents + EXCLUDED.total_earned_cents,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user_id)
        .bind(amount_cents)
        .bind(now)
        .execute(&mut **tx)
        .await?;

        Ok(transaction)
    }

    /// Credit a user's wallet in its own transaction
    pub async fn credit(
        &self,
        user_id: Uuid,
        amount_cents: i64,
        kind: TransactionKind,
        description: &str,
        related_request_id: Option<Uuid>,
        from_user_id: Option<Uuid>,
    ) -> Result<WalletTransaction, WalletError> {
        if amount_cents <= 0 {
            return Err(WalletError::InvalidAmount(
                "Credit amount must be positive".to_string(),
            ));
        }

        let mut tx = self.db_pool.begin().await?;
        let transaction = self
            .credit_in_tx(
                &mut tx,
                user_id,
                amount_cents,
                kind,
                description,
                related_request_id,
                from_user_id,
            )
            .await?;
        tx.commit().await?;

        Ok(transaction)
    }

    /// Record an outgoing card payment inside an existing transaction.
    ///
    /// Card payments never pass through the wallet balance: the ledger
    /// row and total_spent keep the history, available_cents is untouched.
    pub async fn record_payment_sent_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        payer_id: Uuid,
        amount_cents: i64,
        description: &str,
        related_request_id: Option<Uuid>,
        to_user_id: Option<Uuid>,
    ) -> Result<WalletTransaction, sqlx::Error> {
        let now = Utc::now();

        let transaction = sqlx::query_as::<_, WalletTransaction>(
            r#"
            INSERT INTO wallet_transactions (
                id, user_id, kind, amount_cents, description, status,
                related_request_id, from_user_id, to_user_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, NULL, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(payer_id)
        .bind(TransactionKind::PaymentSent)
        .bind(-amount_cents)
        .bind(description)
        .bind(TransactionStatus::Completed)
        .bind(related_request_id)
        .bind(to_user_id)
        .bind(now)
        .fetch_one(&mut **tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO user_wallets (user_id, total_spent_cents, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE SET
                total_spent_cents = user_wallets.total_spent_cents + EXCLUDED.total_spent_cents,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(payer_id)
        .bind(amount_cents)
        .bind(now)
        .execute(&mut **tx)
        .await?;

        Ok(transaction)
    }

    /// Withdraw funds to the user's (simulated) bank account.
    ///
    /// The no-overdraft guard is the conditional UPDATE: the debit only
    /// happens where `available_cents >= amount`, and a zero row count
    /// means the whole withdrawal is refused. Check and debit are a
    /// single atomic statement, so two racing withdrawals can never both
    /// pass the balance check.
    pub async fn withdraw(
        &self,
        user_id: Uuid,
        request: WithdrawRequest,
    ) -> Result<WithdrawalReceipt, WalletError> {
        if request.amount_cents <= 0 {
            return Err(WalletError::InvalidAmount(
                "Withdrawal amount must be positive".to_string(),
            ));
        }

        let fee_cents = withdrawal_fee_cents(request.amount_cents, request.speed.fee_bps());
        let net_cents = request.amount_cents - fee_cents;
        let status = request.speed.ledger_status();
        let now = Utc::now();

        let mut tx = self.db_pool.begin().await?;

        let rows_affected = sqlx::query(
            r#"
            UPDATE user_wallets SET
                available_cents = available_cents - $2,
                pending_cents = pending_cents + $3,
                total_spent_cents = total_spent_cents + $2,
                updated_at = $4
            WHERE user_id = $1 AND available_cents >= $2
            "#,
        )
        .bind(user_id)
        .bind(request.amount_cents)
        .bind(net_cents)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            let available_cents: i64 = sqlx::query_scalar(
                "SELECT COALESCE((SELECT available_cents FROM user_wallets WHERE user_id = $1), 0)",
            )
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;

            return Err(WalletError::InsufficientFunds {
                available_cents,
                requested_cents: request.amount_cents,
            });
        }

        // Two ledger rows per withdrawal: -net and -fee, summing to -amount
        let withdrawal = sqlx::query_as::<_, WalletTransaction>(
            r#"
            INSERT INTO wallet_transactions (
                id, user_id, kind, amount_cents, description, status,
                related_request_id, from_user_id, to_user_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, NULL, NULL, NULL, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(TransactionKind::Withdrawal)
        .bind(-net_cents)
        .bind(format!("Withdrawal ({})", request.speed.as_str()))
        .bind(status)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO wallet_transactions (
                id, user_id, kind, amount_cents, description, status,
                related_request_id, from_user_id, to_user_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, NULL, NULL, NULL, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(TransactionKind::WithdrawalFee)
        .bind(-fee_cents)
        .bind(format!("Withdrawal fee ({} bps)", request.speed.fee_bps()))
        .bind(status)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(WithdrawalReceipt {
            transaction_id: withdrawal.id,
            amount_cents: request.amount_cents,
            fee_cents,
            net_cents,
            speed: request.speed,
            status,
            estimated_completion: request.speed.estimated_completion(),
        })
    }

    /// Simulated top-up: ledger row plus available increment
    pub async fn deposit(
        &self,
        user_id: Uuid,
        request: DepositRequest,
    ) -> Result<WalletTransaction, WalletError> {
        if request.amount_cents <= 0 {
            return Err(WalletError::InvalidAmount(
                "Deposit amount must be positive".to_string(),
            ));
        }

        let now = Utc::now();
        let description = request
            .description
            .unwrap_or_else(|| "Wallet deposit".to_string());

        let mut tx = self.db_pool.begin().await?;

        let transaction = sqlx::query_as::<_, WalletTransaction>(
            r#"
            INSERT INTO wallet_transactions (
                id, user_id, kind, amount_cents, description, status,
                related_request_id, from_user_id, to_user_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, NULL, NULL, NULL, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(TransactionKind::Deposit)
        .bind(request.amount_cents)
        .bind(&description)
        .bind(TransactionStatus::Completed)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO user_wallets (user_id, available_cents, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE SET
                available_cents = user_wallets.available_cents + EXCLUDED.available_cents,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user_id)
        .bind(request.amount_cents)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(transaction)
    }

    /// Wallet summary, provisioning the zero row on first read
    pub async fn get_wallet(&self, user_id: Uuid) -> Result<UserWallet, WalletError> {
        sqlx::query(
            r#"
            INSERT INTO user_wallets (user_id, updated_at)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(Utc::now())
        .execute(&self.db_pool)
        .await?;

        let wallet = sqlx::query_as::<_, UserWallet>(
            "SELECT * FROM user_wallets WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(wallet)
    }

    /// Transaction history, newest first
    pub async fn list_transactions(
        &self,
        user_id: Uuid,
        pagination: PaginationParams,
    ) -> Result<PaginatedResponse<WalletTransaction>, WalletError> {
        let (limit, offset) = pagination.limit_offset();

        let transactions = sqlx::query_as::<_, WalletTransaction>(
            r#"
            SELECT * FROM wallet_transactions
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db_pool)
        .await?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM wallet_transactions WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.db_pool)
                .await?;

        Ok(PaginatedResponse {
            data: transactions,
            total,
            page: pagination.page.unwrap_or(1).max(1),
            limit: pagination.limit.unwrap_or(20).clamp(1, 100),
        })
    }
}
