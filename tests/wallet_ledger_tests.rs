//! Wallet ledger and withdrawal tests

#[cfg(test)]
mod tests {
    use sqlx::PgPool;
    use uuid::Uuid;

    use borrowpal_server::models::PaginationParams;
    use borrowpal_server::pricing::withdrawal_fee_cents;
    use borrowpal_server::wallet::{
        DepositRequest, TransactionKind, TransactionStatus, WalletError, WalletService,
        WithdrawRequest, WithdrawalSpeed,
    };

    /// Helper to create a test database pool
    async fn setup_test_db() -> PgPool {
        let database_url = std::env::var("TEST_DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/borrowpal_test".to_string());

        sqlx::postgres::PgPoolOptions::new()
            .max_connections(1)
            .connect(&database_url)
            .await
            .expect("Failed to connect to test database")
    }

    async fn create_user(pool: &PgPool) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, display_name, created_at, updated_at)
            VALUES ($1, $2, 'hash', 'Test User', NOW(), NOW())
            "#,
        )
        .bind(id)
        .bind(format!("{}@test.example", id))
        .execute(pool)
        .await
        .expect("Failed to insert user");
        id
    }

    async fn ledger_rows(pool: &PgPool, user_id: Uuid) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM wallet_transactions WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
            .expect("count should succeed")
    }

    #[test]
    fn test_fee_rounds_half_up() {
        // 0.5% standard tier
        assert_eq!(withdrawal_fee_cents(4_000, 50), 20);
        assert_eq!(withdrawal_fee_cents(10_000, 50), 50);
        // 999 * 50 / 10_000 = 4.995, rounds up
        assert_eq!(withdrawal_fee_cents(999, 50), 5);
        // 1.5% express tier
        assert_eq!(withdrawal_fee_cents(10_000, 150), 150);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_withdrawal_splits_fee_from_net() {
        let pool = setup_test_db().await;
        let wallet = WalletService::new(pool.clone());
        let user = create_user(&pool).await;

        wallet
            .deposit(
                user,
                DepositRequest {
                    amount_cents: 10_000,
                    description: None,
                },
            )
            .await
            .unwrap();

        let receipt = wallet
            .withdraw(
                user,
                WithdrawRequest {
                    amount_cents: 4_000,
                    speed: WithdrawalSpeed::Standard,
                },
            )
            .await
            .unwrap();

        assert_eq!(receipt.amount_cents, 4_000);
        assert_eq!(receipt.fee_cents, 20);
        assert_eq!(receipt.net_cents, 3_980);
        assert_eq!(receipt.status, TransactionStatus::Pending);
        assert_eq!(receipt.estimated_completion, "1-3 business days");

        let summary = wallet.get_wallet(user).await.unwrap();
        assert_eq!(summary.available_cents, 6_000);
        assert_eq!(summary.pending_cents, 3_980);
        assert_eq!(summary.total_spent_cents, 4_000);

        // Deposit row plus the -net / -fee withdrawal pair
        assert_eq!(ledger_rows(&pool, user).await, 3);

        let outflow: i64 = sqlx::query_scalar(
            r#"
            SELECT CAST(SUM(amount_cents) AS BIGINT) FROM wallet_transactions
            WHERE user_id = $1 AND kind IN ('withdrawal', 'withdrawal_fee')
            "#,
        )
        .bind(user)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(outflow, -4_000);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_overdraft_is_refused_and_leaves_no_trace() {
        let pool = setup_test_db().await;
        let wallet = WalletService::new(pool.clone());
        let user = create_user(&pool).await;

        wallet
            .deposit(
                user,
                DepositRequest {
                    amount_cents: 1_000,
                    description: None,
                },
            )
            .await
            .unwrap();
        let rows_before = ledger_rows(&pool, user).await;

        let err = wallet
            .withdraw(
                user,
                WithdrawRequest {
                    amount_cents: 5_000,
                    speed: WithdrawalSpeed::Standard,
                },
            )
            .await
            .expect_err("overdraft must be refused");

        match err {
            WalletError::InsufficientFunds {
                available_cents,
                requested_cents,
            } => {
                assert_eq!(available_cents, 1_000);
                assert_eq!(requested_cents, 5_000);
            }
            other => panic!("expected InsufficientFunds, got {other:?}"),
        }

        let summary = wallet.get_wallet(user).await.unwrap();
        assert_eq!(summary.available_cents, 1_000);
        assert_eq!(summary.pending_cents, 0);
        assert_eq!(ledger_rows(&pool, user).await, rows_before);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_express_withdrawal_moves_faster() {
        let pool = setup_test_db().await;
        let wallet = WalletService::new(pool.clone());
        let user = create_user(&pool).await;

        wallet
            .deposit(
                user,
                DepositRequest {
                    amount_cents: 10_000,
                    description: None,
                },
            )
            .await
            .unwrap();

        let receipt = wallet
            .withdraw(
                user,
                WithdrawRequest {
                    amount_cents: 10_000,
                    speed: WithdrawalSpeed::Express,
                },
            )
            .await
            .unwrap();

        assert_eq!(receipt.fee_cents, 150);
        assert_eq!(receipt.net_cents, 9_850);
        assert_eq!(receipt.status, TransactionStatus::Processing);
        assert_eq!(receipt.estimated_completion, "15-30 minutes");
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_card_payments_never_touch_the_balance() {
        let pool = setup_test_db().await;
        let wallet = WalletService::new(pool.clone());
        let payer = create_user(&pool).await;
        let payee = create_user(&pool).await;

        let mut tx = pool.begin().await.unwrap();
        wallet
            .record_payment_sent_in_tx(
                &mut tx,
                payer,
                2_500,
                "Borrow payment for \"Cordless drill\"",
                None,
                Some(payee),
            )
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let summary = wallet.get_wallet(payer).await.unwrap();
        assert_eq!(summary.available_cents, 0);
        assert_eq!(summary.total_spent_cents, 2_500);

        let (kind, amount): (TransactionKind, i64) = sqlx::query_as(
            "SELECT kind, amount_cents FROM wallet_transactions WHERE user_id = $1",
        )
        .bind(payer)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(kind, TransactionKind::PaymentSent);
        assert_eq!(amount, -2_500);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_deposits_raise_available() {
        let pool = setup_test_db().await;
        let wallet = WalletService::new(pool.clone());
        let user = create_user(&pool).await;

        let transaction = wallet
            .deposit(
                user,
                DepositRequest {
                    amount_cents: 7_500,
                    description: Some("Test top-up".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(transaction.kind, TransactionKind::Deposit);
        assert_eq!(transaction.amount_cents, 7_500);
        assert_eq!(transaction.description, "Test top-up");

        let summary = wallet.get_wallet(user).await.unwrap();
        assert_eq!(summary.available_cents, 7_500);
        assert_eq!(summary.total_earned_cents, 0);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_history_is_newest_first() {
        let pool = setup_test_db().await;
        let wallet = WalletService::new(pool.clone());
        let user = create_user(&pool).await;

        for amount in [1_000, 2_000, 3_000] {
            wallet
                .deposit(
                    user,
                    DepositRequest {
                        amount_cents: amount,
                        description: None,
                    },
                )
                .await
                .unwrap();
        }

        let page = wallet
            .list_transactions(
                user,
                PaginationParams {
                    page: None,
                    limit: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.data[0].amount_cents, 3_000);
        assert_eq!(page.data[2].amount_cents, 1_000);
    }
}
