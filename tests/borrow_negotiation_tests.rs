//! Borrow request lifecycle and negotiation ledger tests

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use sqlx::PgPool;
    use uuid::Uuid;

    use borrowpal_server::borrows::{
        BorrowService, CreateBorrowRequest, NegotiationStatus, ProposePriceRequest, RequestError,
        RequestStatus,
    };
    use borrowpal_server::notifications::NotificationService;
    use borrowpal_server::payments::PaymentClient;
    use borrowpal_server::wallet::WalletService;

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

    fn borrow_service(pool: &PgPool) -> BorrowService {
        BorrowService::new(
            pool.clone(),
            WalletService::new(pool.clone()),
            NotificationService::new(pool.clone()),
            PaymentClient::simulated("USD"),
        )
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

        sqlx::query("INSERT INTO user_wallets (user_id, updated_at) VALUES ($1, NOW())")
            .bind(id)
            .execute(pool)
            .await
            .expect("Failed to insert wallet");

        id
    }

    async fn create_item(pool: &PgPool, owner_id: Uuid, price_per_day_cents: i64) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO items (
                id, owner_id, title, description, category, condition,
                price_per_day_cents, location, created_at, updated_at
            )
            VALUES ($1, $2, 'Cordless drill', 'Barely used', 'tools', 'good', $3, 'Testville', NOW(), NOW())
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(price_per_day_cents)
        .execute(pool)
        .await
        .expect("Failed to insert item");
        id
    }

    /// Three inclusive days starting a week from now
    fn three_day_request(item_id: Uuid) -> CreateBorrowRequest {
        let start = Utc::now().date_naive() + Duration::days(7);
        CreateBorrowRequest {
            item_id,
            start_date: start,
            end_date: start + Duration::days(2),
            message: Some("May I borrow this?".to_string()),
        }
    }

    #[test]
    fn test_backwards_date_range_is_refused() {
        let start = Utc::now().date_naive() + Duration::days(7);
        let request = CreateBorrowRequest {
            item_id: Uuid::new_v4(),
            start_date: start,
            end_date: start - Duration::days(1),
            message: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_single_day_range_is_allowed() {
        let start = Utc::now().date_naive() + Duration::days(7);
        let request = CreateBorrowRequest {
            item_id: Uuid::new_v4(),
            start_date: start,
            end_date: start,
            message: None,
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_negative_proposal_is_refused() {
        let proposal = ProposePriceRequest {
            proposed_price_cents: -100,
            message: None,
        };
        assert!(proposal.validate().is_err());
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_full_negotiation_lifecycle() {
        let pool = setup_test_db().await;
        let service = borrow_service(&pool);
        let wallet = WalletService::new(pool.clone());

        let lender = create_user(&pool).await;
        let borrower = create_user(&pool).await;
        let item = create_item(&pool, lender, 1_000).await;

        // Borrower opens a request: 3 inclusive days at the live price
        let request = service
            .create_request(borrower, three_day_request(item))
            .await
            .expect("create should succeed");
        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.total_cents, 3_000);

        // Lender proposes a discount; request enters negotiation
        let first = service
            .propose_price(
                lender,
                request.id,
                ProposePriceRequest {
                    proposed_price_cents: 800,
                    message: Some("How about 8 a day?".to_string()),
                },
            )
            .await
            .expect("first proposal should succeed");
        assert_eq!(first.status, NegotiationStatus::Open);

        let after_first = service.get_request(borrower, request.id).await.unwrap();
        assert_eq!(after_first.status, RequestStatus::Negotiating);
        assert_eq!(after_first.total_cents, 2_400);

        // Borrower counters; the first proposal is superseded
        service
            .propose_price(
                borrower,
                request.id,
                ProposePriceRequest {
                    proposed_price_cents: 900,
                    message: None,
                },
            )
            .await
            .expect("counter proposal should succeed");

        let history = service.list_negotiations(borrower, request.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].proposed_price_cents, 900);
        assert_eq!(history[0].status, NegotiationStatus::Open);
        assert_eq!(history[1].status, NegotiationStatus::Superseded);

        // Lender approves at the counter price
        let approved = service.approve(lender, request.id).await.unwrap();
        assert_eq!(approved.status, RequestStatus::PaymentPending);
        assert_eq!(approved.original_price_cents, Some(1_000));
        assert_eq!(approved.total_cents, 2_700);

        let history = service.list_negotiations(lender, request.id).await.unwrap();
        assert_eq!(history[0].status, NegotiationStatus::Accepted);

        // Borrower opens checkout (simulated) and the provider settles it
        let session = service
            .create_payment_session(borrower, request.id)
            .await
            .expect("payment session should open");
        assert!(session.url.contains(&session.session_id));

        let paid = service.confirm_payment(request.id).await.unwrap();
        assert_eq!(paid.status, RequestStatus::Paid);

        let lender_wallet = wallet.get_wallet(lender).await.unwrap();
        assert_eq!(lender_wallet.available_cents, 2_700);
        assert_eq!(lender_wallet.total_earned_cents, 2_700);

        let borrower_wallet = wallet.get_wallet(borrower).await.unwrap();
        assert_eq!(borrower_wallet.available_cents, 0);
        assert_eq!(borrower_wallet.total_spent_cents, 2_700);

        // Hand over, then return
        let active = service.activate(lender, request.id).await.unwrap();
        assert_eq!(active.status, RequestStatus::Active);

        let done = service.complete(lender, request.id).await.unwrap();
        assert_eq!(done.status, RequestStatus::Completed);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_proposals_refused_once_payment_starts() {
        let pool = setup_test_db().await;
        let service = borrow_service(&pool);

        let lender = create_user(&pool).await;
        let borrower = create_user(&pool).await;
        let item = create_item(&pool, lender, 1_000).await;

        let request = service
            .create_request(borrower, three_day_request(item))
            .await
            .unwrap();
        service.approve(lender, request.id).await.unwrap();

        let err = service
            .propose_price(
                borrower,
                request.id,
                ProposePriceRequest {
                    proposed_price_cents: 500,
                    message: None,
                },
            )
            .await
            .expect_err("proposal after approval must fail");
        assert!(matches!(err, RequestError::InvalidTransition(_)));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_paid_request_cannot_be_rejected_or_cancelled() {
        let pool = setup_test_db().await;
        let service = borrow_service(&pool);

        let lender = create_user(&pool).await;
        let borrower = create_user(&pool).await;
        let item = create_item(&pool, lender, 1_000).await;

        let request = service
            .create_request(borrower, three_day_request(item))
            .await
            .unwrap();
        service.approve(lender, request.id).await.unwrap();
        service.confirm_payment(request.id).await.unwrap();

        let err = service
            .reject(lender, request.id)
            .await
            .expect_err("reject after payment must fail");
        assert!(matches!(err, RequestError::InvalidTransition(_)));

        let err = service
            .cancel(borrower, request.id)
            .await
            .expect_err("cancel after payment must fail");
        assert!(matches!(err, RequestError::InvalidTransition(_)));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_webhook_retry_credits_once() {
        let pool = setup_test_db().await;
        let service = borrow_service(&pool);
        let wallet = WalletService::new(pool.clone());

        let lender = create_user(&pool).await;
        let borrower = create_user(&pool).await;
        let item = create_item(&pool, lender, 1_000).await;

        let request = service
            .create_request(borrower, three_day_request(item))
            .await
            .unwrap();
        service.approve(lender, request.id).await.unwrap();

        // The provider may deliver the same webhook more than once
        service.confirm_payment(request.id).await.unwrap();
        service.confirm_payment(request.id).await.unwrap();

        let lender_wallet = wallet.get_wallet(lender).await.unwrap();
        assert_eq!(lender_wallet.available_cents, 3_000);

        let credit_rows: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM wallet_transactions WHERE user_id = $1 AND kind = 'payment_received'",
        )
        .bind(lender)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(credit_rows, 1);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_own_item_cannot_be_borrowed() {
        let pool = setup_test_db().await;
        let service = borrow_service(&pool);

        let owner = create_user(&pool).await;
        let item = create_item(&pool, owner, 1_000).await;

        let err = service
            .create_request(owner, three_day_request(item))
            .await
            .expect_err("borrowing your own item must fail");
        assert!(matches!(err, RequestError::Validation(_)));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_outsiders_cannot_see_requests() {
        let pool = setup_test_db().await;
        let service = borrow_service(&pool);

        let lender = create_user(&pool).await;
        let borrower = create_user(&pool).await;
        let outsider = create_user(&pool).await;
        let item = create_item(&pool, lender, 1_000).await;

        let request = service
            .create_request(borrower, three_day_request(item))
            .await
            .unwrap();

        let err = service
            .get_request(outsider, request.id)
            .await
            .expect_err("outsiders must not see the request");
        assert!(matches!(err, RequestError::Forbidden(_)));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_transitions_enqueue_notifications() {
        let pool = setup_test_db().await;
        let service = borrow_service(&pool);

        let lender = create_user(&pool).await;
        let borrower = create_user(&pool).await;
        let item = create_item(&pool, lender, 1_000).await;

        let request = service
            .create_request(borrower, three_day_request(item))
            .await
            .unwrap();

        // The lender hears about the new request in the same transaction
        let (kind, delivered): (String, bool) = sqlx::query_as(
            r#"
            SELECT kind, delivered_at IS NOT NULL FROM notifications
            WHERE user_id = $1 AND request_id = $2
            ORDER BY created_at DESC LIMIT 1
            "#,
        )
        .bind(lender)
        .bind(request.id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(kind, "request_created");
        assert!(!delivered, "outbox rows start undelivered");
    }
}
