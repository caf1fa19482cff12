//! Booking lifecycle, conflict detection, and checkout rollback tests

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveTime, Utc};
    use sqlx::PgPool;
    use uuid::Uuid;

    use borrowpal_server::bookings::{
        overlaps, BookingError, BookingService, BookingStatus, CancelBookingRequest,
        ConflictChecker, CreateBookingRequest, RespondBookingRequest, ReviewBookingRequest,
    };
    use borrowpal_server::borrows::PaymentStatus;
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

    fn booking_service(pool: &PgPool, payments: PaymentClient) -> BookingService {
        BookingService::new(
            pool.clone(),
            ConflictChecker::new(pool.clone()),
            WalletService::new(pool.clone()),
            NotificationService::new(pool.clone()),
            payments,
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

    async fn create_hourly_service(pool: &PgPool, provider_id: Uuid, price_cents: i64) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO services (
                id, provider_id, title, description, category, price_cents,
                price_type, location, created_at, updated_at
            )
            VALUES ($1, $2, 'Garden tidy-up', 'Mowing and weeding', 'gardening', $3,
                    'per_hour', 'Testville', NOW(), NOW())
            "#,
        )
        .bind(id)
        .bind(provider_id)
        .bind(price_cents)
        .execute(pool)
        .await
        .expect("Failed to insert service");
        id
    }

    async fn create_flat_service(pool: &PgPool, provider_id: Uuid, price_cents: i64) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO services (
                id, provider_id, title, description, category, price_cents,
                price_type, location, created_at, updated_at
            )
            VALUES ($1, $2, 'Gutter clean', 'Full gutter clear-out', 'cleaning', $3,
                    'per_service', 'Testville', NOW(), NOW())
            "#,
        )
        .bind(id)
        .bind(provider_id)
        .bind(price_cents)
        .execute(pool)
        .await
        .expect("Failed to insert service");
        id
    }

    fn slot(service_id: Uuid, start: &str, end: &str) -> CreateBookingRequest {
        CreateBookingRequest {
            service_id,
            booking_date: Utc::now().date_naive() + Duration::days(7),
            start_time: start.parse::<NaiveTime>().expect("valid time"),
            end_time: end.parse::<NaiveTime>().expect("valid time"),
            notes: None,
        }
    }

    fn t(s: &str) -> NaiveTime {
        s.parse().expect("valid time")
    }

    #[test]
    fn test_overlap_scenarios() {
        // Plain overlap
        assert!(overlaps(t("10:00"), t("12:00"), t("11:00"), t("13:00")));
        // Containment
        assert!(overlaps(t("10:00"), t("14:00"), t("11:00"), t("12:00")));
        // Touching slots share nothing
        assert!(!overlaps(t("10:00"), t("12:00"), t("12:00"), t("14:00")));
        // Disjoint
        assert!(!overlaps(t("08:00"), t("09:00"), t("14:00"), t("15:00")));
    }

    #[test]
    fn test_booking_times_must_be_ordered() {
        let request = slot(Uuid::new_v4(), "12:00", "10:00");
        assert!(request.validate().is_err());

        let request = slot(Uuid::new_v4(), "10:00", "10:00");
        assert!(request.validate().is_err());
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_full_booking_lifecycle() {
        let pool = setup_test_db().await;
        let service = booking_service(&pool, PaymentClient::simulated("USD"));
        let wallet = WalletService::new(pool.clone());

        let provider = create_user(&pool).await;
        let customer = create_user(&pool).await;
        let listing = create_hourly_service(&pool, provider, 2_000).await;

        // Two hours at 20/hour
        let created = service
            .create_booking(customer, slot(listing, "10:00", "12:00"))
            .await
            .expect("booking should succeed");
        assert_eq!(created.booking.status, BookingStatus::Pending);
        assert_eq!(created.booking.total_cents, 4_000);
        assert!(created.payment.session_id.starts_with("sim_"));

        let booking_id = created.booking.id;

        // Provider webhook settles the checkout; money leaves the
        // customer but the provider is not paid until completion
        let paid = service.confirm_payment(booking_id).await.unwrap();
        assert_eq!(paid.payment_status, PaymentStatus::Paid);
        assert_eq!(paid.status, BookingStatus::Pending);

        let customer_wallet = wallet.get_wallet(customer).await.unwrap();
        assert_eq!(customer_wallet.total_spent_cents, 4_000);
        let provider_wallet = wallet.get_wallet(provider).await.unwrap();
        assert_eq!(provider_wallet.available_cents, 0);

        // Provider accepts, starts, and finishes the work
        let confirmed = service
            .respond(
                provider,
                booking_id,
                RespondBookingRequest {
                    accept: true,
                    reason: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);
        assert!(confirmed.provider_response_at.is_some());

        let started = service.start(provider, booking_id).await.unwrap();
        assert_eq!(started.status, BookingStatus::InProgress);

        let done = service.complete(provider, booking_id).await.unwrap();
        assert_eq!(done.status, BookingStatus::Completed);

        let provider_wallet = wallet.get_wallet(provider).await.unwrap();
        assert_eq!(provider_wallet.available_cents, 4_000);
        assert_eq!(provider_wallet.total_earned_cents, 4_000);

        // Customer review folds into the service's running average
        let reviewed = service
            .review(
                customer,
                booking_id,
                ReviewBookingRequest {
                    rating: 5,
                    review: Some("Spotless.".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(reviewed.customer_rating, Some(5));

        let (rating_hundredths, total_reviews): (i64, i32) = sqlx::query_as(
            "SELECT rating_hundredths, total_reviews FROM services WHERE id = $1",
        )
        .bind(listing)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(rating_hundredths, 500);
        assert_eq!(total_reviews, 1);

        // One review per side
        let err = service
            .review(
                customer,
                booking_id,
                ReviewBookingRequest {
                    rating: 1,
                    review: None,
                },
            )
            .await
            .expect_err("second review must fail");
        assert!(matches!(err, BookingError::AlreadyReviewed(_)));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_flat_priced_service_charges_per_booking() {
        let pool = setup_test_db().await;
        let service = booking_service(&pool, PaymentClient::simulated("USD"));

        let provider = create_user(&pool).await;
        let customer = create_user(&pool).await;
        let listing = create_flat_service(&pool, provider, 5_000).await;

        // Three hours booked, but a per_service listing charges its
        // flat price no matter the duration
        let created = service
            .create_booking(customer, slot(listing, "09:00", "12:00"))
            .await
            .unwrap();
        assert_eq!(created.booking.total_cents, 5_000);
        assert_eq!(created.payment.amount_cents, 5_000);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_failed_checkout_rolls_back_booking() {
        let pool = setup_test_db().await;
        let service = booking_service(&pool, PaymentClient::always_failing("USD"));

        let provider = create_user(&pool).await;
        let customer = create_user(&pool).await;
        let listing = create_hourly_service(&pool, provider, 2_000).await;

        let err = service
            .create_booking(customer, slot(listing, "10:00", "12:00"))
            .await
            .expect_err("checkout failure must surface");
        assert!(matches!(err, BookingError::Payment(_)));

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM service_bookings WHERE service_id = $1")
                .bind(listing)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(count, 0, "the compensated booking must not linger");
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_overlapping_booking_is_refused() {
        let pool = setup_test_db().await;
        let service = booking_service(&pool, PaymentClient::simulated("USD"));

        let provider = create_user(&pool).await;
        let first_customer = create_user(&pool).await;
        let second_customer = create_user(&pool).await;
        let listing = create_hourly_service(&pool, provider, 2_000).await;

        service
            .create_booking(first_customer, slot(listing, "10:00", "12:00"))
            .await
            .unwrap();

        let err = service
            .create_booking(second_customer, slot(listing, "11:00", "13:00"))
            .await
            .expect_err("overlapping slot must be refused");
        assert!(matches!(err, BookingError::SlotTaken(_)));

        // Touching slots are fine
        service
            .create_booking(second_customer, slot(listing, "12:00", "14:00"))
            .await
            .expect("adjacent slot should succeed");
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_exclusion_constraint_catches_races() {
        let pool = setup_test_db().await;

        let provider = create_user(&pool).await;
        let customer = create_user(&pool).await;
        let listing = create_hourly_service(&pool, provider, 2_000).await;

        let date = Utc::now().date_naive() + Duration::days(7);
        let insert = r#"
            INSERT INTO service_bookings (
                id, service_id, customer_id, provider_id, booking_date,
                start_time, end_time, total_cents, order_number,
                confirmation_code, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, 4000, $8, '123456', NOW(), NOW())
        "#;

        // First writer wins
        sqlx::query(insert)
            .bind(Uuid::new_v4())
            .bind(listing)
            .bind(customer)
            .bind(provider)
            .bind(date)
            .bind(t("10:00"))
            .bind(t("12:00"))
            .bind(format!("BP-{}", &Uuid::new_v4().simple().to_string()[..8]))
            .execute(&pool)
            .await
            .expect("first insert should succeed");

        // Second writer that slipped past the pre-check is stopped by
        // the exclusion constraint
        let err = sqlx::query(insert)
            .bind(Uuid::new_v4())
            .bind(listing)
            .bind(customer)
            .bind(provider)
            .bind(date)
            .bind(t("11:00"))
            .bind(t("13:00"))
            .bind(format!("BP-{}", &Uuid::new_v4().simple().to_string()[..8]))
            .execute(&pool)
            .await
            .expect_err("overlapping insert must violate the constraint");

        match err {
            sqlx::Error::Database(db) => assert_eq!(db.code().as_deref(), Some("23P01")),
            other => panic!("expected a database error, got {other:?}"),
        }
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_cancelled_booking_frees_the_slot() {
        let pool = setup_test_db().await;
        let service = booking_service(&pool, PaymentClient::simulated("USD"));

        let provider = create_user(&pool).await;
        let customer = create_user(&pool).await;
        let listing = create_hourly_service(&pool, provider, 2_000).await;

        let first = service
            .create_booking(customer, slot(listing, "10:00", "12:00"))
            .await
            .unwrap();

        service
            .cancel(
                customer,
                first.booking.id,
                CancelBookingRequest {
                    reason: Some("Change of plans".to_string()),
                },
            )
            .await
            .unwrap();

        // Same slot, same day: the cancellation made room
        service
            .create_booking(customer, slot(listing, "10:00", "12:00"))
            .await
            .expect("rebooking a cancelled slot should succeed");
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_day_calendar_hides_cancelled_slots() {
        let pool = setup_test_db().await;
        let service = booking_service(&pool, PaymentClient::simulated("USD"));

        let provider = create_user(&pool).await;
        let customer = create_user(&pool).await;
        let listing = create_hourly_service(&pool, provider, 2_000).await;

        let date = Utc::now().date_naive() + Duration::days(7);

        let morning = service
            .create_booking(customer, slot(listing, "09:00", "10:00"))
            .await
            .unwrap();
        service
            .create_booking(customer, slot(listing, "14:00", "15:00"))
            .await
            .unwrap();
        service
            .cancel(customer, morning.booking.id, CancelBookingRequest { reason: None })
            .await
            .unwrap();

        let slots = service.day_calendar(listing, date).await.unwrap();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].start_time, t("14:00"));
        assert_eq!(slots[0].end_time, t("15:00"));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_only_the_provider_runs_the_work() {
        let pool = setup_test_db().await;
        let service = booking_service(&pool, PaymentClient::simulated("USD"));

        let provider = create_user(&pool).await;
        let customer = create_user(&pool).await;
        let listing = create_hourly_service(&pool, provider, 2_000).await;

        let created = service
            .create_booking(customer, slot(listing, "10:00", "12:00"))
            .await
            .unwrap();

        let err = service
            .respond(
                customer,
                created.booking.id,
                RespondBookingRequest {
                    accept: true,
                    reason: None,
                },
            )
            .await
            .expect_err("customers must not confirm their own bookings");
        assert!(matches!(err, BookingError::Forbidden(_)));

        let err = service
            .start(customer, created.booking.id)
            .await
            .expect_err("customers must not start the work");
        assert!(matches!(err, BookingError::Forbidden(_)));
    }
}
