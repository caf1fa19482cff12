//! Borrow request workflow: request lifecycle, price negotiation and payment

use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use crate::borrows::model::{
    BorrowRequest, BorrowRequestFilter, CreateBorrowRequest, Negotiation, NegotiationStatus,
    PaymentStatus, ProposePriceRequest, RequestRole, RequestStatus,
};
use crate::error::ApiError;
use crate::items::Item;
use crate::models::{PaginatedResponse, PaginationParams};
use crate::notifications::NotificationService;
use crate::payments::{PaymentClient, PaymentError, PaymentSession};
use crate::pricing;
use crate::wallet::{TransactionKind, WalletService};

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("Borrow request not found")]
    NotFound,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    InvalidTransition(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    ItemUnavailable(String),
    #[error(transparent)]
    Payment(#[from] PaymentError),
}

impl From<RequestError> for ApiError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::DatabaseError(e) => ApiError::DatabaseError(e.to_string()),
            RequestError::NotFound => ApiError::NotFound("Borrow request not found".to_string()),
            RequestError::Forbidden(msg) => ApiError::Forbidden(msg),
            RequestError::InvalidTransition(msg) => ApiError::InvalidTransition(msg),
            RequestError::Validation(msg) => ApiError::ValidationError(msg),
            RequestError::ItemUnavailable(msg) => ApiError::Conflict(msg),
            RequestError::Payment(e) => e.into(),
        }
    }
}

/// Orchestrates the borrow request lifecycle. Every status change goes
/// through a row lock and the transition table in [`RequestStatus`].
#[derive(Clone)]
pub struct BorrowService {
    db_pool: PgPool,
    wallet: WalletService,
    notifications: NotificationService,
    payments: PaymentClient,
}

impl BorrowService {
    pub fn new(
        db_pool: PgPool,
        wallet: WalletService,
        notifications: NotificationService,
        payments: PaymentClient,
    ) -> Self {
        Self {
            db_pool,
            wallet,
            notifications,
            payments,
        }
    }

    /// Open a borrow request against an available item. The total is
    /// computed from the item's live daily price over the inclusive
    /// date range; the lender is notified in the same transaction.
    pub async fn create_request(
        &self,
        borrower_id: Uuid,
        request: CreateBorrowRequest,
    ) -> Result<BorrowRequest, RequestError> {
        request.validate().map_err(RequestError::Validation)?;

        if request.start_date < Utc::now().date_naive() {
            return Err(RequestError::Validation(
                "Start date must not be in the past".to_string(),
            ));
        }

        let item = sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = $1")
            .bind(request.item_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| RequestError::Validation("Item not found".to_string()))?;

        if !item.available {
            return Err(RequestError::ItemUnavailable(
                "Item is not available for borrowing".to_string(),
            ));
        }
        if item.owner_id == borrower_id {
            return Err(RequestError::Validation(
                "You cannot borrow your own item".to_string(),
            ));
        }

        let total_cents = pricing::borrow_total_cents(
            item.price_per_day_cents,
            request.start_date,
            request.end_date,
        );

        let mut tx = self.db_pool.begin().await?;
        let now = Utc::now();

        let created = sqlx::query_as::<_, BorrowRequest>(
            r#"
            INSERT INTO borrow_requests (
                id, item_id, borrower_id, lender_id, start_date, end_date,
                message, total_cents, status, payment_status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(item.id)
        .bind(borrower_id)
        .bind(item.owner_id)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.message.unwrap_or_default())
        .bind(total_cents)
        .bind(RequestStatus::Pending)
        .bind(PaymentStatus::Pending)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        self.notifications
            .enqueue_in_tx(
                &mut tx,
                item.owner_id,
                "New borrow request",
                &format!("Someone wants to borrow \"{}\"", item.title),
                "request_created",
                Some(created.id),
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            request_id = %created.id,
            item_id = %item.id,
            total_cents,
            "Borrow request created"
        );

        Ok(created)
    }

    /// Fetch a single request. Only the borrower or the lender may see it.
    pub async fn get_request(
        &self,
        user_id: Uuid,
        request_id: Uuid,
    ) -> Result<BorrowRequest, RequestError> {
        let request =
            sqlx::query_as::<_, BorrowRequest>("SELECT * FROM borrow_requests WHERE id = $1")
                .bind(request_id)
                .fetch_optional(&self.db_pool)
                .await?
                .ok_or(RequestError::NotFound)?;

        if !request.is_party(user_id) {
            return Err(RequestError::Forbidden(
                "You are not part of this borrow request".to_string(),
            ));
        }

        Ok(request)
    }

    /// List the caller's requests, optionally narrowed to one side of
    /// the exchange and/or one status.
    pub async fn list_requests(
        &self,
        user_id: Uuid,
        filter: BorrowRequestFilter,
    ) -> Result<PaginatedResponse<BorrowRequest>, RequestError> {
        let pagination = PaginationParams {
            page: filter.page,
            limit: filter.limit,
        };
        let (limit, offset) = pagination.limit_offset();

        let mut query = QueryBuilder::new("SELECT * FROM borrow_requests WHERE 1=1");
        let mut count_query =
            QueryBuilder::new("SELECT COUNT(*) FROM borrow_requests WHERE 1=1");

        match filter.role {
            Some(RequestRole::Borrower) => {
                query.push(" AND borrower_id = ").push_bind(user_id);
                count_query.push(" AND borrower_id = ").push_bind(user_id);
            }
            Some(RequestRole::Lender) => {
                query.push(" AND lender_id = ").push_bind(user_id);
                count_query.push(" AND lender_id = ").push_bind(user_id);
            }
            None => {
                query
                    .push(" AND (borrower_id = ")
                    .push_bind(user_id)
                    .push(" OR lender_id = ")
                    .push_bind(user_id)
                    .push(")");
                count_query
                    .push(" AND (borrower_id = ")
                    .push_bind(user_id)
                    .push(" OR lender_id = ")
                    .push_bind(user_id)
                    .push(")");
            }
        }

        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
            count_query.push(" AND status = ").push_bind(status);
        }

        query.push(" ORDER BY created_at DESC");
        query.push(" LIMIT ").push_bind(limit);
        query.push(" OFFSET ").push_bind(offset);

        let requests = query
            .build_query_as::<BorrowRequest>()
            .fetch_all(&self.db_pool)
            .await?;
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.db_pool)
            .await?;

        Ok(PaginatedResponse {
            data: requests,
            total,
            page: pagination.page.unwrap_or(1).max(1),
            limit: pagination.limit.unwrap_or(20).clamp(1, 100),
        })
    }

    /// Record a price proposal in the negotiation ledger. Either party
    /// may counter until payment begins; each new proposal supersedes
    /// the previous open one and retotals the request.
    pub async fn propose_price(
        &self,
        user_id: Uuid,
        request_id: Uuid,
        proposal: ProposePriceRequest,
    ) -> Result<Negotiation, RequestError> {
        proposal.validate().map_err(RequestError::Validation)?;

        let mut tx = self.db_pool.begin().await?;
        let request = Self::lock_request(&mut tx, request_id).await?;

        if !request.is_party(user_id) {
            return Err(RequestError::Forbidden(
                "You are not part of this borrow request".to_string(),
            ));
        }
        if request.status.is_terminal() {
            return Err(RequestError::InvalidTransition(format!(
                "Cannot negotiate a {} request",
                request.status.as_str()
            )));
        }
        if request.status.is_paid_path() {
            return Err(RequestError::InvalidTransition(
                "Price is settled once payment has started".to_string(),
            ));
        }

        // Any earlier open proposal is no longer the live one
        sqlx::query("UPDATE negotiations SET status = $1 WHERE request_id = $2 AND status = $3")
            .bind(NegotiationStatus::Superseded)
            .bind(request_id)
            .bind(NegotiationStatus::Open)
            .execute(&mut *tx)
            .await?;

        let now = Utc::now();
        let message = proposal.message.unwrap_or_default();

        let negotiation = sqlx::query_as::<_, Negotiation>(
            r#"
            INSERT INTO negotiations (id, request_id, sender_id, proposed_price_cents, message, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request_id)
        .bind(user_id)
        .bind(proposal.proposed_price_cents)
        .bind(&message)
        .bind(NegotiationStatus::Open)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let total_cents = pricing::borrow_total_cents(
            proposal.proposed_price_cents,
            request.start_date,
            request.end_date,
        );
        let next_status = if request.status == RequestStatus::Pending {
            RequestStatus::Negotiating
        } else {
            request.status
        };

        sqlx::query(
            r#"
            UPDATE borrow_requests
            SET negotiated_price_cents = $1, negotiation_message = $2,
                total_cents = $3, status = $4, updated_at = $5
            WHERE id = $6
            "#,
        )
        .bind(proposal.proposed_price_cents)
        .bind(&message)
        .bind(total_cents)
        .bind(next_status)
        .bind(now)
        .bind(request_id)
        .execute(&mut *tx)
        .await?;

        self.notifications
            .enqueue_in_tx(
                &mut tx,
                request.counterparty(user_id),
                "New price proposal",
                &format!(
                    "A price of ${:.2} per day was proposed",
                    proposal.proposed_price_cents as f64 / 100.0
                ),
                "price_proposed",
                Some(request_id),
            )
            .await?;

        tx.commit().await?;
        Ok(negotiation)
    }

    /// Lender accepts the request at the current effective price and
    /// hands it to the payment step. The item's daily price is frozen
    /// so later catalog edits cannot reprice an accepted request.
    pub async fn approve(
        &self,
        user_id: Uuid,
        request_id: Uuid,
    ) -> Result<BorrowRequest, RequestError> {
        let mut tx = self.db_pool.begin().await?;
        let request = Self::lock_request(&mut tx, request_id).await?;

        if request.lender_id != user_id {
            return Err(RequestError::Forbidden(
                "Only the lender can approve a borrow request".to_string(),
            ));
        }
        Self::ensure_transition(&request, RequestStatus::PaymentPending)?;

        let item = sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = $1")
            .bind(request.item_id)
            .fetch_one(&mut *tx)
            .await?;

        let original_price_cents = request
            .original_price_cents
            .unwrap_or(item.price_per_day_cents);
        let daily_price = request.effective_daily_price_cents(item.price_per_day_cents);
        let total_cents =
            pricing::borrow_total_cents(daily_price, request.start_date, request.end_date);

        sqlx::query("UPDATE negotiations SET status = $1 WHERE request_id = $2 AND status = $3")
            .bind(NegotiationStatus::Accepted)
            .bind(request_id)
            .bind(NegotiationStatus::Open)
            .execute(&mut *tx)
            .await?;

        let updated = sqlx::query_as::<_, BorrowRequest>(
            r#"
            UPDATE borrow_requests
            SET status = $1, original_price_cents = $2, total_cents = $3, updated_at = $4
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(RequestStatus::PaymentPending)
        .bind(original_price_cents)
        .bind(total_cents)
        .bind(Utc::now())
        .bind(request_id)
        .fetch_one(&mut *tx)
        .await?;

        self.notifications
            .enqueue_in_tx(
                &mut tx,
                request.borrower_id,
                "Request approved",
                &format!(
                    "Your request for \"{}\" was approved. Complete payment to confirm.",
                    item.title
                ),
                "request_approved",
                Some(request_id),
            )
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Lender declines. Allowed up until payment: once money moved, a
    /// rejection would need a refund, which this flow does not do.
    pub async fn reject(
        &self,
        user_id: Uuid,
        request_id: Uuid,
    ) -> Result<BorrowRequest, RequestError> {
        let mut tx = self.db_pool.begin().await?;
        let request = Self::lock_request(&mut tx, request_id).await?;

        if request.lender_id != user_id {
            return Err(RequestError::Forbidden(
                "Only the lender can reject a borrow request".to_string(),
            ));
        }
        Self::ensure_transition(&request, RequestStatus::Rejected)?;

        sqlx::query("UPDATE negotiations SET status = $1 WHERE request_id = $2 AND status = $3")
            .bind(NegotiationStatus::Declined)
            .bind(request_id)
            .bind(NegotiationStatus::Open)
            .execute(&mut *tx)
            .await?;

        let updated = Self::set_status(&mut tx, request_id, RequestStatus::Rejected).await?;

        self.notifications
            .enqueue_in_tx(
                &mut tx,
                request.borrower_id,
                "Request rejected",
                "Your borrow request was rejected by the lender",
                "request_rejected",
                Some(request_id),
            )
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Either party withdraws before any payment step. Open proposals
    /// are closed out with the request.
    pub async fn cancel(
        &self,
        user_id: Uuid,
        request_id: Uuid,
    ) -> Result<BorrowRequest, RequestError> {
        let mut tx = self.db_pool.begin().await?;
        let request = Self::lock_request(&mut tx, request_id).await?;

        if !request.is_party(user_id) {
            return Err(RequestError::Forbidden(
                "You are not part of this borrow request".to_string(),
            ));
        }
        Self::ensure_transition(&request, RequestStatus::Cancelled)?;

        sqlx::query("UPDATE negotiations SET status = $1 WHERE request_id = $2 AND status = $3")
            .bind(NegotiationStatus::Declined)
            .bind(request_id)
            .bind(NegotiationStatus::Open)
            .execute(&mut *tx)
            .await?;

        let updated = Self::set_status(&mut tx, request_id, RequestStatus::Cancelled).await?;

        self.notifications
            .enqueue_in_tx(
                &mut tx,
                request.counterparty(user_id),
                "Request cancelled",
                "A borrow request you were part of was cancelled",
                "request_cancelled",
                Some(request_id),
            )
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Borrower opens a checkout session for an approved request. A
    /// provider failure leaves the request untouched; the borrower can
    /// simply retry.
    pub async fn create_payment_session(
        &self,
        user_id: Uuid,
        request_id: Uuid,
    ) -> Result<PaymentSession, RequestError> {
        let request = self.get_request(user_id, request_id).await?;

        if request.borrower_id != user_id {
            return Err(RequestError::Forbidden(
                "Only the borrower can pay for a borrow request".to_string(),
            ));
        }
        if !matches!(
            request.status,
            RequestStatus::PaymentPending | RequestStatus::Approved
        ) {
            return Err(RequestError::InvalidTransition(format!(
                "Cannot start payment for a {} request",
                request.status.as_str()
            )));
        }

        let item_title: String = sqlx::query_scalar("SELECT title FROM items WHERE id = $1")
            .bind(request.item_id)
            .fetch_one(&self.db_pool)
            .await?;

        let days = pricing::inclusive_day_count(request.start_date, request.end_date);
        let session = self
            .payments
            .create_session(
                request.id,
                request.total_cents,
                &format!("Borrow \"{}\" for {} day(s)", item_title, days),
            )
            .await?;

        // Stored only if the request is still awaiting payment
        let result = sqlx::query(
            r#"
            UPDATE borrow_requests
            SET payment_session_id = $1, updated_at = $2
            WHERE id = $3 AND status IN ('payment_pending', 'approved')
            "#,
        )
        .bind(&session.session_id)
        .bind(Utc::now())
        .bind(request_id)
        .execute(&self.db_pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RequestError::InvalidTransition(
                "Request is no longer awaiting payment".to_string(),
            ));
        }

        Ok(session)
    }

    /// Settle a paid checkout session: flip the request to paid and
    /// post both sides of the money movement in one transaction. Safe
    /// to call more than once; webhook retries hit the early return.
    pub async fn confirm_payment(&self, request_id: Uuid) -> Result<BorrowRequest, RequestError> {
        let mut tx = self.db_pool.begin().await?;
        let request = Self::lock_request(&mut tx, request_id).await?;

        if request.status == RequestStatus::Paid {
            tx.commit().await?;
            return Ok(request);
        }
        Self::ensure_transition(&request, RequestStatus::Paid)?;

        let item_title: String = sqlx::query_scalar("SELECT title FROM items WHERE id = $1")
            .bind(request.item_id)
            .fetch_one(&mut *tx)
            .await?;

        let updated = sqlx::query_as::<_, BorrowRequest>(
            r#"
            UPDATE borrow_requests
            SET status = $1, payment_status = $2, updated_at = $3
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(RequestStatus::Paid)
        .bind(PaymentStatus::Paid)
        .bind(Utc::now())
        .bind(request_id)
        .fetch_one(&mut *tx)
        .await?;

        let description = format!("Borrow payment for \"{}\"", item_title);
        self.wallet
            .credit_in_tx(
                &mut tx,
                request.lender_id,
                request.total_cents,
                TransactionKind::PaymentReceived,
                &description,
                Some(request_id),
                Some(request.borrower_id),
            )
            .await?;
        self.wallet
            .record_payment_sent_in_tx(
                &mut tx,
                request.borrower_id,
                request.total_cents,
                &description,
                Some(request_id),
                Some(request.lender_id),
            )
            .await?;

        self.notifications
            .enqueue_in_tx(
                &mut tx,
                request.lender_id,
                "Payment received",
                &format!(
                    "${:.2} received for \"{}\"",
                    request.total_cents as f64 / 100.0,
                    item_title
                ),
                "payment_received",
                Some(request_id),
            )
            .await?;
        self.notifications
            .enqueue_in_tx(
                &mut tx,
                request.borrower_id,
                "Payment confirmed",
                &format!("Your payment for \"{}\" was confirmed", item_title),
                "payment_confirmed",
                Some(request_id),
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            request_id = %request_id,
            amount_cents = request.total_cents,
            "Borrow request paid"
        );

        Ok(updated)
    }

    /// Lender marks the item as handed over
    pub async fn activate(
        &self,
        user_id: Uuid,
        request_id: Uuid,
    ) -> Result<BorrowRequest, RequestError> {
        let mut tx = self.db_pool.begin().await?;
        let request = Self::lock_request(&mut tx, request_id).await?;

        if request.lender_id != user_id {
            return Err(RequestError::Forbidden(
                "Only the lender can activate a borrow request".to_string(),
            ));
        }
        Self::ensure_transition(&request, RequestStatus::Active)?;

        let updated = Self::set_status(&mut tx, request_id, RequestStatus::Active).await?;

        self.notifications
            .enqueue_in_tx(
                &mut tx,
                request.borrower_id,
                "Borrow started",
                "The lender marked your borrow as started. Enjoy!",
                "request_activated",
                Some(request_id),
            )
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Lender confirms the item came back
    pub async fn complete(
        &self,
        user_id: Uuid,
        request_id: Uuid,
    ) -> Result<BorrowRequest, RequestError> {
        let mut tx = self.db_pool.begin().await?;
        let request = Self::lock_request(&mut tx, request_id).await?;

        if request.lender_id != user_id {
            return Err(RequestError::Forbidden(
                "Only the lender can complete a borrow request".to_string(),
            ));
        }
        Self::ensure_transition(&request, RequestStatus::Completed)?;

        let updated = Self::set_status(&mut tx, request_id, RequestStatus::Completed).await?;

        self.notifications
            .enqueue_in_tx(
                &mut tx,
                request.borrower_id,
                "Borrow completed",
                "The lender confirmed the return. You can now leave a review.",
                "request_completed",
                Some(request_id),
            )
            .await?;

        tx.commit().await?;

        tracing::info!(request_id = %request_id, "Borrow request completed");
        Ok(updated)
    }

    /// Full proposal history for a request, newest first
    pub async fn list_negotiations(
        &self,
        user_id: Uuid,
        request_id: Uuid,
    ) -> Result<Vec<Negotiation>, RequestError> {
        // Reuses the party check
        self.get_request(user_id, request_id).await?;

        let negotiations = sqlx::query_as::<_, Negotiation>(
            "SELECT * FROM negotiations WHERE request_id = $1 ORDER BY created_at DESC",
        )
        .bind(request_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(negotiations)
    }

    async fn lock_request(
        tx: &mut Transaction<'_, Postgres>,
        request_id: Uuid,
    ) -> Result<BorrowRequest, RequestError> {
        sqlx::query_as::<_, BorrowRequest>(
            "SELECT * FROM borrow_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(request_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(RequestError::NotFound)
    }

    fn ensure_transition(
        request: &BorrowRequest,
        next: RequestStatus,
    ) -> Result<(), RequestError> {
        if !request.status.can_transition_to(next) {
            return Err(RequestError::InvalidTransition(format!(
                "Cannot move request from {} to {}",
                request.status.as_str(),
                next.as_str()
            )));
        }
        Ok(())
    }

    async fn set_status(
        tx: &mut Transaction<'_, Postgres>,
        request_id: Uuid,
        status: RequestStatus,
    ) -> Result<BorrowRequest, RequestError> {
        let updated = sqlx::query_as::<_, BorrowRequest>(
            "UPDATE borrow_requests SET status = $1, updated_at = $2 WHERE id = $3 RETURNING *",
        )
        .bind(status)
        .bind(Utc::now())
        .bind(request_id)
        .fetch_one(&mut **tx)
        .await?;
        Ok(updated)
    }
}
