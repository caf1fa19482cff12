//! Service booking workflow: slot booking, provider response, payment
//! and post-completion reviews

use chrono::{NaiveDate, Utc};
use rand::Rng;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use crate::bookings::conflict::ConflictChecker;
use crate::bookings::model::{
    Booking, BookingFilter, BookingRole, BookingStatus, BookingWithPayment, CalendarSlot,
    CancelBookingRequest, CreateBookingRequest, RespondBookingRequest, ReviewBookingRequest,
};
use crate::borrows::PaymentStatus;
use crate::error::ApiError;
use crate::models::{PaginatedResponse, PaginationParams};
use crate::notifications::NotificationService;
use crate::payments::{PaymentClient, PaymentError};
use crate::pricing;
use crate::services::{PriceType, ServiceListing};
use crate::wallet::{TransactionKind, WalletService};

// No lookalike characters in customer-facing references
const ORDER_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("Booking not found")]
    NotFound,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    InvalidTransition(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    SlotTaken(String),
    #[error("{0}")]
    AlreadyReviewed(String),
    #[error(transparent)]
    Payment(#[from] PaymentError),
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::DatabaseError(e) => ApiError::DatabaseError(e.to_string()),
            BookingError::NotFound => ApiError::NotFound("Booking not found".to_string()),
            BookingError::Forbidden(msg) => ApiError::Forbidden(msg),
            BookingError::InvalidTransition(msg) => ApiError::InvalidTransition(msg),
            BookingError::Validation(msg) => ApiError::ValidationError(msg),
            BookingError::SlotTaken(msg) => ApiError::BookingConflict(msg),
            BookingError::AlreadyReviewed(msg) => ApiError::Conflict(msg),
            BookingError::Payment(e) => e.into(),
        }
    }
}

/// Orchestrates the booking lifecycle against the slot-exclusion
/// constraint on `service_bookings`.
#[derive(Clone)]
pub struct BookingService {
    db_pool: PgPool,
    conflicts: ConflictChecker,
    wallet: WalletService,
    notifications: NotificationService,
    payments: PaymentClient,
}

impl BookingService {
    pub fn new(
        db_pool: PgPool,
        conflicts: ConflictChecker,
        wallet: WalletService,
        notifications: NotificationService,
        payments: PaymentClient,
    ) -> Self {
        Self {
            db_pool,
            conflicts,
            wallet,
            notifications,
            payments,
        }
    }

    /// Book a slot and open a checkout session for it. If the payment
    /// provider refuses the session, the booking row is removed again
    /// so the slot frees up immediately instead of holding a booking
    /// nobody can pay for.
    pub async fn create_booking(
        &self,
        customer_id: Uuid,
        request: CreateBookingRequest,
    ) -> Result<BookingWithPayment, BookingError> {
        request.validate().map_err(BookingError::Validation)?;

        if request.booking_date < Utc::now().date_naive() {
            return Err(BookingError::Validation(
                "Booking date must not be in the past".to_string(),
            ));
        }

        let service = sqlx::query_as::<_, ServiceListing>("SELECT * FROM services WHERE id = $1")
            .bind(request.service_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| BookingError::Validation("Service not found".to_string()))?;

        if !service.is_active {
            return Err(BookingError::Validation(
                "Service is not accepting bookings".to_string(),
            ));
        }
        if service.provider_id == customer_id {
            return Err(BookingError::Validation(
                "You cannot book your own service".to_string(),
            ));
        }

        let total_cents = match service.price_type {
            PriceType::PerHour => pricing::hourly_total_cents(
                service.price_cents,
                pricing::duration_minutes(request.start_time, request.end_time),
            ),
            // Flat-priced services charge per booking regardless of length
            _ => service.price_cents,
        };

        // Friendly pre-check; the exclusion constraint is the real gate
        if self
            .conflicts
            .has_conflict(
                service.id,
                request.booking_date,
                request.start_time,
                request.end_time,
            )
            .await?
        {
            return Err(BookingError::SlotTaken(
                "This time slot is already booked".to_string(),
            ));
        }

        let order_number = generate_order_number();
        let confirmation_code = generate_confirmation_code();
        let now = Utc::now();

        let booking = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO service_bookings (
                id, service_id, customer_id, provider_id, booking_date,
                start_time, end_time, status, payment_status, total_cents,
                notes, order_number, confirmation_code, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $14)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(service.id)
        .bind(customer_id)
        .bind(service.provider_id)
        .bind(request.booking_date)
        .bind(request.start_time)
        .bind(request.end_time)
        .bind(BookingStatus::Pending)
        .bind(PaymentStatus::Pending)
        .bind(total_cents)
        .bind(request.notes)
        .bind(&order_number)
        .bind(&confirmation_code)
        .bind(now)
        .fetch_one(&self.db_pool)
        .await
        .map_err(|e| match &e {
            // Two racing bookings: the constraint caught what the
            // pre-check could not see
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23P01") => {
                BookingError::SlotTaken("This time slot is already booked".to_string())
            }
            _ => BookingError::from(e),
        })?;

        let session = match self
            .payments
            .create_session(
                booking.id,
                total_cents,
                &format!("Booking {} for \"{}\"", order_number, service.title),
            )
            .await
        {
            Ok(session) => session,
            Err(e) => {
                if let Err(del_err) = sqlx::query("DELETE FROM service_bookings WHERE id = $1")
                    .bind(booking.id)
                    .execute(&self.db_pool)
                    .await
                {
                    tracing::error!(
                        booking_id = %booking.id,
                        error = %del_err,
                        "Failed to remove booking after checkout failure"
                    );
                }
                return Err(e.into());
            }
        };

        // Notified only once the checkout session exists, so the
        // provider never hears about a booking that was rolled away
        self.notifications
            .emit(
                service.provider_id,
                "New booking request",
                &format!(
                    "{} on {} from {} to {}",
                    service.title, booking.booking_date, booking.start_time, booking.end_time
                ),
                "booking_created",
                Some(booking.id),
            )
            .await;

        tracing::info!(
            booking_id = %booking.id,
            order_number = %order_number,
            total_cents,
            "Booking created"
        );

        Ok(BookingWithPayment {
            booking,
            payment: session,
        })
    }

    /// Fetch a single booking. Only the customer or provider may see it.
    pub async fn get_booking(
        &self,
        user_id: Uuid,
        booking_id: Uuid,
    ) -> Result<Booking, BookingError> {
        let booking =
            sqlx::query_as::<_, Booking>("SELECT * FROM service_bookings WHERE id = $1")
                .bind(booking_id)
                .fetch_optional(&self.db_pool)
                .await?
                .ok_or(BookingError::NotFound)?;

        if !booking.is_party(user_id) {
            return Err(BookingError::Forbidden(
                "You are not part of this booking".to_string(),
            ));
        }

        Ok(booking)
    }

    /// List the caller's bookings, optionally narrowed by side and status
    pub async fn list_bookings(
        &self,
        user_id: Uuid,
        filter: BookingFilter,
    ) -> Result<PaginatedResponse<Booking>, BookingError> {
        let pagination = PaginationParams {
            page: filter.page,
            limit: filter.limit,
        };
        let (limit, offset) = pagination.limit_offset();

        let mut query = QueryBuilder::new("SELECT * FROM service_bookings WHERE 1=1");
        let mut count_query =
            QueryBuilder::new("SELECT COUNT(*) FROM service_bookings WHERE 1=1");

        match filter.role {
            Some(BookingRole::Customer) => {
                query.push(" AND customer_id = ").push_bind(user_id);
                count_query.push(" AND customer_id = ").push_bind(user_id);
            }
            Some(BookingRole::Provider) => {
                query.push(" AND provider_id = ").push_bind(user_id);
                count_query.push(" AND provider_id = ").push_bind(user_id);
            }
            None => {
                query
                    .push(" AND (customer_id = ")
                    .push_bind(user_id)
                    .push(" OR provider_id = ")
                    .push_bind(user_id)
                    .push(")");
                count_query
                    .push(" AND (customer_id = ")
                    .push_bind(user_id)
                    .push(" OR provider_id = ")
                    .push_bind(user_id)
                    .push(")");
            }
        }

        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
            count_query.push(" AND status = ").push_bind(status);
        }

        query.push(" ORDER BY booking_date DESC, start_time DESC");
        query.push(" LIMIT ").push_bind(limit);
        query.push(" OFFSET ").push_bind(offset);

        let bookings = query
            .build_query_as::<Booking>()
            .fetch_all(&self.db_pool)
            .await?;
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.db_pool)
            .await?;

        Ok(PaginatedResponse {
            data: bookings,
            total,
            page: pagination.page.unwrap_or(1).max(1),
            limit: pagination.limit.unwrap_or(20).clamp(1, 100),
        })
    }

    /// Provider accepts or declines a pending booking
    pub async fn respond(
        &self,
        provider_id: Uuid,
        booking_id: Uuid,
        request: RespondBookingRequest,
    ) -> Result<Booking, BookingError> {
        let mut tx = self.db_pool.begin().await?;
        let booking = Self::lock_booking(&mut tx, booking_id).await?;

        if booking.provider_id != provider_id {
            return Err(BookingError::Forbidden(
                "Only the provider can respond to a booking".to_string(),
            ));
        }

        let next = if request.accept {
            BookingStatus::Confirmed
        } else {
            BookingStatus::Rejected
        };
        Self::ensure_transition(&booking, next)?;

        let updated = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE service_bookings
            SET status = $1, provider_response_at = $2, updated_at = $2
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(next)
        .bind(Utc::now())
        .bind(booking_id)
        .fetch_one(&mut *tx)
        .await?;

        let (title, message) = if request.accept {
            (
                "Booking confirmed",
                format!("Your booking {} was confirmed", booking.order_number),
            )
        } else {
            let message = match request.reason.as_deref() {
                Some(reason) => format!(
                    "Your booking {} was declined: {}",
                    booking.order_number, reason
                ),
                None => format!("Your booking {} was declined", booking.order_number),
            };
            ("Booking declined", message)
        };
        self.notifications
            .enqueue_in_tx(
                &mut tx,
                booking.customer_id,
                title,
                &message,
                "booking_response",
                Some(booking_id),
            )
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Provider marks a confirmed booking as underway
    pub async fn start(
        &self,
        provider_id: Uuid,
        booking_id: Uuid,
    ) -> Result<Booking, BookingError> {
        let mut tx = self.db_pool.begin().await?;
        let booking = Self::lock_booking(&mut tx, booking_id).await?;

        if booking.provider_id != provider_id {
            return Err(BookingError::Forbidden(
                "Only the provider can start a booking".to_string(),
            ));
        }
        Self::ensure_transition(&booking, BookingStatus::InProgress)?;

        let updated =
            Self::set_status(&mut tx, booking_id, BookingStatus::InProgress).await?;

        self.notifications
            .enqueue_in_tx(
                &mut tx,
                booking.customer_id,
                "Service started",
                &format!("Your booking {} is now in progress", booking.order_number),
                "booking_started",
                Some(booking_id),
            )
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Provider marks the work as done. If the booking was paid, the
    /// provider's wallet is credited in the same transaction; this is
    /// the point where the money becomes theirs.
    pub async fn complete(
        &self,
        provider_id: Uuid,
        booking_id: Uuid,
    ) -> Result<Booking, BookingError> {
        let mut tx = self.db_pool.begin().await?;
        let booking = Self::lock_booking(&mut tx, booking_id).await?;

        if booking.provider_id != provider_id {
            return Err(BookingError::Forbidden(
                "Only the provider can complete a booking".to_string(),
            ));
        }
        Self::ensure_transition(&booking, BookingStatus::Completed)?;

        let updated = Self::set_status(&mut tx, booking_id, BookingStatus::Completed).await?;

        if booking.payment_status == PaymentStatus::Paid {
            let service_title: String =
                sqlx::query_scalar("SELECT title FROM services WHERE id = $1")
                    .bind(booking.service_id)
                    .fetch_one(&mut *tx)
                    .await?;
            self.wallet
                .credit_in_tx(
                    &mut tx,
                    booking.provider_id,
                    booking.total_cents,
                    TransactionKind::ServicePayment,
                    &format!("Service payment for \"{}\"", service_title),
                    Some(booking_id),
                    Some(booking.customer_id),
                )
                .await?;
        }

        self.notifications
            .enqueue_in_tx(
                &mut tx,
                booking.customer_id,
                "Service completed",
                &format!(
                    "Booking {} is complete. You can now leave a review.",
                    booking.order_number
                ),
                "booking_completed",
                Some(booking_id),
            )
            .await?;

        tx.commit().await?;

        tracing::info!(booking_id = %booking_id, "Booking completed");
        Ok(updated)
    }

    /// Either party backs out of a booking that has not completed.
    /// Cancelling frees the slot for other customers.
    pub async fn cancel(
        &self,
        user_id: Uuid,
        booking_id: Uuid,
        request: CancelBookingRequest,
    ) -> Result<Booking, BookingError> {
        let mut tx = self.db_pool.begin().await?;
        let booking = Self::lock_booking(&mut tx, booking_id).await?;

        if !booking.is_party(user_id) {
            return Err(BookingError::Forbidden(
                "You are not part of this booking".to_string(),
            ));
        }
        Self::ensure_transition(&booking, BookingStatus::Cancelled)?;

        let updated = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE service_bookings
            SET status = $1, cancellation_reason = $2, updated_at = $3
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(BookingStatus::Cancelled)
        .bind(request.reason)
        .bind(Utc::now())
        .bind(booking_id)
        .fetch_one(&mut *tx)
        .await?;

        self.notifications
            .enqueue_in_tx(
                &mut tx,
                booking.counterparty(user_id),
                "Booking cancelled",
                &format!("Booking {} was cancelled", booking.order_number),
                "booking_cancelled",
                Some(booking_id),
            )
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Record one side's review of a completed booking. Each side gets
    /// exactly one shot; a customer review also folds into the
    /// service's running average rating.
    pub async fn review(
        &self,
        user_id: Uuid,
        booking_id: Uuid,
        request: ReviewBookingRequest,
    ) -> Result<Booking, BookingError> {
        request.validate().map_err(BookingError::Validation)?;

        let mut tx = self.db_pool.begin().await?;
        let booking = Self::lock_booking(&mut tx, booking_id).await?;

        if !booking.is_party(user_id) {
            return Err(BookingError::Forbidden(
                "You are not part of this booking".to_string(),
            ));
        }
        if booking.status != BookingStatus::Completed {
            return Err(BookingError::InvalidTransition(
                "Only completed bookings can be reviewed".to_string(),
            ));
        }

        let is_customer = booking.customer_id == user_id;
        let already = if is_customer {
            booking.customer_rating.is_some()
        } else {
            booking.provider_rating.is_some()
        };
        if already {
            return Err(BookingError::AlreadyReviewed(
                "You have already reviewed this booking".to_string(),
            ));
        }

        let column_prefix = if is_customer { "customer" } else { "provider" };
        let updated = sqlx::query_as::<_, Booking>(&format!(
            r#"
            UPDATE service_bookings
            SET {0}_rating = $1, {0}_review = $2, updated_at = $3
            WHERE id = $4
            RETURNING *
            "#,
            column_prefix
        ))
        .bind(request.rating)
        .bind(&request.review)
        .bind(Utc::now())
        .bind(booking_id)
        .fetch_one(&mut *tx)
        .await?;

        if is_customer {
            // Fold into the running average; both expressions read the
            // pre-update values
            sqlx::query(
                r#"
                UPDATE services
                SET rating_hundredths =
                        (rating_hundredths * total_reviews + $1) / (total_reviews + 1),
                    total_reviews = total_reviews + 1,
                    updated_at = $2
                WHERE id = $3
                "#,
            )
            .bind(i64::from(request.rating) * 100)
            .bind(Utc::now())
            .bind(booking.service_id)
            .execute(&mut *tx)
            .await?;
        }

        self.notifications
            .enqueue_in_tx(
                &mut tx,
                booking.counterparty(user_id),
                "New review",
                &format!(
                    "You received a {}-star review on booking {}",
                    request.rating, booking.order_number
                ),
                "booking_reviewed",
                Some(booking_id),
            )
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Settle a paid checkout session. Flips the card state and records
    /// the customer's outgoing payment; the provider is credited later,
    /// at completion. Safe to call more than once.
    pub async fn confirm_payment(&self, booking_id: Uuid) -> Result<Booking, BookingError> {
        let mut tx = self.db_pool.begin().await?;
        let booking = Self::lock_booking(&mut tx, booking_id).await?;

        if booking.payment_status == PaymentStatus::Paid {
            tx.commit().await?;
            return Ok(booking);
        }

        let updated = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE service_bookings
            SET payment_status = $1, updated_at = $2
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(PaymentStatus::Paid)
        .bind(Utc::now())
        .bind(booking_id)
        .fetch_one(&mut *tx)
        .await?;

        self.wallet
            .record_payment_sent_in_tx(
                &mut tx,
                booking.customer_id,
                booking.total_cents,
                &format!("Payment for booking {}", booking.order_number),
                Some(booking_id),
                Some(booking.provider_id),
            )
            .await?;

        self.notifications
            .enqueue_in_tx(
                &mut tx,
                booking.customer_id,
                "Payment confirmed",
                &format!("Your payment for booking {} went through", booking.order_number),
                "payment_confirmed",
                Some(booking_id),
            )
            .await?;
        self.notifications
            .enqueue_in_tx(
                &mut tx,
                booking.provider_id,
                "Booking paid",
                &format!("Booking {} has been paid", booking.order_number),
                "booking_paid",
                Some(booking_id),
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            booking_id = %booking_id,
            amount_cents = booking.total_cents,
            "Booking payment confirmed"
        );

        Ok(updated)
    }

    /// Occupied slots for one service on one day, for slot pickers.
    /// Cancelled bookings are invisible here.
    pub async fn day_calendar(
        &self,
        service_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<CalendarSlot>, BookingError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM services WHERE id = $1)")
            .bind(service_id)
            .fetch_one(&self.db_pool)
            .await?;
        if !exists {
            return Err(BookingError::Validation("Service not found".to_string()));
        }

        let slots = sqlx::query_as::<_, CalendarSlot>(
            r#"
            SELECT start_time, end_time, status FROM service_bookings
            WHERE service_id = $1 AND booking_date = $2 AND status <> 'cancelled'
            ORDER BY start_time ASC
            "#,
        )
        .bind(service_id)
        .bind(date)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(slots)
    }

    async fn lock_booking(
        tx: &mut Transaction<'_, Postgres>,
        booking_id: Uuid,
    ) -> Result<Booking, BookingError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM service_bookings WHERE id = $1 FOR UPDATE")
            .bind(booking_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(BookingError::NotFound)
    }

    fn ensure_transition(booking: &Booking, next: BookingStatus) -> Result<(), BookingError> {
        if !booking.status.can_transition_to(next) {
            return Err(BookingError::InvalidTransition(format!(
                "Cannot move booking from {} to {}",
                booking.status.as_str(),
                next.as_str()
            )));
        }
        Ok(())
    }

    async fn set_status(
        tx: &mut Transaction<'_, Postgres>,
        booking_id: Uuid,
        status: BookingStatus,
    ) -> Result<Booking, BookingError> {
        let updated = sqlx::query_as::<_, Booking>(
            "UPDATE service_bookings SET status = $1, updated_at = $2 WHERE id = $3 RETURNING *",
        )
        .bind(status)
        .bind(Utc::now())
        .bind(booking_id)
        .fetch_one(&mut **tx)
        .await?;
        Ok(updated)
    }
}

fn generate_order_number() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..8)
        .map(|_| ORDER_CHARSET[rng.gen_range(0..ORDER_CHARSET.len())] as char)
        .collect();
    format!("BP-{}", suffix)
}

fn generate_confirmation_code() -> String {
    let mut rng = rand::thread_rng();
    (0..6)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_number_shape() {
        let n = generate_order_number();
        assert!(n.starts_with("BP-"));
        assert_eq!(n.len(), 11);
        assert!(n[3..]
            .chars()
            .all(|c| ORDER_CHARSET.contains(&(c as u8))));
    }

    #[test]
    fn test_confirmation_code_is_six_digits() {
        let code = generate_confirmation_code();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }
}
