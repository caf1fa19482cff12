//! Service booking models

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::borrows::PaymentStatus;

/// A booked time slot against a service
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Booking {
    pub id: Uuid,
    pub service_id: Uuid,
    pub customer_id: Uuid,
    pub provider_id: Uuid,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub total_cents: i64,
    pub notes: Option<String>,
    /// Human-facing reference, unique across all bookings
    pub order_number: String,
    pub confirmation_code: String,
    pub provider_response_at: Option<DateTime<Utc>>,
    /// Rating the customer gave the provider, 1 to 5
    pub customer_rating: Option<i32>,
    /// Rating the provider gave the customer, 1 to 5
    pub provider_rating: Option<i32>,
    pub customer_review: Option<String>,
    pub provider_review: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn is_party(&self, user_id: Uuid) -> bool {
        self.customer_id == user_id || self.provider_id == user_id
    }

    pub fn counterparty(&self, user_id: Uuid) -> Uuid {
        if self.customer_id == user_id {
            self.provider_id
        } else {
            self.customer_id
        }
    }
}

/// Booking lifecycle states
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "booking_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Rejected,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Rejected => "rejected",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// Single authority for booking transitions
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        match (self, next) {
            (Pending, Confirmed | Rejected | Cancelled) => true,
            // Completing straight from confirmed is allowed; providers
            // do not have to report an explicit start
            (Confirmed, InProgress | Completed | Cancelled) => true,
            (InProgress, Completed | Cancelled) => true,
            _ => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Rejected | BookingStatus::Completed | BookingStatus::Cancelled
        )
    }
}

/// Request DTO for booking a slot
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub service_id: Uuid,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub notes: Option<String>,
}

impl CreateBookingRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.end_time <= self.start_time {
            return Err("End time must be after start time".to_string());
        }
        Ok(())
    }
}

/// Provider's answer to a pending booking. The reason, if any, is
/// passed on to the customer when declining.
#[derive(Debug, Deserialize)]
pub struct RespondBookingRequest {
    pub accept: bool,
    pub reason: Option<String>,
}

/// Request DTO for cancelling a booking
#[derive(Debug, Deserialize)]
pub struct CancelBookingRequest {
    pub reason: Option<String>,
}

/// One side's post-completion review
#[derive(Debug, Deserialize)]
pub struct ReviewBookingRequest {
    pub rating: i32,
    pub review: Option<String>,
}

impl ReviewBookingRequest {
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=5).contains(&self.rating) {
            return Err("Rating must be between 1 and 5".to_string());
        }
        Ok(())
    }
}

/// Which side of the booking to list
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingRole {
    Customer,
    Provider,
}

/// Query parameters for listing bookings
#[derive(Debug, Deserialize)]
pub struct BookingFilter {
    pub role: Option<BookingRole>,
    pub status: Option<BookingStatus>,
    pub page: Option<i32>,
    pub limit: Option<i32>,
}

/// Booking plus the checkout session opened for it
#[derive(Debug, Serialize)]
pub struct BookingWithPayment {
    pub booking: Booking,
    pub payment: crate::payments::PaymentSession,
}

/// Query parameters for a service's day calendar
#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub date: NaiveDate,
}

/// An occupied slot on a service's calendar. Exposes no customer
/// details; it exists so clients can avoid taken times.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct CalendarSlot {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: BookingStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use BookingStatus::*;

    #[test]
    fn test_happy_path() {
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
        // Skipping the start step is fine too
        assert!(Confirmed.can_transition_to(Completed));
    }

    #[test]
    fn test_terminal_states_accept_nothing() {
        for terminal in [Rejected, Completed, Cancelled] {
            assert!(terminal.is_terminal());
            for next in [Pending, Confirmed, Rejected, InProgress, Completed, Cancelled] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_unconfirmed_bookings_cannot_jump_ahead() {
        assert!(!Pending.can_transition_to(InProgress));
        assert!(!Pending.can_transition_to(Completed));
    }

    #[test]
    fn test_every_non_terminal_state_can_cancel() {
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(InProgress.can_transition_to(Cancelled));
    }

    #[test]
    fn test_rejection_only_from_pending() {
        assert!(Pending.can_transition_to(Rejected));
        assert!(!Confirmed.can_transition_to(Rejected));
        assert!(!InProgress.can_transition_to(Rejected));
    }

    #[test]
    fn test_review_request_bounds() {
        assert!(ReviewBookingRequest {
            rating: 0,
            review: None
        }
        .validate()
        .is_err());
        assert!(ReviewBookingRequest {
            rating: 6,
            review: None
        }
        .validate()
        .is_err());
        assert!(ReviewBookingRequest {
            rating: 5,
            review: Some("great".to_string())
        }
        .validate()
        .is_ok());
    }
}
