//! Borrow request and negotiation models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

/// A request to borrow an item for an inclusive date range
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct BorrowRequest {
    pub id: Uuid,
    pub item_id: Uuid,
    pub borrower_id: Uuid,
    pub lender_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub message: String,
    /// Item daily price frozen at approval time
    pub original_price_cents: Option<i64>,
    /// Latest proposed daily price, if any negotiation happened
    pub negotiated_price_cents: Option<i64>,
    pub negotiation_message: Option<String>,
    pub total_cents: i64,
    pub status: RequestStatus,
    pub payment_session_id: Option<String>,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BorrowRequest {
    /// Daily price that currently applies: the negotiated price wins,
    /// then the frozen original, then the item's live price.
    pub fn effective_daily_price_cents(&self, item_price_cents: i64) -> i64 {
        self.negotiated_price_cents
            .or(self.original_price_cents)
            .unwrap_or(item_price_cents)
    }

    pub fn is_party(&self, user_id: Uuid) -> bool {
        self.borrower_id == user_id || self.lender_id == user_id
    }

    /// The other side of the request relative to `user_id`
    pub fn counterparty(&self, user_id: Uuid) -> Uuid {
        if self.borrower_id == user_id {
            self.lender_id
        } else {
            self.borrower_id
        }
    }
}

/// Borrow request lifecycle states
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "request_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Negotiating,
    /// Legacy state written by older clients; treated as PaymentPending
    Approved,
    Rejected,
    PaymentPending,
    Paid,
    Active,
    Completed,
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Negotiating => "negotiating",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::PaymentPending => "payment_pending",
            RequestStatus::Paid => "paid",
            RequestStatus::Active => "active",
            RequestStatus::Completed => "completed",
            RequestStatus::Cancelled => "cancelled",
        }
    }

    /// Single authority for transition legality. Every mutation checks
    /// here; nothing else may decide what moves where.
    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        use RequestStatus::*;
        match (self, next) {
            (Pending, Negotiating | PaymentPending | Rejected | Cancelled) => true,
            (Negotiating, PaymentPending | Rejected | Cancelled) => true,
            // Approved behaves exactly like PaymentPending
            (Approved | PaymentPending, Paid | Rejected) => true,
            (Paid, Active) => true,
            (Active, Completed) => true,
            _ => false,
        }
    }

    /// Terminal states accept no further transition
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestStatus::Rejected | RequestStatus::Completed | RequestStatus::Cancelled
        )
    }

    /// States on the payment path: negotiation is settled and money is
    /// committed or about to be.
    pub fn is_paid_path(&self) -> bool {
        matches!(
            self,
            RequestStatus::Approved
                | RequestStatus::PaymentPending
                | RequestStatus::Paid
                | RequestStatus::Active
        )
    }
}

/// Card payment state, tracked independently of the request lifecycle
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

/// One entry in the append-only negotiation ledger
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Negotiation {
    pub id: Uuid,
    pub request_id: Uuid,
    pub sender_id: Uuid,
    pub proposed_price_cents: i64,
    pub message: String,
    pub status: NegotiationStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "negotiation_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NegotiationStatus {
    Open,
    Accepted,
    Declined,
    Superseded,
}

/// Request DTO for opening a borrow request
#[derive(Debug, Deserialize)]
pub struct CreateBorrowRequest {
    pub item_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub message: Option<String>,
}

impl CreateBorrowRequest {
    /// Validate request
    pub fn validate(&self) -> Result<(), String> {
        if self.end_date < self.start_date {
            return Err("End date must not be before start date".to_string());
        }
        Ok(())
    }
}

/// Request DTO for proposing a price
#[derive(Debug, Deserialize)]
pub struct ProposePriceRequest {
    pub proposed_price_cents: i64,
    pub message: Option<String>,
}

impl ProposePriceRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.proposed_price_cents < 0 {
            return Err("Proposed price must not be negative".to_string());
        }
        Ok(())
    }
}

/// Which side of the request to list
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequestRole {
    Borrower,
    Lender,
}

/// Query parameters for listing borrow requests
#[derive(Debug, Deserialize)]
pub struct BorrowRequestFilter {
    pub role: Option<RequestRole>,
    pub status: Option<RequestStatus>,
    pub page: Option<i32>,
    pub limit: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use RequestStatus::*;

    #[test]
    fn test_happy_path_transitions() {
        assert!(Pending.can_transition_to(Negotiating));
        assert!(Negotiating.can_transition_to(PaymentPending));
        assert!(PaymentPending.can_transition_to(Paid));
        assert!(Paid.can_transition_to(Active));
        assert!(Active.can_transition_to(Completed));
    }

    #[test]
    fn test_direct_approval_skips_negotiation() {
        assert!(Pending.can_transition_to(PaymentPending));
    }

    #[test]
    fn test_legacy_approved_behaves_like_payment_pending() {
        assert!(Approved.can_transition_to(Paid));
        assert!(Approved.can_transition_to(Rejected));
        assert!(!Approved.can_transition_to(Cancelled));
    }

    #[test]
    fn test_terminal_states_accept_nothing() {
        for terminal in [Rejected, Completed, Cancelled] {
            assert!(terminal.is_terminal());
            for next in [
                Pending,
                Negotiating,
                Approved,
                Rejected,
                PaymentPending,
                Paid,
                Active,
                Completed,
                Cancelled,
            ] {
                assert!(
                    !terminal.can_transition_to(next),
                    "{:?} -> {:?} must be refused",
                    terminal,
                    next
                );
            }
        }
    }

    #[test]
    fn test_no_shortcuts_to_paid() {
        assert!(!Pending.can_transition_to(Paid));
        assert!(!Negotiating.can_transition_to(Paid));
        assert!(!Pending.can_transition_to(Active));
        assert!(!Paid.can_transition_to(Completed));
    }

    #[test]
    fn test_paid_requests_cannot_be_rejected() {
        assert!(!Paid.can_transition_to(Rejected));
        assert!(!Active.can_transition_to(Rejected));
        assert!(!Paid.can_transition_to(Cancelled));
        assert!(!Active.can_transition_to(Cancelled));
    }

    #[test]
    fn test_paid_path_classification() {
        for status in [Approved, PaymentPending, Paid, Active] {
            assert!(status.is_paid_path());
        }
        for status in [Pending, Negotiating, Rejected, Completed, Cancelled] {
            assert!(!status.is_paid_path());
        }
    }

    #[test]
    fn test_effective_price_precedence() {
        let mut request = BorrowRequest {
            id: Uuid::new_v4(),
            item_id: Uuid::new_v4(),
            borrower_id: Uuid::new_v4(),
            lender_id: Uuid::new_v4(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            message: String::new(),
            original_price_cents: None,
            negotiated_price_cents: None,
            negotiation_message: None,
            total_cents: 0,
            status: RequestStatus::Pending,
            payment_session_id: None,
            payment_status: PaymentStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert_eq!(request.effective_daily_price_cents(1000), 1000);

        request.original_price_cents = Some(900);
        assert_eq!(request.effective_daily_price_cents(1000), 900);

        request.negotiated_price_cents = Some(800);
        assert_eq!(request.effective_daily_price_cents(1000), 800);
    }
}
