//! Borrow requests and price negotiation
//!
//! The request status is a checked state machine; the negotiation
//! ledger is append-only with at most one open proposal at a time.

pub mod model;
mod service;

pub use model::{
    BorrowRequest, BorrowRequestFilter, CreateBorrowRequest, Negotiation, NegotiationStatus,
    PaymentStatus, ProposePriceRequest, RequestRole, RequestStatus,
};
pub use service::{BorrowService, RequestError};
