//! Service bookings
//!
//! Slot bookings against the catalog, guarded twice: a friendly
//! conflict pre-check and the storage-level exclusion constraint.

mod conflict;
pub mod model;
mod service;

pub use conflict::{overlaps, ConflictChecker};
pub use model::{
    Booking, BookingFilter, BookingRole, BookingStatus, BookingWithPayment, CalendarQuery,
    CalendarSlot, CancelBookingRequest, CreateBookingRequest, RespondBookingRequest,
    ReviewBookingRequest,
};
pub use service::{BookingError, BookingService};
