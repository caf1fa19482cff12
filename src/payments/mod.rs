//! External payment provider integration

mod client;

pub use client::{PaymentClient, PaymentError, PaymentSession};
