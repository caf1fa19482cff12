//! BorrowPal backend library
//!
//! Booking, negotiation and wallet workflows for the BorrowPal
//! peer-to-peer lending marketplace.

pub mod auth;
pub mod bookings;
pub mod borrows;
pub mod chat;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod items;
pub mod middleware;
pub mod models;
pub mod notifications;
pub mod payments;
pub mod pricing;
pub mod realtime;
pub mod reviews;
pub mod routes;
pub mod services;
pub mod state;
pub mod wallet;
