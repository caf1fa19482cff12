//! HTTP request handlers

pub mod auth;
pub mod bookings;
pub mod borrows;
pub mod dashboard;
pub mod items;
pub mod messages;
pub mod notifications;
pub mod payments;
pub mod reviews;
pub mod services;
pub mod wallet;
