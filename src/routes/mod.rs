//! Route definitions, one module per domain

mod auth;
mod bookings;
mod borrows;
mod dashboard;
mod items;
mod messages;
mod notifications;
mod payments;
mod reviews;
mod services;
mod wallet;

pub use auth::auth_routes;
pub use bookings::booking_routes;
pub use borrows::borrow_routes;
pub use dashboard::dashboard_routes;
pub use items::item_routes;
pub use messages::message_routes;
pub use notifications::notification_routes;
pub use payments::payment_routes;
pub use reviews::review_routes;
pub use services::service_routes;
pub use wallet::wallet_routes;
