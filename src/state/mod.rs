//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::auth::AuthService;
use crate::bookings::BookingService;
use crate::borrows::BorrowService;
use crate::chat::ChatService;
use crate::items::ItemService;
use crate::notifications::NotificationService;
use crate::realtime::WsState;
use crate::reviews::ReviewService;
use crate::services::ServiceCatalog;
use crate::wallet::WalletService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: Arc<AuthService>,
    pub item_service: Arc<ItemService>,
    pub service_catalog: Arc<ServiceCatalog>,
    pub borrow_service: Arc<BorrowService>,
    pub booking_service: Arc<BookingService>,
    pub wallet_service: Arc<WalletService>,
    pub notification_service: Arc<NotificationService>,
    pub chat_service: Arc<ChatService>,
    pub review_service: Arc<ReviewService>,
    pub ws_state: WsState,
    /// Shared secret expected on payment webhook calls
    pub webhook_secret: Option<String>,
}

impl FromRef<AppState> for WsState {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.ws_state.clone()
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_service.clone()
    }
}
