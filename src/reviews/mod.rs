//! Reviews for completed borrows

pub mod model;
mod service;

pub use model::{CreateReviewRequest, Review, UserRatingSummary};
pub use service::ReviewService;
