//! Services offered for booking

pub mod model;
mod service;

pub use model::{
    CreateServiceRequest, PriceType, ServiceFilter, ServiceListing, UpdateServiceRequest,
};
pub use service::ServiceCatalog;
