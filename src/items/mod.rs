//! Items offered for borrowing

pub mod model;
mod service;

pub use model::{CreateItemRequest, Item, ItemCategory, ItemCondition, ItemFilter, UpdateItemRequest};
pub use service::ItemService;
