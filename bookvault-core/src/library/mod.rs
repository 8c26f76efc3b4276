//! 藏书子系统：受会话保护的书目 CRUD

mod models;
mod store;

pub use models::{Book, CreateBookRequest, UpdateBookRequest};
pub use store::BookStore;
