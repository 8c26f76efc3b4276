mod auth;
mod books;
mod health;

pub use auth::{
    confirm_password_reset, confirm_registration, get_me, login, register, request_password_reset,
};
pub use books::{create_book, delete_book, get_book, list_books, update_book};
pub use health::{handler_404, health};
