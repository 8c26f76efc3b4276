mod error;
mod handlers;
mod mailer;
mod middleware;
mod rate_limit;
mod router;
mod state;

#[cfg(test)]
mod tests;

pub use error::ApiError;
pub use mailer::{MailSettings, Mailer};
pub use rate_limit::RateLimiter;
pub use router::app_router;
pub use state::AppState;
