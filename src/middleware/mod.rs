mod error_handler;
mod rate_limit;

pub use error_handler::log_errors;
pub use rate_limit::{RateLimitGuard, apply_rate_limit_headers, rate_limit};
