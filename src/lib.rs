use std::sync::Arc;

use captcha::TurnstileVerifier;
use config::Config;
use rate_limit::RateLimiter;

pub mod cache;
pub mod captcha;
pub mod config;
pub mod error;
pub mod middleware;
pub mod rate_limit;
pub mod result;
pub mod router;
pub mod routes;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub contact_limiter: Arc<RateLimiter>,
    pub turnstile: TurnstileVerifier,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let contact_limiter = Arc::new(RateLimiter::new(config.contact_rate_limit_options()));
        let turnstile = TurnstileVerifier::from_config(&config);

        Self {
            config,
            contact_limiter,
            turnstile,
        }
    }
}
