// 按客户端限流

mod client;
mod limiter;

pub use client::{client_identifier, client_ip};
pub use limiter::{
    CONTACT_INTERVAL, CONTACT_UNIQUE_TOKEN_PER_INTERVAL, DEFAULT_INTERVAL,
    DEFAULT_UNIQUE_TOKEN_PER_INTERVAL, RateLimitOptions, RateLimitResult, RateLimiter,
};
