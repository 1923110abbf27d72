use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{
    error::AppError,
    rate_limit::{RateLimitResult, RateLimiter, client_identifier},
};

/// 挂在单个路由上的限流守卫：共享的限流器加上该路由的窗口请求上限
#[derive(Clone)]
pub struct RateLimitGuard {
    limiter: Arc<RateLimiter>,
    limit: u32,
}

impl RateLimitGuard {
    pub fn new(limiter: Arc<RateLimiter>, limit: u32) -> Self {
        Self { limiter, limit }
    }

    pub async fn check_rate_limit(&self, req: Request<Body>, next: Next) -> Response {
        let result = self.limiter.check(req.headers(), self.limit).await;

        if !result.success {
            tracing::debug!(
                client = %client_identifier(req.headers()),
                path = %req.uri().path(),
                limit = result.limit,
                reset = %result.reset,
                "rate limit exceeded"
            );
            return AppError::RateLimited(result).into_response();
        }

        let mut response = next.run(req).await;
        apply_rate_limit_headers(response.headers_mut(), &result);
        response
    }
}

pub fn apply_rate_limit_headers(headers: &mut HeaderMap, result: &RateLimitResult) {
    headers.insert("x-ratelimit-limit", HeaderValue::from(result.limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(result.remaining));
    if let Ok(reset) = HeaderValue::from_str(&result.reset.to_rfc3339()) {
        headers.insert("x-ratelimit-reset", reset);
    }
}

pub async fn rate_limit(
    State(guard): State<Arc<RateLimitGuard>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    guard.check_rate_limit(req, next).await
}
