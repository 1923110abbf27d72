use std::sync::Arc;

use axum::{Router, routing::post};

use crate::{
    AppState,
    middleware::{RateLimitGuard, log_errors, rate_limit},
    routes,
};

/// 组装全部路由；联系表单单独挂限流中间件
pub fn create_router(state: AppState) -> Router {
    let contact_guard = Arc::new(RateLimitGuard::new(
        state.contact_limiter.clone(),
        state.config.contact_rate_limit_requests,
    ));

    let contact_routes = Router::new()
        .route("/contact", post(routes::contact::submit_contact))
        .layer(axum::middleware::from_fn_with_state(contact_guard, rate_limit));

    let base_uri = state.config.api_base_uri.trim_end_matches('/');
    let router = if base_uri.is_empty() {
        Router::new().merge(contact_routes)
    } else {
        Router::new().nest(base_uri, contact_routes)
    };

    router
        .layer(axum::middleware::from_fn(log_errors))
        .with_state(state)
}
