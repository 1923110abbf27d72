use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::middleware::apply_rate_limit_headers;
use crate::rate_limit::RateLimitResult;
use crate::utils::{error_codes, error_to_api_response};

#[derive(Debug)]
pub enum AppError {
    Validation(String),
    CaptchaFailed(String),
    RateLimited(RateLimitResult),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, msg) = match &self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                error_codes::VALIDATION_ERROR,
                msg.clone(),
            ),
            AppError::CaptchaFailed(reason) => (
                StatusCode::BAD_REQUEST,
                error_codes::CAPTCHA_FAILED,
                format!("CAPTCHA verification failed: {}", reason),
            ),
            AppError::RateLimited(result) => (
                StatusCode::TOO_MANY_REQUESTS,
                error_codes::RATE_LIMIT,
                format!(
                    "Too many requests, please retry in {} seconds",
                    result.retry_after_secs()
                ),
            ),
        };

        let mut response = (status, error_to_api_response::<()>(code, msg)).into_response();

        if let AppError::RateLimited(result) = &self {
            let headers = response.headers_mut();
            apply_rate_limit_headers(headers, result);
            headers.insert(
                axum::http::header::RETRY_AFTER,
                result.retry_after_secs().into(),
            );
        }

        response
    }
}
