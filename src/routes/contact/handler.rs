use axum::{
    extract::{Json, State, rejection::JsonRejection},
    http::HeaderMap,
};

use crate::{
    AppState,
    captcha::is_captcha_required,
    error::AppError,
    rate_limit::client_ip,
    result::ApiResponse,
    utils::success_to_api_response,
};

use super::model::{ContactRequest, ContactResponse};

#[axum::debug_handler]
pub async fn submit_contact(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ContactRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ContactResponse>>, AppError> {
    let Json(req) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    req.validate().map_err(AppError::Validation)?;

    if is_captcha_required(&state.config) {
        let token = req.turnstile_token.as_deref().unwrap_or_default();
        let remote_ip = client_ip(&headers);
        let verification = state.turnstile.verify(token, remote_ip.as_deref()).await;

        if !verification.success {
            let reason = verification.error_summary();
            tracing::warn!(
                remote_ip = remote_ip.as_deref().unwrap_or("unknown"),
                error_codes = %reason,
                "Contact form CAPTCHA rejected"
            );
            return Err(AppError::CaptchaFailed(reason));
        }
    }

    let submission_id = uuid::Uuid::new_v4().to_string();

    // 不记录留言正文
    tracing::info!(
        submission_id = %submission_id,
        name = %req.name.trim(),
        email = %req.email.trim(),
        company = req.company.as_deref().map(str::trim).unwrap_or(""),
        message_chars = req.message.trim().chars().count(),
        "Contact form submitted"
    );

    Ok(success_to_api_response(ContactResponse { submission_id }))
}
