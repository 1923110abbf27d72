//! Cloudflare Turnstile 服务端校验
//!
//! 校验失败不会返回错误，而是以 `success: false` 加错误码的形式返回，
//! 与 Turnstile 接口自身的响应格式一致。

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TurnstileErrorCode {
    MissingInputSecret,
    InvalidInputSecret,
    MissingInputResponse,
    InvalidInputResponse,
    InvalidWidgetId,
    InvalidParsedSecret,
    BadRequest,
    TimeoutOrDuplicate,
    InternalError,
    // 本地错误码
    MissingSecretKey,
    ApiError,
    NetworkError,
    #[serde(other)]
    Unknown,
}

impl TurnstileErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingInputSecret => "missing-input-secret",
            Self::InvalidInputSecret => "invalid-input-secret",
            Self::MissingInputResponse => "missing-input-response",
            Self::InvalidInputResponse => "invalid-input-response",
            Self::InvalidWidgetId => "invalid-widget-id",
            Self::InvalidParsedSecret => "invalid-parsed-secret",
            Self::BadRequest => "bad-request",
            Self::TimeoutOrDuplicate => "timeout-or-duplicate",
            Self::InternalError => "internal-error",
            Self::MissingSecretKey => "missing-secret-key",
            Self::ApiError => "api-error",
            Self::NetworkError => "network-error",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TurnstileErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnstileVerifyResponse {
    pub success: bool,
    #[serde(
        rename = "error-codes",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub error_codes: Vec<TurnstileErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge_ts: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cdata: Option<String>,
}

impl TurnstileVerifyResponse {
    pub fn failure(code: TurnstileErrorCode) -> Self {
        Self {
            success: false,
            error_codes: vec![code],
            challenge_ts: None,
            hostname: None,
            action: None,
            cdata: None,
        }
    }

    /// 以逗号拼接的错误码，用于日志和接口提示
    pub fn error_summary(&self) -> String {
        self.error_codes
            .iter()
            .map(TurnstileErrorCode::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone)]
pub struct TurnstileVerifier {
    client: reqwest::Client,
    secret_key: Option<String>,
    verify_url: String,
}

impl TurnstileVerifier {
    pub fn new(secret_key: Option<String>, verify_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build Turnstile HTTP client, using defaults: {}", e);
                reqwest::Client::new()
            });

        Self {
            client,
            secret_key,
            verify_url: verify_url.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.turnstile_secret_key.clone(),
            config.turnstile_verify_url.clone(),
        )
    }

    pub async fn verify(&self, token: &str, remote_ip: Option<&str>) -> TurnstileVerifyResponse {
        let Some(secret_key) = self.secret_key.as_deref() else {
            tracing::error!("TURNSTILE_SECRET_KEY is not configured");
            return TurnstileVerifyResponse::failure(TurnstileErrorCode::MissingSecretKey);
        };

        if token.is_empty() {
            return TurnstileVerifyResponse::failure(TurnstileErrorCode::MissingInputResponse);
        }

        let mut form = vec![("secret", secret_key), ("response", token)];
        if let Some(ip) = remote_ip {
            form.push(("remoteip", ip));
        }

        let response = match self.client.post(&self.verify_url).form(&form).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Turnstile verification error: {}", e);
                return TurnstileVerifyResponse::failure(TurnstileErrorCode::NetworkError);
            }
        };

        if !response.status().is_success() {
            tracing::error!("Turnstile API returned status {}", response.status());
            return TurnstileVerifyResponse::failure(TurnstileErrorCode::ApiError);
        }

        match response.json::<TurnstileVerifyResponse>().await {
            Ok(data) => data,
            Err(e) => {
                tracing::error!("Turnstile verification error: {}", e);
                TurnstileVerifyResponse::failure(TurnstileErrorCode::NetworkError)
            }
        }
    }
}

/// 生产环境始终要求人机验证，其他环境除非 `REQUIRE_CAPTCHA=false`
pub fn is_captcha_required(config: &Config) -> bool {
    if config.is_production() {
        return true;
    }
    config.require_captcha.as_deref() != Some("false")
}
