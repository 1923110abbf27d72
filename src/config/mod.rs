use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::rate_limit::{CONTACT_INTERVAL, CONTACT_UNIQUE_TOKEN_PER_INTERVAL, RateLimitOptions};

pub const DEFAULT_TURNSTILE_VERIFY_URL: &str =
    "https://challenges.cloudflare.com/turnstile/v0/siteverify";

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    pub contact_rate_limit_window_secs: u64,
    pub contact_rate_limit_clients: usize,
    pub contact_rate_limit_requests: u32,
    pub turnstile_secret_key: Option<String>,
    pub turnstile_verify_url: String,
    pub app_env: String,
    pub require_captcha: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 从任意键值来源构建配置，无法解析的值回退为默认值
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| non_empty(&lookup, key);

        Config {
            server_host: value("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            server_port: parse_var::<_, u16>(&lookup, "SERVER_PORT").unwrap_or(3000),
            api_base_uri: value("API_BASE_URI")
                .map(|uri| normalize_base_uri(&uri))
                .unwrap_or_else(|| "/api".into()),
            contact_rate_limit_window_secs: parse_var::<_, u64>(&lookup, "CONTACT_RATE_LIMIT_WINDOW")
                .filter(|secs| *secs > 0)
                .unwrap_or(CONTACT_INTERVAL.as_secs()),
            contact_rate_limit_clients: parse_var::<_, usize>(&lookup, "CONTACT_RATE_LIMIT_CLIENTS")
                .filter(|n| *n > 0)
                .unwrap_or(CONTACT_UNIQUE_TOKEN_PER_INTERVAL),
            contact_rate_limit_requests: parse_var::<_, u32>(&lookup, "CONTACT_RATE_LIMIT_REQUESTS")
                .filter(|n| *n > 0)
                .unwrap_or(5),
            turnstile_secret_key: value("TURNSTILE_SECRET_KEY"),
            turnstile_verify_url: value("TURNSTILE_VERIFY_URL")
                .unwrap_or_else(|| DEFAULT_TURNSTILE_VERIFY_URL.into()),
            app_env: value("APP_ENV").unwrap_or_else(|| "development".into()),
            require_captcha: value("REQUIRE_CAPTCHA"),
        }
    }

    pub fn contact_rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.contact_rate_limit_window_secs)
    }

    pub fn contact_rate_limit_options(&self) -> RateLimitOptions {
        RateLimitOptions {
            unique_token_per_interval: self.contact_rate_limit_clients,
            interval: self.contact_rate_limit_window(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|v| !v.trim().is_empty())
}

/// 统一为以 `/` 开头、不以 `/` 结尾的路径，根路径为 `/`
fn normalize_base_uri(uri: &str) -> String {
    format!("/{}", uri.trim().trim_matches('/'))
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    non_empty(lookup, key).and_then(|v| v.trim().parse().ok())
}
