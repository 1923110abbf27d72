use std::num::NonZeroUsize;
use std::time::Duration;

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::client::client_identifier;
use crate::cache::TtlLruCache;

pub const DEFAULT_UNIQUE_TOKEN_PER_INTERVAL: usize = 500;
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(60_000);

/// 联系表单：每小时窗口，最多跟踪 1000 个客户端
pub const CONTACT_UNIQUE_TOKEN_PER_INTERVAL: usize = 1000;
pub const CONTACT_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitOptions {
    /// 同时跟踪的客户端数量上限
    pub unique_token_per_interval: usize,
    /// 计数窗口
    pub interval: Duration,
}

impl Default for RateLimitOptions {
    fn default() -> Self {
        Self {
            unique_token_per_interval: DEFAULT_UNIQUE_TOKEN_PER_INTERVAL,
            interval: DEFAULT_INTERVAL,
        }
    }
}

impl RateLimitOptions {
    pub fn contact() -> Self {
        Self {
            unique_token_per_interval: CONTACT_UNIQUE_TOKEN_PER_INTERVAL,
            interval: CONTACT_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitResult {
    pub success: bool,
    pub limit: u32,
    pub remaining: u32,
    /// 检查时刻加一个窗口，并非该客户端计数的实际过期时间
    pub reset: DateTime<Utc>,
}

impl RateLimitResult {
    /// 距离 `reset` 的秒数，向上取整且至少为 1
    pub fn retry_after_secs(&self) -> u64 {
        let millis = (self.reset - Utc::now()).num_milliseconds().max(0) as u64;
        millis.div_ceil(1000).max(1)
    }
}

/// 按客户端标识计数的固定窗口限流器
///
/// 计数保存在定长 LRU 缓存中，客户端在一个窗口内没有新的放行请求后计数清零。
/// 被拒绝的请求不计数。
pub struct RateLimiter {
    tokens: Mutex<TtlLruCache<String, u32>>,
    interval: Duration,
}

impl RateLimiter {
    pub fn new(options: RateLimitOptions) -> Self {
        let capacity = NonZeroUsize::new(options.unique_token_per_interval)
            .or(NonZeroUsize::new(DEFAULT_UNIQUE_TOKEN_PER_INTERVAL))
            .unwrap_or(NonZeroUsize::MIN);
        let interval = if options.interval.is_zero() {
            DEFAULT_INTERVAL
        } else {
            options.interval
        };

        Self {
            tokens: Mutex::new(TtlLruCache::new(capacity, interval)),
            interval,
        }
    }

    pub fn contact() -> Self {
        Self::new(RateLimitOptions::contact())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// 检查请求是否放行，`limit` 为每个窗口允许的请求数
    pub async fn check(&self, headers: &HeaderMap, limit: u32) -> RateLimitResult {
        let token = client_identifier(headers);
        self.check_token(&token, limit).await
    }

    pub async fn check_token(&self, token: &str, limit: u32) -> RateLimitResult {
        // 读取、递增、写回在同一把锁内完成
        let mut tokens = self.tokens.lock().await;
        let current_usage = tokens.get(token).copied().unwrap_or(0);

        if current_usage >= limit {
            return RateLimitResult {
                success: false,
                limit,
                remaining: 0,
                reset: self.reset_at(),
            };
        }

        let usage = current_usage + 1;
        tokens.set(token.to_string(), usage);

        RateLimitResult {
            success: true,
            limit,
            remaining: limit - usage,
            reset: self.reset_at(),
        }
    }

    pub async fn tracked_clients(&self) -> usize {
        self.tokens.lock().await.len()
    }

    /// 超出时间范围的窗口截断到 `DateTime::MAX_UTC`
    fn reset_at(&self) -> DateTime<Utc> {
        let window = chrono::Duration::from_std(self.interval).unwrap_or(chrono::Duration::MAX);
        Utc::now()
            .checked_add_signed(window)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::http::HeaderValue;

    fn request_from(ip: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(ip));
        headers.insert("user-agent", HeaderValue::from_static("test-agent"));
        headers
    }

    fn limiter(unique_tokens: usize, interval_ms: u64) -> RateLimiter {
        RateLimiter::new(RateLimitOptions {
            unique_token_per_interval: unique_tokens,
            interval: Duration::from_millis(interval_ms),
        })
    }

    #[tokio::test]
    async fn test_remaining_counts_down() {
        let limiter = limiter(10, 60_000);
        let req = request_from("10.0.0.1");

        for n in 1..=5 {
            let result = limiter.check(&req, 5).await;
            assert!(result.success, "Request {} should be allowed", n);
            assert_eq!(result.limit, 5);
            assert_eq!(result.remaining, 5 - n);
        }
    }

    #[tokio::test]
    async fn test_denied_at_limit_without_counting() {
        let limiter = limiter(10, 60_000);
        let req = request_from("10.0.0.1");

        for _ in 0..3 {
            assert!(limiter.check(&req, 3).await.success);
        }

        for _ in 0..3 {
            let result = limiter.check(&req, 3).await;
            assert!(!result.success);
            assert_eq!(result.remaining, 0);
        }

        // 拒绝不增加计数，提高上限后只多放行一次
        let result = limiter.check(&req, 4).await;
        assert!(result.success);
        assert_eq!(result.remaining, 0);
        assert!(!limiter.check(&req, 4).await.success);
    }

    #[tokio::test]
    async fn test_clients_do_not_share_quota() {
        let limiter = limiter(10, 60_000);
        let first = request_from("10.0.0.1");
        let second = request_from("10.0.0.2");

        assert!(limiter.check(&first, 2).await.success);
        assert!(limiter.check(&first, 2).await.success);
        assert!(!limiter.check(&first, 2).await.success);

        let result = limiter.check(&second, 2).await;
        assert!(result.success);
        assert_eq!(result.remaining, 1);
    }

    #[tokio::test]
    async fn test_same_ip_different_user_agent() {
        let limiter = limiter(10, 60_000);
        let mut chrome = request_from("10.0.0.1");
        chrome.insert("user-agent", HeaderValue::from_static("chrome"));
        let firefox = request_from("10.0.0.1");

        assert!(limiter.check(&chrome, 1).await.success);
        assert!(limiter.check(&firefox, 1).await.success);
        assert!(!limiter.check(&chrome, 1).await.success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_expiry_resets_usage() {
        let limiter = limiter(10, 1000);
        let req = request_from("10.0.0.1");

        assert!(limiter.check(&req, 2).await.success);
        assert!(limiter.check(&req, 2).await.success);
        assert!(!limiter.check(&req, 2).await.success);

        tokio::time::advance(Duration::from_millis(1001)).await;

        let result = limiter.check(&req, 2).await;
        assert!(result.success);
        assert_eq!(result.remaining, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_denied_requests_do_not_extend_window() {
        let limiter = limiter(10, 1000);
        let req = request_from("10.0.0.1");

        assert!(limiter.check(&req, 1).await.success);
        tokio::time::advance(Duration::from_millis(900)).await;
        assert!(!limiter.check(&req, 1).await.success);

        tokio::time::advance(Duration::from_millis(100)).await;
        assert!(limiter.check(&req, 1).await.success);
    }

    #[tokio::test]
    async fn test_capacity_eviction_starts_fresh() {
        let limiter = limiter(2, 1000);
        let a = request_from("10.0.0.1");
        let b = request_from("10.0.0.2");
        let c = request_from("10.0.0.3");

        let result = limiter.check(&a, 1).await;
        assert!(result.success);
        assert_eq!(result.remaining, 0);

        let result = limiter.check(&a, 1).await;
        assert!(!result.success);
        assert_eq!(result.remaining, 0);

        let result = limiter.check(&b, 1).await;
        assert!(result.success);
        assert_eq!(result.remaining, 0);

        // 第三个客户端挤掉最久未使用的 a
        let result = limiter.check(&c, 1).await;
        assert!(result.success);
        assert_eq!(result.remaining, 0);
        assert_eq!(limiter.tracked_clients().await, 2);

        assert!(limiter.check(&a, 1).await.success);
    }

    #[tokio::test]
    async fn test_unidentified_clients_share_bucket() {
        let limiter = limiter(10, 60_000);

        assert!(limiter.check(&HeaderMap::new(), 1).await.success);
        assert!(!limiter.check(&HeaderMap::new(), 1).await.success);
    }

    #[tokio::test]
    async fn test_reset_is_one_interval_ahead() {
        let limiter = limiter(10, 60_000);
        let before = Utc::now();
        let result = limiter.check(&request_from("10.0.0.1"), 1).await;
        let after = Utc::now();

        assert!(result.reset >= before + chrono::Duration::seconds(60));
        assert!(result.reset <= after + chrono::Duration::seconds(60));
        assert!(result.retry_after_secs() >= 59 && result.retry_after_secs() <= 60);
    }

    #[tokio::test]
    async fn test_zero_options_use_defaults() {
        let limiter = limiter(0, 0);
        assert_eq!(limiter.interval(), DEFAULT_INTERVAL);

        let contact = RateLimiter::contact();
        assert_eq!(contact.interval(), Duration::from_secs(3600));
    }

    #[tokio::test]
    async fn test_huge_interval_saturates_reset() {
        let limiter = RateLimiter::new(RateLimitOptions {
            unique_token_per_interval: 10,
            interval: Duration::from_secs(10_000_000_000_000),
        });

        let result = limiter.check(&HeaderMap::new(), 1).await;
        assert!(result.success);
        assert_eq!(result.reset, DateTime::<Utc>::MAX_UTC);
        assert!(result.retry_after_secs() > 1);

        // 超出 chrono::Duration 范围的窗口同样不会溢出
        let limiter = RateLimiter::new(RateLimitOptions {
            unique_token_per_interval: 10,
            interval: Duration::MAX,
        });
        let result = limiter.check(&HeaderMap::new(), 1).await;
        assert_eq!(result.reset, DateTime::<Utc>::MAX_UTC);
        assert!(!limiter.check(&HeaderMap::new(), 1).await.success);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_checks_never_exceed_limit() {
        let limiter = Arc::new(limiter(10, 60_000));

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move {
                    limiter.check(&request_from("10.0.0.1"), 7).await.success
                })
            })
            .collect();

        let mut allowed = 0;
        for handle in handles {
            if handle.await.unwrap() {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 7);
    }
}
