use std::net::{IpAddr, SocketAddr};

use roboinvestor::{AppState, captcha::is_captcha_required, config::Config, router::create_router};
#[cfg(debug_assertions)]
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env();

    if is_captcha_required(&config) && config.turnstile_secret_key.is_none() {
        tracing::warn!(
            "CAPTCHA is required but TURNSTILE_SECRET_KEY is not set, contact submissions will be rejected"
        );
    }

    // 限流器和人机验证在启动时显式创建，通过应用状态注入
    let state = AppState::new(config);
    tracing::info!(
        window_secs = state.contact_limiter.interval().as_secs(),
        limit = state.config.contact_rate_limit_requests,
        clients = state.config.contact_rate_limit_clients,
        "Contact rate limiter configured"
    );

    let app = create_router(state.clone());

    // 开发模式允许所有来源跨域
    #[cfg(debug_assertions)]
    let app = {
        tracing::debug!("Adding CORS layer for development mode");
        app.layer(CorsLayer::permissive())
    };

    let addr = SocketAddr::new(
        state.config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        state.config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app,
    )
    .await
    .expect("Failed to start server");
}
