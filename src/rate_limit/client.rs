use axum::http::HeaderMap;

const UNKNOWN: &str = "unknown";

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}

/// 限流使用的客户端标识：`<ip>:<user-agent>`
///
/// IP 依次取 `x-forwarded-for` 的第一项、`x-real-ip`、`cf-connecting-ip`，
/// 都没有时为 `unknown`；缺少 user-agent 时同样为 `unknown`。
/// 无法识别的客户端因此共享同一个计数。
pub fn client_identifier(headers: &HeaderMap) -> String {
    let ip = header_value(headers, "x-forwarded-for")
        .and_then(|forwarded| forwarded.split(',').next())
        .filter(|first| !first.is_empty())
        .or_else(|| header_value(headers, "x-real-ip"))
        .or_else(|| header_value(headers, "cf-connecting-ip"))
        .unwrap_or(UNKNOWN);

    let user_agent = header_value(headers, "user-agent").unwrap_or(UNKNOWN);

    format!("{}:{}", ip, user_agent)
}

/// 客户端 IP，用于人机验证时上报；没有任何 IP 头时返回 `None`
///
/// 存在 `x-forwarded-for` 时只看它的第一项，第一项为空则不上报 IP，
/// 不再回退到其他头。
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded) = header_value(headers, "x-forwarded-for") {
        let first = forwarded.split(',').next().unwrap_or_default().trim();
        return (!first.is_empty()).then(|| first.to_string());
    }

    header_value(headers, "x-real-ip")
        .or_else(|| header_value(headers, "cf-connecting-ip"))
        .map(str::to_string)
}
