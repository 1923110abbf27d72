use serde::{Deserialize, Serialize};

/// 统一的接口响应结构
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// 错误码，0 表示成功
    pub code: i32,
    pub msg: String,
    /// 响应数据，错误时为 None
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resp_data: Option<T>,
}
