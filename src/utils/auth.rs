// 认证工具函数
// 管理端接口的API密钥提取与校验

use actix_web::{error::ErrorUnauthorized, HttpRequest, Result as ActixResult};

/// 从HTTP请求中提取API密钥
///
/// 支持 `Authorization: Bearer <key>` 与 `X-API-Key` 两种携带方式。
///
/// # Arguments
/// * `req` - HTTP请求对象
///
/// # Returns
/// * API密钥字符串
pub fn extract_api_key(req: &HttpRequest) -> ActixResult<String> {
    // 从Authorization头部提取Bearer token
    if let Some(auth_header) = req.headers().get("Authorization") {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Ok(token.to_string());
            }
        }
    }

    // 从X-API-Key头部提取
    if let Some(api_key_header) = req.headers().get("X-API-Key") {
        if let Ok(api_key) = api_key_header.to_str() {
            return Ok(api_key.to_string());
        }
    }

    Err(ErrorUnauthorized("Missing or invalid API key"))
}

/// 校验请求是否携带了有效的管理员密钥
///
/// # Arguments
/// * `req` - HTTP请求对象
/// * `admin_api_key` - 配置的管理员密钥
pub fn is_admin_request(req: &HttpRequest, admin_api_key: &str) -> bool {
    match extract_api_key(req) {
        Ok(key) => !admin_api_key.is_empty() && key == admin_api_key,
        Err(_) => false,
    }
}
