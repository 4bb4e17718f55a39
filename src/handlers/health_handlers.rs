// 健康检查处理器

use actix_web::{HttpResponse, Result as ActixResult};
use serde::Serialize;

use crate::models::ApiResponse;
use crate::state::AppStateData;

/// 健康检查响应
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    /// 服务状态
    pub status: &'static str,
    /// 数据库连通性
    pub database: &'static str,
    /// 服务版本
    pub version: &'static str,
}

/// 健康检查端点
///
/// GET /health
pub async fn health_check(data: AppStateData) -> ActixResult<HttpResponse> {
    let database = match sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&data.db_pool)
        .await
    {
        Ok(_) => "up",
        Err(e) => {
            log::error!("Health check database probe failed: {}", e);
            "down"
        }
    };

    let status = HealthStatus {
        status: if database == "up" { "ok" } else { "degraded" },
        database,
        version: env!("CARGO_PKG_VERSION"),
    };

    if database == "up" {
        Ok(HttpResponse::Ok().json(ApiResponse::success(status)))
    } else {
        Ok(HttpResponse::ServiceUnavailable().json(ApiResponse::success(status)))
    }
}

/// 版本信息响应
#[derive(Debug, Serialize)]
pub struct VersionInfo {
    /// 服务名称
    pub name: &'static str,
    /// 服务版本
    pub version: &'static str,
}

/// 版本信息端点
///
/// GET /api/v1/version
pub async fn version_info() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::success(VersionInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })))
}
