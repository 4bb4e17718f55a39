// HTTP处理器模块
// 处理器只做参数提取、鉴权与响应映射，业务逻辑全部在服务层

pub mod delivery_handlers;
pub mod discount_handlers;
pub mod health_handlers;
pub mod order_handlers;
pub mod payout_handlers;
pub mod referral_handlers;
pub mod wallet_handlers;
pub mod webhook_handlers;

pub use delivery_handlers::*;
pub use discount_handlers::*;
pub use health_handlers::*;
pub use order_handlers::*;
pub use payout_handlers::*;
pub use referral_handlers::*;
pub use wallet_handlers::*;
pub use webhook_handlers::*;

use actix_web::HttpResponse;

use crate::error::ServiceError;
use crate::models::ApiResponse;

/// 将服务层错误映射为HTTP响应
///
/// 数据库与内部错误不向外暴露细节，只记录日志。
pub fn service_error_response(error: &ServiceError) -> HttpResponse {
    match error {
        ServiceError::Validation(message) => {
            HttpResponse::BadRequest().json(ApiResponse::<()>::error(400, message))
        }
        ServiceError::NotFound(entity) => HttpResponse::NotFound()
            .json(ApiResponse::<()>::error(404, &format!("{} not found", entity))),
        ServiceError::InsufficientFunds { .. }
        | ServiceError::AmountMismatch { .. }
        | ServiceError::MissingTransferRecipient { .. } => HttpResponse::UnprocessableEntity()
            .json(ApiResponse::<()>::error(422, &error.to_string())),
        ServiceError::Gateway(message) => {
            log::error!("Transfer gateway failure: {}", message);
            HttpResponse::BadGateway()
                .json(ApiResponse::<()>::error(502, "Transfer gateway unavailable"))
        }
        ServiceError::Database(e) => {
            log::error!("Database error: {}", e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error(500, "Internal server error"))
        }
        ServiceError::Internal(e) => {
            log::error!("Internal error: {}", e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error(500, "Internal server error"))
        }
    }
}

/// 管理端接口的统一拒绝响应
pub fn admin_forbidden() -> HttpResponse {
    HttpResponse::Forbidden().json(ApiResponse::<()>::error(403, "Admin API key required"))
}
