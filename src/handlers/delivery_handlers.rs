// 配送费处理器
// 配送费试算与时段规则管理 (管理端)

use actix_web::{web, HttpRequest, HttpResponse, Result as ActixResult};
use uuid::Uuid;

use crate::handlers::{admin_forbidden, service_error_response};
use crate::models::{ApiResponse, CreateFeeRuleRequest, FeeQuoteQuery};
use crate::state::AppStateData;
use crate::utils::is_admin_request;

/// 配送费试算
///
/// GET /api/v1/delivery-fees/quote?area_id=...&at=HH:MM:SS
pub async fn quote_delivery_fee(
    data: AppStateData,
    query: web::Query<FeeQuoteQuery>,
) -> ActixResult<HttpResponse> {
    match data
        .delivery_fee_service
        .quote_fee(query.area_id, query.at)
        .await
    {
        Ok(quote) => Ok(HttpResponse::Ok().json(ApiResponse::success(quote))),
        Err(e) => Ok(service_error_response(&e)),
    }
}

/// 创建配送费时段规则
///
/// POST /api/v1/areas/{area_id}/fee-rules
///
/// 需要管理员API密钥。
pub async fn create_fee_rule(
    data: AppStateData,
    path: web::Path<Uuid>,
    request: web::Json<CreateFeeRuleRequest>,
    req: HttpRequest,
) -> ActixResult<HttpResponse> {
    if !is_admin_request(&req, &data.config.security.admin_api_key) {
        return Ok(admin_forbidden());
    }

    match data
        .delivery_fee_service
        .create_fee_rule(path.into_inner(), request.into_inner())
        .await
    {
        Ok(rule) => Ok(HttpResponse::Created().json(ApiResponse::success(rule))),
        Err(e) => Ok(service_error_response(&e)),
    }
}

/// 查询区域的全部规则
///
/// GET /api/v1/areas/{area_id}/fee-rules
pub async fn list_fee_rules(
    data: AppStateData,
    path: web::Path<Uuid>,
) -> ActixResult<HttpResponse> {
    match data
        .delivery_fee_service
        .rules_for_area(path.into_inner())
        .await
    {
        Ok(rules) => Ok(HttpResponse::Ok().json(ApiResponse::success(rules))),
        Err(e) => Ok(service_error_response(&e)),
    }
}
