// 商家结算处理器
// 待结算列表与批量转账发起，全部为管理端接口

use actix_web::{web, HttpRequest, HttpResponse, Result as ActixResult};

use crate::handlers::{admin_forbidden, service_error_response};
use crate::models::{ApiResponse, InitiateTransfersRequest};
use crate::state::AppStateData;
use crate::utils::is_admin_request;

/// 查询待结算记录 (按商家分组)
///
/// GET /api/v1/payouts/pending
///
/// 需要管理员API密钥。
pub async fn get_pending_payouts(
    data: AppStateData,
    req: HttpRequest,
) -> ActixResult<HttpResponse> {
    if !is_admin_request(&req, &data.config.security.admin_api_key) {
        return Ok(admin_forbidden());
    }

    match data.payout_service.get_pending_payouts().await {
        Ok(groups) => Ok(HttpResponse::Ok().json(ApiResponse::success(groups))),
        Err(e) => Ok(service_error_response(&e)),
    }
}

/// 为选中的结算记录发起批量转账
///
/// POST /api/v1/payouts/transfers
///
/// 需要管理员API密钥。批次整体校验通过才会触碰转账网关。
pub async fn initiate_transfers(
    data: AppStateData,
    request: web::Json<InitiateTransfersRequest>,
    req: HttpRequest,
) -> ActixResult<HttpResponse> {
    if !is_admin_request(&req, &data.config.security.admin_api_key) {
        return Ok(admin_forbidden());
    }

    match data
        .payout_service
        .initiate_vendor_transfers(&request.payout_ids)
        .await
    {
        Ok(summary) => Ok(HttpResponse::Ok().json(ApiResponse::success(summary))),
        Err(e) => Ok(service_error_response(&e)),
    }
}
