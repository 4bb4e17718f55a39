// 订单处理器
// 订单送达确认: 推进订单状态并触发推荐确认与奖励

use actix_web::{web, HttpResponse, Result as ActixResult};
use uuid::Uuid;

use serde::Serialize;

use crate::handlers::service_error_response;
use crate::models::{ApiResponse, Order, ReferralProcessOutcome};
use crate::state::AppStateData;

/// 送达确认响应
#[derive(Debug, Serialize)]
pub struct DeliveryConfirmation {
    /// 更新后的订单
    pub order: Order,
    /// 推荐处理结果
    pub referral: ReferralProcessOutcome,
}

/// 订单送达确认
///
/// POST /api/v1/orders/{order_id}/delivered
///
/// 已支付或配送中的订单可以标记送达；送达后同步处理被推荐用户的
/// 推荐确认与奖励发放。重复送达确认不会重复处理。
pub async fn mark_order_delivered(
    data: AppStateData,
    path: web::Path<Uuid>,
) -> ActixResult<HttpResponse> {
    let order_id = path.into_inner();

    match data.referral_service.confirm_order_delivered(order_id).await {
        Ok((order, referral)) => Ok(HttpResponse::Ok()
            .json(ApiResponse::success(DeliveryConfirmation { order, referral }))),
        Err(e) => Ok(service_error_response(&e)),
    }
}
