// 支付服务商Webhook处理器
// 签名校验在读取原始请求体上进行，通过后才解析事件并进入业务逻辑

use actix_web::{web, HttpRequest, HttpResponse, Result as ActixResult};

use crate::handlers::service_error_response;
use crate::models::{ApiResponse, WebhookEvent};
use crate::state::AppStateData;
use crate::utils::verify_webhook_signature;

/// 携带签名的请求头名称
pub const SIGNATURE_HEADER: &str = "x-provider-signature";

/// 支付服务商Webhook端点
///
/// POST /webhooks/provider
///
/// 签名为原始请求体的HMAC-SHA512。缺少签名头返回400，签名不符返回
/// 401。已识别事件处理完毕或确认忽略后返回200，服务商才会停止重试。
pub async fn provider_webhook(
    data: AppStateData,
    req: HttpRequest,
    body: web::Bytes,
) -> ActixResult<HttpResponse> {
    let signature = match req.headers().get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) {
        Some(s) => s,
        None => {
            log::warn!("Webhook request without signature header");
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::<()>::error(400, "Missing signature header")));
        }
    };

    let valid = match verify_webhook_signature(&body, signature, &data.config.provider.webhook_secret)
    {
        Ok(v) => v,
        Err(e) => {
            log::error!("Webhook signature verification failed: {}", e);
            false
        }
    };
    if !valid {
        log::warn!("Webhook request with invalid signature rejected");
        return Ok(
            HttpResponse::Unauthorized().json(ApiResponse::<()>::error(401, "Invalid signature"))
        );
    }

    let event = match WebhookEvent::parse(&body) {
        Ok(event) => event,
        Err(e) => {
            log::warn!("Malformed webhook payload: {}", e);
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::<()>::error(400, "Malformed event payload")));
        }
    };

    match event {
        WebhookEvent::ChargeSuccess(charge) => {
            match data
                .payment_completion_service
                .handle_charge_success(&charge)
                .await
            {
                Ok(outcome) => {
                    if outcome.already_completed {
                        log::info!(
                            "Duplicate charge.success for reference {} acknowledged",
                            charge.reference
                        );
                    }
                    Ok(HttpResponse::Ok().json(ApiResponse::success(outcome)))
                }
                // 金额不一致属于安全异常: 显著记录，确认收到但不改任何状态
                Err(crate::error::ServiceError::AmountMismatch {
                    reference,
                    expected_kobo,
                    received_kobo,
                }) => {
                    log::error!(
                        "SECURITY: amount mismatch for reference {}: expected {} kobo, webhook reported {} kobo; no state changed",
                        reference,
                        expected_kobo,
                        received_kobo
                    );
                    Ok(HttpResponse::Ok()
                        .json(ApiResponse::<()>::error(200, "Amount mismatch, event not applied")))
                }
                // 未知引用同样确认收到，避免服务商无限重试
                Err(crate::error::ServiceError::NotFound(_)) => {
                    log::warn!(
                        "charge.success for unknown reference {} acknowledged",
                        charge.reference
                    );
                    Ok(HttpResponse::Ok()
                        .json(ApiResponse::<()>::error(200, "Unknown payment reference")))
                }
                Err(e) => {
                    log::error!(
                        "Failed to process charge.success for {}: {}",
                        charge.reference,
                        e
                    );
                    Ok(service_error_response(&e))
                }
            }
        }
        WebhookEvent::ChargeFailed(charge) => {
            match data
                .payment_completion_service
                .fail_payment_by_reference(&charge.reference)
                .await
            {
                Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::success("Failure recorded"))),
                Err(e) => {
                    log::error!(
                        "Failed to process charge.failed for {}: {}",
                        charge.reference,
                        e
                    );
                    Ok(service_error_response(&e))
                }
            }
        }
        WebhookEvent::Unknown(event_type) => {
            log::info!("Ignoring unhandled webhook event type {}", event_type);
            Ok(HttpResponse::Ok().json(ApiResponse::success("Event ignored")))
        }
    }
}
