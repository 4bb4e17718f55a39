// 钱包处理器
// 余额查询、流水分页、发起充值与管理员手工调整

use actix_web::{web, HttpRequest, HttpResponse, Result as ActixResult};
use uuid::Uuid;

use crate::handlers::{admin_forbidden, service_error_response};
use crate::models::{
    AdjustWalletRequest, ApiResponse, BalanceResponse, CreateFundingRequest,
    TransactionListQuery, TxnSource, TxnType, WalletEntry,
};
use crate::state::AppStateData;
use crate::utils::{admin_adjustment_reference, is_admin_request};

/// 查询钱包余额
///
/// GET /api/v1/wallets/{user_id}
pub async fn get_balance(
    data: AppStateData,
    path: web::Path<Uuid>,
) -> ActixResult<HttpResponse> {
    let user_id = path.into_inner();

    match data.wallet_service.balance(user_id).await {
        Ok(balance) => Ok(HttpResponse::Ok()
            .json(ApiResponse::success(BalanceResponse { user_id, balance }))),
        Err(e) => Ok(service_error_response(&e)),
    }
}

/// 分页查询钱包流水
///
/// GET /api/v1/wallets/{user_id}/transactions?page=1&limit=20
pub async fn list_transactions(
    data: AppStateData,
    path: web::Path<Uuid>,
    query: web::Query<TransactionListQuery>,
) -> ActixResult<HttpResponse> {
    let user_id = path.into_inner();

    match data.wallet_service.transactions(user_id, &query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response))),
        Err(e) => Ok(service_error_response(&e)),
    }
}

/// 发起钱包充值
///
/// POST /api/v1/wallets/{user_id}/fundings
///
/// 只登记待支付记录并返回收款引用，余额在服务商确认收款后才变化。
pub async fn create_funding(
    data: AppStateData,
    path: web::Path<Uuid>,
    request: web::Json<CreateFundingRequest>,
) -> ActixResult<HttpResponse> {
    let user_id = path.into_inner();

    match data
        .wallet_service
        .create_funding(user_id, request.amount)
        .await
    {
        Ok(response) => Ok(HttpResponse::Created().json(ApiResponse::success(response))),
        Err(e) => Ok(service_error_response(&e)),
    }
}

/// 管理员手工调整钱包
///
/// POST /api/v1/wallets/{user_id}/adjust
///
/// 需要管理员API密钥。出账同样走余额校验，不允许把余额调成负数。
pub async fn adjust_wallet(
    data: AppStateData,
    path: web::Path<Uuid>,
    request: web::Json<AdjustWalletRequest>,
    req: HttpRequest,
) -> ActixResult<HttpResponse> {
    if !is_admin_request(&req, &data.config.security.admin_api_key) {
        return Ok(admin_forbidden());
    }

    let user_id = path.into_inner();
    let source_type = match request.txn_type {
        TxnType::Credit => TxnSource::AdminCredit,
        TxnType::Debit => TxnSource::AdminDebit,
    };

    let entry = WalletEntry {
        user_id,
        amount: request.amount,
        source_type,
        source_id: None,
        reference: admin_adjustment_reference(user_id),
    };

    let result = match request.txn_type {
        TxnType::Credit => data.wallet_service.credit_wallet(entry).await,
        TxnType::Debit => data.wallet_service.debit_wallet(entry).await,
    };

    match result {
        Ok(_) => {
            log::info!(
                "Admin {:?} adjustment of {} applied to user {} ({})",
                request.txn_type,
                request.amount,
                user_id,
                request.note.as_deref().unwrap_or("no note")
            );
            match data.wallet_service.balance(user_id).await {
                Ok(balance) => Ok(HttpResponse::Ok()
                    .json(ApiResponse::success(BalanceResponse { user_id, balance }))),
                Err(e) => Ok(service_error_response(&e)),
            }
        }
        Err(e) => Ok(service_error_response(&e)),
    }
}
