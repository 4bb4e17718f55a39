// 折扣处理器
// 折扣创建 (管理端) 与最优折扣解析、价格试算

use actix_web::{web, HttpRequest, HttpResponse, Result as ActixResult};

use crate::handlers::{admin_forbidden, service_error_response};
use crate::models::{
    ApiResponse, BestDiscountQuery, CartDiscountQuery, CartQuoteRequest, CreateDiscountRequest,
    PriceQuoteRequest,
};
use crate::state::AppStateData;
use crate::utils::is_admin_request;

/// 创建折扣
///
/// POST /api/v1/discounts
///
/// 需要管理员API密钥。
pub async fn create_discount(
    data: AppStateData,
    request: web::Json<CreateDiscountRequest>,
    req: HttpRequest,
) -> ActixResult<HttpResponse> {
    if !is_admin_request(&req, &data.config.security.admin_api_key) {
        return Ok(admin_forbidden());
    }

    match data
        .discount_service
        .create_discount(request.into_inner())
        .await
    {
        Ok(discount) => Ok(HttpResponse::Created().json(ApiResponse::success(discount))),
        Err(e) => Ok(service_error_response(&e)),
    }
}

/// 解析商品的最优可用折扣
///
/// GET /api/v1/discounts/best?product_item_id=...&vendor_id=...
pub async fn get_best_discount(
    data: AppStateData,
    query: web::Query<BestDiscountQuery>,
) -> ActixResult<HttpResponse> {
    match data
        .discount_service
        .get_best_active_discount(query.product_item_id, query.vendor_id)
        .await
    {
        Ok(discount) => Ok(HttpResponse::Ok().json(ApiResponse::success(discount))),
        Err(e) => Ok(service_error_response(&e)),
    }
}

/// 解析购物车的最优可用折扣
///
/// GET /api/v1/discounts/cart-best?vendor_id=...
pub async fn get_best_cart_discount(
    data: AppStateData,
    query: web::Query<CartDiscountQuery>,
) -> ActixResult<HttpResponse> {
    match data
        .discount_service
        .get_best_cart_discount(query.vendor_id)
        .await
    {
        Ok(discount) => Ok(HttpResponse::Ok().json(ApiResponse::success(discount))),
        Err(e) => Ok(service_error_response(&e)),
    }
}

/// 商品价格试算
///
/// POST /api/v1/discounts/quote
pub async fn quote_item_price(
    data: AppStateData,
    request: web::Json<PriceQuoteRequest>,
) -> ActixResult<HttpResponse> {
    match data
        .discount_service
        .quote_item_price(request.base_price, request.product_item_id, request.vendor_id)
        .await
    {
        Ok(quote) => Ok(HttpResponse::Ok().json(ApiResponse::success(quote))),
        Err(e) => Ok(service_error_response(&e)),
    }
}

/// 购物车价格试算
///
/// POST /api/v1/discounts/cart-quote
pub async fn quote_cart_price(
    data: AppStateData,
    request: web::Json<CartQuoteRequest>,
) -> ActixResult<HttpResponse> {
    match data
        .discount_service
        .quote_cart_price(request.subtotal, request.vendor_id)
        .await
    {
        Ok(quote) => Ok(HttpResponse::Ok().json(ApiResponse::success(quote))),
        Err(e) => Ok(service_error_response(&e)),
    }
}
