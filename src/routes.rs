// API路由配置
// 定义所有HTTP接口的路由规则

use actix_web::{web, Scope};

use crate::handlers::*;

/// API v1路由配置
pub fn api_v1_routes() -> Scope {
    web::scope("/api/v1")
        // 钱包路由
        .service(wallet_routes())
        // 折扣路由
        .service(discount_routes())
        // 配送费路由
        .service(delivery_routes())
        // 订单路由
        .service(order_routes())
        // 推荐路由
        .service(referral_routes())
        // 商家结算路由
        .service(payout_routes())
        // 系统状态路由
        .route("/version", web::get().to(version_info))
}

/// 钱包路由
fn wallet_routes() -> Scope {
    web::scope("/wallets")
        .route("/{user_id}", web::get().to(get_balance))
        .route("/{user_id}/transactions", web::get().to(list_transactions))
        .route("/{user_id}/fundings", web::post().to(create_funding))
        .route("/{user_id}/adjust", web::post().to(adjust_wallet))
}

/// 折扣路由
fn discount_routes() -> Scope {
    web::scope("/discounts")
        .route("", web::post().to(create_discount))
        .route("/best", web::get().to(get_best_discount))
        .route("/cart-best", web::get().to(get_best_cart_discount))
        .route("/quote", web::post().to(quote_item_price))
        .route("/cart-quote", web::post().to(quote_cart_price))
}

/// 配送费路由
fn delivery_routes() -> Scope {
    web::scope("")
        .route("/delivery-fees/quote", web::get().to(quote_delivery_fee))
        .route("/areas/{area_id}/fee-rules", web::post().to(create_fee_rule))
        .route("/areas/{area_id}/fee-rules", web::get().to(list_fee_rules))
}

/// 订单路由
fn order_routes() -> Scope {
    web::scope("/orders")
        .route("/{order_id}/delivered", web::post().to(mark_order_delivered))
}

/// 推荐路由
fn referral_routes() -> Scope {
    web::scope("/referrals")
        .route("/leaderboard", web::get().to(get_leaderboard))
        .route("/{referrer_id}/stats", web::get().to(get_referee_stats))
}

/// 商家结算路由
fn payout_routes() -> Scope {
    web::scope("/payouts")
        .route("/pending", web::get().to(get_pending_payouts))
        .route("/transfers", web::post().to(initiate_transfers))
}

/// 公共路由 (无需认证)
pub fn public_routes() -> Scope {
    web::scope("")
        .route("/health", web::get().to(health_check))
        .route("/webhooks/provider", web::post().to(provider_webhook))
}
