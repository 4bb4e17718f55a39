// 推荐处理器
// 月度排行榜与推荐人的被推荐用户统计

use actix_web::{web, HttpResponse, Result as ActixResult};
use uuid::Uuid;

use crate::handlers::service_error_response;
use crate::models::{ApiResponse, LeaderboardQuery};
use crate::state::AppStateData;

/// 当月推荐排行榜
///
/// GET /api/v1/referrals/leaderboard?limit=10
pub async fn get_leaderboard(
    data: AppStateData,
    query: web::Query<LeaderboardQuery>,
) -> ActixResult<HttpResponse> {
    match data.referral_service.get_monthly_leaderboard(&query).await {
        Ok(entries) => Ok(HttpResponse::Ok().json(ApiResponse::success(entries))),
        Err(e) => Ok(service_error_response(&e)),
    }
}

/// 推荐人的被推荐用户统计
///
/// GET /api/v1/referrals/{referrer_id}/stats
pub async fn get_referee_stats(
    data: AppStateData,
    path: web::Path<Uuid>,
) -> ActixResult<HttpResponse> {
    match data
        .referral_service
        .get_referee_stats(path.into_inner())
        .await
    {
        Ok(stats) => Ok(HttpResponse::Ok().json(ApiResponse::success(stats))),
        Err(e) => Ok(service_error_response(&e)),
    }
}
