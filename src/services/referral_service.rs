// 推荐奖励服务
// 首单送达确认推荐关系，前五名推荐按单发奖，两个"5"上限各自独立

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::ReferralConfig;
use crate::error::ServiceError;
use crate::models::{
    LeaderboardEntry, LeaderboardQuery, Order, OrderStatus, RefereeStat, Referral,
    ReferralProcessOutcome, ReferralStatus, TxnSource, WalletEntry,
};
use crate::services::WalletService;
use crate::utils::referral_reward_reference;

/// 奖励发放决定
///
/// 推荐人的确认名次与被推荐用户的送达订单数各有独立上限，
/// 超出任一上限即不发奖。名次按确认时间排定，永不变化。
pub fn reward_decision(
    confirmation_rank: i64,
    delivered_orders: i64,
    config: &ReferralConfig,
) -> Option<Decimal> {
    if confirmation_rank <= config.max_rewarded_referrals
        && delivered_orders <= config.max_rewarded_orders
    {
        Some(config.reward_amount)
    } else {
        None
    }
}

/// 订单是否处于可标记送达的状态
///
/// 只有已支付或配送中的订单接受送达确认；已送达的订单再次确认
/// 属于无效转换而不是幂等重放。
pub fn delivery_transition_allowed(status: OrderStatus) -> bool {
    matches!(status, OrderStatus::Paid | OrderStatus::Dispatched)
}

/// 推荐奖励服务
#[derive(Clone)]
pub struct ReferralService {
    pool: PgPool,
    wallet: WalletService,
    config: ReferralConfig,
}

impl ReferralService {
    /// 创建新的推荐奖励服务实例
    pub fn new(pool: PgPool, wallet: WalletService, config: ReferralConfig) -> Self {
        Self {
            pool,
            wallet,
            config,
        }
    }

    /// 订单送达确认
    ///
    /// 锁定订单校验状态转换后标记DELIVERED，提交后处理被推荐用户的
    /// 推荐确认与奖励。不存在的订单返回NotFound，不可送达的状态返回
    /// 校验错误。
    pub async fn confirm_order_delivered(
        &self,
        order_id: Uuid,
    ) -> Result<(Order, ReferralProcessOutcome), ServiceError> {
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, user_id, vendor_id, total, status, payout_status, created_at, updated_at
            FROM orders
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ServiceError::NotFound("order"))?;

        if !delivery_transition_allowed(order.status) {
            return Err(ServiceError::validation(format!(
                "Order {} is not in a deliverable state",
                order_id
            )));
        }

        let order = sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, vendor_id, total, status, payout_status, created_at, updated_at
            "#,
        )
        .bind(order_id)
        .bind(OrderStatus::Delivered)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        log::info!(
            "Order {} marked delivered for user {}",
            order_id,
            order.user_id
        );

        let referral = self.process_referral_reward_on_order(order.user_id).await?;
        Ok((order, referral))
    }

    /// 被推荐用户的订单送达后处理推荐确认与奖励
    ///
    /// 单事务内: 锁定推荐关系，首个送达订单完成PENDING→CONFIRMED转换，
    /// 按确认名次与送达订单数决定是否发奖。奖励入账带确定性引用，
    /// 同一单重复触发不会二次发放。
    pub async fn process_referral_reward_on_order(
        &self,
        referred_user_id: Uuid,
    ) -> Result<ReferralProcessOutcome, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let referral = sqlx::query_as::<_, Referral>(
            r#"
            SELECT id, referrer_id, referred_user_id, status, confirmed_at, created_at
            FROM referrals
            WHERE referred_user_id = $1
            FOR UPDATE
            "#,
        )
        .bind(referred_user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let referral = match referral {
            Some(r) => r,
            None => {
                tx.commit().await?;
                return Ok(ReferralProcessOutcome::not_referred());
            }
        };

        let delivered_orders: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders WHERE user_id = $1 AND status = 'DELIVERED'",
        )
        .bind(referred_user_id)
        .fetch_one(&mut *tx)
        .await?;

        // 首个送达订单触发确认，之后确认时间不再变动
        let mut confirmed_now = false;
        let confirmed_at: DateTime<Utc> = match referral.confirmed_at {
            Some(at) => at,
            None => {
                let now = Utc::now();
                if referral.status == ReferralStatus::Pending && delivered_orders >= 1 {
                    sqlx::query(
                        "UPDATE referrals SET status = $2, confirmed_at = $3 WHERE id = $1",
                    )
                    .bind(referral.id)
                    .bind(ReferralStatus::Confirmed)
                    .bind(now)
                    .execute(&mut *tx)
                    .await?;
                    confirmed_now = true;
                    now
                } else {
                    tx.commit().await?;
                    return Ok(ReferralProcessOutcome {
                        referred: true,
                        confirmed_now: false,
                        reward_credited: false,
                    });
                }
            }
        };

        // 确认名次 = 该推荐人在此之前 (含此次) 确认的推荐数
        let confirmation_rank: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM referrals
            WHERE referrer_id = $1 AND status = 'CONFIRMED' AND confirmed_at <= $2
            "#,
        )
        .bind(referral.referrer_id)
        .bind(confirmed_at)
        .fetch_one(&mut *tx)
        .await?;

        let reward = reward_decision(confirmation_rank, delivered_orders, &self.config);

        let mut reward_credited = false;
        if let Some(amount) = reward {
            reward_credited = self
                .wallet
                .credit(
                    &mut tx,
                    &WalletEntry {
                        user_id: referral.referrer_id,
                        amount,
                        source_type: TxnSource::ReferralBonus,
                        source_id: Some(referral.id),
                        reference: referral_reward_reference(
                            referral.referrer_id,
                            referred_user_id,
                            delivered_orders,
                        ),
                    },
                )
                .await?;
        }

        tx.commit().await?;

        if confirmed_now {
            log::info!(
                "Referral of user {} by {} confirmed (rank {})",
                referred_user_id,
                referral.referrer_id,
                confirmation_rank
            );
        }
        if reward_credited {
            log::info!(
                "Credited referral reward to {} for order {} of user {}",
                referral.referrer_id,
                delivered_orders,
                referred_user_id
            );
        }

        Ok(ReferralProcessOutcome {
            referred: true,
            confirmed_now,
            reward_credited,
        })
    }

    /// 当月推荐排行榜
    ///
    /// 只统计本日历月内确认的推荐，按确认数降序。
    pub async fn get_monthly_leaderboard(
        &self,
        query: &LeaderboardQuery,
    ) -> Result<Vec<LeaderboardEntry>, ServiceError> {
        let entries = sqlx::query_as::<_, LeaderboardEntry>(
            r#"
            SELECT r.referrer_id, u.name, u.avatar_url, COUNT(*) AS confirmed_count
            FROM referrals r
            JOIN users u ON u.id = r.referrer_id
            WHERE r.status = 'CONFIRMED'
              AND r.confirmed_at >= date_trunc('month', NOW())
            GROUP BY r.referrer_id, u.name, u.avatar_url
            ORDER BY confirmed_count DESC, r.referrer_id
            LIMIT $1
            "#,
        )
        .bind(query.limit() as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// 推荐人的被推荐用户统计
    ///
    /// 展示用的送达订单数封顶在奖励上限，超出部分不再有业务意义。
    pub async fn get_referee_stats(
        &self,
        referrer_id: Uuid,
    ) -> Result<Vec<RefereeStat>, ServiceError> {
        let rows: Vec<(Uuid, String, ReferralStatus, Option<DateTime<Utc>>, i64)> =
            sqlx::query_as(
                r#"
                SELECT r.referred_user_id, u.name, r.status, r.confirmed_at,
                       LEAST(
                           (SELECT COUNT(*) FROM orders o
                            WHERE o.user_id = r.referred_user_id AND o.status = 'DELIVERED'),
                           $2
                       ) AS delivered_orders
                FROM referrals r
                JOIN users u ON u.id = r.referred_user_id
                WHERE r.referrer_id = $1
                ORDER BY r.created_at
                "#,
            )
            .bind(referrer_id)
            .bind(self.config.max_rewarded_orders)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(
                |(referred_user_id, name, status, confirmed_at, delivered_orders)| RefereeStat {
                    referred_user_id,
                    name,
                    status,
                    delivered_orders,
                    confirmed_at,
                },
            )
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ReferralConfig {
        ReferralConfig {
            reward_amount: Decimal::from(100),
            max_rewarded_referrals: 5,
            max_rewarded_orders: 5,
        }
    }

    #[test]
    fn test_first_five_orders_rewarded() {
        let config = config();
        for order in 1..=5 {
            assert_eq!(
                reward_decision(1, order, &config),
                Some(Decimal::from(100)),
                "order {} should be rewarded",
                order
            );
        }
    }

    #[test]
    fn test_sixth_order_not_rewarded() {
        let config = config();
        assert_eq!(reward_decision(1, 6, &config), None);
        assert_eq!(reward_decision(1, 100, &config), None);
    }

    #[test]
    fn test_sixth_confirmed_referral_never_rewarded() {
        let config = config();
        assert_eq!(reward_decision(6, 1, &config), None);
        // 第六名不会因为前面的推荐用完订单上限而补位
        assert_eq!(reward_decision(6, 1, &config), None);
        assert_eq!(reward_decision(5, 1, &config), Some(Decimal::from(100)));
    }

    #[test]
    fn test_both_caps_are_independent() {
        let config = config();
        assert_eq!(reward_decision(5, 5, &config), Some(Decimal::from(100)));
        assert_eq!(reward_decision(5, 6, &config), None);
        assert_eq!(reward_decision(6, 5, &config), None);
    }

    #[test]
    fn test_only_paid_or_dispatched_orders_deliverable() {
        assert!(delivery_transition_allowed(OrderStatus::Paid));
        assert!(delivery_transition_allowed(OrderStatus::Dispatched));
        assert!(!delivery_transition_allowed(OrderStatus::Pending));
        assert!(!delivery_transition_allowed(OrderStatus::Delivered));
        assert!(!delivery_transition_allowed(OrderStatus::Cancelled));
    }

    #[test]
    fn test_reward_reference_is_deterministic_per_order() {
        let referrer = Uuid::new_v4();
        let referred = Uuid::new_v4();
        let first = referral_reward_reference(referrer, referred, 2);
        let second = referral_reward_reference(referrer, referred, 2);
        assert_eq!(first, second);
        assert_ne!(first, referral_reward_reference(referrer, referred, 3));
    }
}
