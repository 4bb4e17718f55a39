// 引用生成工具
// 提供随机唯一引用与确定性推荐奖励引用

use rand::{distributions::Alphanumeric, Rng};
use uuid::Uuid;

/// 生成带前缀的随机唯一引用
///
/// # Arguments
/// * `prefix` - 引用前缀 (如 "fund"、"payout")
///
/// # Returns
/// * 形如 `fund_aB3xY9...` 的引用字符串
pub fn generate_reference(prefix: &str) -> String {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(20)
        .map(char::from)
        .collect();

    format!("{}_{}", prefix, token)
}

/// 生成确定性的推荐奖励引用
///
/// 同一推荐人、同一被推荐用户、同一订单序号永远产生同一引用，
/// 重放的发放信号依赖流水表的唯一引用约束自然去重。
///
/// # Arguments
/// * `referrer_id` - 推荐人用户ID
/// * `referred_user_id` - 被推荐用户ID
/// * `order_ordinal` - 被推荐用户的送达订单序号 (1起)
pub fn referral_reward_reference(referrer_id: Uuid, referred_user_id: Uuid, order_ordinal: i64) -> String {
    format!("referral-{}-{}-{}", referrer_id, referred_user_id, order_ordinal)
}

/// 生成管理员手工调整的引用
pub fn admin_adjustment_reference(user_id: Uuid) -> String {
    format!("admin-{}-{}", user_id, generate_reference("adj"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_reference() {
        let reference = generate_reference("fund");
        assert!(reference.starts_with("fund_"));
        assert_eq!(reference.len(), "fund_".len() + 20);

        let another = generate_reference("fund");
        assert_ne!(reference, another);
    }

    #[test]
    fn test_referral_reward_reference_is_deterministic() {
        let referrer = Uuid::new_v4();
        let referred = Uuid::new_v4();

        let first = referral_reward_reference(referrer, referred, 3);
        let replay = referral_reward_reference(referrer, referred, 3);
        assert_eq!(first, replay);

        let next_order = referral_reward_reference(referrer, referred, 4);
        assert_ne!(first, next_order);
    }
}
