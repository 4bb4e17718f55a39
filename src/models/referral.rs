// 推荐关系数据模型
// 每个被推荐用户一行，PENDING→CONFIRMED只发生一次

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// 推荐关系
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Referral {
    /// 推荐关系唯一标识符
    pub id: Uuid,
    /// 推荐人用户ID
    pub referrer_id: Uuid,
    /// 被推荐用户ID (唯一)
    pub referred_user_id: Uuid,
    /// 推荐状态
    pub status: ReferralStatus,
    /// 确认时间 (首个送达订单触发时写入)
    pub confirmed_at: Option<DateTime<Utc>>,
    /// 创建时间 (携带推荐码注册时)
    pub created_at: DateTime<Utc>,
}

/// 推荐状态枚举
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "varchar", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ReferralStatus {
    /// 待确认
    Pending,
    /// 已确认
    Confirmed,
}

/// 推荐奖励处理结果
#[derive(Debug, Serialize, Clone, Copy)]
pub struct ReferralProcessOutcome {
    /// 该用户是否存在推荐关系
    pub referred: bool,
    /// 本次调用是否完成了PENDING→CONFIRMED转换
    pub confirmed_now: bool,
    /// 本次调用是否发放了奖励
    pub reward_credited: bool,
}

impl ReferralProcessOutcome {
    /// 用户没有推荐关系时的空结果
    pub fn not_referred() -> Self {
        Self {
            referred: false,
            confirmed_now: false,
            reward_credited: false,
        }
    }
}

/// 月度推荐排行榜条目
#[derive(Debug, Serialize, FromRow, Clone)]
pub struct LeaderboardEntry {
    /// 推荐人用户ID
    pub referrer_id: Uuid,
    /// 推荐人显示名称
    pub name: String,
    /// 推荐人头像
    pub avatar_url: Option<String>,
    /// 本月已确认的推荐数
    pub confirmed_count: i64,
}

/// 排行榜查询参数
#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    /// 返回条目数 (默认10，最大100)
    pub limit: Option<u32>,
}

impl LeaderboardQuery {
    /// 获取生效的条目数限制
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(10).clamp(1, 100)
    }
}

/// 单条被推荐用户的统计摘要
#[derive(Debug, Serialize, Clone)]
pub struct RefereeStat {
    /// 被推荐用户ID
    pub referred_user_id: Uuid,
    /// 被推荐用户显示名称
    pub name: String,
    /// 推荐状态
    pub status: ReferralStatus,
    /// 已送达订单数 (展示用，封顶5)
    pub delivered_orders: i64,
    /// 确认时间
    pub confirmed_at: Option<DateTime<Utc>>,
}
