// 配送区域与配送费规则数据模型

use chrono::{DateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// 配送区域
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Area {
    /// 区域唯一标识符
    pub id: Uuid,
    /// 区域名称
    pub name: String,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

/// 配送费时段规则
///
/// 窗口为 [start_time, end_time)，允许跨午夜 (start_time > end_time)。
/// 同一区域的规则不应互相重叠，创建时校验。
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct DeliveryFeeRule {
    /// 规则唯一标识符
    pub id: Uuid,
    /// 所属区域ID
    pub area_id: Uuid,
    /// 窗口开始时刻 (含)
    pub start_time: NaiveTime,
    /// 窗口结束时刻 (不含)
    pub end_time: NaiveTime,
    /// 窗口内的配送费 (奈拉)
    pub fee: Decimal,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

/// 创建配送费规则请求
#[derive(Debug, Deserialize)]
pub struct CreateFeeRuleRequest {
    /// 窗口开始时刻
    pub start_time: NaiveTime,
    /// 窗口结束时刻
    pub end_time: NaiveTime,
    /// 窗口内的配送费 (奈拉)
    pub fee: Decimal,
}

/// 配送费试算查询参数
#[derive(Debug, Deserialize)]
pub struct FeeQuoteQuery {
    /// 区域ID
    pub area_id: Uuid,
    /// 查询时刻 (HH:MM:SS，缺省取当前UTC时刻)
    pub at: Option<NaiveTime>,
}

/// 配送费试算响应
#[derive(Debug, Serialize)]
pub struct FeeQuoteResponse {
    /// 区域ID
    pub area_id: Uuid,
    /// 试算时刻
    pub at: NaiveTime,
    /// 应收配送费
    pub fee: Decimal,
    /// 是否回退到了平台基础费
    pub fallback: bool,
}
