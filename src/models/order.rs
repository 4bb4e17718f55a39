// 订单数据模型
// 订单与包裹订单是支付完成处理器推进的两个聚合根

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// 订单模型
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Order {
    /// 订单唯一标识符
    pub id: Uuid,
    /// 下单用户ID
    pub user_id: Uuid,
    /// 商家ID (包裹订单以外的订单都归属一个商家)
    pub vendor_id: Option<Uuid>,
    /// 订单总额 (奈拉)
    pub total: Decimal,
    /// 订单状态
    pub status: OrderStatus,
    /// 结算状态 (派生字段，结算批次完成后翻转为PAID)
    pub payout_status: PayoutState,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

/// 包裹订单模型
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct PackageOrder {
    /// 包裹订单唯一标识符
    pub id: Uuid,
    /// 下单用户ID
    pub user_id: Uuid,
    /// 订单总额 (奈拉)
    pub total: Decimal,
    /// 订单状态
    pub status: OrderStatus,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

/// 订单状态枚举
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "varchar", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    /// 待支付
    Pending,
    /// 已支付
    Paid,
    /// 配送中
    Dispatched,
    /// 已送达
    Delivered,
    /// 已取消
    Cancelled,
}

/// 订单结算状态枚举
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "varchar", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PayoutState {
    /// 待结算
    Pending,
    /// 已结算
    Paid,
}
