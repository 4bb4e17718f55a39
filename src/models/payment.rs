// 支付记录数据模型
// 三类独立的支付域: 订单支付、钱包充值、包裹订单支付

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// 订单支付记录
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Payment {
    /// 支付记录唯一标识符
    pub id: Uuid,
    /// 所属订单ID
    pub order_id: Uuid,
    /// 支付服务商交易引用
    pub reference: String,
    /// 支付金额 (奈拉)
    pub amount: Decimal,
    /// 支付状态
    pub status: PaymentStatus,
    /// 支付确认时间 (一旦写入不再覆盖)
    pub paid_at: Option<DateTime<Utc>>,
    /// 通知是否已尝试发送
    pub notifications_sent: bool,
    /// 通知发送时间
    pub notified_at: Option<DateTime<Utc>>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

/// 包裹订单支付记录，与订单支付同构但通知标记独立
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct PackagePayment {
    /// 支付记录唯一标识符
    pub id: Uuid,
    /// 所属包裹订单ID
    pub package_order_id: Uuid,
    /// 支付服务商交易引用
    pub reference: String,
    /// 支付金额 (奈拉)
    pub amount: Decimal,
    /// 支付状态
    pub status: PaymentStatus,
    /// 支付确认时间
    pub paid_at: Option<DateTime<Utc>>,
    /// 通知是否已尝试发送
    pub notifications_sent: bool,
    /// 通知发送时间
    pub notified_at: Option<DateTime<Utc>>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

/// 钱包充值记录
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct WalletFunding {
    /// 充值记录唯一标识符
    pub id: Uuid,
    /// 充值用户ID
    pub user_id: Uuid,
    /// 支付服务商交易引用
    pub reference: String,
    /// 充值金额 (奈拉)
    pub amount: Decimal,
    /// 充值状态
    pub status: FundingStatus,
    /// 支付确认时间
    pub paid_at: Option<DateTime<Utc>>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

/// 支付状态枚举
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "varchar", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    /// 待支付状态
    Pending,
    /// 已完成状态
    Completed,
    /// 失败状态
    Failed,
    /// 已退款状态
    Refunded,
}

/// 充值状态枚举
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "varchar", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum FundingStatus {
    /// 待支付状态
    Pending,
    /// 已完成状态
    Completed,
    /// 失败状态
    Failed,
}

/// 支付域类别
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentKind {
    /// 钱包充值
    WalletFunding,
    /// 标准订单支付
    OrderPayment,
    /// 包裹订单支付
    PackagePayment,
}

/// 支付完成处理结果
///
/// `already_completed = true` 表示幂等短路，属于正常结果而非错误。
#[derive(Debug, Serialize, Clone)]
pub struct CompletionOutcome {
    /// 支付域类别
    pub kind: PaymentKind,
    /// 内部支付记录ID
    pub record_id: Uuid,
    /// 是否为重复信号 (已完成且已通知)
    pub already_completed: bool,
}

/// 将奈拉金额换算为最小货币单位kobo
///
/// Webhook的金额字段以kobo为单位上报，与本地存储的奈拉金额比对前必须换算。
pub fn naira_to_kobo(amount: Decimal) -> i64 {
    (amount * Decimal::from(100)).trunc().to_i64().unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_naira_to_kobo() {
        assert_eq!(naira_to_kobo(Decimal::new(1000, 0)), 100_000);
        assert_eq!(naira_to_kobo(Decimal::new(150050, 2)), 150_050);
        assert_eq!(naira_to_kobo(Decimal::ZERO), 0);
    }

    #[test]
    fn test_payment_status_serialization() {
        let json = serde_json::to_string(&PaymentStatus::Completed).unwrap();
        assert_eq!(json, "\"COMPLETED\"");
    }
}
