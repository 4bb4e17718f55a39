// 商家结算数据模型
// 每个已支付订单一条结算记录，批量提交到转账网关

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// 商家结算记录
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct VendorPayout {
    /// 结算记录唯一标识符
    pub id: Uuid,
    /// 关联订单ID (唯一，一单一结算)
    pub order_id: Uuid,
    /// 商家ID
    pub vendor_id: Uuid,
    /// 结算金额 (奈拉)
    pub amount: Decimal,
    /// 结算状态
    pub status: PayoutStatus,
    /// 提交给网关的转账引用
    pub transfer_ref: Option<String>,
    /// 网关返回的转账码
    pub transfer_code: Option<String>,
    /// 发起时间
    pub initiated_at: Option<DateTime<Utc>>,
    /// 完成时间
    pub completed_at: Option<DateTime<Utc>>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

/// 结算状态枚举
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "varchar", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PayoutStatus {
    /// 待结算
    Pending,
    /// 结算成功
    Success,
    /// 结算失败
    Failed,
}

/// 待结算记录及其商家信息 (连表查询结果)
#[derive(Debug, Serialize, FromRow, Clone)]
pub struct PendingPayoutRow {
    /// 结算记录ID
    pub id: Uuid,
    /// 关联订单ID
    pub order_id: Uuid,
    /// 商家ID
    pub vendor_id: Uuid,
    /// 商家名称
    pub vendor_name: String,
    /// 商家的转账收款人标识
    pub recipient_code: Option<String>,
    /// 结算金额
    pub amount: Decimal,
    /// 结算状态
    pub status: PayoutStatus,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

/// 按商家分组的待结算汇总
#[derive(Debug, Serialize)]
pub struct VendorPayoutGroup {
    /// 商家ID
    pub vendor_id: Uuid,
    /// 商家名称
    pub vendor_name: String,
    /// 是否已配置收款人标识
    pub has_recipient: bool,
    /// 待结算总额
    pub total_amount: Decimal,
    /// 待结算记录
    pub payouts: Vec<PendingPayoutRow>,
}

/// 发起批量转账请求
#[derive(Debug, Deserialize)]
pub struct InitiateTransfersRequest {
    /// 选中的结算记录ID列表
    pub payout_ids: Vec<Uuid>,
}

/// 批量转账结果摘要
#[derive(Debug, Serialize)]
pub struct TransferBatchSummary {
    /// 提交的转账笔数
    pub submitted: usize,
    /// 转账总额
    pub total_amount: Decimal,
    /// 更新后的结算记录
    pub payouts: Vec<VendorPayout>,
}
