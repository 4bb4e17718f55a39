// 钱包数据模型
// 余额缓存 + 只追加的流水账，余额永远等于流水的累计和

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// 用户钱包 (余额缓存字段)
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Wallet {
    /// 用户ID
    pub user_id: Uuid,
    /// 缓存余额，与流水插入在同一事务内更新
    pub balance: Decimal,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

/// 钱包流水记录 (只追加，永不更新或删除)
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct WalletTransaction {
    /// 流水唯一标识符
    pub id: Uuid,
    /// 用户ID
    pub user_id: Uuid,
    /// 流水方向
    pub txn_type: TxnType,
    /// 金额 (奈拉，恒为正数)
    pub amount: Decimal,
    /// 资金来源类别
    pub source_type: TxnSource,
    /// 关联的来源实体ID
    pub source_id: Option<Uuid>,
    /// 唯一引用，重放信号靠它在存储层自然去重
    pub reference: String,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

/// 流水方向枚举
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "varchar", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TxnType {
    /// 入账
    Credit,
    /// 出账
    Debit,
}

/// 资金来源类别枚举
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxnSource {
    /// 推荐奖励
    ReferralBonus,
    /// 钱包充值
    WalletFunding,
    /// 包裹订单支付
    PackagePayment,
    /// 订单支付
    OrderPayment,
    /// 管理员手工入账
    AdminCredit,
    /// 管理员手工出账
    AdminDebit,
}

/// 钱包入账/出账请求参数
#[derive(Debug, Clone)]
pub struct WalletEntry {
    /// 用户ID
    pub user_id: Uuid,
    /// 金额 (必须为正数)
    pub amount: Decimal,
    /// 资金来源类别
    pub source_type: TxnSource,
    /// 关联的来源实体ID
    pub source_id: Option<Uuid>,
    /// 唯一引用
    pub reference: String,
}

/// 钱包余额响应
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// 用户ID
    pub user_id: Uuid,
    /// 当前余额
    pub balance: Decimal,
}

/// 发起钱包充值请求
#[derive(Debug, Deserialize)]
pub struct CreateFundingRequest {
    /// 充值金额 (奈拉)
    pub amount: Decimal,
}

/// 发起钱包充值响应
#[derive(Debug, Serialize)]
pub struct CreateFundingResponse {
    /// 充值记录ID
    pub funding_id: Uuid,
    /// 交给支付服务商发起收款的引用
    pub reference: String,
    /// 充值金额
    pub amount: Decimal,
}

/// 管理员手工调整钱包请求
#[derive(Debug, Deserialize)]
pub struct AdjustWalletRequest {
    /// 调整方向
    pub txn_type: TxnType,
    /// 金额 (奈拉)
    pub amount: Decimal,
    /// 调整原因备注
    pub note: Option<String>,
}

/// 流水列表查询参数
#[derive(Debug, Deserialize)]
pub struct TransactionListQuery {
    /// 页码 (从1开始)
    pub page: Option<u32>,
    /// 每页数量 (默认20，最大100)
    pub limit: Option<u32>,
}

impl TransactionListQuery {
    /// 获取分页偏移量
    pub fn offset(&self) -> u32 {
        let page = self.page.unwrap_or(1).max(1);
        (page - 1) * self.limit()
    }

    /// 获取每页限制数量
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(20).clamp(1, 100)
    }
}

/// 流水列表响应
#[derive(Debug, Serialize)]
pub struct TransactionListResponse {
    /// 流水列表
    pub transactions: Vec<WalletTransaction>,
    /// 分页信息
    pub pagination: super::PaginationInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_list_query_bounds() {
        let query = TransactionListQuery { page: Some(3), limit: Some(500) };
        assert_eq!(query.limit(), 100);
        assert_eq!(query.offset(), 200);

        let default = TransactionListQuery { page: None, limit: None };
        assert_eq!(default.limit(), 20);
        assert_eq!(default.offset(), 0);
    }

    #[test]
    fn test_txn_source_serialization() {
        let json = serde_json::to_string(&TxnSource::ReferralBonus).unwrap();
        assert_eq!(json, "\"REFERRAL_BONUS\"");
    }
}
