// 业务错误定义
// 区分校验错误、未找到、幂等短路之外的硬性约束违反等错误类别

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// 业务服务层错误
#[derive(Debug, Error)]
pub enum ServiceError {
    /// 输入校验失败
    #[error("validation failed: {0}")]
    Validation(String),

    /// 实体未找到
    #[error("{0} not found")]
    NotFound(&'static str),

    /// 钱包余额不足，扣款被拒绝
    #[error("insufficient wallet balance: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: Decimal, requested: Decimal },

    /// Webhook金额与本地记录不一致 (安全相关异常)
    #[error("amount mismatch for reference {reference}: expected {expected_kobo} kobo, webhook reported {received_kobo} kobo")]
    AmountMismatch {
        reference: String,
        expected_kobo: i64,
        received_kobo: i64,
    },

    /// 商家未配置转账收款人标识，批量结算整体中止
    #[error("vendor {vendor_id} has no transfer recipient configured")]
    MissingTransferRecipient { vendor_id: Uuid },

    /// 转账网关调用失败
    #[error("transfer gateway error: {0}")]
    Gateway(String),

    /// 数据库错误
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// 其他内部错误
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    /// 构造校验错误
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }
}
