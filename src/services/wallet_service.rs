// 钱包服务
// 钱包余额变动的唯一写入方: 入账/出账原语 + 充值完成

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::ServiceError;
use crate::models::{
    CompletionOutcome, CreateFundingResponse, FundingStatus, PaginationInfo, PaymentKind,
    TransactionListQuery, TransactionListResponse, TxnSource, TxnType, Wallet, WalletEntry,
    WalletFunding, WalletTransaction,
};
use crate::utils::{generate_reference, validate_positive_amount};

/// 重复充值确认的短路判定
///
/// 充值记录已COMPLETED时跳过标记与入账，重放的确认不会二次加钱。
pub fn funding_short_circuits(status: FundingStatus) -> bool {
    status == FundingStatus::Completed
}

/// 钱包服务
///
/// 入账/出账原语接受调用方已打开的事务连接，保证流水插入与余额缓存
/// 更新的原子性可以和上层状态机推进组合在同一事务里。
#[derive(Clone)]
pub struct WalletService {
    pool: PgPool,
}

impl WalletService {
    /// 创建新的钱包服务实例
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 在调用方事务内入账
    ///
    /// 流水插入带唯一引用去重 (ON CONFLICT DO NOTHING)，重放的信号不会
    /// 二次加钱。返回是否真正写入了新流水。
    ///
    /// # Arguments
    /// * `conn` - 调用方事务连接
    /// * `entry` - 入账参数
    pub async fn credit(
        &self,
        conn: &mut PgConnection,
        entry: &WalletEntry,
    ) -> Result<bool, ServiceError> {
        validate_positive_amount(entry.amount, "credit amount")?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO wallet_transactions (
                id, user_id, txn_type, amount, source_type, source_id, reference, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
            ON CONFLICT (reference) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entry.user_id)
        .bind(TxnType::Credit)
        .bind(entry.amount)
        .bind(entry.source_type)
        .bind(entry.source_id)
        .bind(&entry.reference)
        .execute(&mut *conn)
        .await?
        .rows_affected();

        if inserted == 0 {
            log::info!(
                "Wallet credit with reference {} already applied, skipping",
                entry.reference
            );
            return Ok(false);
        }

        // 余额缓存与流水插入在同一事务内更新，避免漂移
        sqlx::query(
            r#"
            INSERT INTO wallets (user_id, balance, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (user_id)
            DO UPDATE SET balance = wallets.balance + EXCLUDED.balance, updated_at = NOW()
            "#,
        )
        .bind(entry.user_id)
        .bind(entry.amount)
        .execute(&mut *conn)
        .await?;

        log::info!(
            "Credited {} to wallet of user {} ({})",
            entry.amount,
            entry.user_id,
            entry.reference
        );
        Ok(true)
    }

    /// 在调用方事务内出账
    ///
    /// 先锁定余额行校验余额充足，余额不足抛出InsufficientFunds并中止
    /// 整个操作；余额永远不会变成负数。
    pub async fn debit(
        &self,
        conn: &mut PgConnection,
        entry: &WalletEntry,
    ) -> Result<bool, ServiceError> {
        validate_positive_amount(entry.amount, "debit amount")?;

        let balance: Option<Decimal> =
            sqlx::query_scalar("SELECT balance FROM wallets WHERE user_id = $1 FOR UPDATE")
                .bind(entry.user_id)
                .fetch_optional(&mut *conn)
                .await?;
        let balance = balance.unwrap_or(Decimal::ZERO);

        if balance < entry.amount {
            return Err(ServiceError::InsufficientFunds {
                balance,
                requested: entry.amount,
            });
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO wallet_transactions (
                id, user_id, txn_type, amount, source_type, source_id, reference, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
            ON CONFLICT (reference) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entry.user_id)
        .bind(TxnType::Debit)
        .bind(entry.amount)
        .bind(entry.source_type)
        .bind(entry.source_id)
        .bind(&entry.reference)
        .execute(&mut *conn)
        .await?
        .rows_affected();

        if inserted == 0 {
            log::info!(
                "Wallet debit with reference {} already applied, skipping",
                entry.reference
            );
            return Ok(false);
        }

        sqlx::query("UPDATE wallets SET balance = balance - $2, updated_at = NOW() WHERE user_id = $1")
            .bind(entry.user_id)
            .bind(entry.amount)
            .execute(&mut *conn)
            .await?;

        log::info!(
            "Debited {} from wallet of user {} ({})",
            entry.amount,
            entry.user_id,
            entry.reference
        );
        Ok(true)
    }

    /// 独立事务入账 (外部调用方没有自己的事务时使用)
    pub async fn credit_wallet(&self, entry: WalletEntry) -> Result<bool, ServiceError> {
        let mut tx = self.pool.begin().await?;
        let applied = self.credit(&mut tx, &entry).await?;
        tx.commit().await?;
        Ok(applied)
    }

    /// 独立事务出账
    pub async fn debit_wallet(&self, entry: WalletEntry) -> Result<bool, ServiceError> {
        let mut tx = self.pool.begin().await?;
        let applied = self.debit(&mut tx, &entry).await?;
        tx.commit().await?;
        Ok(applied)
    }

    /// 完成一笔钱包充值
    ///
    /// 在单个事务内: 锁定充值记录，已完成则幂等短路；否则标记COMPLETED、
    /// 写入paid_at并按充值金额入账 (来源WALLET_FUNDING)。
    ///
    /// # Arguments
    /// * `reference` - 支付服务商交易引用
    /// * `paid_at` - 服务商记录的支付时间 (缺省取当前时间)
    pub async fn complete_funding(
        &self,
        reference: &str,
        paid_at: Option<DateTime<Utc>>,
    ) -> Result<CompletionOutcome, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let funding = sqlx::query_as::<_, WalletFunding>(
            r#"
            SELECT id, user_id, reference, amount, status, paid_at, created_at, updated_at
            FROM wallet_fundings
            WHERE reference = $1
            FOR UPDATE
            "#,
        )
        .bind(reference)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ServiceError::NotFound("wallet funding"))?;

        if funding_short_circuits(funding.status) {
            tx.commit().await?;
            log::info!(
                "Wallet funding {} already completed, skipping duplicate signal",
                funding.reference
            );
            return Ok(CompletionOutcome {
                kind: PaymentKind::WalletFunding,
                record_id: funding.id,
                already_completed: true,
            });
        }

        sqlx::query(
            r#"
            UPDATE wallet_fundings
            SET status = $2, paid_at = COALESCE(paid_at, $3), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(funding.id)
        .bind(FundingStatus::Completed)
        .bind(paid_at.unwrap_or_else(Utc::now))
        .execute(&mut *tx)
        .await?;

        self.credit(
            &mut tx,
            &WalletEntry {
                user_id: funding.user_id,
                amount: funding.amount,
                source_type: TxnSource::WalletFunding,
                source_id: Some(funding.id),
                reference: format!("funding-{}", funding.reference),
            },
        )
        .await?;

        tx.commit().await?;

        log::info!(
            "Wallet funding {} completed for user {}",
            funding.reference,
            funding.user_id
        );

        Ok(CompletionOutcome {
            kind: PaymentKind::WalletFunding,
            record_id: funding.id,
            already_completed: false,
        })
    }

    /// 发起一笔待支付的充值记录
    pub async fn create_funding(
        &self,
        user_id: Uuid,
        amount: Decimal,
    ) -> Result<CreateFundingResponse, ServiceError> {
        validate_positive_amount(amount, "funding amount")?;

        let funding_id = Uuid::new_v4();
        let reference = generate_reference("fund");

        sqlx::query(
            r#"
            INSERT INTO wallet_fundings (id, user_id, reference, amount, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
            "#,
        )
        .bind(funding_id)
        .bind(user_id)
        .bind(&reference)
        .bind(amount)
        .bind(FundingStatus::Pending)
        .execute(&self.pool)
        .await?;

        log::info!("Created wallet funding {} for user {}", reference, user_id);

        Ok(CreateFundingResponse {
            funding_id,
            reference,
            amount,
        })
    }

    /// 查询用户当前余额 (无钱包行视作零余额)
    pub async fn balance(&self, user_id: Uuid) -> Result<Decimal, ServiceError> {
        let wallet = sqlx::query_as::<_, Wallet>(
            "SELECT user_id, balance, updated_at FROM wallets WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(wallet.map(|w| w.balance).unwrap_or(Decimal::ZERO))
    }

    /// 分页查询用户流水
    pub async fn transactions(
        &self,
        user_id: Uuid,
        query: &TransactionListQuery,
    ) -> Result<TransactionListResponse, ServiceError> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM wallet_transactions WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        let transactions = sqlx::query_as::<_, WalletTransaction>(
            r#"
            SELECT id, user_id, txn_type, amount, source_type, source_id, reference, created_at
            FROM wallet_transactions
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(query.limit() as i64)
        .bind(query.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(TransactionListResponse {
            transactions,
            pagination: PaginationInfo::new(
                query.page.unwrap_or(1).max(1),
                query.limit(),
                total as u64,
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_funding_short_circuits_replay() {
        assert!(funding_short_circuits(FundingStatus::Completed));
    }

    #[test]
    fn test_open_funding_states_proceed_to_completion() {
        assert!(!funding_short_circuits(FundingStatus::Pending));
        assert!(!funding_short_circuits(FundingStatus::Failed));
    }
}
