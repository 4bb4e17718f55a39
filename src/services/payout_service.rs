// 商家结算服务
// 汇总待结算记录并批量提交转账，批次要么全部提交要么全不提交

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::models::{
    PayoutState, PayoutStatus, PendingPayoutRow, TransferBatchSummary, VendorPayout,
    VendorPayoutGroup,
};
use crate::services::transfer_gateway::{TransferGateway, TransferInstruction, TransferReceipt};
use crate::utils::generate_reference;

/// 校验一批结算记录可以提交转账
///
/// 任何一条不处于PENDING或其商家未配置收款人标识，整批拒绝。
pub fn ensure_transferable(rows: &[PendingPayoutRow]) -> Result<(), ServiceError> {
    for row in rows {
        if row.status != PayoutStatus::Pending {
            return Err(ServiceError::validation(format!(
                "Payout {} is not pending and cannot be transferred",
                row.id
            )));
        }
        if row.recipient_code.as_deref().map_or(true, str::is_empty) {
            return Err(ServiceError::MissingTransferRecipient {
                vendor_id: row.vendor_id,
            });
        }
    }
    Ok(())
}

/// 按商家分组待结算记录
pub fn group_by_vendor(rows: Vec<PendingPayoutRow>) -> Vec<VendorPayoutGroup> {
    let mut groups: HashMap<Uuid, VendorPayoutGroup> = HashMap::new();
    for row in rows {
        let group = groups
            .entry(row.vendor_id)
            .or_insert_with(|| VendorPayoutGroup {
                vendor_id: row.vendor_id,
                vendor_name: row.vendor_name.clone(),
                has_recipient: row.recipient_code.as_deref().map_or(false, |c| !c.is_empty()),
                total_amount: Decimal::ZERO,
                payouts: Vec::new(),
            });
        group.total_amount += row.amount;
        group.payouts.push(row);
    }

    let mut groups: Vec<VendorPayoutGroup> = groups.into_values().collect();
    groups.sort_by(|a, b| a.vendor_name.cmp(&b.vendor_name));
    groups
}

/// 商家结算服务
#[derive(Clone)]
pub struct PayoutService {
    pool: PgPool,
    gateway: TransferGateway,
}

impl PayoutService {
    /// 创建新的商家结算服务实例
    pub fn new(pool: PgPool, gateway: TransferGateway) -> Self {
        Self { pool, gateway }
    }

    /// 查询全部待结算记录，按商家分组
    ///
    /// 已取消订单的结算记录不进入列表。
    pub async fn get_pending_payouts(&self) -> Result<Vec<VendorPayoutGroup>, ServiceError> {
        let rows = sqlx::query_as::<_, PendingPayoutRow>(
            r#"
            SELECT p.id, p.order_id, p.vendor_id, v.name AS vendor_name,
                   v.recipient_code, p.amount, p.status, p.created_at
            FROM vendor_payouts p
            JOIN vendors v ON v.id = p.vendor_id
            JOIN orders o ON o.id = p.order_id
            WHERE p.status = 'PENDING' AND o.status <> 'CANCELLED'
            ORDER BY p.created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(group_by_vendor(rows))
    }

    /// 为选中的结算记录发起批量转账
    ///
    /// 全程在单个事务内持有结算记录的行锁: 锁内重读并校验状态，任何
    /// 一条不合格整批失败且不触碰网关。并发的重复提交会在行锁上排队，
    /// 后到者重读时看到SUCCESS状态被整批拒绝，同一批结算永远只会提交
    /// 给网关一次。SUCCESS落库以状态仍为PENDING为前提。
    pub async fn initiate_vendor_transfers(
        &self,
        payout_ids: &[Uuid],
    ) -> Result<TransferBatchSummary, ServiceError> {
        if payout_ids.is_empty() {
            return Err(ServiceError::validation("No payouts selected for transfer"));
        }

        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query_as::<_, PendingPayoutRow>(
            r#"
            SELECT p.id, p.order_id, p.vendor_id, v.name AS vendor_name,
                   v.recipient_code, p.amount, p.status, p.created_at
            FROM vendor_payouts p
            JOIN vendors v ON v.id = p.vendor_id
            WHERE p.id = ANY($1)
            ORDER BY p.id
            FOR UPDATE OF p
            "#,
        )
        .bind(payout_ids)
        .fetch_all(&mut *tx)
        .await?;

        if rows.len() != payout_ids.len() {
            return Err(ServiceError::NotFound("vendor payout"));
        }

        ensure_transferable(&rows)?;

        let instructions: Vec<TransferInstruction> = rows
            .iter()
            .map(|row| TransferInstruction {
                amount: row.amount,
                // ensure_transferable保证收款人标识存在
                recipient_code: row.recipient_code.clone().unwrap_or_default(),
                reference: generate_reference("payout"),
                reason: format!("Settlement for order {}", row.order_id),
            })
            .collect();

        // 持有行锁期间调用网关，并发提交在此之前就已被挡下
        let receipts = self.gateway.bulk_transfer(&instructions).await?;
        let receipts_by_ref: HashMap<&str, &TransferReceipt> = receipts
            .iter()
            .map(|r| (r.reference.as_str(), r))
            .collect();

        // 网关已受理，整批落库为成功；失败回执由对账流程处理
        let now = Utc::now();
        for (row, instruction) in rows.iter().zip(&instructions) {
            let transfer_code = receipts_by_ref
                .get(instruction.reference.as_str())
                .map(|r| r.transfer_code.clone());

            let updated = sqlx::query(
                r#"
                UPDATE vendor_payouts
                SET status = $2, transfer_ref = $3, transfer_code = $4,
                    initiated_at = $5, completed_at = $5
                WHERE id = $1 AND status = 'PENDING'
                "#,
            )
            .bind(row.id)
            .bind(PayoutStatus::Success)
            .bind(&instruction.reference)
            .bind(transfer_code)
            .bind(now)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            // 行锁之下不应发生，发生即中止整批并回滚
            if updated == 0 {
                return Err(ServiceError::Internal(anyhow::anyhow!(
                    "payout {} changed state during settlement",
                    row.id
                )));
            }

            sqlx::query(
                "UPDATE orders SET payout_status = $2, updated_at = NOW() WHERE id = $1",
            )
            .bind(row.order_id)
            .bind(PayoutState::Paid)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        let payouts = sqlx::query_as::<_, VendorPayout>(
            r#"
            SELECT id, order_id, vendor_id, amount, status, transfer_ref, transfer_code,
                   initiated_at, completed_at, created_at
            FROM vendor_payouts
            WHERE id = ANY($1)
            ORDER BY created_at
            "#,
        )
        .bind(payout_ids)
        .fetch_all(&self.pool)
        .await?;

        let total_amount = rows.iter().map(|r| r.amount).sum();
        log::info!(
            "Submitted {} vendor transfer(s) totalling {}",
            rows.len(),
            total_amount
        );

        Ok(TransferBatchSummary {
            submitted: rows.len(),
            total_amount,
            payouts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn row(status: PayoutStatus, recipient: Option<&str>, amount: i64) -> PendingPayoutRow {
        PendingPayoutRow {
            id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            vendor_id: Uuid::new_v4(),
            vendor_name: "Mama Cass".to_string(),
            recipient_code: recipient.map(str::to_string),
            amount: Decimal::from(amount),
            status,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_batch_with_missing_recipient_rejected() {
        let rows = vec![
            row(PayoutStatus::Pending, Some("RCP_a"), 1500),
            row(PayoutStatus::Pending, None, 2000),
        ];
        let err = ensure_transferable(&rows).unwrap_err();
        assert!(matches!(err, ServiceError::MissingTransferRecipient { .. }));
    }

    #[test]
    fn test_batch_with_non_pending_payout_rejected() {
        let rows = vec![
            row(PayoutStatus::Pending, Some("RCP_a"), 1500),
            row(PayoutStatus::Success, Some("RCP_b"), 2000),
        ];
        assert!(ensure_transferable(&rows).is_err());
    }

    #[test]
    fn test_valid_batch_accepted() {
        let rows = vec![
            row(PayoutStatus::Pending, Some("RCP_a"), 1500),
            row(PayoutStatus::Pending, Some("RCP_b"), 2000),
        ];
        assert!(ensure_transferable(&rows).is_ok());
    }

    #[test]
    fn test_resubmitted_settled_batch_rejected() {
        // 重复提交同一批结算: 锁内重读看到的已是SUCCESS，整批拒绝
        let rows = vec![
            row(PayoutStatus::Success, Some("RCP_a"), 1500),
            row(PayoutStatus::Success, Some("RCP_b"), 2000),
        ];
        let err = ensure_transferable(&rows).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn test_empty_recipient_code_treated_as_missing() {
        let rows = vec![row(PayoutStatus::Pending, Some(""), 1500)];
        assert!(ensure_transferable(&rows).is_err());
    }

    #[test]
    fn test_group_by_vendor_sums_amounts() {
        let vendor_id = Uuid::new_v4();
        let mut a = row(PayoutStatus::Pending, Some("RCP_a"), 1500);
        let mut b = row(PayoutStatus::Pending, Some("RCP_a"), 2500);
        a.vendor_id = vendor_id;
        b.vendor_id = vendor_id;

        let groups = group_by_vendor(vec![a, b]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].total_amount, Decimal::from(4000));
        assert_eq!(groups[0].payouts.len(), 2);
        assert!(groups[0].has_recipient);
    }
}
