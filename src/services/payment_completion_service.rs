// 支付完成处理服务
// Webhook确认的收款按固定顺序解析到三个支付域之一，并幂等地推进状态机

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::models::{
    naira_to_kobo, ChargeData, CompletionOutcome, OrderStatus, PackageOrder, PackagePayment,
    Payment, PaymentKind, PaymentStatus, PayoutState, PayoutStatus,
};
use crate::services::{NotificationService, WalletService};

/// 引用解析的固定扫描顺序
///
/// 三个支付域共享服务商引用命名空间，解析顺序是协议的一部分，
/// 不随表大小或查询代价变化。
pub const RESOLUTION_ORDER: [PaymentKind; 3] = [
    PaymentKind::WalletFunding,
    PaymentKind::OrderPayment,
    PaymentKind::PackagePayment,
];

/// 引用解析结果
#[derive(Debug, Clone)]
pub struct ResolvedPayment {
    /// 所属支付域
    pub kind: PaymentKind,
    /// 内部支付记录ID
    pub record_id: Uuid,
    /// 本地存储的金额 (奈拉)
    pub amount: Decimal,
}

/// 校验Webhook上报金额与本地存储金额是否一致
///
/// Webhook金额以kobo为单位；服务商未携带金额字段时跳过校验。
pub fn verify_charge_amount(
    reference: &str,
    stored_amount: Decimal,
    reported_kobo: Option<i64>,
) -> Result<(), ServiceError> {
    let expected_kobo = naira_to_kobo(stored_amount);
    match reported_kobo {
        Some(received) if received != expected_kobo => Err(ServiceError::AmountMismatch {
            reference: reference.to_string(),
            expected_kobo,
            received_kobo: received,
        }),
        _ => Ok(()),
    }
}

/// 重复收款信号的短路判定
///
/// 支付已COMPLETED且通知标记已置位时跳过整个完成流程；COMPLETED但
/// 通知标记缺失的记录继续走流程补置标记，不会被短路。
pub fn completion_short_circuits(status: PaymentStatus, notifications_sent: bool) -> bool {
    status == PaymentStatus::Completed && notifications_sent
}

/// 支付完成处理服务
#[derive(Clone)]
pub struct PaymentCompletionService {
    pool: PgPool,
    wallet: WalletService,
    notifications: NotificationService,
}

impl PaymentCompletionService {
    /// 创建新的支付完成处理服务实例
    pub fn new(pool: PgPool, wallet: WalletService, notifications: NotificationService) -> Self {
        Self {
            pool,
            wallet,
            notifications,
        }
    }

    /// 按固定顺序解析服务商引用归属的支付域
    pub async fn resolve_reference(
        &self,
        reference: &str,
    ) -> Result<Option<ResolvedPayment>, ServiceError> {
        for kind in RESOLUTION_ORDER {
            let row: Option<(Uuid, Decimal)> = match kind {
                PaymentKind::WalletFunding => {
                    sqlx::query_as("SELECT id, amount FROM wallet_fundings WHERE reference = $1")
                        .bind(reference)
                        .fetch_optional(&self.pool)
                        .await?
                }
                PaymentKind::OrderPayment => {
                    sqlx::query_as("SELECT id, amount FROM payments WHERE reference = $1")
                        .bind(reference)
                        .fetch_optional(&self.pool)
                        .await?
                }
                PaymentKind::PackagePayment => {
                    sqlx::query_as("SELECT id, amount FROM package_payments WHERE reference = $1")
                        .bind(reference)
                        .fetch_optional(&self.pool)
                        .await?
                }
            };

            if let Some((record_id, amount)) = row {
                return Ok(Some(ResolvedPayment {
                    kind,
                    record_id,
                    amount,
                }));
            }
        }

        Ok(None)
    }

    /// 处理一次收款成功信号
    ///
    /// 解析引用、校验金额，然后按支付域推进对应状态机。重复信号
    /// 返回 `already_completed = true` 而不是错误。
    pub async fn handle_charge_success(
        &self,
        charge: &ChargeData,
    ) -> Result<CompletionOutcome, ServiceError> {
        let resolved = self
            .resolve_reference(&charge.reference)
            .await?
            .ok_or(ServiceError::NotFound("payment reference"))?;

        verify_charge_amount(&charge.reference, resolved.amount, charge.amount)?;

        match resolved.kind {
            PaymentKind::WalletFunding => {
                self.wallet
                    .complete_funding(&charge.reference, charge.paid_at)
                    .await
            }
            PaymentKind::OrderPayment => {
                self.complete_order_payment(resolved.record_id, charge.paid_at)
                    .await
            }
            PaymentKind::PackagePayment => {
                self.complete_package_payment(resolved.record_id, charge.paid_at)
                    .await
            }
        }
    }

    /// 处理一次收款失败信号
    ///
    /// 按固定顺序找到第一条匹配的记录，仅当其仍为PENDING时标记FAILED。
    /// 已完成的支付不会被失败信号降级，失败不触发通知。
    pub async fn fail_payment_by_reference(&self, reference: &str) -> Result<(), ServiceError> {
        for kind in RESOLUTION_ORDER {
            let updated = match kind {
                PaymentKind::WalletFunding => sqlx::query(
                    "UPDATE wallet_fundings SET status = 'FAILED', updated_at = NOW() \
                     WHERE reference = $1 AND status = 'PENDING'",
                ),
                PaymentKind::OrderPayment => sqlx::query(
                    "UPDATE payments SET status = 'FAILED', updated_at = NOW() \
                     WHERE reference = $1 AND status = 'PENDING'",
                ),
                PaymentKind::PackagePayment => sqlx::query(
                    "UPDATE package_payments SET status = 'FAILED', updated_at = NOW() \
                     WHERE reference = $1 AND status = 'PENDING'",
                ),
            }
            .bind(reference)
            .execute(&self.pool)
            .await?
            .rows_affected();

            if updated > 0 {
                log::info!("Marked {:?} payment {} as failed", kind, reference);
                return Ok(());
            }

            // 引用存在但已不是PENDING: 保持原状，不再继续扫描
            let exists: Option<Uuid> = match kind {
                PaymentKind::WalletFunding => {
                    sqlx::query_scalar("SELECT id FROM wallet_fundings WHERE reference = $1")
                }
                PaymentKind::OrderPayment => {
                    sqlx::query_scalar("SELECT id FROM payments WHERE reference = $1")
                }
                PaymentKind::PackagePayment => {
                    sqlx::query_scalar("SELECT id FROM package_payments WHERE reference = $1")
                }
            }
            .bind(reference)
            .fetch_optional(&self.pool)
            .await?;

            if exists.is_some() {
                log::info!(
                    "Ignoring failure signal for non-pending {:?} payment {}",
                    kind,
                    reference
                );
                return Ok(());
            }
        }

        log::warn!("Failure signal for unknown reference {}", reference);
        Ok(())
    }

    /// 完成一笔订单支付
    ///
    /// 单事务内: 锁定支付记录做幂等检查，标记COMPLETED，订单翻转为
    /// PAID并挂起结算，为商家订单登记结算记录，置位通知标记。事务
    /// 提交后才分发通知，通知失败不回滚支付。
    pub async fn complete_order_payment(
        &self,
        payment_id: Uuid,
        paid_at: Option<DateTime<Utc>>,
    ) -> Result<CompletionOutcome, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, order_id, reference, amount, status, paid_at,
                   notifications_sent, notified_at, created_at, updated_at
            FROM payments
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(payment_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ServiceError::NotFound("payment"))?;

        if completion_short_circuits(payment.status, payment.notifications_sent) {
            tx.commit().await?;
            log::info!(
                "Order payment {} already completed, skipping duplicate signal",
                payment.reference
            );
            return Ok(CompletionOutcome {
                kind: PaymentKind::OrderPayment,
                record_id: payment.id,
                already_completed: true,
            });
        }

        sqlx::query(
            r#"
            UPDATE payments
            SET status = $2, paid_at = COALESCE(paid_at, $3),
                notifications_sent = TRUE, notified_at = NOW(), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(payment.id)
        .bind(PaymentStatus::Completed)
        .bind(paid_at.unwrap_or_else(Utc::now))
        .execute(&mut *tx)
        .await?;

        let order: (Uuid, Option<Uuid>, Decimal) = sqlx::query_as(
            "SELECT id, vendor_id, total FROM orders WHERE id = $1 FOR UPDATE",
        )
        .bind(payment.order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ServiceError::NotFound("order"))?;
        let (order_id, vendor_id, order_total) = order;

        sqlx::query(
            "UPDATE orders SET status = $2, payout_status = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(order_id)
        .bind(OrderStatus::Paid)
        .bind(PayoutState::Pending)
        .execute(&mut *tx)
        .await?;

        // 商家订单登记待结算记录，一单一条
        if let Some(vendor_id) = vendor_id {
            sqlx::query(
                r#"
                INSERT INTO vendor_payouts (id, order_id, vendor_id, amount, status, created_at)
                VALUES ($1, $2, $3, $4, $5, NOW())
                ON CONFLICT (order_id) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(order_id)
            .bind(vendor_id)
            .bind(order_total)
            .bind(PayoutStatus::Pending)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        log::info!(
            "Order payment {} completed, order {} marked paid",
            payment.reference,
            order_id
        );

        self.notifications.notify_order_paid(order_id).await;

        Ok(CompletionOutcome {
            kind: PaymentKind::OrderPayment,
            record_id: payment.id,
            already_completed: false,
        })
    }

    /// 完成一笔包裹订单支付
    pub async fn complete_package_payment(
        &self,
        payment_id: Uuid,
        paid_at: Option<DateTime<Utc>>,
    ) -> Result<CompletionOutcome, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let payment = sqlx::query_as::<_, PackagePayment>(
            r#"
            SELECT id, package_order_id, reference, amount, status, paid_at,
                   notifications_sent, notified_at, created_at, updated_at
            FROM package_payments
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(payment_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ServiceError::NotFound("package payment"))?;

        if completion_short_circuits(payment.status, payment.notifications_sent) {
            tx.commit().await?;
            log::info!(
                "Package payment {} already completed, skipping duplicate signal",
                payment.reference
            );
            return Ok(CompletionOutcome {
                kind: PaymentKind::PackagePayment,
                record_id: payment.id,
                already_completed: true,
            });
        }

        sqlx::query(
            r#"
            UPDATE package_payments
            SET status = $2, paid_at = COALESCE(paid_at, $3),
                notifications_sent = TRUE, notified_at = NOW(), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(payment.id)
        .bind(PaymentStatus::Completed)
        .bind(paid_at.unwrap_or_else(Utc::now))
        .execute(&mut *tx)
        .await?;

        let package_order = sqlx::query_as::<_, PackageOrder>(
            r#"
            SELECT id, user_id, total, status, created_at, updated_at
            FROM package_orders
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(payment.package_order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ServiceError::NotFound("package order"))?;

        sqlx::query(
            "UPDATE package_orders SET status = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(package_order.id)
        .bind(OrderStatus::Paid)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        log::info!(
            "Package payment {} completed, package order {} marked paid",
            payment.reference,
            payment.package_order_id
        );

        self.notifications
            .notify_package_paid(payment.package_order_id)
            .await;

        Ok(CompletionOutcome {
            kind: PaymentKind::PackagePayment,
            record_id: payment.id,
            already_completed: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_order_is_fixed() {
        assert_eq!(
            RESOLUTION_ORDER,
            [
                PaymentKind::WalletFunding,
                PaymentKind::OrderPayment,
                PaymentKind::PackagePayment,
            ]
        );
    }

    #[test]
    fn test_amount_verification_accepts_matching_kobo() {
        // ₦1500.00 == 150000 kobo
        assert!(verify_charge_amount("ref_1", Decimal::from(1500), Some(150_000)).is_ok());
    }

    #[test]
    fn test_amount_verification_rejects_mismatch() {
        let err = verify_charge_amount("ref_2", Decimal::from(1500), Some(140_000)).unwrap_err();
        match err {
            ServiceError::AmountMismatch {
                reference,
                expected_kobo,
                received_kobo,
            } => {
                assert_eq!(reference, "ref_2");
                assert_eq!(expected_kobo, 150_000);
                assert_eq!(received_kobo, 140_000);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_amount_verification_skipped_when_not_reported() {
        assert!(verify_charge_amount("ref_3", Decimal::from(1500), None).is_ok());
    }

    #[test]
    fn test_duplicate_signal_short_circuits_completed_payment() {
        assert!(completion_short_circuits(PaymentStatus::Completed, true));
    }

    #[test]
    fn test_completed_payment_without_notifications_reprocessed() {
        // 通知标记未置位: 重走完成流程补置标记而不是短路
        assert!(!completion_short_circuits(PaymentStatus::Completed, false));
    }

    #[test]
    fn test_pending_payment_never_short_circuits() {
        assert!(!completion_short_circuits(PaymentStatus::Pending, false));
        assert!(!completion_short_circuits(PaymentStatus::Pending, true));
        assert!(!completion_short_circuits(PaymentStatus::Failed, true));
    }
}
