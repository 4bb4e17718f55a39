// 配送费服务
// 按区域与时段规则计算配送费，无规则命中时回退到平台基础费

use chrono::{NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::models::{Area, CreateFeeRuleRequest, DeliveryFeeRule, FeeQuoteResponse};
use crate::utils::validate_positive_amount;

/// 配送费服务
pub struct DeliveryFeeService {
    pool: PgPool,
    /// 无规则命中时的平台基础费
    base_fee: Decimal,
}

/// 判断时刻是否落在 [start, end) 窗口内
///
/// start > end 表示窗口跨午夜，例如 22:00-02:00。
pub fn window_contains(start: NaiveTime, end: NaiveTime, at: NaiveTime) -> bool {
    if start <= end {
        at >= start && at < end
    } else {
        at >= start || at < end
    }
}

/// 判断两个 [start, end) 窗口是否重叠 (均支持跨午夜)
pub fn windows_overlap(a_start: NaiveTime, a_end: NaiveTime, b_start: NaiveTime, b_end: NaiveTime) -> bool {
    window_contains(a_start, a_end, b_start)
        || window_contains(b_start, b_end, a_start)
}

impl DeliveryFeeService {
    /// 创建新的配送费服务实例
    pub fn new(pool: PgPool, base_fee: Decimal) -> Self {
        Self { pool, base_fee }
    }

    /// 配送费试算
    ///
    /// 按 (start_time, id) 顺序扫描该区域的规则，第一条命中的窗口决定
    /// 费用；无命中时返回平台基础费并标记fallback。
    ///
    /// # Arguments
    /// * `area_id` - 配送区域ID
    /// * `at` - 试算时刻 (缺省取当前UTC时刻)
    pub async fn quote_fee(
        &self,
        area_id: Uuid,
        at: Option<NaiveTime>,
    ) -> Result<FeeQuoteResponse, ServiceError> {
        let at = at.unwrap_or_else(|| Utc::now().time());

        let rules = self.rules_for_area(area_id).await?;

        let matched = rules
            .iter()
            .find(|rule| window_contains(rule.start_time, rule.end_time, at));

        Ok(match matched {
            Some(rule) => FeeQuoteResponse {
                area_id,
                at,
                fee: rule.fee,
                fallback: false,
            },
            None => FeeQuoteResponse {
                area_id,
                at,
                fee: self.base_fee,
                fallback: true,
            },
        })
    }

    /// 创建配送费时段规则
    ///
    /// 拒绝与该区域已有规则重叠的窗口。
    pub async fn create_fee_rule(
        &self,
        area_id: Uuid,
        request: CreateFeeRuleRequest,
    ) -> Result<DeliveryFeeRule, ServiceError> {
        validate_positive_amount(request.fee, "delivery fee")?;

        if request.start_time == request.end_time {
            return Err(ServiceError::validation(
                "Fee rule window cannot be empty (start_time equals end_time)",
            ));
        }

        let area = sqlx::query_as::<_, Area>("SELECT id, name, created_at FROM areas WHERE id = $1")
            .bind(area_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServiceError::NotFound("area"))?;

        let existing = self.rules_for_area(area_id).await?;
        for rule in &existing {
            if windows_overlap(rule.start_time, rule.end_time, request.start_time, request.end_time)
            {
                return Err(ServiceError::validation(
                    "Fee rule window overlaps an existing rule for this area",
                ));
            }
        }

        let rule_id = Uuid::new_v4();
        let rule = sqlx::query_as::<_, DeliveryFeeRule>(
            r#"
            INSERT INTO delivery_fee_rules (id, area_id, start_time, end_time, fee, created_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            RETURNING id, area_id, start_time, end_time, fee, created_at
            "#,
        )
        .bind(rule_id)
        .bind(area_id)
        .bind(request.start_time)
        .bind(request.end_time)
        .bind(request.fee)
        .fetch_one(&self.pool)
        .await?;

        log::info!(
            "Created delivery fee rule {} for area {}: {}-{} = {}",
            rule.id,
            area.name,
            rule.start_time,
            rule.end_time,
            rule.fee
        );
        Ok(rule)
    }

    /// 查询区域的全部规则，按扫描顺序排序
    pub async fn rules_for_area(&self, area_id: Uuid) -> Result<Vec<DeliveryFeeRule>, ServiceError> {
        let rules = sqlx::query_as::<_, DeliveryFeeRule>(
            r#"
            SELECT id, area_id, start_time, end_time, fee, created_at
            FROM delivery_fee_rules
            WHERE area_id = $1
            ORDER BY start_time, id
            "#,
        )
        .bind(area_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_window_contains_simple() {
        // 08:00-12:00
        assert!(window_contains(t(8, 0), t(12, 0), t(8, 0)));
        assert!(window_contains(t(8, 0), t(12, 0), t(11, 59)));
        assert!(!window_contains(t(8, 0), t(12, 0), t(12, 0)));
        assert!(!window_contains(t(8, 0), t(12, 0), t(7, 59)));
    }

    #[test]
    fn test_window_contains_wraps_midnight() {
        // 22:00-02:00 跨午夜
        assert!(window_contains(t(22, 0), t(2, 0), t(23, 30)));
        assert!(window_contains(t(22, 0), t(2, 0), t(0, 15)));
        assert!(window_contains(t(22, 0), t(2, 0), t(1, 59)));
        assert!(!window_contains(t(22, 0), t(2, 0), t(2, 0)));
        assert!(!window_contains(t(22, 0), t(2, 0), t(12, 0)));
    }

    #[test]
    fn test_windows_overlap_detection() {
        assert!(windows_overlap(t(8, 0), t(12, 0), t(11, 0), t(14, 0)));
        assert!(windows_overlap(t(8, 0), t(12, 0), t(6, 0), t(9, 0)));
        assert!(!windows_overlap(t(8, 0), t(12, 0), t(12, 0), t(18, 0)));
        // 跨午夜窗口与凌晨窗口重叠
        assert!(windows_overlap(t(22, 0), t(2, 0), t(1, 0), t(5, 0)));
        assert!(!windows_overlap(t(22, 0), t(2, 0), t(2, 0), t(6, 0)));
    }

    #[test]
    fn test_gap_between_rules_falls_through() {
        // 08:00-12:00 与 12:00-18:00 两条规则，20:00不在任何窗口内
        let rules = [
            (t(8, 0), t(12, 0)),
            (t(12, 0), t(18, 0)),
        ];
        let at = t(20, 0);
        assert!(rules
            .iter()
            .all(|(s, e)| !window_contains(*s, *e, at)));
    }
}
