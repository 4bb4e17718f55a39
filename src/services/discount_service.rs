// 折扣服务
// 负责"唯一适用折扣"的确定性解析与折后价计算，永不叠加折扣

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::models::{CreateDiscountRequest, Discount, DiscountScope, DiscountType, PriceQuote};
use crate::utils::validate_discount_request;

/// 折扣服务
pub struct DiscountService {
    pool: PgPool,
}

/// 在商品级候选中选出最优折扣
///
/// 作用域优先级高者胜 (PRODUCT_ITEM > VENDOR > PLATFORM)，
/// 同优先级按折扣值大者胜。无候选返回None。
pub fn select_best_item_discount(candidates: Vec<Discount>) -> Option<Discount> {
    candidates
        .into_iter()
        .max_by_key(|d| (d.scope.priority(), d.value))
}

/// 在购物车级候选中选出最优折扣
///
/// 商家专属的购物车折扣优先于平台通用的，再按折扣值比较。
pub fn select_best_cart_discount(candidates: Vec<Discount>) -> Option<Discount> {
    candidates
        .into_iter()
        .max_by_key(|d| (d.vendor_id.is_some(), d.value))
}

/// 计算折后价
///
/// 减免金额永远不会超过原价，折后价永远不会为负。
pub fn calculate_discounted_price(base_price: Decimal, discount: Option<&Discount>) -> PriceQuote {
    let discount = match discount {
        Some(d) => d,
        None => return PriceQuote::unchanged(base_price),
    };

    let raw_amount = match discount.discount_type {
        DiscountType::Percentage => base_price * discount.value / Decimal::from(100),
        DiscountType::Fixed => discount.value,
    };

    let discount_amount = raw_amount.min(base_price).max(Decimal::ZERO);

    PriceQuote {
        original_price: base_price,
        discount_amount,
        final_price: base_price - discount_amount,
        applied_discount_id: Some(discount.id),
    }
}

impl DiscountService {
    /// 创建新的折扣服务实例
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 解析商品的最优可用折扣
    ///
    /// 候选 = 生效中的 PRODUCT_ITEM(该商品) / VENDOR(该商家) / PLATFORM
    /// 折扣，且未超出可用次数上限。本服务不递增usage_count，兑换计数
    /// 由订单终结流程负责。
    pub async fn get_best_active_discount(
        &self,
        product_item_id: Uuid,
        vendor_id: Uuid,
    ) -> Result<Option<Discount>, ServiceError> {
        let candidates = sqlx::query_as::<_, Discount>(
            r#"
            SELECT id, discount_type, scope, value, usage_limit, usage_count,
                   starts_at, ends_at, is_active, product_item_id, vendor_id,
                   created_at, updated_at
            FROM discounts
            WHERE is_active = TRUE
              AND starts_at <= $3 AND ends_at > $3
              AND (usage_limit IS NULL OR usage_count < usage_limit)
              AND (
                  (scope = 'PRODUCT_ITEM' AND product_item_id = $1)
                  OR (scope = 'VENDOR' AND vendor_id = $2)
                  OR scope = 'PLATFORM'
              )
            "#,
        )
        .bind(product_item_id)
        .bind(vendor_id)
        .bind(Utc::now())
        .fetch_all(&self.pool)
        .await?;

        Ok(select_best_item_discount(candidates))
    }

    /// 解析购物车的最优可用折扣
    ///
    /// 候选限定为CART作用域: 该商家专属的或平台通用的 (vendor_id为空)。
    pub async fn get_best_cart_discount(
        &self,
        vendor_id: Uuid,
    ) -> Result<Option<Discount>, ServiceError> {
        let candidates = sqlx::query_as::<_, Discount>(
            r#"
            SELECT id, discount_type, scope, value, usage_limit, usage_count,
                   starts_at, ends_at, is_active, product_item_id, vendor_id,
                   created_at, updated_at
            FROM discounts
            WHERE is_active = TRUE
              AND starts_at <= $2 AND ends_at > $2
              AND (usage_limit IS NULL OR usage_count < usage_limit)
              AND scope = 'CART'
              AND (vendor_id = $1 OR vendor_id IS NULL)
            "#,
        )
        .bind(vendor_id)
        .bind(Utc::now())
        .fetch_all(&self.pool)
        .await?;

        Ok(select_best_cart_discount(candidates))
    }

    /// 商品价格试算: 解析最优折扣并计算折后价
    pub async fn quote_item_price(
        &self,
        base_price: Decimal,
        product_item_id: Uuid,
        vendor_id: Uuid,
    ) -> Result<PriceQuote, ServiceError> {
        let discount = self
            .get_best_active_discount(product_item_id, vendor_id)
            .await?;
        Ok(calculate_discounted_price(base_price, discount.as_ref()))
    }

    /// 购物车价格试算: 解析最优购物车折扣并计算折后小计
    pub async fn quote_cart_price(
        &self,
        subtotal: Decimal,
        vendor_id: Uuid,
    ) -> Result<PriceQuote, ServiceError> {
        let discount = self.get_best_cart_discount(vendor_id).await?;
        Ok(calculate_discounted_price(subtotal, discount.as_ref()))
    }

    /// 创建折扣
    pub async fn create_discount(
        &self,
        request: CreateDiscountRequest,
    ) -> Result<Discount, ServiceError> {
        validate_discount_request(&request)?;

        let now = Utc::now();
        let discount = Discount {
            id: Uuid::new_v4(),
            discount_type: request.discount_type,
            scope: request.scope,
            value: request.value,
            usage_limit: request.usage_limit,
            usage_count: 0,
            starts_at: request.starts_at,
            ends_at: request.ends_at,
            is_active: true,
            product_item_id: request.product_item_id,
            vendor_id: request.vendor_id,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO discounts (
                id, discount_type, scope, value, usage_limit, usage_count,
                starts_at, ends_at, is_active, product_item_id, vendor_id,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
            "#,
        )
        .bind(discount.id)
        .bind(discount.discount_type)
        .bind(discount.scope)
        .bind(discount.value)
        .bind(discount.usage_limit)
        .bind(discount.usage_count)
        .bind(discount.starts_at)
        .bind(discount.ends_at)
        .bind(discount.is_active)
        .bind(discount.product_item_id)
        .bind(discount.vendor_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        log::info!(
            "Created {:?} discount {} with scope {:?}",
            discount.discount_type,
            discount.id,
            discount.scope
        );
        Ok(discount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn make_discount(
        discount_type: DiscountType,
        scope: DiscountScope,
        value: Decimal,
        vendor_id: Option<Uuid>,
    ) -> Discount {
        let now = Utc::now();
        Discount {
            id: Uuid::new_v4(),
            discount_type,
            scope,
            value,
            usage_limit: None,
            usage_count: 0,
            starts_at: now - Duration::days(1),
            ends_at: now + Duration::days(1),
            is_active: true,
            product_item_id: None,
            vendor_id,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_vendor_discount_beats_platform() {
        let vendor_id = Uuid::new_v4();
        let vendor = make_discount(
            DiscountType::Percentage,
            DiscountScope::Vendor,
            Decimal::from(10),
            Some(vendor_id),
        );
        let platform = make_discount(
            DiscountType::Percentage,
            DiscountScope::Platform,
            Decimal::from(5),
            None,
        );

        let best = select_best_item_discount(vec![platform, vendor.clone()]).unwrap();
        assert_eq!(best.id, vendor.id);
    }

    #[test]
    fn test_product_item_discount_beats_bigger_vendor_discount() {
        let item = make_discount(
            DiscountType::Percentage,
            DiscountScope::ProductItem,
            Decimal::from(5),
            None,
        );
        let vendor = make_discount(
            DiscountType::Percentage,
            DiscountScope::Vendor,
            Decimal::from(50),
            Some(Uuid::new_v4()),
        );

        let best = select_best_item_discount(vec![vendor, item.clone()]).unwrap();
        assert_eq!(best.id, item.id);
    }

    #[test]
    fn test_same_scope_tie_broken_by_value() {
        let small = make_discount(
            DiscountType::Percentage,
            DiscountScope::Platform,
            Decimal::from(5),
            None,
        );
        let big = make_discount(
            DiscountType::Percentage,
            DiscountScope::Platform,
            Decimal::from(15),
            None,
        );

        let best = select_best_item_discount(vec![small, big.clone()]).unwrap();
        assert_eq!(best.id, big.id);
    }

    #[test]
    fn test_no_candidates_returns_none() {
        assert!(select_best_item_discount(vec![]).is_none());
        assert!(select_best_cart_discount(vec![]).is_none());
    }

    #[test]
    fn test_vendor_cart_discount_beats_platform_cart_discount() {
        let vendor_id = Uuid::new_v4();
        let vendor_cart = make_discount(
            DiscountType::Fixed,
            DiscountScope::Cart,
            Decimal::from(200),
            Some(vendor_id),
        );
        let platform_cart = make_discount(
            DiscountType::Fixed,
            DiscountScope::Cart,
            Decimal::from(300),
            None,
        );

        let best = select_best_cart_discount(vec![platform_cart, vendor_cart.clone()]).unwrap();
        assert_eq!(best.id, vendor_cart.id);
    }

    #[test]
    fn test_percentage_price_calculation() {
        let discount = make_discount(
            DiscountType::Percentage,
            DiscountScope::Platform,
            Decimal::from(10),
            None,
        );

        let quote = calculate_discounted_price(Decimal::from(1000), Some(&discount));
        assert_eq!(quote.discount_amount, Decimal::from(100));
        assert_eq!(quote.final_price, Decimal::from(900));
        assert_eq!(quote.applied_discount_id, Some(discount.id));
    }

    #[test]
    fn test_fixed_discount_clamped_to_base_price() {
        let discount = make_discount(
            DiscountType::Fixed,
            DiscountScope::Platform,
            Decimal::from(5000),
            None,
        );

        let quote = calculate_discounted_price(Decimal::from(800), Some(&discount));
        assert_eq!(quote.discount_amount, Decimal::from(800));
        assert_eq!(quote.final_price, Decimal::ZERO);
    }

    #[test]
    fn test_no_discount_returns_unchanged_price() {
        let quote = calculate_discounted_price(Decimal::from(1500), None);
        assert_eq!(quote.original_price, Decimal::from(1500));
        assert_eq!(quote.discount_amount, Decimal::ZERO);
        assert_eq!(quote.final_price, Decimal::from(1500));
        assert_eq!(quote.applied_discount_id, None);
    }

    #[test]
    fn test_final_price_never_negative() {
        let discount = make_discount(
            DiscountType::Percentage,
            DiscountScope::Platform,
            Decimal::from(100),
            None,
        );

        let quote = calculate_discounted_price(Decimal::from(250), Some(&discount));
        assert_eq!(quote.final_price, Decimal::ZERO);
        assert!(quote.discount_amount <= quote.original_price);
    }
}
