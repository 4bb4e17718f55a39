// 数据验证工具函数
// 金额、折扣、配送费规则等输入校验，边界处拒绝非法形状

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::ServiceError;
use crate::models::{CreateDiscountRequest, DiscountScope, DiscountType};

/// 验证金额为正数
///
/// # Arguments
/// * `amount` - 金额
/// * `field` - 字段名 (用于错误信息)
pub fn validate_positive_amount(amount: Decimal, field: &str) -> Result<(), ServiceError> {
    if amount <= Decimal::ZERO {
        return Err(ServiceError::validation(format!("{} must be positive", field)));
    }
    Ok(())
}

/// 验证时间窗口 (结束必须晚于开始)
pub fn validate_window(starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Result<(), ServiceError> {
    if ends_at <= starts_at {
        return Err(ServiceError::validation("ends_at must be after starts_at"));
    }
    Ok(())
}

/// 验证创建折扣请求
///
/// 百分比折扣值不得超过100；作用域决定必填的外键。
pub fn validate_discount_request(request: &CreateDiscountRequest) -> Result<(), ServiceError> {
    validate_positive_amount(request.value, "value")?;
    validate_window(request.starts_at, request.ends_at)?;

    if request.discount_type == DiscountType::Percentage && request.value > Decimal::from(100) {
        return Err(ServiceError::validation("percentage discount value cannot exceed 100"));
    }

    if let Some(limit) = request.usage_limit {
        if limit <= 0 {
            return Err(ServiceError::validation("usage_limit must be positive when set"));
        }
    }

    match request.scope {
        DiscountScope::ProductItem => {
            if request.product_item_id.is_none() {
                return Err(ServiceError::validation(
                    "product_item_id is required for PRODUCT_ITEM scope",
                ));
            }
        }
        DiscountScope::Vendor => {
            if request.vendor_id.is_none() {
                return Err(ServiceError::validation("vendor_id is required for VENDOR scope"));
            }
        }
        // 平台级折扣与平台级购物车折扣不关联任何外键
        DiscountScope::Platform | DiscountScope::Cart => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn base_request() -> CreateDiscountRequest {
        CreateDiscountRequest {
            discount_type: DiscountType::Percentage,
            scope: DiscountScope::Platform,
            value: Decimal::from(10),
            usage_limit: None,
            starts_at: Utc::now(),
            ends_at: Utc::now() + Duration::days(7),
            product_item_id: None,
            vendor_id: None,
        }
    }

    #[test]
    fn test_validate_positive_amount() {
        assert!(validate_positive_amount(Decimal::from(100), "amount").is_ok());
        assert!(validate_positive_amount(Decimal::ZERO, "amount").is_err());
        assert!(validate_positive_amount(Decimal::from(-5), "amount").is_err());
    }

    #[test]
    fn test_percentage_over_100_rejected() {
        let mut request = base_request();
        request.value = Decimal::from(101);
        assert!(validate_discount_request(&request).is_err());

        request.value = Decimal::from(100);
        assert!(validate_discount_request(&request).is_ok());
    }

    #[test]
    fn test_fixed_discount_over_100_allowed() {
        let mut request = base_request();
        request.discount_type = DiscountType::Fixed;
        request.value = Decimal::from(500);
        assert!(validate_discount_request(&request).is_ok());
    }

    #[test]
    fn test_window_end_before_start_rejected() {
        let mut request = base_request();
        request.ends_at = request.starts_at - Duration::hours(1);
        assert!(validate_discount_request(&request).is_err());
    }

    #[test]
    fn test_scope_foreign_key_requirements() {
        let mut request = base_request();
        request.scope = DiscountScope::ProductItem;
        assert!(validate_discount_request(&request).is_err());

        request.product_item_id = Some(Uuid::new_v4());
        assert!(validate_discount_request(&request).is_ok());

        let mut vendor_request = base_request();
        vendor_request.scope = DiscountScope::Vendor;
        assert!(validate_discount_request(&vendor_request).is_err());

        vendor_request.vendor_id = Some(Uuid::new_v4());
        assert!(validate_discount_request(&vendor_request).is_ok());
    }
}
