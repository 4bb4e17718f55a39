// 折扣数据模型
// 单一最优折扣解析，永不叠加

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// 折扣模型
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Discount {
    /// 折扣唯一标识符
    pub id: Uuid,
    /// 折扣类型
    pub discount_type: DiscountType,
    /// 折扣作用域
    pub scope: DiscountScope,
    /// 折扣值 (百分比折扣时为百分数，固定折扣时为奈拉金额)
    pub value: Decimal,
    /// 可用次数上限 (NULL表示不限)
    pub usage_limit: Option<i32>,
    /// 已使用次数
    pub usage_count: i32,
    /// 生效开始时间
    pub starts_at: DateTime<Utc>,
    /// 生效结束时间
    pub ends_at: DateTime<Utc>,
    /// 是否启用
    pub is_active: bool,
    /// 作用域为PRODUCT_ITEM时关联的商品ID
    pub product_item_id: Option<Uuid>,
    /// 作用域为VENDOR或商家级CART时关联的商家ID
    pub vendor_id: Option<Uuid>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

/// 折扣类型枚举
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "varchar", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum DiscountType {
    /// 按百分比减免
    Percentage,
    /// 减免固定金额
    Fixed,
}

/// 折扣作用域枚举
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountScope {
    /// 单个商品
    ProductItem,
    /// 商家全部商品
    Vendor,
    /// 全平台
    Platform,
    /// 购物车小计
    Cart,
}

impl DiscountScope {
    /// 作用域优先级，商品级最高，平台级最低
    ///
    /// CART作用域不参与商品级解析，优先级为0。
    pub fn priority(&self) -> u8 {
        match self {
            DiscountScope::ProductItem => 3,
            DiscountScope::Vendor => 2,
            DiscountScope::Platform => 1,
            DiscountScope::Cart => 0,
        }
    }
}

/// 创建折扣请求
#[derive(Debug, Deserialize)]
pub struct CreateDiscountRequest {
    /// 折扣类型
    pub discount_type: DiscountType,
    /// 折扣作用域
    pub scope: DiscountScope,
    /// 折扣值
    pub value: Decimal,
    /// 可用次数上限
    pub usage_limit: Option<i32>,
    /// 生效开始时间
    pub starts_at: DateTime<Utc>,
    /// 生效结束时间
    pub ends_at: DateTime<Utc>,
    /// 商品ID (作用域为PRODUCT_ITEM时必填)
    pub product_item_id: Option<Uuid>,
    /// 商家ID (作用域为VENDOR时必填)
    pub vendor_id: Option<Uuid>,
}

/// 折扣解析查询参数
#[derive(Debug, Deserialize)]
pub struct BestDiscountQuery {
    /// 商品ID
    pub product_item_id: Uuid,
    /// 商品所属商家ID
    pub vendor_id: Uuid,
}

/// 购物车折扣解析查询参数
#[derive(Debug, Deserialize)]
pub struct CartDiscountQuery {
    /// 购物车所属商家ID
    pub vendor_id: Uuid,
}

/// 商品价格试算请求
#[derive(Debug, Deserialize)]
pub struct PriceQuoteRequest {
    /// 商品原价 (奈拉)
    pub base_price: Decimal,
    /// 商品ID
    pub product_item_id: Uuid,
    /// 商品所属商家ID
    pub vendor_id: Uuid,
}

/// 购物车价格试算请求
#[derive(Debug, Deserialize)]
pub struct CartQuoteRequest {
    /// 购物车小计 (奈拉)
    pub subtotal: Decimal,
    /// 购物车所属商家ID
    pub vendor_id: Uuid,
}

/// 价格试算结果
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PriceQuote {
    /// 原价
    pub original_price: Decimal,
    /// 减免金额 (不会超过原价)
    pub discount_amount: Decimal,
    /// 折后价 (不会为负)
    pub final_price: Decimal,
    /// 命中的折扣ID
    pub applied_discount_id: Option<Uuid>,
}

impl PriceQuote {
    /// 无折扣命中时的原价结果
    pub fn unchanged(base_price: Decimal) -> Self {
        Self {
            original_price: base_price,
            discount_amount: Decimal::ZERO,
            final_price: base_price,
            applied_discount_id: None,
        }
    }
}
