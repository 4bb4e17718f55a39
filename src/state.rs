// 应用状态管理
// 包含数据库连接池、配置与各业务服务实例，服务在启动时注入一次

use actix_web::web;
use sqlx::PgPool;

use crate::config::Config;
use crate::services::{
    DeliveryFeeService, DiscountService, NotificationService, NotificationWorker,
    PaymentCompletionService, PayoutService, ReferralService, TransferGateway, WalletService,
};

/// 应用全局状态
pub struct AppState {
    /// 数据库连接池
    pub db_pool: PgPool,
    /// 应用配置
    pub config: Config,
    /// 钱包服务
    pub wallet_service: WalletService,
    /// 折扣服务
    pub discount_service: DiscountService,
    /// 配送费服务
    pub delivery_fee_service: DeliveryFeeService,
    /// 支付完成处理服务
    pub payment_completion_service: PaymentCompletionService,
    /// 推荐奖励服务
    pub referral_service: ReferralService,
    /// 商家结算服务
    pub payout_service: PayoutService,
}

impl AppState {
    /// 创建新的应用状态实例
    ///
    /// 构造全部业务服务并返回配套的通知分发worker，
    /// worker需要由调用方spawn到运行时上。
    ///
    /// # Arguments
    /// * `db_pool` - 数据库连接池
    /// * `config` - 应用配置
    pub fn new(db_pool: PgPool, config: Config) -> (Self, NotificationWorker) {
        let (notification_service, notification_worker) =
            NotificationService::new(db_pool.clone(), &config.notifications);

        let wallet_service = WalletService::new(db_pool.clone());
        let gateway = TransferGateway::new(&config.gateway);

        let state = Self {
            wallet_service: wallet_service.clone(),
            discount_service: DiscountService::new(db_pool.clone()),
            delivery_fee_service: DeliveryFeeService::new(db_pool.clone(), config.delivery.base_fee),
            payment_completion_service: PaymentCompletionService::new(
                db_pool.clone(),
                wallet_service.clone(),
                notification_service,
            ),
            referral_service: ReferralService::new(
                db_pool.clone(),
                wallet_service,
                config.referral.clone(),
            ),
            payout_service: PayoutService::new(db_pool.clone(), gateway),
            db_pool,
            config,
        };

        (state, notification_worker)
    }
}

/// 应用状态数据类型别名
pub type AppStateData = web::Data<AppState>;
