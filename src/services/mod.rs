// 服务层模块
// 包含所有业务逻辑服务

pub mod delivery_fee_service;
pub mod discount_service;
pub mod notification_service;
pub mod payment_completion_service;
pub mod payout_service;
pub mod referral_service;
pub mod transfer_gateway;
pub mod wallet_service;

// 重新导出服务
pub use delivery_fee_service::DeliveryFeeService;
pub use discount_service::DiscountService;
pub use notification_service::{NotificationService, NotificationWorker};
pub use payment_completion_service::PaymentCompletionService;
pub use payout_service::PayoutService;
pub use referral_service::ReferralService;
pub use transfer_gateway::TransferGateway;
pub use wallet_service::WalletService;
