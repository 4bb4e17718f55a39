// 工具函数模块
// 包含签名校验、输入校验、引用生成、管理员鉴权等通用工具

pub mod auth;
pub mod crypto;
pub mod reference;
pub mod validation;

// 重新导出常用函数
pub use auth::*;
pub use crypto::*;
pub use reference::*;
pub use validation::*;
