// 中间件模块
// 请求日志与CORS配置

pub mod cors;
pub mod logging;

pub use cors::create_cors;
pub use logging::RequestLogging;
