// 请求日志中间件
// 记录API请求日志，包括来源地址、耗时、状态码

use actix_web::{
    dev::{ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures_util::future::{ok, Ready};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

/// 按路径和状态码决定请求日志级别
///
/// 健康检查由负载均衡器高频轮询，成功时降到Debug避免刷屏；
/// 其余请求成功记Info，4xx/5xx记Warn。
pub fn request_log_level(path: &str, status: u16) -> log::Level {
    if status >= 400 {
        log::Level::Warn
    } else if path == "/health" {
        log::Level::Debug
    } else {
        log::Level::Info
    }
}

/// 请求日志中间件
pub struct RequestLogging;

impl<S, B> Transform<S, ServiceRequest> for RequestLogging
where
    S: actix_web::dev::Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequestLoggingMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RequestLoggingMiddleware { service })
    }
}

pub struct RequestLoggingMiddleware<S> {
    service: S,
}

impl<S, B> actix_web::dev::Service<ServiceRequest> for RequestLoggingMiddleware<S>
where
    S: actix_web::dev::Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start_time = Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();
        let remote_addr = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();

        let fut = self.service.call(req);

        Box::pin(async move {
            let result = fut.await;
            let elapsed_ms = start_time.elapsed().as_millis();

            match &result {
                Ok(response) => {
                    let status = response.status().as_u16();
                    log::log!(
                        request_log_level(&path, status),
                        "{} {} -> {} in {}ms from {}",
                        method,
                        path,
                        status,
                        elapsed_ms,
                        remote_addr
                    );
                }
                Err(e) => {
                    log::error!(
                        "{} {} failed after {}ms from {}: {}",
                        method,
                        path,
                        elapsed_ms,
                        remote_addr,
                        e
                    );
                }
            }

            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test as actix_test, web, App, HttpResponse};

    #[test]
    fn test_health_polling_logged_at_debug() {
        assert_eq!(request_log_level("/health", 200), log::Level::Debug);
    }

    #[test]
    fn test_normal_request_logged_at_info() {
        assert_eq!(
            request_log_level("/api/v1/payouts/pending", 200),
            log::Level::Info
        );
    }

    #[test]
    fn test_error_statuses_logged_at_warn() {
        assert_eq!(request_log_level("/health", 503), log::Level::Warn);
        assert_eq!(request_log_level("/api/v1/discounts", 422), log::Level::Warn);
    }

    #[actix_web::test]
    async fn test_middleware_passes_response_through() {
        let app = actix_test::init_service(
            App::new()
                .wrap(RequestLogging)
                .route("/ping", web::get().to(|| async { HttpResponse::Ok().body("pong") })),
        )
        .await;

        let req = actix_test::TestRequest::get().uri("/ping").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }
}
