// chowpay 服务入口
// 加载配置、连接数据库、跑迁移、启动通知worker与HTTP服务

mod config;
mod error;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;
mod state;
mod utils;

use std::io::{self, Write};
use std::time::Duration;

use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use chrono::Local;
use sqlx::postgres::PgPoolOptions;

use crate::config::Config;
use crate::middleware::{create_cors, RequestLogging};
use crate::routes::{api_v1_routes, public_routes};
use crate::state::AppState;

#[actix_web::main]
async fn main() -> Result<()> {
    // 初始化日志
    let mut log_builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    log_builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S %:z"),
                record.level(),
                record.args()
            )
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
        })
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(config.database.connect_timeout))
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .context("Failed to run database migrations")?;
    log::info!("Database migrations applied");

    let bind_address = config.bind_address();
    let workers = config.server.workers;

    let (app_state, notification_worker) = AppState::new(db_pool, config);
    let app_state = web::Data::new(app_state);

    // 通知分发worker独立于HTTP服务运行
    tokio::spawn(notification_worker.run());

    log::info!("Starting chowpay server on {}", bind_address);

    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(create_cors())
            .wrap(RequestLogging)
            .service(api_v1_routes())
            .service(public_routes())
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind to {}", bind_address))?;

    if let Some(workers) = workers {
        server = server.workers(workers);
    }

    server.run().await.context("Server error")?;

    log::info!("chowpay server stopped");
    Ok(())
}
