// 通知分发服务
// 支付完成后的推送/邮件走进程内队列异步分发，永不反馈到支付事务

use std::time::Duration;

use serde::Serialize;
use sqlx::PgPool;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::NotificationConfig;
use crate::models::UserRole;

/// 一条待分发的通知任务
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "channel", rename_all = "snake_case")]
pub enum NotificationJob {
    /// 应用内推送
    Push {
        user_id: Uuid,
        title: String,
        body: String,
    },
    /// 邮件
    Email {
        to: String,
        subject: String,
        body: String,
    },
}

#[derive(sqlx::FromRow)]
struct OrderRecipients {
    customer_id: Uuid,
    customer_email: String,
    vendor_owner_id: Option<Uuid>,
    vendor_email: Option<String>,
    vendor_name: Option<String>,
}

#[derive(sqlx::FromRow)]
struct PackageRecipient {
    user_id: Uuid,
    email: String,
}

#[derive(sqlx::FromRow)]
struct OperatorRecipient {
    user_id: Uuid,
    email: String,
}

/// 为每个运营人员生成推送+邮件两条任务
fn operator_jobs(operators: &[OperatorRecipient], body: &str) -> Vec<NotificationJob> {
    let mut jobs = Vec::with_capacity(operators.len() * 2);
    for operator in operators {
        jobs.push(NotificationJob::Push {
            user_id: operator.user_id,
            title: "Payment activity".to_string(),
            body: body.to_string(),
        });
        jobs.push(NotificationJob::Email {
            to: operator.email.clone(),
            subject: "Payment activity".to_string(),
            body: body.to_string(),
        });
    }
    jobs
}

/// 通知服务 (入队侧)
///
/// 入队永不阻塞调用方: 队列满时丢弃并记录日志。通知失败只影响
/// 通知本身，绝不回滚或重试支付事务。
#[derive(Clone)]
pub struct NotificationService {
    pool: PgPool,
    tx: mpsc::Sender<NotificationJob>,
}

impl NotificationService {
    /// 创建服务与配套的分发worker
    ///
    /// worker需要由调用方spawn到运行时上。
    pub fn new(pool: PgPool, config: &NotificationConfig) -> (Self, NotificationWorker) {
        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let service = Self { pool, tx };
        let worker = NotificationWorker {
            rx,
            sender: DeliverySender::new(config),
        };
        (service, worker)
    }

    /// 将一条通知任务入队
    pub fn enqueue(&self, job: NotificationJob) {
        if let Err(e) = self.tx.try_send(job) {
            log::error!("Notification queue full or closed, dropping job: {}", e);
        }
    }

    /// 订单支付完成通知
    ///
    /// 收件方: 下单用户 (推送+邮件)、商家老板 (推送+邮件)、运营人员
    /// (推送+邮件)。任何一路查询或入队失败都只记录日志。
    pub async fn notify_order_paid(&self, order_id: Uuid) {
        let recipients = sqlx::query_as::<_, OrderRecipients>(
            r#"
            SELECT o.user_id AS customer_id,
                   cu.email AS customer_email,
                   v.owner_id AS vendor_owner_id,
                   v.email AS vendor_email,
                   v.name AS vendor_name
            FROM orders o
            JOIN users cu ON cu.id = o.user_id
            LEFT JOIN vendors v ON v.id = o.vendor_id
            WHERE o.id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await;

        let recipients = match recipients {
            Ok(Some(r)) => r,
            Ok(None) => {
                log::warn!("No recipients found for paid order {}", order_id);
                return;
            }
            Err(e) => {
                log::error!("Failed to load recipients for order {}: {}", order_id, e);
                return;
            }
        };

        self.enqueue(NotificationJob::Push {
            user_id: recipients.customer_id,
            title: "Payment received".to_string(),
            body: format!("Your payment for order {} was confirmed", order_id),
        });
        self.enqueue(NotificationJob::Email {
            to: recipients.customer_email,
            subject: "Payment received".to_string(),
            body: format!("Your payment for order {} was confirmed.", order_id),
        });

        if let Some(owner_id) = recipients.vendor_owner_id {
            self.enqueue(NotificationJob::Push {
                user_id: owner_id,
                title: "New paid order".to_string(),
                body: format!("Order {} has been paid", order_id),
            });
        }
        if let Some(vendor_email) = recipients.vendor_email {
            self.enqueue(NotificationJob::Email {
                to: vendor_email,
                subject: "New paid order".to_string(),
                body: format!(
                    "{}: order {} has been paid and is ready for preparation.",
                    recipients.vendor_name.as_deref().unwrap_or("Vendor"),
                    order_id
                ),
            });
        }

        self.notify_operators(&format!("Order {} paid", order_id)).await;
    }

    /// 包裹订单支付完成通知
    pub async fn notify_package_paid(&self, package_order_id: Uuid) {
        let recipient = sqlx::query_as::<_, PackageRecipient>(
            r#"
            SELECT u.id AS user_id, u.email
            FROM package_orders p
            JOIN users u ON u.id = p.user_id
            WHERE p.id = $1
            "#,
        )
        .bind(package_order_id)
        .fetch_optional(&self.pool)
        .await;

        let recipient = match recipient {
            Ok(Some(r)) => r,
            Ok(None) => {
                log::warn!(
                    "No recipient found for paid package order {}",
                    package_order_id
                );
                return;
            }
            Err(e) => {
                log::error!(
                    "Failed to load recipient for package order {}: {}",
                    package_order_id,
                    e
                );
                return;
            }
        };

        self.enqueue(NotificationJob::Push {
            user_id: recipient.user_id,
            title: "Payment received".to_string(),
            body: format!(
                "Your payment for package delivery {} was confirmed",
                package_order_id
            ),
        });
        self.enqueue(NotificationJob::Email {
            to: recipient.email,
            subject: "Payment received".to_string(),
            body: format!(
                "Your payment for package delivery {} was confirmed.",
                package_order_id
            ),
        });

        self.notify_operators(&format!("Package order {} paid", package_order_id))
            .await;
    }

    /// 给全部运营角色用户发推送和邮件
    async fn notify_operators(&self, body: &str) {
        let operators = sqlx::query_as::<_, OperatorRecipient>(
            "SELECT id AS user_id, email FROM users WHERE role = $1",
        )
        .bind(UserRole::Operator.as_str())
        .fetch_all(&self.pool)
        .await;

        match operators {
            Ok(operators) => {
                for job in operator_jobs(&operators, body) {
                    self.enqueue(job);
                }
            }
            Err(e) => log::error!("Failed to load operator users: {}", e),
        }
    }
}

/// 通知分发worker (出队侧)
///
/// 独立任务运行，逐条投递；单条失败记录日志后继续。
pub struct NotificationWorker {
    rx: mpsc::Receiver<NotificationJob>,
    sender: DeliverySender,
}

impl NotificationWorker {
    /// 消费队列直到所有发送端关闭
    pub async fn run(mut self) {
        log::info!("Notification worker started");
        while let Some(job) = self.rx.recv().await {
            if let Err(e) = self.sender.deliver(&job).await {
                log::error!("Notification delivery failed: {}", e);
            }
        }
        log::info!("Notification worker stopped");
    }
}

/// 推送/邮件HTTP投递器
struct DeliverySender {
    client: reqwest::Client,
    push_url: String,
    email_url: String,
    api_key: String,
}

impl DeliverySender {
    fn new(config: &NotificationConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .unwrap_or_default();

        Self {
            client,
            push_url: config.push_url.clone(),
            email_url: config.email_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    async fn deliver(&self, job: &NotificationJob) -> anyhow::Result<()> {
        let url = match job {
            NotificationJob::Push { .. } => &self.push_url,
            NotificationJob::Email { .. } => &self.email_url,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(job)
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("Relay returned status {}", response.status());
        }

        log::debug!("Delivered notification via {}", url);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_serializes_with_channel_tag() {
        let job = NotificationJob::Email {
            to: "vendor@example.com".to_string(),
            subject: "New paid order".to_string(),
            body: "Order paid".to_string(),
        };
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["channel"], "email");
        assert_eq!(json["to"], "vendor@example.com");

        let push = NotificationJob::Push {
            user_id: Uuid::new_v4(),
            title: "Payment received".to_string(),
            body: "ok".to_string(),
        };
        let json = serde_json::to_value(&push).unwrap();
        assert_eq!(json["channel"], "push");
    }

    #[test]
    fn test_operator_jobs_cover_push_and_email() {
        let operators = vec![
            OperatorRecipient {
                user_id: Uuid::new_v4(),
                email: "ops1@example.com".to_string(),
            },
            OperatorRecipient {
                user_id: Uuid::new_v4(),
                email: "ops2@example.com".to_string(),
            },
        ];

        let jobs = operator_jobs(&operators, "Order paid");
        assert_eq!(jobs.len(), 4);

        let pushes = jobs
            .iter()
            .filter(|j| matches!(j, NotificationJob::Push { .. }))
            .count();
        let emails = jobs
            .iter()
            .filter(|j| matches!(j, NotificationJob::Email { .. }))
            .count();
        assert_eq!(pushes, 2);
        assert_eq!(emails, 2);

        assert!(jobs.iter().any(|j| matches!(
            j,
            NotificationJob::Email { to, .. } if to == "ops2@example.com"
        )));
    }

    #[tokio::test]
    async fn test_enqueue_drops_when_queue_full() {
        // 容量1的队列: 第二条任务被丢弃而不是阻塞
        let (tx, mut rx) = mpsc::channel(1);
        let service = NotificationService {
            pool: PgPool::connect_lazy("postgres://localhost/unused").unwrap(),
            tx,
        };

        service.enqueue(NotificationJob::Push {
            user_id: Uuid::new_v4(),
            title: "a".to_string(),
            body: "a".to_string(),
        });
        service.enqueue(NotificationJob::Push {
            user_id: Uuid::new_v4(),
            title: "b".to_string(),
            body: "b".to_string(),
        });

        let first = rx.recv().await;
        assert!(first.is_some());
        assert!(rx.try_recv().is_err());
    }
}
