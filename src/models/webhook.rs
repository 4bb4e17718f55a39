// 支付服务商Webhook事件模型
// 原始载荷在边界处解析为带标签的事件枚举，未识别形状不进入业务逻辑

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// 服务商事件原始载荷
#[derive(Debug, Deserialize)]
struct RawProviderEvent {
    /// 事件类型标识，如 "charge.success"
    event: String,
    /// 事件数据
    data: ChargeData,
}

/// 收款事件数据
#[derive(Debug, Deserialize, Clone)]
pub struct ChargeData {
    /// 服务商交易引用
    pub reference: String,
    /// 金额 (最小货币单位kobo)
    #[serde(default)]
    pub amount: Option<i64>,
    /// 服务商记录的支付时间
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
}

/// 解析后的Webhook事件
#[derive(Debug, Clone)]
pub enum WebhookEvent {
    /// 收款成功
    ChargeSuccess(ChargeData),
    /// 收款失败
    ChargeFailed(ChargeData),
    /// 未识别的事件类型，确认收到但不处理
    Unknown(String),
}

impl WebhookEvent {
    /// 从原始请求体解析事件
    ///
    /// 只有已知的事件类型会携带数据进入业务逻辑，其余一律归为Unknown。
    pub fn parse(body: &[u8]) -> Result<Self, serde_json::Error> {
        let raw: RawProviderEvent = serde_json::from_slice(body)?;
        let event = match raw.event.as_str() {
            "charge.success" => WebhookEvent::ChargeSuccess(raw.data),
            "charge.failed" => WebhookEvent::ChargeFailed(raw.data),
            _ => WebhookEvent::Unknown(raw.event),
        };
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_charge_success() {
        let body = br#"{"event":"charge.success","data":{"reference":"ref_123","amount":100000,"paid_at":"2024-05-01T12:00:00Z"}}"#;
        let event = WebhookEvent::parse(body).unwrap();

        match event {
            WebhookEvent::ChargeSuccess(data) => {
                assert_eq!(data.reference, "ref_123");
                assert_eq!(data.amount, Some(100_000));
                assert!(data.paid_at.is_some());
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_parse_charge_failed() {
        let body = br#"{"event":"charge.failed","data":{"reference":"ref_456"}}"#;
        let event = WebhookEvent::parse(body).unwrap();

        match event {
            WebhookEvent::ChargeFailed(data) => {
                assert_eq!(data.reference, "ref_456");
                assert_eq!(data.amount, None);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_parse_unknown_event() {
        let body = br#"{"event":"transfer.success","data":{"reference":"tr_1"}}"#;
        let event = WebhookEvent::parse(body).unwrap();

        assert!(matches!(event, WebhookEvent::Unknown(ref e) if e == "transfer.success"));
    }

    #[test]
    fn test_parse_malformed_body() {
        assert!(WebhookEvent::parse(b"not json").is_err());
        assert!(WebhookEvent::parse(br#"{"data":{}}"#).is_err());
    }
}
