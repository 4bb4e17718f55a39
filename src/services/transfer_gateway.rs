// 转账网关客户端
// 封装出账方向的批量转账HTTP API (Paystack风格)

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::GatewayConfig;
use crate::error::ServiceError;
use crate::models::naira_to_kobo;

/// 单笔转账指令
#[derive(Debug, Clone, Serialize)]
pub struct TransferInstruction {
    /// 转账金额 (奈拉)
    pub amount: Decimal,
    /// 收款人标识
    pub recipient_code: String,
    /// 转账引用 (本系统生成，幂等键)
    pub reference: String,
    /// 转账事由
    pub reason: String,
}

/// 网关返回的单笔转账回执
#[derive(Debug, Clone, Deserialize)]
pub struct TransferReceipt {
    /// 本系统提交的转账引用
    pub reference: String,
    /// 网关分配的转账码
    pub transfer_code: String,
    /// 网关侧状态
    pub status: String,
}

#[derive(Serialize)]
struct BulkTransferItem {
    amount: i64,
    recipient: String,
    reference: String,
    reason: String,
}

#[derive(Serialize)]
struct BulkTransferRequest {
    source: &'static str,
    currency: &'static str,
    transfers: Vec<BulkTransferItem>,
}

#[derive(Deserialize)]
struct BulkTransferResponse {
    status: bool,
    message: String,
    #[serde(default)]
    data: Vec<TransferReceipt>,
}

/// 转账网关客户端
#[derive(Clone)]
pub struct TransferGateway {
    client: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl TransferGateway {
    /// 根据配置创建网关客户端
    pub fn new(config: &GatewayConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
        }
    }

    /// 提交一批转账
    ///
    /// 金额以科博 (kobo) 提交。返回的回执顺序与提交顺序一致；
    /// 网关受理即视为本批次提交成功。
    pub async fn bulk_transfer(
        &self,
        instructions: &[TransferInstruction],
    ) -> Result<Vec<TransferReceipt>, ServiceError> {
        if instructions.is_empty() {
            return Ok(Vec::new());
        }

        let transfers = instructions
            .iter()
            .map(|i| BulkTransferItem {
                amount: naira_to_kobo(i.amount),
                recipient: i.recipient_code.clone(),
                reference: i.reference.clone(),
                reason: i.reason.clone(),
            })
            .collect();

        let request = BulkTransferRequest {
            source: "balance",
            currency: "NGN",
            transfers,
        };

        let response = self
            .client
            .post(format!("{}/transfer/bulk", self.base_url))
            .bearer_auth(&self.secret_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ServiceError::Gateway(format!("Bulk transfer request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Gateway(format!(
                "Bulk transfer rejected with status {}: {}",
                status, body
            )));
        }

        let parsed: BulkTransferResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Gateway(format!("Invalid bulk transfer response: {}", e)))?;

        if !parsed.status {
            return Err(ServiceError::Gateway(format!(
                "Bulk transfer not accepted: {}",
                parsed.message
            )));
        }

        log::info!(
            "Gateway accepted bulk transfer of {} item(s)",
            instructions.len()
        );
        Ok(parsed.data)
    }

    /// 批次转账总额 (奈拉)
    pub fn batch_total(instructions: &[TransferInstruction]) -> Decimal {
        instructions.iter().map(|i| i.amount).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_amounts_convert_to_kobo() {
        let instruction = TransferInstruction {
            amount: Decimal::new(250050, 2), // ₦2500.50
            recipient_code: "RCP_abc".to_string(),
            reference: "payout_ref1".to_string(),
            reason: "Vendor settlement".to_string(),
        };
        assert_eq!(naira_to_kobo(instruction.amount), 250050);
    }

    #[test]
    fn test_batch_total_sums_amounts() {
        let instructions = vec![
            TransferInstruction {
                amount: Decimal::from(1500),
                recipient_code: "RCP_a".to_string(),
                reference: "r1".to_string(),
                reason: "settlement".to_string(),
            },
            TransferInstruction {
                amount: Decimal::from(2500),
                recipient_code: "RCP_b".to_string(),
                reference: "r2".to_string(),
                reason: "settlement".to_string(),
            },
        ];
        assert_eq!(TransferGateway::batch_total(&instructions), Decimal::from(4000));
    }
}
