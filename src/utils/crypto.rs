// 加密工具函数
// 提供Webhook签名生成与验证功能

use anyhow::{Context, Result};
use hmac::{Hmac, Mac};
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

/// 生成HMAC-SHA512签名
///
/// # Arguments
/// * `message` - 要签名的消息
/// * `secret` - 签名密钥
///
/// # Returns
/// * 十六进制格式的签名字符串
pub fn generate_hmac_signature(message: &[u8], secret: &str) -> Result<String> {
    let mut mac = HmacSha512::new_from_slice(secret.as_bytes())
        .context("Invalid HMAC key")?;

    mac.update(message);
    let result = mac.finalize();
    let signature = hex::encode(result.into_bytes());

    Ok(signature)
}

/// 验证Webhook签名
///
/// 服务商对原始请求体做HMAC-SHA512签名，签名通过专用请求头携带。
///
/// # Arguments
/// * `payload` - 原始请求体字节
/// * `signature` - 请求头中携带的签名
/// * `secret` - 签名密钥
///
/// # Returns
/// * 签名是否有效
pub fn verify_webhook_signature(payload: &[u8], signature: &str, secret: &str) -> Result<bool> {
    let expected_signature = generate_hmac_signature(payload, secret)?;
    Ok(constant_time_eq(&expected_signature, signature))
}

/// 常量时间字符串比较 (防止时序攻击)
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (byte_a, byte_b) in a.bytes().zip(b.bytes()) {
        result |= byte_a ^ byte_b;
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hmac_signature() {
        let message = b"test message";
        let secret = "test secret";

        let signature = generate_hmac_signature(message, secret).unwrap();
        assert!(!signature.is_empty());

        let is_valid = verify_webhook_signature(message, &signature, secret).unwrap();
        assert!(is_valid);

        let is_invalid = verify_webhook_signature(message, "invalid_signature", secret).unwrap();
        assert!(!is_invalid);
    }

    #[test]
    fn test_signature_changes_with_secret() {
        let message = b"same payload";
        let sig_a = generate_hmac_signature(message, "secret_a").unwrap();
        let sig_b = generate_hmac_signature(message, "secret_b").unwrap();
        assert_ne!(sig_a, sig_b);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("hello", "hello"));
        assert!(!constant_time_eq("hello", "world"));
        assert!(!constant_time_eq("hello", "hello world"));
    }

    #[test]
    fn test_webhook_signature_over_raw_body() {
        let payload = br#"{"event":"charge.success","data":{"reference":"ref_1"}}"#;
        let secret = "webhook_secret";

        let signature = generate_hmac_signature(payload, secret).unwrap();
        let is_valid = verify_webhook_signature(payload, &signature, secret).unwrap();
        assert!(is_valid);
    }
}
