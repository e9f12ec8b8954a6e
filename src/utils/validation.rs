use crate::error::{Result, TradeFlowError};
use anyhow::anyhow;

/// 输入验证器
pub struct ConfigValidator;

impl ConfigValidator {
    /// 验证节点 ID
    pub fn validate_node_id(node_id: &str) -> Result<()> {
        if node_id.is_empty() {
            return Err(TradeFlowError::Other(anyhow!("节点 ID 不能为空")));
        }

        if !node_id
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        {
            return Err(TradeFlowError::Other(anyhow!(
                "节点 ID '{}' 包含无效字符，应该只包含字母、数字、下划线和短横线",
                node_id
            )));
        }

        Ok(())
    }

    /// 验证 Flow 名称
    pub fn validate_flow_name(name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(TradeFlowError::Other(anyhow!("Flow 名称不能为空")));
        }

        if name.len() > 100 {
            return Err(TradeFlowError::Other(anyhow!(
                "Flow 名称过长（最多 100 字符）"
            )));
        }

        Ok(())
    }

    /// 验证股票代码
    pub fn validate_ticker(ticker: &str) -> Result<()> {
        if ticker.is_empty() {
            return Err(TradeFlowError::Other(anyhow!("股票代码不能为空")));
        }

        if ticker.len() > 10 || !ticker.chars().all(|c| c.is_ascii_alphanumeric() || c == '.') {
            return Err(TradeFlowError::Other(anyhow!(
                "股票代码 '{}' 格式无效",
                ticker
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_node_id() {
        assert!(ConfigValidator::validate_node_id("").is_err());
        assert!(ConfigValidator::validate_node_id("node-1").is_ok());
        assert!(ConfigValidator::validate_node_id("node_1").is_ok());
        assert!(ConfigValidator::validate_node_id("node@1").is_err());
    }

    #[test]
    fn test_validate_flow_name() {
        assert!(ConfigValidator::validate_flow_name("").is_err());
        assert!(ConfigValidator::validate_flow_name("My Strategy").is_ok());
        assert!(ConfigValidator::validate_flow_name(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_ticker() {
        assert!(ConfigValidator::validate_ticker("").is_err());
        assert!(ConfigValidator::validate_ticker("AAPL").is_ok());
        assert!(ConfigValidator::validate_ticker("BRK.B").is_ok());
        assert!(ConfigValidator::validate_ticker("TOO-LONG-TICKER").is_err());
    }
}
