use solana_rpc_client_api::client_error::{Error as ClientError, ErrorKind as ClientErrorKind};
use solana_rpc_client_api::request::{RpcError, RpcResponseErrorData};
use thiserror::Error;

/// Errors surfaced by the chain client
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChainError {
    /// Network-level failure reaching the node
    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Request timed out: {message}")]
    Timeout { message: String },

    /// The node answered with an error; `logs` holds any execution logs
    /// it attached (preflight failure data)
    #[error("RPC error: {message}")]
    Rpc {
        message: String,
        code: Option<i64>,
        logs: Vec<String>,
    },

    #[error("Blockhash not found")]
    BlockhashNotFound,

    /// Block height passed the transaction's last valid height
    #[error("Transaction expired: {message}")]
    TransactionExpired { message: String },

    /// The transaction landed but failed during execution
    #[error("Transaction failed on chain: {message}")]
    ExecutionFailed { message: String },

    #[error("Malformed response: {0}")]
    Decode(String),
}

impl ChainError {
    /// Human-readable message without the variant prefix.
    pub fn message(&self) -> String {
        match self {
            ChainError::Transport { message }
            | ChainError::Timeout { message }
            | ChainError::Rpc { message, .. }
            | ChainError::TransactionExpired { message }
            | ChainError::ExecutionFailed { message } => message.clone(),
            ChainError::BlockhashNotFound => "Blockhash not found".to_string(),
            ChainError::Decode(message) => message.clone(),
        }
    }

    /// Execution logs attached by the node, empty when none were sent.
    pub fn logs(&self) -> &[String] {
        match self {
            ChainError::Rpc { logs, .. } => logs,
            _ => &[],
        }
    }

    /// Classify a client error, keeping preflight logs when present.
    pub fn from_client_error(err: &ClientError) -> Self {
        if let ClientErrorKind::RpcError(RpcError::RpcResponseError {
            code,
            message,
            data,
        }) = err.kind()
        {
            let logs = match data {
                RpcResponseErrorData::SendTransactionPreflightFailure(result) => {
                    result.logs.clone().unwrap_or_default()
                }
                _ => Vec::new(),
            };
            return ChainError::Rpc {
                message: message.clone(),
                code: Some(*code),
                logs,
            };
        }

        let text = err.to_string();
        let lower = text.to_lowercase();
        if lower.contains("blockhash not found") {
            ChainError::BlockhashNotFound
        } else if lower.contains("block height exceeded") || lower.contains("transaction expired") {
            ChainError::TransactionExpired { message: text }
        } else if lower.contains("timeout") || lower.contains("timed out") {
            ChainError::Timeout { message: text }
        } else if matches!(err.kind(), ClientErrorKind::Reqwest(_) | ClientErrorKind::Io(_)) {
            ChainError::Transport { message: text }
        } else {
            ChainError::Rpc {
                message: text,
                code: None,
                logs: Vec::new(),
            }
        }
    }
}

impl From<ClientError> for ChainError {
    fn from(err: ClientError) -> Self {
        ChainError::from_client_error(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_rpc_client_api::response::RpcSimulateTransactionResult;

    #[test]
    fn test_preflight_failure_keeps_logs() {
        let result: RpcSimulateTransactionResult = serde_json::from_value(serde_json::json!({
            "err": null,
            "logs": [
                "Program log: Instruction: Fund",
                "Program log: Error: insufficient funds",
            ],
        }))
        .unwrap();
        let client_err = ClientError::from(ClientErrorKind::RpcError(RpcError::RpcResponseError {
            code: -32002,
            message: "Transaction simulation failed".to_string(),
            data: RpcResponseErrorData::SendTransactionPreflightFailure(result),
        }));

        let err = ChainError::from_client_error(&client_err);
        assert_eq!(err.logs().len(), 2);
        assert_eq!(err.message(), "Transaction simulation failed");
        assert!(matches!(err, ChainError::Rpc { code: Some(-32002), .. }));
    }

    #[test]
    fn test_response_error_without_logs() {
        let client_err = ClientError::from(ClientErrorKind::RpcError(RpcError::RpcResponseError {
            code: 500,
            message: "Internal server error".to_string(),
            data: RpcResponseErrorData::Empty,
        }));
        let err: ChainError = client_err.into();
        assert!(err.logs().is_empty());
        assert_eq!(err.message(), "Internal server error");
    }

    #[test]
    fn test_string_classification() {
        let expired = ClientError::from(ClientErrorKind::Custom(
            "block height exceeded for signature".to_string(),
        ));
        assert!(matches!(
            ChainError::from_client_error(&expired),
            ChainError::TransactionExpired { .. }
        ));

        let blockhash = ClientError::from(ClientErrorKind::Custom("Blockhash not found".to_string()));
        assert_eq!(ChainError::from_client_error(&blockhash), ChainError::BlockhashNotFound);

        let other = ClientError::from(ClientErrorKind::Custom("something odd".to_string()));
        assert!(matches!(
            ChainError::from_client_error(&other),
            ChainError::Rpc { code: None, .. }
        ));
    }
}
