use thiserror::Error;

/// Error type for bridge operations.
///
/// `Clone` so a single failure can be handed to every observer of a cached
/// fee quote.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BridgeError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),
    /// Wallet provider rejected a request or lacks a required capability.
    #[error("Provider error: {0}")]
    Provider(String),
    /// Asset matches none of the recognized shapes.
    #[error("Invalid asset: {0}")]
    InvalidAsset(String),
    /// Transport-level failure talking to the external API.
    #[error("Network error: {0}")]
    Network(String),
    /// The external API answered with an error envelope.
    #[error("API error {code}: {description}")]
    Api { code: i64, description: String },
    /// Amount could not be converted to base units.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    /// RPC, contract or signer failures.
    #[error("Blockchain error: {0}")]
    Blockchain(String),
    /// Malformed user input (addresses, ids).
    #[error("Validation error: {0}")]
    Validation(String),
    /// Serialization/deserialization errors.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Timeout errors.
    #[error("Timeout error: {0}")]
    Timeout(String),
}

impl BridgeError {
    /// Whether the failure is transient and the caller may try again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BridgeError::Network(_) | BridgeError::Timeout(_))
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for BridgeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BridgeError::Timeout(err.to_string())
        } else {
            BridgeError::Network(err.to_string())
        }
    }
}

impl From<ethers::utils::ConversionError> for BridgeError {
    fn from(err: ethers::utils::ConversionError) -> Self {
        BridgeError::InvalidAmount(err.to_string())
    }
}

pub type Result<T, E = BridgeError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_invalid_asset() {
        let err = BridgeError::InvalidAsset("xyz".to_string());
        assert_eq!(format!("{}", err), "Invalid asset: xyz");
    }

    #[test]
    fn test_display_api_error() {
        let err = BridgeError::Api { code: 401, description: "Unauthorized".to_string() };
        assert_eq!(format!("{}", err), "API error 401: Unauthorized");
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(BridgeError::Network("reset".into()).is_retryable());
        assert!(BridgeError::Timeout("slow".into()).is_retryable());
        assert!(!BridgeError::Provider("rejected".into()).is_retryable());
    }

    #[test]
    fn test_from_serde_json() {
        let err = serde_json::from_str::<u8>("nope").unwrap_err();
        let bridge_err: BridgeError = err.into();
        assert!(matches!(bridge_err, BridgeError::Serialization(_)));
    }
}
