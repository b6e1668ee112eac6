//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Authentication and credential configuration.
///
/// The embedding process is responsible for loading this (from a file,
/// environment, or hard-coded defaults); the engine only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Process-wide secret used to salt password digests and key the
    /// bearer-token digest. Changing it invalidates every stored password
    /// and every issued token.
    #[serde(default = "default_secret")]
    pub secret: String,
    /// Lifetime of the long-lived "remember me" token, in days.
    #[serde(default = "default_remember_token_days")]
    pub remember_token_days: i64,
    /// Settings key toggling the activation-required policy.
    #[serde(default = "default_activation_key")]
    pub activation_required_key: String,
    /// Settings key toggling the authorization-required policy.
    #[serde(default = "default_authorization_key")]
    pub authorization_required_key: String,
}

fn default_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_remember_token_days() -> i64 {
    7
}

fn default_activation_key() -> String {
    "USER_NEED_ACTIVATE".to_string()
}

fn default_authorization_key() -> String {
    "API_NEED_AUTH".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: default_secret(),
            remember_token_days: default_remember_token_days(),
            activation_required_key: default_activation_key(),
            authorization_required_key: default_authorization_key(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config: AuthConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.remember_token_days, 7);
        assert_eq!(config.activation_required_key, "USER_NEED_ACTIVATE");
        assert_eq!(config.authorization_required_key, "API_NEED_AUTH");
    }
}
