//! Server configuration loading.
//!
//! Configuration is read from a TOML file, then secret-bearing fields
//! are overridden from the environment so that secrets never need to
//! live on disk. Validation runs before the listener binds; any missing
//! secret is a fatal, loud startup error.

use std::path::Path;

use serde::{Deserialize, Serialize};

use parley_auth::config::AuthConfig;

/// Errors produced while loading the server configuration.
#[derive(Debug, thiserror::Error)]
pub enum ServerConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read {path}: {message}")]
    Io {
        /// The file that failed.
        path: String,
        /// The underlying error.
        message: String,
    },

    /// The configuration file is not valid TOML.
    #[error("Failed to parse {path}: {message}")]
    Parse {
        /// The file that failed.
        path: String,
        /// The underlying error.
        message: String,
    },

    /// The configuration is invalid.
    #[error(transparent)]
    Invalid(#[from] parley_auth::config::ConfigError),
}

/// Root server configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener settings.
    pub server: ListenConfig,

    /// Auth subsystem settings.
    pub auth: AuthConfig,
}

/// Listener settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenConfig {
    /// Bind address.
    pub host: String,

    /// Bind port.
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ListenConfig {
    /// Returns the socket address string.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Loads configuration from an optional TOML file plus environment
/// overrides, then validates it.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed,
/// or validation fails. All of these are fatal at startup.
pub fn load_config(path: Option<&Path>) -> Result<ServerConfig, ServerConfigError> {
    let mut config = match path {
        Some(path) if path.exists() => {
            let raw = std::fs::read_to_string(path).map_err(|e| ServerConfigError::Io {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
            toml::from_str(&raw).map_err(|e| ServerConfigError::Parse {
                path: path.display().to_string(),
                message: e.to_string(),
            })?
        }
        _ => ServerConfig::default(),
    };

    apply_env_overrides(&mut config);
    config.auth.validate()?;
    Ok(config)
}

/// Overrides secret-bearing settings from the environment.
fn apply_env_overrides(config: &mut ServerConfig) {
    let overrides: [(&str, &mut String); 7] = [
        ("PARLEY_ISSUER", &mut config.auth.issuer),
        ("PARLEY_SESSION_SECRET", &mut config.auth.session.signing_secret),
        ("PARLEY_WEBHOOK_SECRET", &mut config.auth.webhook.signing_secret),
        ("PARLEY_ENCRYPTION_KEY", &mut config.auth.encryption_key),
        ("PARLEY_PROVIDER_CLIENT_ID", &mut config.auth.provider.client_id),
        (
            "PARLEY_PROVIDER_CLIENT_SECRET",
            &mut config.auth.provider.client_secret,
        ),
        ("PARLEY_PROVIDER_TENANT", &mut config.auth.provider.tenant),
    ];

    for (name, target) in overrides {
        if let Ok(value) = std::env::var(name)
            && !value.is_empty()
        {
            *target = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_fails_validation() {
        // No secrets anywhere: startup must refuse to proceed.
        let err = load_config(None).unwrap_err();
        assert!(matches!(err, ServerConfigError::Invalid(_)));
    }

    #[test]
    fn test_parse_full_toml() {
        let raw = r#"
            [server]
            host = "127.0.0.1"
            port = 9090

            [auth]
            issuer = "https://parley.example.com"
            audience = "parley"
            encryption_key = "abababababababababababababababababababababababababababababababab"

            [auth.session]
            signing_secret = "0123456789abcdef0123456789abcdef"
            lifetime = "24h"

            [auth.provider]
            client_id = "client-1"
            client_secret = "secret-1"
            tenant = "acme"
            redirect_uri = "https://parley.example.com/auth/callback"

            [auth.webhook]
            signing_secret = "whsec-1"
            timestamp_tolerance = "5m"
        "#;

        let config: ServerConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.server.bind_addr(), "127.0.0.1:9090");
        assert_eq!(config.auth.provider.tenant, "acme");
        assert_eq!(
            config.auth.webhook.timestamp_tolerance,
            std::time::Duration::from_secs(300)
        );
        config.auth.validate().unwrap();
    }
}
