//! Environment-based configuration types for the identity provider runtime settings.

use anyhow::Result;
use rand::RngCore;

use crate::errors::ConfigError;

/// Minimum accepted length, in bytes, of a shared token signing secret
pub const MIN_SIGNING_SECRET_LENGTH: usize = 32;

/// HTTP server port configuration
#[derive(Clone)]
pub struct HttpPort(u16);

/// Shared secret for HS256 access token signatures
#[derive(Clone)]
pub struct TokenSigningSecret(Vec<u8>);

/// Access token lifetime configuration
#[derive(Clone)]
pub struct AccessTokenLifetime(chrono::Duration);

/// Minimum password length enforced by the registration form
#[derive(Clone)]
pub struct PasswordMinLength(usize);

/// Argon2 cost parameters, written as `memory_kib,iterations,parallelism`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PasswordHashingParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

/// Main application configuration
#[derive(Clone)]
pub struct Config {
    pub version: String,
    pub http_port: HttpPort,
    pub http_static_path: String,
    pub http_templates_path: String,
    pub external_base: String,
    pub catalog_path: Option<String>,
    pub token_signing_secret: TokenSigningSecret,
    pub token_signing_key_pem: Option<String>,
    pub token_verifying_key_pem: Option<String>,
    pub access_token_lifetime: AccessTokenLifetime,
    pub password_min_length: PasswordMinLength,
    pub password_hashing_params: PasswordHashingParams,
    pub storage_backend: String,
    pub database_url: Option<String>,
}

impl Config {
    /// Create a new configuration from environment variables
    pub fn new() -> Result<Self> {
        let external_base = require_env("EXTERNAL_BASE")?;
        let http_port: HttpPort = default_env("HTTP_PORT", "8080").try_into()?;
        let http_static_path = optional_env("HTTP_STATIC_PATH")
            .unwrap_or_else(|| format!("{}/static", env!("CARGO_MANIFEST_DIR")));
        let http_templates_path = optional_env("HTTP_TEMPLATES_PATH")
            .unwrap_or_else(|| format!("{}/templates", env!("CARGO_MANIFEST_DIR")));
        let catalog_path = optional_env("CATALOG_PATH").filter(|v| !v.is_empty());
        let token_signing_secret: TokenSigningSecret =
            optional_env("TOKEN_SIGNING_SECRET").try_into()?;
        let token_signing_key_pem = optional_env("TOKEN_SIGNING_KEY_PEM").filter(|v| !v.is_empty());
        let token_verifying_key_pem =
            optional_env("TOKEN_VERIFYING_KEY_PEM").filter(|v| !v.is_empty());
        let access_token_lifetime: AccessTokenLifetime =
            default_env("ACCESS_TOKEN_LIFETIME", "1h").try_into()?;
        let password_min_length: PasswordMinLength =
            default_env("PASSWORD_MIN_LENGTH", "8").try_into()?;
        let password_hashing_params: PasswordHashingParams =
            default_env("PASSWORD_HASHING_PARAMS", "19456,2,1").try_into()?;
        let storage_backend = default_env("STORAGE_BACKEND", "memory");
        let database_url = optional_env("DATABASE_URL");

        Ok(Self {
            version: version()?,
            http_port,
            http_static_path,
            http_templates_path,
            external_base,
            catalog_path,
            token_signing_secret,
            token_signing_key_pem,
            token_verifying_key_pem,
            access_token_lifetime,
            password_min_length,
            password_hashing_params,
            storage_backend,
            database_url,
        })
    }
}

/// Get application version from build environment
pub fn version() -> Result<String> {
    option_env!("GIT_HASH")
        .or(option_env!("CARGO_PKG_VERSION"))
        .map(|val| val.to_string())
        .ok_or(ConfigError::VersionNotSet.into())
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| ConfigError::EnvVarRequired(name.to_string()).into())
}

pub(crate) fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn default_env(name: &str, default_value: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default_value.to_string())
}

impl TryFrom<String> for HttpPort {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            Ok(Self(8080))
        } else {
            value
                .parse::<u16>()
                .map(Self)
                .map_err(|err| ConfigError::PortParsingFailed(err).into())
        }
    }
}

impl AsRef<u16> for HttpPort {
    fn as_ref(&self) -> &u16 {
        &self.0
    }
}

impl TryFrom<Option<String>> for TokenSigningSecret {
    type Error = anyhow::Error;

    fn try_from(value: Option<String>) -> Result<Self, Self::Error> {
        match value {
            Some(value) if !value.is_empty() => {
                if value.len() < MIN_SIGNING_SECRET_LENGTH {
                    return Err(ConfigError::SigningKeyInvalid(format!(
                        "TOKEN_SIGNING_SECRET must be at least {MIN_SIGNING_SECRET_LENGTH} bytes"
                    ))
                    .into());
                }
                Ok(Self(value.into_bytes()))
            }
            _ => {
                // Tokens signed with a generated secret do not survive a restart.
                tracing::warn!("TOKEN_SIGNING_SECRET not set, generating an ephemeral secret");
                let mut secret = vec![0u8; MIN_SIGNING_SECRET_LENGTH];
                rand::thread_rng().fill_bytes(&mut secret);
                Ok(Self(secret))
            }
        }
    }
}

impl TryFrom<String> for TokenSigningSecret {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(Some(value))
    }
}

impl AsRef<[u8]> for TokenSigningSecret {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<String> for AccessTokenLifetime {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let duration = duration_str::parse(&value)
            .map_err(|e| ConfigError::DurationParsingFailed(value, e.to_string()))?;
        Ok(Self(chrono::Duration::from_std(duration)?))
    }
}

impl AsRef<chrono::Duration> for AccessTokenLifetime {
    fn as_ref(&self) -> &chrono::Duration {
        &self.0
    }
}

impl TryFrom<String> for PasswordMinLength {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value
            .trim()
            .parse::<usize>()
            .map(Self)
            .map_err(|err| ConfigError::NumberParsingFailed(value, err).into())
    }
}

impl AsRef<usize> for PasswordMinLength {
    fn as_ref(&self) -> &usize {
        &self.0
    }
}

impl TryFrom<String> for PasswordHashingParams {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let parts = value
            .split(',')
            .map(|s| s.trim())
            .map(|s| {
                s.parse::<u32>()
                    .map_err(|e| ConfigError::NumberParsingFailed(s.to_string(), e))
            })
            .collect::<Result<Vec<u32>, ConfigError>>()?;

        match parts.as_slice() {
            [memory_kib, iterations, parallelism] => Ok(Self {
                memory_kib: *memory_kib,
                iterations: *iterations,
                parallelism: *parallelism,
            }),
            _ => Err(ConfigError::PasswordHashingParamsInvalid(format!(
                "expected memory_kib,iterations,parallelism, got '{value}'"
            ))
            .into()),
        }
    }
}

impl Default for PasswordHashingParams {
    fn default() -> Self {
        Self {
            memory_kib: 19456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_token_lifetime_parsing() {
        let lifetime: AccessTokenLifetime = "1h".to_string().try_into().unwrap();
        assert_eq!(lifetime.as_ref().num_seconds(), 3600);

        let lifetime: AccessTokenLifetime = "90s".to_string().try_into().unwrap();
        assert_eq!(lifetime.as_ref().num_seconds(), 90);

        let invalid: Result<AccessTokenLifetime, _> = "soon".to_string().try_into();
        assert!(invalid.is_err());
    }

    #[test]
    fn test_token_signing_secret() {
        let generated = TokenSigningSecret::try_from(None).unwrap();
        assert_eq!(generated.as_ref().len(), MIN_SIGNING_SECRET_LENGTH);

        let short = TokenSigningSecret::try_from("too-short".to_string());
        assert!(short.is_err());

        let provided =
            TokenSigningSecret::try_from("0123456789abcdef0123456789abcdef".to_string()).unwrap();
        assert_eq!(provided.as_ref(), b"0123456789abcdef0123456789abcdef");
    }

    #[test]
    fn test_password_hashing_params() {
        let params: PasswordHashingParams = "19456, 2, 1".to_string().try_into().unwrap();
        assert_eq!(params, PasswordHashingParams::default());

        let missing: Result<PasswordHashingParams, _> = "19456,2".to_string().try_into();
        assert!(missing.is_err());

        let garbage: Result<PasswordHashingParams, _> = "a,b,c".to_string().try_into();
        assert!(garbage.is_err());
    }

    #[test]
    fn test_http_port() {
        let port: HttpPort = "".to_string().try_into().unwrap();
        assert_eq!(*port.as_ref(), 8080);

        let port: HttpPort = "3000".to_string().try_into().unwrap();
        assert_eq!(*port.as_ref(), 3000);

        assert!(HttpPort::try_from("99999".to_string()).is_err());
    }
}
