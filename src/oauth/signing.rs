//! Access token signing behind a small trait so the algorithm can be swapped.

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config::Config;
use crate::errors::{ConfigError, TokenError};
use crate::oauth::types::parse_scope;

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Issuer (external base URL)
    pub iss: String,
    /// Subject; the client id for client credentials tokens
    pub sub: String,
    pub client_id: String,
    /// Space separated granted scopes
    pub scope: String,
    /// Issued at, seconds since the epoch
    pub iat: i64,
    /// Expiry, seconds since the epoch
    pub exp: i64,
    /// Unique token identifier
    pub jti: String,
}

impl AccessTokenClaims {
    pub fn scopes(&self) -> HashSet<String> {
        parse_scope(&self.scope)
    }
}

/// Signs and verifies access tokens
pub trait TokenSigner: Send + Sync {
    /// JOSE algorithm name, e.g. `HS256`
    fn algorithm(&self) -> &'static str;

    fn sign(&self, claims: &AccessTokenClaims) -> Result<String, TokenError>;

    /// Check signature, issuer, and expiry, returning the claims
    fn verify(&self, token: &str, issuer: &str) -> Result<AccessTokenClaims, TokenError>;
}

/// JWT signer backed by `jsonwebtoken`
pub struct JwtSigner {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtSigner {
    /// HMAC-SHA256 with a shared secret
    pub fn hs256(secret: &[u8]) -> Self {
        Self {
            algorithm: Algorithm::HS256,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// ECDSA P-256 from a PKCS#8 private key and SPKI public key, both PEM encoded
    pub fn es256_pem(private_pem: &[u8], public_pem: &[u8]) -> Result<Self, ConfigError> {
        let encoding_key = EncodingKey::from_ec_pem(private_pem)
            .map_err(|e| ConfigError::SigningKeyInvalid(format!("private key: {e}")))?;
        let decoding_key = DecodingKey::from_ec_pem(public_pem)
            .map_err(|e| ConfigError::SigningKeyInvalid(format!("public key: {e}")))?;
        Ok(Self {
            algorithm: Algorithm::ES256,
            encoding_key,
            decoding_key,
        })
    }

    /// ES256 when both PEM paths are configured, HS256 with the shared secret otherwise
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        match (
            config.token_signing_key_pem.as_deref(),
            config.token_verifying_key_pem.as_deref(),
        ) {
            (Some(private_path), Some(public_path)) => {
                let private_pem = std::fs::read(private_path)
                    .map_err(|e| ConfigError::SigningKeyInvalid(format!("{private_path}: {e}")))?;
                let public_pem = std::fs::read(public_path)
                    .map_err(|e| ConfigError::SigningKeyInvalid(format!("{public_path}: {e}")))?;
                tracing::info!("signing access tokens with ES256");
                Self::es256_pem(&private_pem, &public_pem)
            }
            (None, None) => {
                tracing::info!("signing access tokens with HS256");
                Ok(Self::hs256(config.token_signing_secret.as_ref()))
            }
            _ => Err(ConfigError::SigningKeyInvalid(
                "TOKEN_SIGNING_KEY_PEM and TOKEN_VERIFYING_KEY_PEM must be set together"
                    .to_string(),
            )),
        }
    }
}

impl TokenSigner for JwtSigner {
    fn algorithm(&self) -> &'static str {
        match self.algorithm {
            Algorithm::ES256 => "ES256",
            _ => "HS256",
        }
    }

    fn sign(&self, claims: &AccessTokenClaims) -> Result<String, TokenError> {
        let mut header = Header::new(self.algorithm);
        header.typ = Some("at+jwt".to_string());
        encode(&header, claims, &self.encoding_key)
            .map_err(|e| TokenError::SigningFailed(e.to_string()))
    }

    fn verify(&self, token: &str, issuer: &str) -> Result<AccessTokenClaims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.set_issuer(&[issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = 0;

        decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::InvalidToken(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    fn claims(exp_offset: i64) -> AccessTokenClaims {
        let now = Utc::now().timestamp();
        AccessTokenClaims {
            iss: "https://idp.example".to_string(),
            sub: "recipebook".to_string(),
            client_id: "recipebook".to_string(),
            scope: "recipebookapi".to_string(),
            iat: now,
            exp: now + exp_offset,
            jti: "01J9Z3T4V5W6X7Y8Z9A0B1C2D3".to_string(),
        }
    }

    #[test]
    fn test_hs256_sign_and_verify() {
        let signer = JwtSigner::hs256(SECRET);
        assert_eq!(signer.algorithm(), "HS256");

        let claims = claims(3600);
        let token = signer.sign(&claims).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let verified = signer.verify(&token, "https://idp.example").unwrap();
        assert_eq!(verified, claims);
        assert!(verified.scopes().contains("recipebookapi"));
    }

    #[test]
    fn test_verify_rejects_other_key_and_issuer() {
        let token = JwtSigner::hs256(SECRET).sign(&claims(3600)).unwrap();

        let other = JwtSigner::hs256(b"fedcba9876543210fedcba9876543210");
        assert!(matches!(
            other.verify(&token, "https://idp.example"),
            Err(TokenError::InvalidToken(_))
        ));

        let signer = JwtSigner::hs256(SECRET);
        assert!(matches!(
            signer.verify(&token, "https://elsewhere.example"),
            Err(TokenError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let signer = JwtSigner::hs256(SECRET);
        let token = signer.sign(&claims(-120)).unwrap();
        assert!(matches!(
            signer.verify(&token, "https://idp.example"),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_es256_rejects_garbage_pem() {
        let result = JwtSigner::es256_pem(b"not a key", b"not a key either");
        assert!(matches!(result, Err(ConfigError::SigningKeyInvalid(_))));
    }
}
