//! Static client and scope registries loaded once at startup.
//!
//! The catalog holds the registered OAuth clients, the API scopes, and the
//! identity resources exposed by the provider. It is immutable after
//! construction and shared behind an `Arc`, so concurrent reads need no
//! synchronization.

use base64::prelude::*;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashMap, HashSet};
use subtle::ConstantTimeEq;

use crate::errors::{CatalogError, ConfigError};
use crate::oauth::types::GrantType;

/// SHA-256 digest of a client secret.
///
/// Serialized as standard base64, the same encoding produced by
/// `idp-admin hash-secret`.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretHash([u8; 32]);

impl SecretHash {
    /// Hash a plaintext client secret
    pub fn of(secret: &str) -> Self {
        Self(Sha256::digest(secret.as_bytes()).into())
    }

    /// Digest that no presented secret is expected to match.
    pub const fn unmatchable() -> Self {
        Self([0u8; 32])
    }

    /// Compare against a presented secret in constant time
    pub fn matches(&self, presented: &str) -> bool {
        let presented = Self::of(presented);
        self.0[..].ct_eq(&presented.0[..]).into()
    }

    pub fn to_base64(&self) -> String {
        BASE64_STANDARD.encode(self.0)
    }

    pub fn from_base64(value: &str) -> Result<Self, ConfigError> {
        let bytes = BASE64_STANDARD
            .decode(value.trim())
            .map_err(|e| ConfigError::CatalogLoadFailed(format!("invalid secret hash: {e}")))?;
        let digest: [u8; 32] = bytes.try_into().map_err(|_| {
            ConfigError::CatalogLoadFailed("secret hash must be a SHA-256 digest".to_string())
        })?;
        Ok(Self(digest))
    }
}

impl std::fmt::Debug for SecretHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretHash(..)")
    }
}

impl Serialize for SecretHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for SecretHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::from_base64(&value).map_err(serde::de::Error::custom)
    }
}

/// Registered OAuth client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    /// Unique client identifier
    pub client_id: String,
    /// Human readable client name
    #[serde(default)]
    pub client_name: Option<String>,
    /// SHA-256 digest of the client secret
    pub secret_hash: SecretHash,
    /// Grant types this client may use
    pub allowed_grant_types: HashSet<GrantType>,
    /// Scopes this client may be granted
    pub allowed_scopes: HashSet<String>,
    /// Redirect URIs for interactive clients
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

impl Client {
    pub fn allows_grant(&self, grant_type: GrantType) -> bool {
        self.allowed_grant_types.contains(&grant_type)
    }
}

/// Protected API scope
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApiScope {
    pub name: String,
    pub display_name: String,
}

/// Claim bundle exposed to authenticated end users
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityResource {
    pub name: String,
}

impl IdentityResource {
    /// The standard OpenID Connect `openid` resource
    pub fn openid() -> Self {
        Self {
            name: "openid".to_string(),
        }
    }
}

/// On-disk catalog document
#[derive(Debug, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    identity_resources: Vec<IdentityResource>,
    #[serde(default)]
    api_scopes: Vec<ApiScope>,
    #[serde(default)]
    clients: Vec<Client>,
}

/// Client registry and scope registry
#[derive(Debug)]
pub struct Catalog {
    clients: HashMap<String, Client>,
    api_scopes: Vec<ApiScope>,
    identity_resources: Vec<IdentityResource>,
}

impl Catalog {
    /// Build a catalog, rejecting clients that allow scopes the registry does not define
    pub fn new(
        identity_resources: Vec<IdentityResource>,
        api_scopes: Vec<ApiScope>,
        clients: Vec<Client>,
    ) -> Result<Self, ConfigError> {
        let known_scopes: HashSet<&str> = api_scopes
            .iter()
            .map(|s| s.name.as_str())
            .chain(identity_resources.iter().map(|r| r.name.as_str()))
            .collect();

        let mut registry = HashMap::with_capacity(clients.len());
        for client in clients {
            if let Some(scope) = client
                .allowed_scopes
                .iter()
                .find(|scope| !known_scopes.contains(scope.as_str()))
            {
                return Err(ConfigError::UndefinedClientScope {
                    client_id: client.client_id.clone(),
                    scope: scope.clone(),
                });
            }

            if registry.contains_key(&client.client_id) {
                return Err(ConfigError::DuplicateClient(client.client_id));
            }
            registry.insert(client.client_id.clone(), client);
        }

        Ok(Self {
            clients: registry,
            api_scopes,
            identity_resources,
        })
    }

    /// The built-in catalog: the `openid` identity resource, the `recipebookapi`
    /// scope, and the `recipebook` machine client.
    pub fn default_catalog() -> Result<Self, ConfigError> {
        Self::new(
            vec![IdentityResource::openid()],
            vec![ApiScope {
                name: "recipebookapi".to_string(),
                display_name: "RecipeBookApi".to_string(),
            }],
            vec![Client {
                client_id: "recipebook".to_string(),
                client_name: None,
                secret_hash: SecretHash::of("secret"),
                allowed_grant_types: HashSet::from([GrantType::ClientCredentials]),
                allowed_scopes: HashSet::from(["recipebookapi".to_string()]),
                redirect_uris: Vec::new(),
            }],
        )
    }

    /// Parse a JSON catalog document
    pub fn from_json(document: &str) -> Result<Self, ConfigError> {
        let document: CatalogDocument = serde_json::from_str(document)
            .map_err(|e| ConfigError::CatalogLoadFailed(e.to_string()))?;
        Self::new(
            document.identity_resources,
            document.api_scopes,
            document.clients,
        )
    }

    /// Load the catalog from `path`, or fall back to the built-in catalog
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                let document = std::fs::read_to_string(path)
                    .map_err(|e| ConfigError::CatalogLoadFailed(format!("{path}: {e}")))?;
                Self::from_json(&document)
            }
            None => Self::default_catalog(),
        }
    }

    /// Retrieve a client by ID
    pub fn find_client(&self, client_id: &str) -> Result<&Client, CatalogError> {
        self.clients
            .get(client_id)
            .ok_or_else(|| CatalogError::ClientNotFound(client_id.to_string()))
    }

    pub fn list_scopes(&self) -> &[ApiScope] {
        &self.api_scopes
    }

    pub fn identity_resources(&self) -> &[IdentityResource] {
        &self.identity_resources
    }

    /// Identity resource and API scope names, sorted and de-duplicated
    pub fn supported_scopes(&self) -> Vec<String> {
        self.identity_resources
            .iter()
            .map(|r| r.name.clone())
            .chain(self.api_scopes.iter().map(|s| s.name.clone()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog() {
        let catalog = Catalog::default_catalog().unwrap();

        let client = catalog.find_client("recipebook").unwrap();
        assert!(client.allows_grant(GrantType::ClientCredentials));
        assert!(!client.allows_grant(GrantType::AuthorizationCode));
        assert!(client.secret_hash.matches("secret"));
        assert!(!client.secret_hash.matches("Secret"));

        assert_eq!(catalog.list_scopes().len(), 1);
        assert_eq!(catalog.list_scopes()[0].display_name, "RecipeBookApi");
        assert_eq!(catalog.identity_resources(), &[IdentityResource::openid()]);
        assert_eq!(catalog.supported_scopes(), vec!["openid", "recipebookapi"]);
    }

    #[test]
    fn test_find_client_not_found() {
        let catalog = Catalog::default_catalog().unwrap();
        assert!(matches!(
            catalog.find_client("nobody"),
            Err(CatalogError::ClientNotFound(id)) if id == "nobody"
        ));
    }

    #[test]
    fn test_undefined_client_scope_rejected() {
        let result = Catalog::new(
            vec![],
            vec![ApiScope {
                name: "read".to_string(),
                display_name: "Read".to_string(),
            }],
            vec![Client {
                client_id: "svc".to_string(),
                client_name: None,
                secret_hash: SecretHash::of("s"),
                allowed_grant_types: HashSet::from([GrantType::ClientCredentials]),
                allowed_scopes: HashSet::from(["read".to_string(), "write".to_string()]),
                redirect_uris: vec![],
            }],
        );

        match result {
            Err(ConfigError::UndefinedClientScope { client_id, scope }) => {
                assert_eq!(client_id, "svc");
                assert_eq!(scope, "write");
            }
            other => panic!("expected UndefinedClientScope, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_client_rejected() {
        let client = Client {
            client_id: "svc".to_string(),
            client_name: None,
            secret_hash: SecretHash::of("s"),
            allowed_grant_types: HashSet::from([GrantType::ClientCredentials]),
            allowed_scopes: HashSet::new(),
            redirect_uris: vec![],
        };
        let result = Catalog::new(vec![], vec![], vec![client.clone(), client]);
        assert!(matches!(result, Err(ConfigError::DuplicateClient(id)) if id == "svc"));
    }

    #[test]
    fn test_catalog_from_json() {
        let document = serde_json::json!({
            "identity_resources": [{ "name": "openid" }],
            "api_scopes": [
                { "name": "recipes.read", "display_name": "Read recipes" },
                { "name": "recipes.write", "display_name": "Write recipes" }
            ],
            "clients": [{
                "client_id": "importer",
                "client_name": "Recipe importer",
                "secret_hash": SecretHash::of("importer-secret").to_base64(),
                "allowed_grant_types": ["client_credentials"],
                "allowed_scopes": ["recipes.read", "recipes.write"]
            }]
        });

        let catalog = Catalog::from_json(&document.to_string()).unwrap();
        let client = catalog.find_client("importer").unwrap();
        assert!(client.secret_hash.matches("importer-secret"));
        assert_eq!(client.allowed_scopes.len(), 2);
        assert!(client.redirect_uris.is_empty());
        assert_eq!(catalog.client_count(), 1);
    }

    #[test]
    fn test_secret_hash_base64() {
        // Same encoding as the original configuration's hashed secrets.
        let hash = SecretHash::of("secret");
        assert_eq!(
            hash.to_base64(),
            "K7gNU3sdo+OL0wNhqoVWhr3g6s1xYv72ol/pe/Unols="
        );
        assert_eq!(SecretHash::from_base64(&hash.to_base64()).unwrap(), hash);
        assert!(SecretHash::from_base64("c2hvcnQ=").is_err());
        assert!(!SecretHash::unmatchable().matches(""));
    }
}
