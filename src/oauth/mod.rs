//! OAuth 2.0 client credentials issuance, the client and scope catalog, and
//! interactive authorization contexts.

pub mod catalog;
pub mod interaction;
pub mod signing;
pub mod token_issuer;
pub mod types;

// Re-export frequently used items from each module
pub use catalog::{ApiScope, Catalog, Client, IdentityResource, SecretHash};
pub use interaction::{
    AuthorizationContext, AuthorizationError, CatalogInteractionService, InteractionService,
    is_local_url,
};
pub use signing::{AccessTokenClaims, JwtSigner, TokenSigner};
pub use token_issuer::{ClientAuthentication, IssuedToken, TokenIssuer, extract_client_auth};
pub use types::{
    GrantType, OAuthErrorResponse, TokenForm, TokenRequest, TokenResponse, TokenType, parse_scope,
};
