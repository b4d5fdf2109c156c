//! The capability boundary to the low-level OAuth exchange.

use crate::error::AuthResult;
use crate::token::TokenRecord;
use async_trait::async_trait;

/// Performs the interactive login and the silent refresh.
///
/// The orchestrator and gate depend on this abstractly; any concrete OAuth
/// client satisfies it, which lets tests substitute a fake without touching
/// a browser or the network. The production implementation is
/// [`crate::oauth::OauthClient`].
#[async_trait]
pub trait AuthPrimitive: Send + Sync {
    /// Run the full browser-mediated login.
    ///
    /// Suspends until the user completes the flow or it fails. A browser
    /// that cannot be opened surfaces as [`crate::AuthError::Browser`].
    async fn login(&self, oauth_host: &str, client_id: &str) -> AuthResult<TokenRecord>;

    /// Obtain a fresh record from a refresh token without user interaction.
    ///
    /// Rejection (expired/revoked refresh token, network failure) surfaces
    /// as [`crate::AuthError::RefreshFailed`].
    async fn refresh(&self, refresh_token: &str) -> AuthResult<TokenRecord>;
}
