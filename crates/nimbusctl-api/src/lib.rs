//! Nimbus control-plane API client.
//!
//! This crate is the boundary between nimbusctl and the hosted service. It
//! exposes a concrete reqwest-based [`Api`] client plus the small traits
//! ([`IdentityApi`], [`ClientFactory`]) the auth subsystem depends on, so
//! flows can be exercised in tests without any network.
//!
//! # Example
//!
//! ```no_run
//! use nimbusctl_api::{Api, ClientOptions, IdentityApi};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api = Api::new(ClientOptions {
//!         api_key: "nbs_...".to_string(),
//!         api_host: "https://api.nimbus.dev/v1".to_string(),
//!     });
//!     let user = api.get_current_user_info().await?;
//!     println!("logged in as {}", user.id);
//!     Ok(())
//! }
//! ```

mod client;
mod error;

pub use client::{Api, ApiFactory, Branch, CurrentUserInfo, Project};
pub use error::{ApiError, ApiResult};

use async_trait::async_trait;

/// Options used to construct an API client.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientOptions {
    /// Bearer credential presented to the service (API key or access token).
    pub api_key: String,
    /// Base URL of the control-plane API.
    pub api_host: String,
}

/// The lightweight identity check used to validate a credential.
#[async_trait]
pub trait IdentityApi: Send + Sync {
    /// Fetch the identity of the authenticated user.
    async fn get_current_user_info(&self) -> ApiResult<CurrentUserInfo>;
}

/// Constructs API clients from resolved credentials.
///
/// The auth gate depends on this abstractly so tests can observe which
/// credentials a flow resolved without constructing real HTTP clients.
pub trait ClientFactory: Send + Sync {
    /// The client type produced by this factory.
    type Client: IdentityApi;

    /// Build a client bound to the given key and host.
    fn make_client(&self, options: ClientOptions) -> Self::Client;
}
