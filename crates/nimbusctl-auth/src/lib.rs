//! Authentication and credential lifecycle for nimbusctl.
//!
//! Every command invocation passes through [`flow::ensure_auth`], which
//! resolves the cheapest path to a usable bearer credential: an explicit API
//! key, a cached token that is still valid, a silent refresh, or a full
//! browser-based login. Credentials persist between invocations in a single
//! JSON file with owner-only permissions.
//!
//! # Storage Location
//!
//! `{config_dir}/credentials.json`, where the config directory defaults to
//! the platform config dir (e.g. `~/.config/nimbusctl` on Linux).
//!
//! # Example
//!
//! ```no_run
//! use nimbusctl_api::ApiFactory;
//! use nimbusctl_auth::flow::{ensure_auth, AuthContext, EnsureAuthProps};
//! use nimbusctl_auth::oauth::OauthClient;
//! use nimbusctl_auth::store::CredentialStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let context = AuthContext::from_env(
//!         nimbusctl_auth::default_config_dir(),
//!         "https://oauth.nimbus.dev".to_string(),
//!         "nimbusctl".to_string(),
//!         "https://api.nimbus.dev/v1".to_string(),
//!         false,
//!     );
//!     let props = EnsureAuthProps {
//!         api_key: None,
//!         help: false,
//!         args: vec!["projects".to_string()],
//!         context,
//!     };
//!     let store = CredentialStore::new(&props.context.config_dir);
//!     let client = ensure_auth(&props, &store, &OauthClient::default(), &ApiFactory).await?;
//!     Ok(())
//! }
//! ```

pub mod env;
pub mod error;
pub mod flow;
pub mod oauth;
pub mod primitive;
pub mod store;
pub mod token;

pub use error::{AuthError, AuthResult};
pub use token::TokenRecord;

/// Default config directory for the current platform.
///
/// Falls back to `.nimbusctl` in the working directory if the platform
/// config dir cannot be determined.
pub fn default_config_dir() -> std::path::PathBuf {
    dirs::config_dir()
        .map(|p| p.join("nimbusctl"))
        .unwrap_or_else(|| std::path::PathBuf::from(".nimbusctl"))
}

/// Current time in milliseconds since the Unix epoch.
pub fn current_time_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
