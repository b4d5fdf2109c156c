//! Token lifecycle, the interactive login orchestrator, and the auth gate.
//!
//! [`ensure_auth`] is the single entry point commands pass through to obtain
//! a ready-to-use API client. Per invocation it takes exactly one of these
//! paths, all terminal:
//!
//! ```text
//! START -> HELP_EXIT
//!        | KEY_PROVIDED
//!        | NO_RECORD -> INTERACTIVE
//!        | VALID    -> REUSE
//!        | EXPIRED  -> REFRESH
//!        -> CLIENT_READY | FAILED
//! ```
//!
//! There is no retry loop within a single run.

use crate::error::{AuthError, AuthResult};
use crate::primitive::AuthPrimitive;
use crate::store::CredentialStore;
use crate::token::TokenRecord;
use nimbusctl_api::{ClientFactory, ClientOptions, IdentityApi};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Per-invocation authentication configuration.
///
/// Constructed from flags and environment at the start of a command, never
/// persisted, discarded at process exit.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Directory holding the credentials file.
    pub config_dir: PathBuf,
    /// OAuth authorization server.
    pub oauth_host: String,
    /// OAuth client identifier.
    pub client_id: String,
    /// Control-plane API base URL.
    pub api_host: String,
    /// Run the browser flow even in a non-interactive context.
    pub force_auth: bool,
    /// Resolved non-interactive (CI) signal.
    pub non_interactive: bool,
}

impl AuthContext {
    /// Build a context, resolving the non-interactive signal from the
    /// process environment.
    pub fn from_env(
        config_dir: PathBuf,
        oauth_host: String,
        client_id: String,
        api_host: String,
        force_auth: bool,
    ) -> Self {
        Self {
            config_dir,
            oauth_host,
            client_id,
            api_host,
            force_auth,
            non_interactive: crate::env::is_ci(),
        }
    }

    fn client_options(&self, api_key: String) -> ClientOptions {
        ClientOptions {
            api_key,
            api_host: self.api_host.clone(),
        }
    }
}

/// Input to [`ensure_auth`].
#[derive(Debug, Clone)]
pub struct EnsureAuthProps {
    /// Explicit API key from config, flag, or environment.
    pub api_key: Option<String>,
    /// Whether this invocation is a help request.
    pub help: bool,
    /// Raw command arguments, used only to detect whether a subcommand is
    /// being run.
    pub args: Vec<String>,
    /// Per-invocation auth configuration.
    pub context: AuthContext,
}

/// Decides whether a stored record is usable and refreshes it when not.
pub struct TokenLifecycle<'a, P: AuthPrimitive> {
    store: &'a CredentialStore,
    primitive: &'a P,
}

impl<'a, P: AuthPrimitive> TokenLifecycle<'a, P> {
    pub fn new(store: &'a CredentialStore, primitive: &'a P) -> Self {
        Self { store, primitive }
    }

    /// True iff the record has no expiry or the expiry is in the future.
    pub fn is_valid(&self, record: &TokenRecord) -> bool {
        record.is_valid_at(crate::current_time_ms())
    }

    /// Obtain a fresh record via the primitive and persist it.
    ///
    /// Failure surfaces as [`AuthError::RefreshFailed`] and is not retried;
    /// the caller decides whether to abort. There is no fallback to a full
    /// interactive login here; a refresh must never surprise the user with
    /// a browser window.
    pub async fn refresh(&self, record: &TokenRecord) -> AuthResult<TokenRecord> {
        let refresh_token = record.refresh_token.as_deref().ok_or_else(|| {
            AuthError::RefreshFailed("stored credentials have no refresh token".to_string())
        })?;

        let renewed = self.primitive.refresh(refresh_token).await?;
        self.store.save(&renewed).await?;
        debug!("Refreshed credentials persisted");
        Ok(renewed)
    }
}

/// Perform one complete interactive login.
///
/// Guards against non-interactive contexts, runs the browser flow, validates
/// the resulting token with an identity check, persists it, and returns the
/// access-token string. The token is persisted only after validation
/// succeeds, so the credentials file never holds a token that was never
/// confirmed usable.
pub async fn auth_flow<P, F>(
    context: &AuthContext,
    store: &CredentialStore,
    primitive: &P,
    factory: &F,
) -> AuthResult<String>
where
    P: AuthPrimitive,
    F: ClientFactory,
{
    if context.non_interactive && !context.force_auth {
        return Err(AuthError::CiBlocked);
    }

    info!("Starting interactive authentication");
    let record = primitive
        .login(&context.oauth_host, &context.client_id)
        .await?;

    let client = factory.make_client(context.client_options(record.access_token.clone()));
    let user = client
        .get_current_user_info()
        .await
        .map_err(|e| AuthError::ValidationFailed(e.to_string()))?;
    debug!(user_id = %user.id, "Token validated");

    store.save(&record).await?;
    info!("Saved credentials to {}", store.path().display());
    info!("Auth complete");

    Ok(record.access_token)
}

/// Resolve the cheapest path to a usable credential and hand back a
/// configured API client.
///
/// Returns `Ok(None)` for help requests and bare invocations, where no
/// client is needed. An unreadable credentials file is logged and treated
/// the same as a missing one. A failed refresh propagates rather than
/// falling back to an interactive login.
pub async fn ensure_auth<P, F>(
    props: &EnsureAuthProps,
    store: &CredentialStore,
    primitive: &P,
    factory: &F,
) -> AuthResult<Option<F::Client>>
where
    P: AuthPrimitive,
    F: ClientFactory,
{
    if props.help || props.args.is_empty() {
        return Ok(None);
    }

    let context = &props.context;

    if let Some(key) = props.api_key.as_deref().filter(|k| !k.is_empty()) {
        debug!("Using explicit API key");
        return Ok(Some(
            factory.make_client(context.client_options(key.to_string())),
        ));
    }

    let stored = match store.load().await {
        Ok(record) => record,
        Err(AuthError::Parse { path, message }) => {
            warn!(path = %path, error = %message, "Ignoring unreadable credentials file");
            None
        }
        Err(e) => return Err(e),
    };

    let lifecycle = TokenLifecycle::new(store, primitive);
    let access_token = match stored {
        None => auth_flow(context, store, primitive, factory).await?,
        Some(record) if lifecycle.is_valid(&record) => {
            debug!("Using stored credentials");
            record.access_token
        }
        Some(record) => {
            debug!("Stored credentials expired, refreshing");
            lifecycle.refresh(&record).await?.access_token
        }
    };

    Ok(Some(
        factory.make_client(context.client_options(access_token)),
    ))
}
