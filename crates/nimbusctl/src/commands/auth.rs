//! Authentication command handlers.

use clap::Subcommand;
use nimbusctl_api::ApiFactory;
use nimbusctl_auth::flow::{auth_flow, AuthContext};
use nimbusctl_auth::oauth::OauthClient;
use nimbusctl_auth::store::CredentialStore;

/// Authentication subcommands.
#[derive(Subcommand)]
pub enum AuthCommands {
    /// Log in via the browser
    Login {
        /// Run the browser flow even in a non-interactive context
        #[arg(long)]
        force_auth: bool,
    },
    /// Show authentication status
    Status,
    /// Remove stored credentials
    Logout,
}

/// Handle authentication commands.
pub async fn handle_auth(
    command: AuthCommands,
    context: &AuthContext,
    store: &CredentialStore,
) -> anyhow::Result<()> {
    match command {
        AuthCommands::Login { .. } => {
            let primitive = OauthClient::new(&context.oauth_host, &context.client_id);
            auth_flow(context, store, &primitive, &ApiFactory).await?;
            println!("✓ Logged in. Credentials saved to {}", store.path().display());
        }
        AuthCommands::Status => {
            auth_status(store).await?;
        }
        AuthCommands::Logout => {
            if store.remove().await? {
                println!("✓ Logged out.");
            } else {
                println!("No stored credentials.");
            }
        }
    }

    Ok(())
}

/// Show authentication status.
async fn auth_status(store: &CredentialStore) -> anyhow::Result<()> {
    println!("Credentials file: {}", store.path().display());

    let record = match store.load().await {
        Ok(Some(record)) => record,
        Ok(None) => {
            println!("Status: not authenticated (run: nimbusctl auth login)");
            return Ok(());
        }
        Err(e) => {
            println!("Status: unreadable credentials ({e})");
            return Ok(());
        }
    };

    let now = nimbusctl_auth::current_time_ms();
    let state = match record.expires_at {
        None => "valid (no expiry)".to_string(),
        Some(expires_at) if expires_at > now => {
            format!("valid for {} more minutes", (expires_at - now) / 60_000)
        }
        Some(_) => "expired (will refresh on next use)".to_string(),
    };

    println!("Token: {}", mask_token(&record.access_token));
    println!("Status: {state}");
    if record.refresh_token.is_none() {
        println!("Note: no refresh token; a new login will be needed after expiry.");
    }

    Ok(())
}

/// Mask a token for display.
///
/// Operates on characters, not bytes; tokens are opaque strings and may
/// contain multi-byte UTF-8.
fn mask_token(token: &str) -> String {
    let count = token.chars().count();
    if count <= 8 {
        return "*".repeat(count);
    }
    let prefix: String = token.chars().take(4).collect();
    let suffix: String = token.chars().skip(count - 4).collect();
    format!("{prefix}...{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_token_short() {
        assert_eq!(mask_token("abcd"), "****");
    }

    #[test]
    fn test_mask_token_long() {
        assert_eq!(mask_token("abcdefghijkl"), "abcd...ijkl");
    }

    #[test]
    fn test_mask_token_multibyte() {
        assert_eq!(mask_token("aéécdefghij"), "aééc...ghij");
        assert_eq!(mask_token("ééé"), "***");
    }
}
