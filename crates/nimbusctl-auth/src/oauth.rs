//! OAuth 2.0 authorization-code client with PKCE.
//!
//! Implements the concrete [`AuthPrimitive`]: a browser-mediated login that
//! listens for the redirect on a loopback port, and a silent refresh against
//! the token endpoint.

use crate::error::{AuthError, AuthResult};
use crate::primitive::AuthPrimitive;
use crate::token::TokenRecord;
use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::Rng;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

/// Loopback port the browser is redirected back to.
pub const CALLBACK_PORT: u16 = 63315;

/// Path of the loopback redirect.
pub const CALLBACK_PATH: &str = "/callback";

/// Scopes requested during login.
const SCOPES: &str = "openid offline_access";

/// How long to wait for the user to complete the browser flow.
const CALLBACK_TIMEOUT: tokio::time::Duration = tokio::time::Duration::from_secs(5 * 60);

const HTML_SUCCESS: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>nimbusctl - Authorization Successful</title>
</head>
<body>
  <h1>Authorization Successful</h1>
  <p>You can close this window and return to your terminal.</p>
  <script>setTimeout(() => window.close(), 2000);</script>
</body>
</html>"#;

fn html_error(error: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <title>nimbusctl - Authorization Failed</title>
</head>
<body>
  <h1>Authorization Failed</h1>
  <p>{}</p>
</body>
</html>"#,
        html_escape(error)
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Token-endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    /// Lifetime in seconds from issuance.
    expires_in: Option<u64>,
}

impl TokenResponse {
    fn into_record(self, now_ms: u64) -> TokenRecord {
        let mut record = TokenRecord::bearer(self.access_token);
        record.refresh_token = self.refresh_token;
        record.expires_at = self.expires_in.map(|secs| now_ms + secs * 1000);
        record
    }
}

/// Concrete OAuth client performing the browser login and silent refresh.
#[derive(Debug, Clone)]
pub struct OauthClient {
    http: reqwest::Client,
    oauth_host: String,
    client_id: String,
}

impl OauthClient {
    pub fn new(oauth_host: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            oauth_host: oauth_host.into().trim_end_matches('/').to_string(),
            client_id: client_id.into(),
        }
    }

    fn redirect_uri() -> String {
        format!("http://127.0.0.1:{CALLBACK_PORT}{CALLBACK_PATH}")
    }

    fn token_endpoint(&self, oauth_host: &str) -> String {
        format!("{}/oauth2/token", oauth_host.trim_end_matches('/'))
    }

    /// Generate a PKCE code verifier.
    pub fn generate_code_verifier() -> String {
        let mut rng = rand::thread_rng();
        let bytes: Vec<u8> = (0..32).map(|_| rng.gen()).collect();
        URL_SAFE_NO_PAD.encode(&bytes)
    }

    /// Derive the PKCE code challenge from a verifier.
    pub fn generate_code_challenge(verifier: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }

    /// Generate the OAuth state parameter.
    pub fn generate_state() -> String {
        let mut rng = rand::thread_rng();
        let bytes: Vec<u8> = (0..16).map(|_| rng.gen()).collect();
        URL_SAFE_NO_PAD.encode(&bytes)
    }

    async fn request_tokens(&self, endpoint: &str, params: &[(&str, &str)]) -> AuthResult<TokenResponse> {
        let response = self
            .http
            .post(endpoint)
            .form(params)
            .send()
            .await
            .map_err(|e| AuthError::LoginFailed(format!("token request failed: {e}")))?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AuthError::LoginFailed(format!("token exchange rejected: {text}")));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| AuthError::LoginFailed(format!("invalid token response: {e}")))
    }
}

impl Default for OauthClient {
    fn default() -> Self {
        Self::new("https://oauth.nimbus.dev", "nimbusctl")
    }
}

#[async_trait]
impl AuthPrimitive for OauthClient {
    async fn login(&self, oauth_host: &str, client_id: &str) -> AuthResult<TokenRecord> {
        let verifier = Self::generate_code_verifier();
        let challenge = Self::generate_code_challenge(&verifier);
        let state = Self::generate_state();
        let redirect_uri = Self::redirect_uri();

        // Bind before opening the browser so the redirect has somewhere to
        // land.
        let listener = TcpListener::bind(("127.0.0.1", CALLBACK_PORT))
            .await
            .map_err(|e| {
                AuthError::LoginFailed(format!(
                    "could not listen on 127.0.0.1:{CALLBACK_PORT} for the OAuth redirect: {e}"
                ))
            })?;

        let url = build_authorize_url(
            oauth_host,
            client_id,
            &redirect_uri,
            SCOPES,
            &state,
            &challenge,
        );

        info!("Awaiting authentication in web browser.");
        info!("If the browser does not open, visit:\n  {url}");

        open::that(&url).map_err(|e| {
            warn!(error = %e, "Browser launch failed");
            AuthError::Browser
        })?;

        let code = tokio::time::timeout(CALLBACK_TIMEOUT, wait_for_code(listener, &state))
            .await
            .map_err(|_| {
                AuthError::LoginFailed("timed out waiting for the browser flow".to_string())
            })??;

        debug!("Authorization code received, exchanging for tokens");

        let response = self
            .request_tokens(
                &self.token_endpoint(oauth_host),
                &[
                    ("grant_type", "authorization_code"),
                    ("code", &code),
                    ("redirect_uri", &redirect_uri),
                    ("client_id", client_id),
                    ("code_verifier", &verifier),
                ],
            )
            .await?;

        Ok(response.into_record(crate::current_time_ms()))
    }

    async fn refresh(&self, refresh_token: &str) -> AuthResult<TokenRecord> {
        debug!("Refreshing token");

        let response = self
            .http
            .post(&self.token_endpoint(&self.oauth_host))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", self.client_id.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AuthError::RefreshFailed(e.to_string()))?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AuthError::RefreshFailed(text));
        }

        let response = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| AuthError::RefreshFailed(format!("invalid refresh response: {e}")))?;

        Ok(response.into_record(crate::current_time_ms()))
    }
}

/// Build the authorization URL for the browser.
pub fn build_authorize_url(
    oauth_host: &str,
    client_id: &str,
    redirect_uri: &str,
    scope: &str,
    state: &str,
    code_challenge: &str,
) -> String {
    format!(
        "{}/oauth2/auth?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}&code_challenge={}&code_challenge_method=S256",
        oauth_host.trim_end_matches('/'),
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(scope),
        urlencoding::encode(state),
        urlencoding::encode(code_challenge),
    )
}

/// Accept loopback connections until the redirect matching `expected_state`
/// arrives, then return its authorization code.
async fn wait_for_code(listener: TcpListener, expected_state: &str) -> AuthResult<String> {
    loop {
        let (stream, _) = listener
            .accept()
            .await
            .map_err(|e| AuthError::LoginFailed(format!("callback accept failed: {e}")))?;

        match handle_connection(stream, expected_state).await {
            Ok(Some(code)) => return Ok(code),
            Ok(None) => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Handle one HTTP connection on the callback listener.
///
/// Returns `Ok(Some(code))` for a matching redirect, `Ok(None)` for
/// unrelated requests (favicon probes, stale state), and `Err` when the
/// provider reported an authorization error.
async fn handle_connection(mut stream: TcpStream, expected_state: &str) -> AuthResult<Option<String>> {
    let mut buffer = [0u8; 4096];
    let n = stream
        .read(&mut buffer)
        .await
        .map_err(|e| AuthError::LoginFailed(format!("failed to read callback request: {e}")))?;

    let request = String::from_utf8_lossy(&buffer[..n]);
    let first_line = request.lines().next().unwrap_or("");
    let parts: Vec<&str> = first_line.split_whitespace().collect();

    if parts.len() < 2 {
        respond(&mut stream, 400, "text/plain", "Bad Request").await;
        return Ok(None);
    }

    let url = format!("http://127.0.0.1{}", parts[1]);
    let parsed = match url::Url::parse(&url) {
        Ok(u) => u,
        Err(_) => {
            respond(&mut stream, 400, "text/plain", "Invalid URL").await;
            return Ok(None);
        }
    };

    if parsed.path() != CALLBACK_PATH {
        respond(&mut stream, 404, "text/plain", "Not Found").await;
        return Ok(None);
    }

    let params: HashMap<String, String> = parsed
        .query_pairs()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    if let Some(err) = params.get("error") {
        let message = params
            .get("error_description")
            .cloned()
            .unwrap_or_else(|| err.clone());
        respond(&mut stream, 200, "text/html", &html_error(&message)).await;
        return Err(AuthError::LoginFailed(message));
    }

    if params.get("state").map(String::as_str) != Some(expected_state) {
        warn!("OAuth callback with missing or mismatched state parameter");
        let html = html_error("Invalid state parameter");
        respond(&mut stream, 400, "text/html", &html).await;
        return Ok(None);
    }

    match params.get("code") {
        Some(code) => {
            respond(&mut stream, 200, "text/html", HTML_SUCCESS).await;
            Ok(Some(code.clone()))
        }
        None => {
            let html = html_error("No authorization code provided");
            respond(&mut stream, 400, "text/html", &html).await;
            Ok(None)
        }
    }
}

async fn respond(stream: &mut TcpStream, status: u16, content_type: &str, body: &str) {
    let status_text = match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        _ => "Unknown",
    };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        status_text,
        content_type,
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await.ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_verifier_length_and_uniqueness() {
        let a = OauthClient::generate_code_verifier();
        let b = OauthClient::generate_code_verifier();
        // Base64url encoded 32 bytes = 43 characters
        assert!(a.len() >= 40);
        assert_ne!(a, b);
    }

    #[test]
    fn test_code_challenge_deterministic() {
        let verifier = "test_verifier_12345678901234567890";
        let c1 = OauthClient::generate_code_challenge(verifier);
        let c2 = OauthClient::generate_code_challenge(verifier);
        assert_eq!(c1, c2);
        // Base64url encoded SHA256 = 43 characters
        assert_eq!(c1.len(), 43);
    }

    #[test]
    fn test_build_authorize_url() {
        let url = build_authorize_url(
            "https://oauth.nimbus.dev/",
            "nimbusctl",
            "http://127.0.0.1:63315/callback",
            "openid offline_access",
            "state123",
            "challenge123",
        );

        assert!(url.starts_with("https://oauth.nimbus.dev/oauth2/auth?"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("client_id=nimbusctl"));
        assert!(url.contains("scope=openid%20offline_access"));
        assert!(url.contains("code_challenge_method=S256"));
    }

    #[test]
    fn test_token_response_expiry_conversion() {
        let response = TokenResponse {
            access_token: "tok".to_string(),
            refresh_token: Some("ref".to_string()),
            expires_in: Some(3600),
        };
        let record = response.into_record(1_000_000);
        assert_eq!(record.access_token, "tok");
        assert_eq!(record.refresh_token, Some("ref".to_string()));
        assert_eq!(record.expires_at, Some(1_000_000 + 3_600_000));
    }

    #[test]
    fn test_token_response_without_expiry() {
        let response = TokenResponse {
            access_token: "tok".to_string(),
            refresh_token: None,
            expires_in: None,
        };
        let record = response.into_record(1_000_000);
        assert_eq!(record.expires_at, None);
        assert!(record.is_valid_at(u64::MAX));
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("<script>"), "&lt;script&gt;");
        assert_eq!(html_escape("a & b"), "a &amp; b");
        assert_eq!(html_escape("it's"), "it&#39;s");
    }

    #[test]
    fn test_redirect_uri_uses_loopback() {
        let uri = OauthClient::redirect_uri();
        assert!(uri.contains("127.0.0.1"));
        assert!(uri.ends_with(CALLBACK_PATH));
    }
}
