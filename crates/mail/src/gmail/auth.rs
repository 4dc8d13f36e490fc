//! Gmail OAuth2 authentication
//!
//! Implements OAuth2 authorization code flow for Gmail API authentication.
//! Uses a local HTTP server to receive the OAuth callback.
//! Uses synchronous HTTP (ureq) to be executor-agnostic.
//!
//! The cached token file is a read-only fast path: it is written at most
//! once, after the first successful authorization, and only when
//! [`AuthConfig::write_token`] is set and no token file exists yet.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::config::{AuthConfig, GmailCredentials};

/// OAuth2 configuration and token management for Gmail
pub struct GmailAuth {
    client_id: String,
    client_secret: String,
    scopes: Vec<String>,
    token_path: PathBuf,
    write_token: bool,
    /// Token obtained during this process
    current: Mutex<Option<StoredToken>>,
}

/// Stored token data
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredToken {
    /// `token` is the field name used by Google's authorized-user files
    #[serde(alias = "token")]
    access_token: String,
    refresh_token: Option<String>,
    #[serde(default)]
    expires_at: Option<i64>,
}

impl StoredToken {
    fn from_response(token: TokenResponse) -> Self {
        Self {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: token
                .expires_in
                .map(|d| chrono::Utc::now().timestamp() + d as i64),
        }
    }

    /// Valid with a 5 minute buffer
    fn is_fresh(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at > chrono::Utc::now().timestamp() + 300)
    }
}

/// Token response from Google
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
    #[allow(dead_code)]
    token_type: String,
}

impl GmailAuth {
    /// Gmail API OAuth2 endpoints
    const AUTH_URL: &'static str = "https://accounts.google.com/o/oauth2/v2/auth";
    const TOKEN_URL: &'static str = "https://oauth2.googleapis.com/token";

    /// Port range to try for local OAuth callback server
    const PORT_RANGE_START: u16 = 8080;
    const PORT_RANGE_END: u16 = 8090;

    /// Create a new GmailAuth instance
    ///
    /// # Arguments
    /// * `credentials` - OAuth2 client ID and secret from Google Cloud Console
    /// * `config` - Scopes and token file settings resolved at startup
    pub fn new(credentials: GmailCredentials, config: &AuthConfig) -> Self {
        Self {
            client_id: credentials.client_id,
            client_secret: credentials.client_secret,
            scopes: config.scopes.clone(),
            token_path: config.token_path.clone(),
            write_token: config.write_token,
            current: Mutex::new(None),
        }
    }

    /// Load credentials from the configured path and build a GmailAuth
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        let credentials = config.credentials()?;
        Ok(Self::new(credentials, config))
    }

    /// Get a valid access token, refreshing or re-authenticating as needed
    pub fn get_access_token(&self) -> Result<String> {
        let mut current = self
            .current
            .lock()
            .map_err(|_| anyhow::anyhow!("Token cache poisoned"))?;

        if let Some(token) = current.as_ref()
            && token.is_fresh()
        {
            return Ok(token.access_token.clone());
        }

        // Refresh the token we already hold before touching disk
        if let Some(refresh_token) = current.as_ref().and_then(|t| t.refresh_token.clone())
            && let Ok(new_token) = self.refresh_access_token(&refresh_token)
        {
            let stored = StoredToken::from_response(new_token);
            let access_token = stored.access_token.clone();
            *current = Some(stored);
            return Ok(access_token);
        }

        // Try the cached token file
        if let Ok(token) = self.load_token() {
            if token.is_fresh() {
                debug!("Using cached token from {}", self.token_path.display());
                let access_token = token.access_token.clone();
                *current = Some(token);
                return Ok(access_token);
            }

            if let Some(refresh_token) = &token.refresh_token
                && let Ok(new_token) = self.refresh_access_token(refresh_token)
            {
                debug!("Refreshed cached token");
                let stored = StoredToken::from_response(new_token);
                let access_token = stored.access_token.clone();
                *current = Some(stored);
                return Ok(access_token);
            }
        }

        // Need to authenticate from scratch
        let token = StoredToken::from_response(self.authorization_code_auth()?);
        if self.write_token && !self.token_path.exists() {
            if let Err(e) = self.save_token(&token) {
                warn!("Error writing token: {:#}", e);
                eprintln!("Error writing token: {:#}", e);
            } else {
                info!("Saved token to {}", self.token_path.display());
            }
        }
        let access_token = token.access_token.clone();
        *current = Some(token);
        Ok(access_token)
    }

    /// Build the URL the user visits to grant access
    fn authorization_url(&self, redirect_uri: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}\
             &access_type=offline&prompt=consent",
            Self::AUTH_URL,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&self.scopes.join(" ")),
        )
    }

    /// Perform authorization code flow authentication
    fn authorization_code_auth(&self) -> Result<TokenResponse> {
        // Step 1: Start local server to receive callback
        let (listener, port) = self.start_local_server()?;
        let redirect_uri = format!("http://localhost:{}", port);

        // Step 2: Build authorization URL
        let auth_url = self.authorization_url(&redirect_uri);

        println!("\n=== Gmail Authentication Required ===");
        println!("Opening browser for authentication...");
        println!("If the browser doesn't open, visit: {}", auth_url);

        if let Err(e) = open::that(&auth_url) {
            eprintln!("Failed to open browser: {}. Please open the URL manually.", e);
        }

        // Step 3: Wait for callback with authorization code
        println!("Waiting for authorization...");
        let code = self.wait_for_callback(listener)?;

        // Step 4: Exchange code for tokens
        println!("Exchanging authorization code for tokens...");
        let mut response = ureq::post(Self::TOKEN_URL)
            .send_form([
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code.as_str()),
                ("grant_type", "authorization_code"),
                ("redirect_uri", redirect_uri.as_str()),
            ])
            .context("Failed to exchange authorization code")?;

        let token: TokenResponse = response
            .body_mut()
            .read_json()
            .context("Failed to parse token response")?;

        println!("Authentication successful!\n");
        Ok(token)
    }

    /// Start a local TCP server on an available port
    fn start_local_server(&self) -> Result<(TcpListener, u16)> {
        for port in Self::PORT_RANGE_START..=Self::PORT_RANGE_END {
            if let Ok(listener) = TcpListener::bind(format!("127.0.0.1:{}", port)) {
                return Ok((listener, port));
            }
        }
        anyhow::bail!(
            "Could not bind to any port in range {}-{}",
            Self::PORT_RANGE_START,
            Self::PORT_RANGE_END
        )
    }

    /// Wait for OAuth callback and extract authorization code
    fn wait_for_callback(&self, listener: TcpListener) -> Result<String> {
        let (mut stream, _) = listener.accept().context("Failed to accept connection")?;

        let mut reader = BufReader::new(&stream);
        let mut request_line = String::new();
        reader
            .read_line(&mut request_line)
            .context("Failed to read request")?;

        // Format: GET /?code=AUTH_CODE&scope=... HTTP/1.1
        let code = callback_param(&request_line, "code");
        let error = callback_param(&request_line, "error");

        // Send response to browser
        let (status, body) = if code.is_some() {
            ("200 OK", "Authentication successful! You can close this window.")
        } else {
            ("400 Bad Request", "Authentication failed. Please try again.")
        };

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n\
             <html><body><h1>{}</h1></body></html>",
            status, body
        );
        stream.write_all(response.as_bytes()).ok();

        if let Some(err) = error {
            anyhow::bail!("OAuth error: {}", err);
        }

        code.context("No authorization code received")
    }

    /// Refresh an access token using a refresh token
    fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenResponse> {
        let response = ureq::post(Self::TOKEN_URL)
            .send_form([
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .context("Failed to refresh access token")?;

        let mut token: TokenResponse = response
            .into_body()
            .read_json()
            .context("Failed to parse refresh token response")?;

        // Preserve the refresh token if not returned
        if token.refresh_token.is_none() {
            token.refresh_token = Some(refresh_token.to_string());
        }

        Ok(token)
    }

    /// Load stored token from disk
    fn load_token(&self) -> Result<StoredToken> {
        config::load_json_file(&self.token_path)
    }

    fn save_token(&self, token: &StoredToken) -> Result<()> {
        config::save_json_file(&self.token_path, token)
    }
}

/// Pull a query parameter out of the callback request line
fn callback_param(request_line: &str, name: &str) -> Option<String> {
    let path = request_line.split_whitespace().nth(1)?;
    let query = path.split('?').nth(1)?;
    query.split('&').find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if key == name {
            urlencoding::decode(value).ok().map(|v| v.into_owned())
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_with_token_path(path: PathBuf) -> GmailAuth {
        let config = AuthConfig::from_env()
            .with_token_path(path)
            .with_scopes(["scope-a", "scope-b"]);
        GmailAuth::new(
            GmailCredentials {
                client_id: "id".to_string(),
                client_secret: "secret".to_string(),
            },
            &config,
        )
    }

    #[test]
    fn test_callback_param() {
        let line = "GET /?code=4%2F0Ab&scope=email HTTP/1.1\r\n";
        assert_eq!(callback_param(line, "code"), Some("4/0Ab".to_string()));
        assert_eq!(callback_param(line, "error"), None);
        assert_eq!(callback_param("GET / HTTP/1.1", "code"), None);
    }

    #[test]
    fn test_authorization_url_joins_scopes() {
        let auth = auth_with_token_path(PathBuf::from("/nonexistent/token.json"));
        let url = auth.authorization_url("http://localhost:8080");
        assert!(url.contains("scope=scope-a%20scope-b"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8080"));
    }

    #[test]
    fn test_fresh_cached_token_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        let token = StoredToken {
            access_token: "cached".to_string(),
            refresh_token: None,
            expires_at: Some(chrono::Utc::now().timestamp() + 3600),
        };
        config::save_json_file(&path, &token).unwrap();

        let auth = auth_with_token_path(path);
        assert_eq!(auth.get_access_token().unwrap(), "cached");
    }

    #[test]
    fn test_google_token_file_field_alias() {
        let json = r#"{"token": "abc", "refresh_token": "r", "expiry": "x"}"#;
        let token: StoredToken = serde_json::from_str(json).unwrap();
        assert_eq!(token.access_token, "abc");
        assert!(!token.is_fresh());
    }
}
