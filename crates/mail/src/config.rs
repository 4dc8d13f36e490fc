//! Configuration loading for Gmail access
//!
//! [`AuthConfig`] is resolved once at process start (environment variables
//! and defaults) and handed to [`GmailAuth`](crate::GmailAuth).
//!
//! OAuth client credentials are loaded from (in order of priority):
//! 1. JSON file (Google Cloud Console format) at the configured path
//! 2. Runtime environment variables (fallback)

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable overriding the cached token path
pub const TOKEN_PATH_VAR: &str = "TOKEN_PATH";
/// Environment variable overriding the client credentials path
pub const CREDENTIALS_PATH_VAR: &str = "CREDENTIALS_PATH";

const DEFAULT_TOKEN_PATH: &str = "~/token.json";
const DEFAULT_CREDENTIALS_PATH: &str = "~/credentials.json";
const CREDENTIALS_FILE: &str = "credentials.json";

/// Default authorization scopes. Narrow them if the account allows it.
pub const DEFAULT_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/userinfo.email",
    "https://www.googleapis.com/auth/userinfo.profile",
    "https://www.googleapis.com/auth/gmail.settings.basic",
    "https://www.googleapis.com/auth/gmail.labels",
    "https://www.googleapis.com/auth/gmail.modify",
    "https://www.googleapis.com/auth/gmail.compose",
];

/// Settings for the OAuth bootstrap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// Scopes requested during the authorization code flow
    pub scopes: Vec<String>,
    /// Cached token from a previous run
    pub token_path: PathBuf,
    /// Client secret file downloaded from Google Cloud Console
    pub credentials_path: PathBuf,
    /// Save the token after the first successful authentication
    pub write_token: bool,
}

impl AuthConfig {
    /// Resolve paths from `TOKEN_PATH` / `CREDENTIALS_PATH` or their defaults
    pub fn from_env() -> Self {
        Self {
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            token_path: config::env_path(TOKEN_PATH_VAR, DEFAULT_TOKEN_PATH),
            credentials_path: config::env_path(CREDENTIALS_PATH_VAR, DEFAULT_CREDENTIALS_PATH),
            write_token: false,
        }
    }

    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = path.into();
        self
    }

    pub fn with_credentials_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_path = path.into();
        self
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn write_token(mut self, write: bool) -> Self {
        self.write_token = write;
        self
    }

    /// Load the OAuth client credentials this config points at
    pub fn credentials(&self) -> Result<GmailCredentials> {
        GmailCredentials::load(&self.credentials_path)
    }
}

/// OAuth credentials for Gmail API access
#[derive(Debug, Clone)]
pub struct GmailCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Google Cloud Console credential file format (installed app)
#[derive(Deserialize)]
struct GoogleCredentialFile {
    installed: Option<InstalledCredentials>,
    web: Option<InstalledCredentials>,
}

#[derive(Deserialize)]
struct InstalledCredentials {
    client_id: String,
    client_secret: String,
}

impl GmailCredentials {
    /// Load credentials from `path`, then `~/.config/gmailtools/credentials.json`,
    /// then environment variables
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::from_file(path);
        }

        if let Some(fallback) = config::config_path(CREDENTIALS_FILE)
            && fallback.exists()
        {
            return Self::from_file(&fallback);
        }

        Self::from_env().with_context(|| format!("{} does not exist", path.display()))
    }

    /// Load credentials from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let creds: GoogleCredentialFile = config::load_json_file(path)?;
        Self::from_credential_file(creds)
    }

    /// Parse credentials from a GoogleCredentialFile
    fn from_credential_file(creds: GoogleCredentialFile) -> Result<Self> {
        // Support both "installed" (desktop) and "web" credential types
        let installed = creds
            .installed
            .or(creds.web)
            .context("Credentials file missing 'installed' or 'web' section")?;

        Ok(Self {
            client_id: installed.client_id,
            client_secret: installed.client_secret,
        })
    }

    /// Parse credentials from JSON string (Google Cloud Console format)
    pub fn from_json(json: &str) -> Result<Self> {
        let creds: GoogleCredentialFile =
            serde_json::from_str(json).context("Failed to parse credentials JSON")?;
        Self::from_credential_file(creds)
    }

    /// Load credentials from environment variables
    pub fn from_env() -> Result<Self> {
        let client_id = std::env::var("GMAIL_CLIENT_ID")
            .context("GMAIL_CLIENT_ID environment variable not set")?;
        let client_secret = std::env::var("GMAIL_CLIENT_SECRET")
            .context("GMAIL_CLIENT_SECRET environment variable not set")?;

        Ok(Self {
            client_id,
            client_secret,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_installed_credentials() {
        let json = r#"{
            "installed": {
                "client_id": "test-client-id.apps.googleusercontent.com",
                "client_secret": "test-secret",
                "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                "token_uri": "https://oauth2.googleapis.com/token"
            }
        }"#;

        let creds = GmailCredentials::from_json(json).unwrap();
        assert_eq!(creds.client_id, "test-client-id.apps.googleusercontent.com");
        assert_eq!(creds.client_secret, "test-secret");
    }

    #[test]
    fn test_parse_web_credentials() {
        let json = r#"{
            "web": {
                "client_id": "web-client-id.apps.googleusercontent.com",
                "client_secret": "web-secret"
            }
        }"#;

        let creds = GmailCredentials::from_json(json).unwrap();
        assert_eq!(creds.client_id, "web-client-id.apps.googleusercontent.com");
    }

    #[test]
    fn test_invalid_json() {
        let json = r#"{ "other": {} }"#;
        assert!(GmailCredentials::from_json(json).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(
            &path,
            r#"{"installed": {"client_id": "id", "client_secret": "secret"}}"#,
        )
        .unwrap();

        let config = AuthConfig::from_env().with_credentials_path(&path);
        let creds = config.credentials().unwrap();
        assert_eq!(creds.client_id, "id");
        assert_eq!(creds.client_secret, "secret");
    }

    #[test]
    fn test_builder_overrides() {
        let config = AuthConfig::from_env()
            .with_token_path("/tmp/t.json")
            .with_scopes(["https://www.googleapis.com/auth/gmail.readonly"])
            .write_token(true);
        assert_eq!(config.token_path, PathBuf::from("/tmp/t.json"));
        assert_eq!(config.scopes.len(), 1);
        assert!(config.write_token);
    }
}
