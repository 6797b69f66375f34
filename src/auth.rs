//! OAuth2 authentication with a local token cache.
//!
//! The first run walks the user through the interactive authorization-code
//! flow (visit a URL, paste the verification code) and caches the resulting
//! token as JSON. Later runs load the cache and refresh the access token
//! when it is close to expiry.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{DriveError, Result};
use crate::models::TokenResponse;

/// Google OAuth2 authorization endpoint.
const AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";

/// Google OAuth2 token endpoint.
const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Google Drive API scope.
const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

/// Out-of-band redirect for installed applications.
const REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// Compiled-in client registration.
const CLIENT_ID: &str = "YOUR_CLIENT_ID";
const CLIENT_SECRET: &str = "YOUR_CLIENT_SECRET";

/// Seconds before the recorded expiry at which a token counts as expired.
const EXPIRY_BUFFER_SECS: u64 = 60;

/// OAuth2 client settings.
///
/// `Default` carries the compiled-in registration and the Google endpoints;
/// tests point the endpoints at a mock server.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub scope: String,
    pub redirect_uri: String,
    pub auth_uri: String,
    pub token_uri: String,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id: CLIENT_ID.to_string(),
            client_secret: CLIENT_SECRET.to_string(),
            scope: DRIVE_SCOPE.to_string(),
            redirect_uri: REDIRECT_URI.to_string(),
            auth_uri: AUTH_URI.to_string(),
            token_uri: TOKEN_URI.to_string(),
        }
    }
}

/// Token as persisted in the cache file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Expiry as unix seconds. `None` means the token never expires.
    #[serde(default)]
    pub expires_at: Option<u64>,
}

impl StoredToken {
    /// Load a token from the cache file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write the token to the cache file.
    pub fn store<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Whether the token is expired or within the expiry buffer.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => unix_now() + EXPIRY_BUFFER_SECS >= expires_at,
            None => false,
        }
    }

    /// Build a stored token from a token endpoint response, keeping the
    /// previous refresh token when the response does not carry one.
    pub fn from_response(response: TokenResponse, previous_refresh: Option<String>) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token.or(previous_refresh),
            expires_at: response.expires_in.map(|secs| unix_now() + secs),
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Build the URL the user must visit to authorize the application.
///
/// Requests offline access so the token endpoint issues a refresh token.
pub fn authorization_url(config: &OAuthConfig) -> Result<String> {
    let url = Url::parse_with_params(
        &config.auth_uri,
        &[
            ("client_id", config.client_id.as_str()),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", config.scope.as_str()),
            ("access_type", "offline"),
        ],
    )
    .map_err(|e| DriveError::AuthenticationError(format!("invalid authorization endpoint: {e}")))?;
    Ok(url.to_string())
}

/// Exchange a verification code for a token.
pub async fn exchange_code(config: &OAuthConfig, http: &Client, code: &str) -> Result<StoredToken> {
    let params = [
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret.as_str()),
        ("code", code),
        ("redirect_uri", config.redirect_uri.as_str()),
        ("grant_type", "authorization_code"),
    ];

    let response = http.post(&config.token_uri).form(&params).send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(DriveError::TokenExchangeError(format!(
            "status {status}: {body}"
        )));
    }

    let token_response: TokenResponse = response.json().await?;
    Ok(StoredToken::from_response(token_response, None))
}

/// Authenticator holding the current token and the client registration.
#[derive(Clone)]
pub struct Authenticator {
    config: OAuthConfig,
    cache_path: Option<PathBuf>,
    http: Client,
    token: Arc<RwLock<StoredToken>>,
}

impl Authenticator {
    /// Create an authenticator from an already obtained token.
    ///
    /// `cache_path`, when given, receives refreshed tokens.
    pub fn with_token(config: OAuthConfig, token: StoredToken, cache_path: Option<PathBuf>) -> Self {
        Self {
            config,
            cache_path,
            http: Client::new(),
            token: Arc::new(RwLock::new(token)),
        }
    }

    /// Load the cached token, or run the interactive authorization flow when
    /// the cache is missing or unreadable.
    pub async fn from_cache_or_prompt(config: OAuthConfig, cache_path: &Path) -> Result<Self> {
        match StoredToken::load(cache_path) {
            Ok(token) => {
                debug!("loaded cached token from {}", cache_path.display());
                Ok(Self::with_token(config, token, Some(cache_path.to_path_buf())))
            }
            Err(err) => {
                warn!("need a new token, cannot load the cached one: {err}");
                let http = Client::new();
                let token = authorize_interactive(&config, &http).await?;
                if let Err(err) = token.store(cache_path) {
                    warn!(
                        "failed to write token cache {}: {err}",
                        cache_path.display()
                    );
                }
                Ok(Self {
                    config,
                    cache_path: Some(cache_path.to_path_buf()),
                    http,
                    token: Arc::new(RwLock::new(token)),
                })
            }
        }
    }

    /// Get a valid access token, refreshing it when close to expiry.
    pub async fn access_token(&self) -> Result<String> {
        {
            let token = self.token.read().await;
            if !token.is_expired() {
                return Ok(token.access_token.clone());
            }
        }

        let refresh_token = {
            let token = self.token.read().await;
            token.refresh_token.clone()
        }
        .ok_or_else(|| {
            DriveError::AuthenticationError(
                "token expired and no refresh token is cached; delete the token cache and run again"
                    .to_string(),
            )
        })?;

        let new_token = self.refresh(&refresh_token).await?;
        if let Some(path) = &self.cache_path {
            if let Err(err) = new_token.store(path) {
                warn!("failed to rewrite token cache {}: {err}", path.display());
            }
        }

        let access_token = new_token.access_token.clone();
        *self.token.write().await = new_token;
        Ok(access_token)
    }

    /// Renew the access token with the refresh grant.
    async fn refresh(&self, refresh_token: &str) -> Result<StoredToken> {
        debug!("refreshing access token");

        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .http
            .post(&self.config.token_uri)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DriveError::TokenExchangeError(format!(
                "status {status}: {body}"
            )));
        }

        let token_response: TokenResponse = response.json().await?;
        Ok(StoredToken::from_response(
            token_response,
            Some(refresh_token.to_string()),
        ))
    }
}

/// Walk the user through the authorization-code flow on the terminal.
async fn authorize_interactive(config: &OAuthConfig, http: &Client) -> Result<StoredToken> {
    let url = authorization_url(config)?;
    println!("Go to the following link in your browser:\n{url}");
    print!("Enter verification code: ");
    io::stdout().flush()?;

    let mut code = String::new();
    io::stdin().lock().read_line(&mut code)?;
    let code = code.trim();
    if code.is_empty() {
        return Err(DriveError::AuthenticationError(
            "no verification code entered".to_string(),
        ));
    }

    let token = exchange_code(config, http, code).await?;
    info!("authorization successful");
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_token_cache_roundtrip() {
        let temp_file = NamedTempFile::new().unwrap();
        let token = StoredToken {
            access_token: "access".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_at: Some(1234567890),
        };

        token.store(temp_file.path()).unwrap();
        let loaded = StoredToken::load(temp_file.path()).unwrap();

        assert_eq!(loaded.access_token, "access");
        assert_eq!(loaded.refresh_token, Some("refresh".to_string()));
        assert_eq!(loaded.expires_at, Some(1234567890));
    }

    #[test]
    fn test_load_missing_cache() {
        assert!(StoredToken::load("/nonexistent/auth.json").is_err());
    }

    #[test]
    fn test_load_invalid_cache() {
        let mut temp_file = NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut temp_file, b"not valid json").unwrap();
        assert!(StoredToken::load(temp_file.path()).is_err());
    }

    #[test]
    fn test_expiry_buffer() {
        let fresh = StoredToken {
            access_token: "a".to_string(),
            refresh_token: None,
            expires_at: Some(unix_now() + 3600),
        };
        assert!(!fresh.is_expired());

        let stale = StoredToken {
            access_token: "a".to_string(),
            refresh_token: None,
            // Not yet past expiry, but inside the buffer.
            expires_at: Some(unix_now() + EXPIRY_BUFFER_SECS / 2),
        };
        assert!(stale.is_expired());

        let no_expiry = StoredToken {
            access_token: "a".to_string(),
            refresh_token: None,
            expires_at: None,
        };
        assert!(!no_expiry.is_expired());
    }

    #[test]
    fn test_authorization_url() {
        let config = OAuthConfig {
            client_id: "client-123".to_string(),
            ..Default::default()
        };
        let url = authorization_url(&config).unwrap();
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/auth?"));
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("access_type=offline"));
    }

    #[test]
    fn test_from_response_keeps_previous_refresh_token() {
        let response = TokenResponse {
            access_token: "new-access".to_string(),
            refresh_token: None,
            expires_in: Some(3600),
            token_type: Some("Bearer".to_string()),
        };

        let token = StoredToken::from_response(response, Some("old-refresh".to_string()));
        assert_eq!(token.access_token, "new-access");
        assert_eq!(token.refresh_token, Some("old-refresh".to_string()));
        assert!(token.expires_at.is_some());
    }
}
