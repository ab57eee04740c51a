//! Service account authentication for Google APIs.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use log::debug;
use reqwest::Client;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::config::expand_home;
use crate::error::{DriveError, ExportError, Result};
use crate::models::{ServiceAccountCredentials, TokenResponse};

/// Google OAuth2 token endpoint.
const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Read-only Google Drive API scope.
const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";

/// JWT claims for service account authentication.
#[derive(Debug, Serialize)]
struct Claims {
    iss: String,   // Issuer (service account email)
    scope: String, // OAuth scope
    aud: String,   // Audience (token endpoint)
    exp: u64,      // Expiration time
    iat: u64,      // Issued at
}

/// Cached access token with expiration.
#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: SystemTime,
}

/// Authenticator for Google APIs using service account credentials.
///
/// Cheap to clone; clones share the token cache.
#[derive(Clone)]
pub struct Authenticator {
    client_email: Arc<str>,
    token_uri: Arc<str>,
    key: Arc<EncodingKey>,
    http: Client,
    cached_token: Arc<RwLock<Option<CachedToken>>>,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl Authenticator {
    /// Load a service account JSON file. A leading `~` is expanded.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = expand_home(path.as_ref());
        let content =
            fs::read_to_string(&path).map_err(|e| ExportError::credential(&path, e))?;
        let credentials: ServiceAccountCredentials =
            serde_json::from_str(&content).map_err(|e| ExportError::credential(&path, e))?;
        let auth = Self::new(credentials).map_err(|e| ExportError::credential(&path, e))?;
        debug!("Loaded service account {}", auth.client_email);
        Ok(auth)
    }

    /// Create a new authenticator from credentials, validating the private key.
    pub fn new(credentials: ServiceAccountCredentials) -> std::result::Result<Self, DriveError> {
        let key = EncodingKey::from_rsa_pem(credentials.private_key.as_bytes())?;
        let token_uri = credentials
            .token_uri
            .unwrap_or_else(|| TOKEN_URI.to_string());

        Ok(Self {
            client_email: credentials.client_email.into(),
            token_uri: token_uri.into(),
            key: Arc::new(key),
            http: Client::new(),
            cached_token: Arc::new(RwLock::new(None)),
        })
    }

    /// Service account identity.
    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    /// Get a valid access token, refreshing if necessary.
    pub async fn get_access_token(&self) -> std::result::Result<String, DriveError> {
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                // Add 60 second buffer before expiration
                let buffer = Duration::from_secs(60);
                if token.expires_at > SystemTime::now() + buffer {
                    return Ok(token.access_token.clone());
                }
            }
        }

        let new_token = self.refresh_token().await?;

        {
            let mut cached = self.cached_token.write().await;
            *cached = Some(new_token.clone());
        }

        Ok(new_token.access_token)
    }

    /// Refresh the access token using JWT assertion.
    async fn refresh_token(&self) -> std::result::Result<CachedToken, DriveError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| DriveError::TokenRefreshError(e.to_string()))?
            .as_secs();

        let claims = Claims {
            iss: self.client_email.to_string(),
            scope: DRIVE_SCOPE.to_string(),
            aud: self.token_uri.to_string(),
            iat: now,
            exp: now + 3600, // 1 hour
        };

        let jwt = encode(&Header::new(Algorithm::RS256), &claims, &self.key)?;

        let params = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", &jwt),
        ];

        debug!("Requesting access token from {}", self.token_uri);
        let response = self
            .http
            .post(&*self.token_uri)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DriveError::TokenRefreshError(format!(
                "Status {}: {}",
                status, body
            )));
        }

        let token_response: TokenResponse = response.json().await?;

        let expires_at = SystemTime::now() + Duration::from_secs(token_response.expires_in);

        Ok(CachedToken {
            access_token: token_response.access_token,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_serialization() {
        let claims = Claims {
            iss: "test@example.iam.gserviceaccount.com".to_string(),
            scope: DRIVE_SCOPE.to_string(),
            aud: TOKEN_URI.to_string(),
            iat: 1234567890,
            exp: 1234571490,
        };

        let json = serde_json::to_string(&claims).unwrap();
        assert!(json.contains("test@example.iam.gserviceaccount.com"));
        assert!(json.contains(DRIVE_SCOPE));
    }

    #[test]
    fn test_rejects_unusable_private_key() {
        let credentials = ServiceAccountCredentials {
            client_email: "test@example.iam.gserviceaccount.com".to_string(),
            private_key: "not a key".to_string(),
            token_uri: None,
        };

        assert!(matches!(
            Authenticator::new(credentials),
            Err(DriveError::JwtError(_))
        ));
    }
}
