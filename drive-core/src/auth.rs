use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Full read/write Drive access, the scope the service account is granted.
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: u64 = 3600;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("assertion signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
    #[error("api returned {status}: {body}")]
    Api { status: StatusCode, body: String },
}

/// The subset of a Google service-account key file needed for the
/// JWT-bearer grant.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    pub token_uri: String,
}

/// Claim set of the signed assertion sent to the token endpoint.
#[derive(Debug, Serialize)]
pub struct Claims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: u64,
    pub exp: u64,
}

impl Claims {
    pub fn new(key: &ServiceAccountKey, scope: &str, issued_at: u64) -> Self {
        Self {
            iss: key.client_email.clone(),
            scope: scope.to_string(),
            aud: key.token_uri.clone(),
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[derive(Clone)]
pub struct TokenClient {
    http: Client,
    key: ServiceAccountKey,
}

impl TokenClient {
    pub fn new(key: ServiceAccountKey) -> Self {
        Self {
            http: Client::new(),
            key,
        }
    }

    /// Signs a fresh RS256 assertion and trades it for an access token at
    /// the key's `token_uri`.
    pub async fn authenticate(&self, scope: &str) -> Result<AccessToken, AuthError> {
        let issued_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let claims = Claims::new(&self.key, scope, issued_at);
        let encoding_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())?;
        let assertion =
            jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)?;
        self.exchange_assertion(&assertion).await
    }

    pub async fn exchange_assertion(&self, assertion: &str) -> Result<AccessToken, AuthError> {
        let form = [("grant_type", JWT_BEARER_GRANT), ("assertion", assertion)];
        let response = self
            .http
            .post(self.key.token_uri.as_str())
            .form(&form)
            .send()
            .await?;
        if response.status().is_success() {
            Ok(response.json::<AccessToken>().await?)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(AuthError::Api { status, body })
        }
    }
}
