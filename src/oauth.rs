//! OAuth 2.0 Web Server Authentication Flow for Salesforce.
//!
//! This module provides the client-side half of the flow:
//! - **Authorization URL** - Build the URL to redirect users to
//! - **Code exchange** - Trade an authorization code for tokens
//! - **Password** - Resource-owner password credentials grant
//! - **Refresh Token** - Refresh an expired access token
//! - **Introspection** - Check whether an access or refresh token is valid
//! - **Revocation** - Revoke a token
//!
//! Successful token responses that carry `id` and `issued_at` are signed by
//! Salesforce; the signature is verified against the consumer secret before
//! the payload is returned.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{Error, ErrorKind, Result};
use crate::params::Params;
use crate::signature::verify_signature;

/// OAuth 2.0 endpoints under `/services/oauth2/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    Authorize,
    Token,
    Introspect,
    Revoke,
}

impl Endpoint {
    fn path(self) -> &'static str {
        match self {
            Endpoint::Authorize => "/services/oauth2/authorize",
            Endpoint::Token => "/services/oauth2/token",
            Endpoint::Introspect => "/services/oauth2/introspect",
            Endpoint::Revoke => "/services/oauth2/revoke",
        }
    }
}

/// OAuth 2.0 configuration for a connected app.
///
/// Sensitive fields like `consumer_secret` are redacted in Debug output
/// to prevent accidental exposure in logs.
#[derive(Clone)]
pub struct OAuth2Config {
    /// Consumer key (client_id).
    pub consumer_key: String,
    /// Consumer secret (client_secret). Required for token requests and
    /// signature verification.
    consumer_secret: Option<String>,
    /// Redirect URI for the web flow.
    pub redirect_uri: Option<String>,
    /// Scopes to request in the authorization URL.
    pub scopes: Vec<String>,
    /// Login URL the endpoints are appended to.
    pub login_url: String,
}

impl std::fmt::Debug for OAuth2Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth2Config")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .field("login_url", &self.login_url)
            .finish()
    }
}

impl OAuth2Config {
    /// Create a new OAuth config targeting the production login URL.
    pub fn new(consumer_key: impl Into<String>) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: None,
            redirect_uri: None,
            scopes: Vec::new(),
            login_url: crate::PRODUCTION_LOGIN_URL.to_string(),
        }
    }

    /// Set the consumer secret.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.consumer_secret = Some(secret.into());
        self
    }

    /// Set the redirect URI.
    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    /// Set the scopes.
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Set the login URL (e.g. [`crate::SANDBOX_LOGIN_URL`] or a My Domain).
    pub fn with_login_url(mut self, url: impl Into<String>) -> Self {
        self.login_url = url.into();
        self
    }

    /// Get the consumer secret (for internal use).
    pub(crate) fn consumer_secret(&self) -> Option<&str> {
        self.consumer_secret.as_deref()
    }
}

/// OAuth 2.0 client for the Salesforce Web Server Authentication Flow.
///
/// Every network operation is a single HTTPS exchange: one POST, one JSON
/// response, no retries and no crate-imposed timeout. Calls share no mutable
/// state and may run concurrently. To bound latency, configure timeouts on
/// the [`reqwest::Client`] passed to [`OAuth2Client::with_http_client`], or
/// wrap the returned future in `tokio::time::timeout` - dropping the future
/// cancels the request.
#[derive(Clone)]
pub struct OAuth2Client {
    config: OAuth2Config,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for OAuth2Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth2Client")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl OAuth2Client {
    /// Create a new OAuth client with a default HTTP client.
    pub fn new(config: OAuth2Config) -> Self {
        Self::with_http_client(config, reqwest::Client::new())
    }

    /// Create a new OAuth client with a caller-supplied HTTP client.
    ///
    /// Timeout, proxy, and TLS policy belong to the injected client.
    pub fn with_http_client(config: OAuth2Config, http_client: reqwest::Client) -> Self {
        Self {
            config,
            http_client,
        }
    }

    /// Get the OAuth config.
    pub fn config(&self) -> &OAuth2Config {
        &self.config
    }

    /// Generate the authorization URL to redirect users to.
    ///
    /// Defaults `response_type=code` and carries client_id, redirect_uri, and
    /// the configured scopes; any of them can be overridden through `extra`
    /// (e.g. `state`, `prompt`, or a different `response_type`). No network
    /// call is made and the inputs are not validated beyond URL encoding.
    pub fn authorization_url(&self, extra: Params) -> Result<String> {
        let redirect_uri = self.config.redirect_uri.as_deref().ok_or_else(|| {
            Error::new(ErrorKind::Config(
                "redirect_uri is required for the authorization URL".to_string(),
            ))
        })?;

        let mut params = Params::new()
            .with("response_type", "code")
            .with("client_id", &self.config.consumer_key)
            .with("redirect_uri", redirect_uri);

        if !self.config.scopes.is_empty() {
            params.insert("scope", self.config.scopes.join(" "));
        }

        params.merge(&extra);

        Ok(format!(
            "{}{}?{}",
            self.config.login_url,
            Endpoint::Authorize.path(),
            params.to_query()?
        ))
    }

    /// Exchange an authorization code for tokens.
    ///
    /// Defaults `grant_type=authorization_code`. The code parameter is not
    /// logged to prevent credential exposure.
    #[instrument(skip(self, code, extra))]
    pub async fn authenticate(&self, code: &str, extra: Params) -> Result<TokenResponse> {
        let redirect_uri = self.config.redirect_uri.as_deref().ok_or_else(|| {
            Error::new(ErrorKind::Config(
                "redirect_uri is required for the code exchange".to_string(),
            ))
        })?;

        let mut params = self
            .credential_params()?
            .with("grant_type", "authorization_code")
            .with("redirect_uri", redirect_uri)
            .with("code", code);
        params.merge(&extra);

        self.token_request(params).await
    }

    /// Authenticate with the resource-owner password credentials grant.
    ///
    /// Defaults `grant_type=password`. If the caller's IP is not allowlisted
    /// in Salesforce, the security token must be appended to `password` by
    /// the caller; this client does not do the concatenation. Neither
    /// credential parameter is logged.
    #[instrument(skip(self, username, password, extra))]
    pub async fn password(
        &self,
        username: &str,
        password: &str,
        extra: Params,
    ) -> Result<TokenResponse> {
        let mut params = self
            .credential_params()?
            .with("grant_type", "password")
            .with("username", username)
            .with("password", password);
        params.merge(&extra);

        self.token_request(params).await
    }

    /// Refresh an access token using a refresh token.
    ///
    /// Defaults `grant_type=refresh_token`. The refresh_token parameter is
    /// not logged to prevent credential exposure.
    #[instrument(skip(self, refresh_token, extra))]
    pub async fn refresh(&self, refresh_token: &str, extra: Params) -> Result<TokenResponse> {
        let mut params = self
            .credential_params()?
            .with("grant_type", "refresh_token")
            .with("refresh_token", refresh_token);
        params.merge(&extra);

        self.token_request(params).await
    }

    /// Check whether an access token is still valid.
    ///
    /// Defaults `token_type_hint=access_token`. The token parameter is not
    /// logged to prevent credential exposure.
    #[instrument(skip(self, token, extra))]
    pub async fn is_access_token_valid(
        &self,
        token: &str,
        extra: Params,
    ) -> Result<IntrospectionResponse> {
        self.introspect(token, "access_token", extra).await
    }

    /// Check whether a refresh token is still valid.
    ///
    /// Defaults `token_type_hint=refresh_token`. The token parameter is not
    /// logged to prevent credential exposure.
    #[instrument(skip(self, token, extra))]
    pub async fn is_refresh_token_valid(
        &self,
        token: &str,
        extra: Params,
    ) -> Result<IntrospectionResponse> {
        self.introspect(token, "refresh_token", extra).await
    }

    /// Revoke an access or refresh token.
    ///
    /// The token parameter is not logged to prevent credential exposure.
    #[instrument(skip(self, token))]
    pub async fn revoke(&self, token: &str) -> Result<()> {
        let params = Params::new().with("token", token);
        let response = self.post(Endpoint::Revoke, &params).await?;

        if !response.status().is_success() {
            return Err(Error::new(ErrorKind::Api {
                error: "revoke_failed".to_string(),
                description: format!("revoke returned HTTP {}", response.status().as_u16()),
                payload: serde_json::Value::Null,
            }));
        }

        Ok(())
    }

    async fn introspect(
        &self,
        token: &str,
        token_type_hint: &str,
        extra: Params,
    ) -> Result<IntrospectionResponse> {
        let mut params = self
            .credential_params()?
            .with("token_type_hint", token_type_hint)
            .with("token", token);
        params.merge(&extra);

        let payload = self.post_form(Endpoint::Introspect, &params).await?;
        Ok(serde_json::from_value(payload)?)
    }

    /// Base parameters every credentialed request carries.
    fn credential_params(&self) -> Result<Params> {
        let secret = self.config.consumer_secret().ok_or_else(|| {
            Error::new(ErrorKind::Config(
                "consumer secret is required for this operation".to_string(),
            ))
        })?;

        Ok(Params::new()
            .with("client_id", &self.config.consumer_key)
            .with("client_secret", secret))
    }

    async fn token_request(&self, params: Params) -> Result<TokenResponse> {
        let payload = self.post_form(Endpoint::Token, &params).await?;
        Ok(serde_json::from_value(payload)?)
    }

    /// Execute one POST against `{login_url}{endpoint}` and vet the payload.
    ///
    /// The merged parameters ride in the URL query string and no request body
    /// is sent. That matches what Salesforce's endpoints accept on the wire
    /// (they read form and query parameters interchangeably), and it is kept
    /// for compatibility with existing integrations even though form-encoded
    /// bodies are the conventional choice.
    ///
    /// Failure is exclusive: a payload that carries an `error` field or fails
    /// signature verification is returned as an `Err` and never as a payload.
    async fn post_form(&self, endpoint: Endpoint, params: &Params) -> Result<serde_json::Value> {
        let response = self.post(endpoint, params).await?;
        let body = response.text().await?;
        let payload: serde_json::Value = serde_json::from_str(&body)?;

        if let Some(error) = payload.get("error").and_then(|v| v.as_str()) {
            let description = payload
                .get("error_description")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            return Err(Error::new(ErrorKind::Api {
                error: error.to_string(),
                description,
                payload,
            }));
        }

        self.verify_payload_signature(&payload)?;
        Ok(payload)
    }

    async fn post(&self, endpoint: Endpoint, params: &Params) -> Result<reqwest::Response> {
        let url = format!(
            "{}{}?{}",
            self.config.login_url,
            endpoint.path(),
            params.to_query()?
        );
        Ok(self.http_client.post(url).send().await?)
    }

    /// Verify the identity signature when the payload carries one.
    ///
    /// A payload with `id` and `issued_at` but no `signature` field is
    /// accepted as-is; there is nothing to check.
    fn verify_payload_signature(&self, payload: &serde_json::Value) -> Result<()> {
        let (Some(id), Some(issued_at)) = (
            payload.get("id").and_then(|v| v.as_str()),
            payload.get("issued_at").and_then(|v| v.as_str()),
        ) else {
            return Ok(());
        };
        let Some(signature) = payload.get("signature").and_then(|v| v.as_str()) else {
            return Ok(());
        };
        let Some(secret) = self.config.consumer_secret() else {
            return Ok(());
        };

        if !verify_signature(secret, id, issued_at, signature) {
            return Err(Error::new(ErrorKind::SignatureMismatch));
        }

        Ok(())
    }
}

/// Token response from the token endpoint.
///
/// Sensitive fields like `access_token` and `refresh_token` are redacted
/// in Debug output to prevent accidental exposure in logs. Fields this
/// struct does not model are collected in `extra`.
#[derive(Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    /// Access token.
    pub access_token: String,
    /// Refresh token (if requested).
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Instance URL for subsequent API calls.
    pub instance_url: String,
    /// Identity URL of the authenticated user.
    #[serde(default)]
    pub id: Option<String>,
    /// Token type (usually "Bearer").
    #[serde(default)]
    pub token_type: Option<String>,
    /// Scopes granted.
    #[serde(default)]
    pub scope: Option<String>,
    /// Identity signature (already verified when present).
    #[serde(default)]
    pub signature: Option<String>,
    /// Issued at timestamp (epoch milliseconds, as a string).
    #[serde(default)]
    pub issued_at: Option<String>,
    /// Any additional fields Salesforce returned.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("instance_url", &self.instance_url)
            .field("id", &self.id)
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .field("signature", &self.signature.as_ref().map(|_| "[REDACTED]"))
            .field("issued_at", &self.issued_at)
            .finish_non_exhaustive()
    }
}

/// Introspection response from the introspect endpoint.
///
/// The schema is defined by Salesforce (RFC 7662); only `active` is
/// guaranteed to be present.
#[derive(Debug, Clone, Deserialize)]
pub struct IntrospectionResponse {
    /// Whether the token is active.
    pub active: bool,
    /// Scopes.
    #[serde(default)]
    pub scope: Option<String>,
    /// Client ID the token was issued to.
    #[serde(default)]
    pub client_id: Option<String>,
    /// Username.
    #[serde(default)]
    pub username: Option<String>,
    /// Token type.
    #[serde(default)]
    pub token_type: Option<String>,
    /// Expiration time (epoch seconds).
    #[serde(default)]
    pub exp: Option<u64>,
    /// Issued at (epoch seconds).
    #[serde(default)]
    pub iat: Option<u64>,
    /// Not before (epoch seconds).
    #[serde(default)]
    pub nbf: Option<u64>,
    /// Subject.
    #[serde(default)]
    pub sub: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::compute_signature;

    fn params_of(url: &str) -> Vec<(String, String)> {
        let query = url.split_once('?').expect("url has a query").1;
        serde_urlencoded::from_str(query).unwrap()
    }

    #[test]
    fn test_oauth2_config_builder() {
        let config = OAuth2Config::new("consumer_key")
            .with_secret("secret")
            .with_redirect_uri("https://example.com/callback")
            .with_scopes(vec!["api".to_string(), "web".to_string()])
            .with_login_url("https://test.salesforce.com");

        assert_eq!(config.consumer_key, "consumer_key");
        assert_eq!(config.consumer_secret(), Some("secret"));
        assert_eq!(
            config.redirect_uri,
            Some("https://example.com/callback".to_string())
        );
        assert_eq!(config.scopes, vec!["api", "web"]);
        assert_eq!(config.login_url, "https://test.salesforce.com");
    }

    #[test]
    fn test_oauth2_config_debug_redacts_secret() {
        let config = OAuth2Config::new("consumer_key").with_secret("super_secret_value");

        let debug_output = format!("{:?}", config);
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_value"));
    }

    #[test]
    fn test_authorization_url_defaults() {
        let config = OAuth2Config::new("my_client_id")
            .with_redirect_uri("https://localhost:8080/callback")
            .with_scopes(vec!["api".to_string(), "refresh_token".to_string()]);
        let client = OAuth2Client::new(config);

        let url = client.authorization_url(Params::new()).unwrap();
        assert!(url.starts_with("https://login.salesforce.com/services/oauth2/authorize?"));

        let params = params_of(&url);
        assert!(params.contains(&("response_type".to_string(), "code".to_string())));
        assert!(params.contains(&("client_id".to_string(), "my_client_id".to_string())));
        assert!(params.contains(&(
            "redirect_uri".to_string(),
            "https://localhost:8080/callback".to_string()
        )));
        assert!(params.contains(&("scope".to_string(), "api refresh_token".to_string())));
    }

    #[test]
    fn test_authorization_url_extra_and_overrides() {
        let config = OAuth2Config::new("my_client_id")
            .with_redirect_uri("https://localhost:8080/callback");
        let client = OAuth2Client::new(config);

        let url = client
            .authorization_url(
                Params::new()
                    .with("state", "state123")
                    .with("response_type", "token"),
            )
            .unwrap();

        let params = params_of(&url);
        assert!(params.contains(&("state".to_string(), "state123".to_string())));
        // Caller override beats the response_type=code default.
        assert!(params.contains(&("response_type".to_string(), "token".to_string())));
        assert!(!params.contains(&("response_type".to_string(), "code".to_string())));
    }

    #[test]
    fn test_authorization_url_requires_redirect_uri() {
        let client = OAuth2Client::new(OAuth2Config::new("my_client_id"));

        let err = client.authorization_url(Params::new()).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Config(_)));
    }

    #[test]
    fn test_endpoint_paths() {
        assert_eq!(Endpoint::Authorize.path(), "/services/oauth2/authorize");
        assert_eq!(Endpoint::Token.path(), "/services/oauth2/token");
        assert_eq!(Endpoint::Introspect.path(), "/services/oauth2/introspect");
        assert_eq!(Endpoint::Revoke.path(), "/services/oauth2/revoke");
    }

    #[test]
    fn test_verify_payload_signature_accepts_valid() {
        let config = OAuth2Config::new("key").with_secret("shhh");
        let client = OAuth2Client::new(config);

        let id = "https://login.salesforce.com/id/00D/005";
        let issued_at = "1278448101416";
        let payload = serde_json::json!({
            "id": id,
            "issued_at": issued_at,
            "signature": compute_signature("shhh", id, issued_at),
            "access_token": "tok",
        });

        assert!(client.verify_payload_signature(&payload).is_ok());
    }

    #[test]
    fn test_verify_payload_signature_rejects_wrong_secret() {
        let config = OAuth2Config::new("key").with_secret("shhh");
        let client = OAuth2Client::new(config);

        let id = "https://login.salesforce.com/id/00D/005";
        let issued_at = "1278448101416";
        let payload = serde_json::json!({
            "id": id,
            "issued_at": issued_at,
            "signature": compute_signature("a_different_secret", id, issued_at),
        });

        let err = client.verify_payload_signature(&payload).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::SignatureMismatch));
    }

    #[test]
    fn test_verify_payload_signature_skips_unsigned() {
        let config = OAuth2Config::new("key").with_secret("shhh");
        let client = OAuth2Client::new(config);

        // No signature field: nothing to check.
        let payload = serde_json::json!({
            "id": "https://login.salesforce.com/id/00D/005",
            "issued_at": "1278448101416",
        });
        assert!(client.verify_payload_signature(&payload).is_ok());

        // Introspection-style payload with none of the identity fields.
        let payload = serde_json::json!({ "active": true });
        assert!(client.verify_payload_signature(&payload).is_ok());
    }

    #[test]
    fn test_token_response_captures_extra_fields() {
        let payload = serde_json::json!({
            "access_token": "tok",
            "instance_url": "https://na1.salesforce.com",
            "sfdc_community_url": "https://community.example.com",
        });

        let token: TokenResponse = serde_json::from_value(payload).unwrap();
        assert_eq!(
            token.extra.get("sfdc_community_url").and_then(|v| v.as_str()),
            Some("https://community.example.com")
        );
    }

    #[test]
    fn test_token_response_debug_redacts_tokens() {
        let token = TokenResponse {
            access_token: "super_secret_access_token".to_string(),
            refresh_token: Some("super_secret_refresh_token".to_string()),
            instance_url: "https://na1.salesforce.com".to_string(),
            id: None,
            token_type: Some("Bearer".to_string()),
            scope: None,
            signature: Some("signature_value".to_string()),
            issued_at: None,
            extra: serde_json::Map::new(),
        };

        let debug_output = format!("{:?}", token);
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_access_token"));
        assert!(!debug_output.contains("super_secret_refresh_token"));
        assert!(!debug_output.contains("signature_value"));
    }
}
