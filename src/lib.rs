//! # salesforce-oauth2
//!
//! Client helper for Salesforce's OAuth 2.0 Web Server Authentication Flow:
//! build authorization URLs, exchange authorization codes, credentials, or
//! refresh tokens for access tokens, and introspect or revoke tokens.
//!
//! Token responses carrying `id` and `issued_at` are signed by Salesforce
//! with the consumer secret; this crate verifies the signature before
//! returning the payload, and fails with a distinct error when it does not
//! match.
//!
//! ## Security
//!
//! - Sensitive data (tokens, secrets) are redacted in Debug output
//! - Tracing/logging skips credential parameters
//! - Error messages sanitize any credential data
//!
//! ## Example
//!
//! ```rust,ignore
//! use salesforce_oauth2::{OAuth2Client, OAuth2Config, Params};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), salesforce_oauth2::Error> {
//!     let config = OAuth2Config::new("consumer_key")
//!         .with_secret("consumer_secret")
//!         .with_redirect_uri("https://example.com/oauth/callback");
//!     let client = OAuth2Client::new(config);
//!
//!     // 1. Redirect the user here.
//!     let url = client.authorization_url(Params::new().with("state", "xyz"))?;
//!
//!     // 2. Exchange the code Salesforce sent to the callback.
//!     let token = client.authenticate("the_code", Params::new()).await?;
//!     println!("instance: {}", token.instance_url);
//!
//!     // 3. Later: refresh, introspect, revoke.
//!     let check = client
//!         .is_access_token_valid(&token.access_token, Params::new())
//!         .await?;
//!     println!("active: {}", check.active);
//!
//!     Ok(())
//! }
//! ```

mod error;
mod oauth;
mod params;
mod signature;

pub use error::{Error, ErrorKind, Result};
pub use oauth::{IntrospectionResponse, OAuth2Client, OAuth2Config, TokenResponse};
pub use params::Params;
pub use signature::{compute_signature, verify_signature};

/// Default Salesforce login URL for production.
pub const PRODUCTION_LOGIN_URL: &str = "https://login.salesforce.com";

/// Default Salesforce login URL for sandbox.
pub const SANDBOX_LOGIN_URL: &str = "https://test.salesforce.com";
