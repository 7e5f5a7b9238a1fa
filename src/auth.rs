//! Authentication collaborator client.
//!
//! Mealsmith never manages credentials itself: a hosted auth service issues
//! bearer tokens, and this client resolves a token to a user identity. All
//! stored data is keyed by that identity. No user means no data, and the
//! service never fabricates placeholder records.
//!
//! Deployments without a configured auth endpoint (local development, the
//! test suite) skip this client entirely and treat the bearer token itself
//! as the user id; see [`crate::api`].

use serde::Deserialize;

/// Client for the hosted auth service.
#[derive(Clone)]
pub struct AuthClient {
    client: reqwest::Client,
    base_url: String,
}

/// The subset of the auth service's user payload we care about.
#[derive(Debug, Default, Deserialize)]
struct AuthUser {
    #[serde(default)]
    id: String,
}

impl AuthClient {
    /// Create a client for the given auth endpoint.
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create a client with a custom base URL (for testing).
    pub fn with_base_url(base_url: &str) -> Self {
        Self::new(base_url)
    }

    /// Resolve a bearer token to a user id.
    ///
    /// Returns `Ok(None)` for tokens the auth service rejects; transport
    /// failures surface as errors so callers can distinguish "bad token"
    /// from "auth service down".
    pub async fn resolve_user(&self, token: &str) -> anyhow::Result<Option<String>> {
        let url = format!("{}/user", self.base_url);
        let response = self.client.get(&url).bearer_auth(token).send().await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED
            || response.status() == reqwest::StatusCode::FORBIDDEN
        {
            return Ok(None);
        }

        let user = response.error_for_status()?.json::<AuthUser>().await?;
        if user.id.is_empty() {
            return Ok(None);
        }
        Ok(Some(user.id))
    }
}
