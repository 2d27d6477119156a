//! Provider authorize-URL construction.

use std::sync::Arc;

use serde::Serialize;
use url::Url;

use crate::AuthResult;
use crate::config::{ProviderConfig, StateConfig};
use crate::error::AuthError;

use super::state::{StateStore, generate_state};

/// A login redirect: where to send the user, and the state value that
/// must come back on the callback.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// The provider's authorize endpoint with all query parameters set.
    pub auth_url: String,

    /// The registered CSRF state value.
    pub state: String,
}

/// Builds provider authorize URLs and registers their state values.
///
/// Provider configuration is validated at process start; a missing
/// client id or tenant never surfaces here.
pub struct LoginRequestBuilder {
    provider: ProviderConfig,
    state_config: StateConfig,
    states: Arc<dyn StateStore>,
}

impl LoginRequestBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new(
        provider: ProviderConfig,
        state_config: StateConfig,
        states: Arc<dyn StateStore>,
    ) -> Self {
        Self {
            provider,
            state_config,
            states,
        }
    }

    /// Builds the authorize redirect.
    ///
    /// Generates a fresh state value when the caller supplies none, and
    /// registers it with the configured TTL.
    ///
    /// # Errors
    ///
    /// Returns an error if the authorize endpoint is not a valid URL or
    /// the state store fails.
    pub async fn build(&self, state: Option<String>) -> AuthResult<LoginRequest> {
        let state = state.unwrap_or_else(generate_state);
        self.states.register(&state, self.state_config.ttl).await?;

        let mut url = Url::parse(&self.provider.authorize_endpoint()).map_err(|e| {
            AuthError::configuration(format!("Invalid authorize endpoint: {e}"))
        })?;
        {
            let mut params = url.query_pairs_mut();
            params.append_pair("client_id", &self.provider.client_id);
            params.append_pair("redirect_uri", &self.provider.redirect_uri);
            params.append_pair("response_type", "code");
            params.append_pair("scope", &self.provider.scopes.join(" "));
            params.append_pair("state", &state);
        }

        tracing::debug!(
            endpoint = url.as_str().split('?').next().unwrap_or(""),
            "Built provider authorize URL"
        );

        Ok(LoginRequest {
            auth_url: url.into(),
            state,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct RecordingStateStore {
        registered: Mutex<HashMap<String, Duration>>,
    }

    #[async_trait]
    impl StateStore for RecordingStateStore {
        async fn register(&self, state: &str, ttl: Duration) -> AuthResult<()> {
            self.registered
                .lock()
                .unwrap()
                .insert(state.to_string(), ttl);
            Ok(())
        }

        async fn consume(&self, state: &str) -> AuthResult<bool> {
            Ok(self.registered.lock().unwrap().remove(state).is_some())
        }
    }

    fn test_provider() -> ProviderConfig {
        ProviderConfig {
            client_id: "client-1".to_string(),
            client_secret: "secret".to_string(),
            tenant: "acme".to_string(),
            redirect_uri: "https://parley.example.com/auth/callback".to_string(),
            ..ProviderConfig::default()
        }
    }

    fn test_builder(states: Arc<RecordingStateStore>) -> LoginRequestBuilder {
        LoginRequestBuilder::new(test_provider(), StateConfig::default(), states)
    }

    #[tokio::test]
    async fn test_build_includes_required_parameters() {
        let states = Arc::new(RecordingStateStore::default());
        let builder = test_builder(states.clone());

        let request = builder.build(None).await.unwrap();
        let url = Url::parse(&request.auth_url).unwrap();
        let params: HashMap<String, String> = url.query_pairs().into_owned().collect();

        assert_eq!(params["client_id"], "client-1");
        assert_eq!(
            params["redirect_uri"],
            "https://parley.example.com/auth/callback"
        );
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["scope"], "openid profile email");
        assert_eq!(params["state"], request.state);
    }

    #[tokio::test]
    async fn test_generated_state_is_registered_with_ttl() {
        let states = Arc::new(RecordingStateStore::default());
        let builder = test_builder(states.clone());

        let request = builder.build(None).await.unwrap();
        let registered = states.registered.lock().unwrap();
        assert_eq!(
            registered.get(&request.state),
            Some(&Duration::from_secs(600))
        );
    }

    #[tokio::test]
    async fn test_caller_supplied_state_is_kept() {
        let states = Arc::new(RecordingStateStore::default());
        let builder = test_builder(states.clone());

        let request = builder.build(Some("caller-state".to_string())).await.unwrap();
        assert_eq!(request.state, "caller-state");
        assert!(states.registered.lock().unwrap().contains_key("caller-state"));
    }
}
