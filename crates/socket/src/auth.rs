//! Credential injection for the socket connection.
//!
//! Session credentials are supplied by the embedding application (which owns
//! login and token refresh); the adapter only asks for the current access
//! token at connect time and rides it on the upgrade request.

/// Source of the current access token
pub trait CredentialProvider {
    /// Get the access token to present, if any
    fn access_token(&self) -> Option<String>;
}

/// A fixed token, for tools and tests
#[derive(Debug, Clone, Default)]
pub struct StaticToken {
    token: Option<String>,
}

impl StaticToken {
    /// Create a provider around an optional token
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }

    /// Create a provider for a known token
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }
}

impl CredentialProvider for StaticToken {
    fn access_token(&self) -> Option<String> {
        self.token.clone()
    }
}
