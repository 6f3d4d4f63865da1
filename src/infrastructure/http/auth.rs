//! Bearer token sources

use async_trait::async_trait;

use crate::domain::TokenProvider;
use crate::shared::FetchResult;

/// Fixed token, e.g. from config or the command line
#[derive(Debug, Clone, Default)]
pub struct StaticToken {
    token: Option<String>,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// No `Authorization` header at all
    pub fn none() -> Self {
        Self { token: None }
    }

    pub fn from_option(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn bearer_token(&self) -> FetchResult<Option<String>> {
        Ok(self.token.clone())
    }
}
