use crate::domain::model::IdentityRef;
use crate::domain::ports::{IdentityVerifier, Principal};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Resolves bearer tokens from a fixed table loaded at start-up.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, IdentityRef>,
}

impl StaticTokenVerifier {
    pub fn new<I, T, U>(tokens: I) -> Self
    where
        I: IntoIterator<Item = (T, U)>,
        T: Into<String>,
        U: Into<String>,
    {
        Self {
            tokens: tokens
                .into_iter()
                .map(|(token, identity)| (token.into(), IdentityRef::new(identity)))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl IdentityVerifier for StaticTokenVerifier {
    async fn verify_token(&self, token: &str) -> Result<Option<Principal>> {
        Ok(self.tokens.get(token).map(|identity| Principal {
            identity: identity.clone(),
        }))
    }
}
