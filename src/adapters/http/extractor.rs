use axum::{async_trait, extract::FromRequestParts, http::request::Parts, RequestPartsExt};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::adapters::http::AppState;
use crate::domain::model::IdentityRef;
use crate::domain::ports::{EntityStore, Principal};
use crate::utils::error::LendingError;

/// A caller whose bearer token resolved to a principal. Handlers taking this
/// argument never run for anonymous requests.
#[derive(Debug, Clone)]
pub struct AuthorizedUser {
    pub principal: Principal,
}

impl AuthorizedUser {
    pub fn identity(&self) -> &IdentityRef {
        &self.principal.identity
    }
}

#[async_trait]
impl<S: EntityStore + 'static> FromRequestParts<AppState<S>> for AuthorizedUser {
    type Rejection = LendingError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| LendingError::Unauthenticated)?;

        let principal = state
            .verifier
            .verify_token(bearer.token())
            .await?
            .ok_or(LendingError::Unauthenticated)?;

        tracing::debug!(identity = %principal.identity, "Request authenticated");
        Ok(Self { principal })
    }
}
