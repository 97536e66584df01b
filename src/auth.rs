//! Token guard for the API routes.
//!
//! Every guarded request carries two headers: `Token` with the raw bearer key and
//! `Id` with the user id the caller claims to be. Both must be present and the token
//! must belong to that user.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};

use crate::{
    domain::CredentialStore,
    errors::{AppError, AuthError},
    models::User,
    AppState,
};

pub const TOKEN_HEADER: &str = "token";
pub const USER_ID_HEADER: &str = "id";

/// Resolves a (token, claimed user id) pair to the owning user. Read-only.
pub async fn authenticate(
    store: &dyn CredentialStore,
    token: Option<&str>,
    user_id: Option<&str>,
) -> Result<User, AppError> {
    let (token, user_id) = match (non_blank(token), non_blank(user_id)) {
        (Some(token), Some(user_id)) => (token, user_id),
        _ => return Err(AuthError::MissingCredentials.into()),
    };

    let owner = store
        .find_token_owner(token)
        .await?
        .ok_or(AuthError::InvalidToken)?;

    if owner.id.to_string() != user_id {
        tracing::warn!(token_owner = owner.id, claimed_user_id = %user_id, "Token presented for another user");
        return Err(AuthError::TokenUserMismatch.into());
    }

    Ok(owner)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Extractor for handlers that require an authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl FromRequestParts<Arc<AppState>> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = header_str(&parts.headers, TOKEN_HEADER).map(str::to_owned);
        let user_id = header_str(&parts.headers, USER_ID_HEADER).map(str::to_owned);

        let user = authenticate(state.credentials.as_ref(), token.as_deref(), user_id.as_deref()).await?;
        tracing::debug!(user_id = user.id, "Request authenticated");
        Ok(AuthenticatedUser(user))
    }
}
