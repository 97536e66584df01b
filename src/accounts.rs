use std::sync::Arc;

use serde::Serialize;

use crate::{
    domain::{CredentialStore, PasswordHasher},
    errors::{internal_error, AppError, AuthError, FieldErrors},
    models::{NewUser, User},
    requests::{LoginRequest, LogoutRequest, SignupRequest},
};

const REQUIRED: &str = "This field is required.";
const MAX_USERNAME_LEN: usize = 150;

#[derive(Serialize, Debug)]
pub struct SignupResponse {
    pub id: i64,
    pub username: String,
}

#[derive(Serialize, Debug)]
pub struct LoginResponse {
    pub message: String,
    pub id: i64,
    pub token: String,
}

#[derive(Serialize, Debug)]
pub struct LogoutResponse {
    pub message: String,
}

fn required(errors: &mut FieldErrors, field: &str, value: Option<String>) -> Option<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Some(v),
        _ => {
            errors.add(field, REQUIRED);
            None
        }
    }
}

fn validate_username(errors: &mut FieldErrors, username: &str) {
    if username.chars().count() > MAX_USERNAME_LEN {
        errors.add("username", format!("Ensure this field has no more than {} characters.", MAX_USERNAME_LEN));
    }
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if !username.chars().all(allowed) {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }
}

fn validate_email(errors: &mut FieldErrors, email: &str) {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        errors.add("email", "Enter a valid email address.");
    }
}

async fn hash_password(hasher: Arc<dyn PasswordHasher>, password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| internal_error!("password hashing task failed: {}", e))?
        .map_err(|e| internal_error!(e))
}

async fn verify_password(
    hasher: Arc<dyn PasswordHasher>,
    encoded: String,
    password: String,
) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || hasher.verify(&encoded, &password))
        .await
        .map_err(|e| internal_error!("password verification task failed: {}", e))?
        .map_err(|e| internal_error!(e))
}

/// Registers a new user. Duplicate usernames and emails are rejected by the store.
pub async fn signup(
    store: &dyn CredentialStore,
    hasher: Arc<dyn PasswordHasher>,
    request: SignupRequest,
) -> Result<User, AppError> {
    let mut errors = FieldErrors::new();
    let username = required(&mut errors, "username", request.username).map(|u| u.trim().to_string());
    let email = required(&mut errors, "email", request.email).map(|e| e.trim().to_string());
    let password = required(&mut errors, "password", request.password);

    if let Some(username) = &username {
        validate_username(&mut errors, username);
    }
    if let Some(email) = &email {
        validate_email(&mut errors, email);
    }

    let (Some(username), Some(email), Some(password)) = (username, email, password) else {
        return Err(AppError::Validation(errors));
    };
    errors.into_result()?;

    let password_hash = hash_password(hasher, password).await?;
    let user = store
        .create_user(NewUser {
            username,
            email,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = user.id, username = %user.username, "User signed up");
    Ok(user)
}

/// Verifies credentials and hands out the user's token, creating it on first login.
pub async fn login(
    store: &dyn CredentialStore,
    hasher: Arc<dyn PasswordHasher>,
    request: LoginRequest,
) -> Result<LoginResponse, AppError> {
    let mut errors = FieldErrors::new();
    let username = required(&mut errors, "username", request.username);
    let password = required(&mut errors, "password", request.password);
    let (Some(username), Some(password)) = (username, password) else {
        return Err(AppError::Validation(errors));
    };

    let user = store
        .find_user_by_username(username.trim())
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !verify_password(hasher, user.password.clone(), password).await? {
        tracing::warn!(user_id = user.id, "Login rejected: wrong password");
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = store.get_or_create_token(user.id).await?;
    tracing::info!(user_id = user.id, "User logged in");
    Ok(LoginResponse {
        message: format!("Welcome {}", user.username),
        id: user.id,
        token: token.key,
    })
}

/// Deletes the named user's token so it no longer passes the guard.
/// `caller` is the authenticated user and may only log out themselves.
pub async fn logout(
    store: &dyn CredentialStore,
    caller: &User,
    request: LogoutRequest,
) -> Result<LogoutResponse, AppError> {
    let mut errors = FieldErrors::new();
    let Some(username) = required(&mut errors, "username", request.username) else {
        return Err(AppError::Validation(errors));
    };
    let username = username.trim();

    let user = store
        .find_user_by_username(username)
        .await?
        .ok_or_else(|| AppError::UserNotFound(username.to_string()))?;

    if user.id != caller.id {
        tracing::warn!(user_id = user.id, caller_id = caller.id, "Logout rejected: token belongs to another user");
        return Err(AuthError::TokenUserMismatch.into());
    }

    if !store.delete_token(user.id).await? {
        return Err(AppError::TokenNotFound(user.username));
    }

    tracing::info!(user_id = user.id, "User logged out");
    Ok(LogoutResponse {
        message: format!("Successfully logged out user '{}'.", user.username),
    })
}
