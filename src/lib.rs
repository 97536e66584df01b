use std::sync::Arc;

pub mod accounts;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod memes;
pub mod models;
pub mod password;
pub mod ranking;
pub mod repositories;
pub mod requests;
pub mod routes;
pub mod seed;
pub mod startup;

use crate::config::Config;
use crate::domain::{CredentialStore, MemeRepository, PasswordHasher};

/// AppState holds shared resources for the web server.
pub struct AppState {
    pub credentials: Arc<dyn CredentialStore>,
    pub memes: Arc<dyn MemeRepository>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub config: Config,
}
