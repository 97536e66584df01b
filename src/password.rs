use anyhow::{Context, Result};
use rand::{thread_rng, Rng};

use crate::domain::PasswordHasher;

/// Argon2 hasher producing PHC-encoded strings with a random 32-byte salt.
pub struct Argon2PasswordHasher {
    config: argon2::Config<'static>,
}

impl Argon2PasswordHasher {
    pub fn new() -> Self {
        Self::with_config(argon2::Config::default())
    }

    /// Custom cost parameters, e.g. a cheap profile for tests.
    pub fn with_config(config: argon2::Config<'static>) -> Self {
        Self { config }
    }

    /// Minimal cost parameters. Only for tests.
    pub fn fast() -> Self {
        Self::with_config(argon2::Config {
            mem_cost: 64,
            time_cost: 1,
            ..argon2::Config::default()
        })
    }
}

impl Default for Argon2PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &str) -> Result<String> {
        let mut salt = [0u8; 32];
        thread_rng().fill(&mut salt);
        argon2::hash_encoded(password.as_bytes(), &salt, &self.config)
            .context("Failed to hash password")
    }

    fn verify(&self, encoded: &str, password: &str) -> Result<bool> {
        argon2::verify_encoded(encoded, password.as_bytes())
            .context("Failed to verify password hash")
    }
}
