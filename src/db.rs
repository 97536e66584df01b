// Standard library imports
use std::path::Path;
use std::sync::{Arc, Mutex};

// External crate imports
use anyhow::{anyhow, Context, Result};
use rusqlite::{ffi, Connection};
use tracing;

// Internal crate imports
use crate::errors::RepoError;

/// Extended result code for `UNIQUE` constraint failures.
pub const SQLITE_CONSTRAINT_UNIQUE: i32 = 2067;
/// Extended result code for `FOREIGN KEY` constraint failures.
pub const SQLITE_CONSTRAINT_FOREIGNKEY: i32 = 787;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT NOT NULL UNIQUE,
    email       TEXT NOT NULL UNIQUE,
    password    TEXT NOT NULL,
    date_joined TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tokens (
    key     TEXT PRIMARY KEY,
    user_id INTEGER NOT NULL UNIQUE REFERENCES users (id) ON DELETE CASCADE,
    created TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS meme_templates (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    name                TEXT NOT NULL,
    image_url           TEXT NOT NULL,
    default_top_text    TEXT NOT NULL DEFAULT '',
    default_bottom_text TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS memes (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    template_id INTEGER NOT NULL REFERENCES meme_templates (id) ON DELETE CASCADE,
    created_by  INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE,
    top_text    TEXT NOT NULL,
    bottom_text TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS ratings (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    meme_id  INTEGER NOT NULL REFERENCES memes (id) ON DELETE CASCADE,
    user_id  INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE,
    score    INTEGER NOT NULL CHECK (score BETWEEN 1 AND 5),
    rated_at TEXT NOT NULL,
    UNIQUE (meme_id, user_id)
);

CREATE INDEX IF NOT EXISTS ratings_meme_id ON ratings (meme_id);
";

/// Shared handle to the single SQLite connection.
///
/// Every call takes the lock for one closure on the blocking pool, so a request
/// never holds the connection across more than one store round trip.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens (or creates) the database file and applies the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("SQLite: Failed to open database at '{}'", path.display()))?;
        tracing::info!(path = %path.display(), "SQLite: Database opened");
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("SQLite: Failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")
            .context("SQLite: Failed to enable foreign keys")?;
        migrate(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` against the connection on the blocking thread pool.
    pub async fn call<F, T>(&self, f: F) -> Result<T, RepoError>
    where
        F: FnOnce(&mut Connection) -> Result<T, RepoError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| RepoError::BackendError(anyhow!("SQLite: connection mutex poisoned")))?;
            f(&mut guard)
        })
        .await
        .context("SQLite: Blocking database task failed")
        .map_err(RepoError::BackendError)?
    }
}

/// Creates every table and index if it does not already exist.
pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("SQLite: Failed to apply schema")?;
    tracing::debug!("SQLite: Schema is up to date");
    Ok(())
}

/// True when `err` is a constraint failure with the given extended result code.
pub fn is_constraint_violation(err: &rusqlite::Error, extended_code: i32) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ffi::ErrorCode::ConstraintViolation
            && e.extended_code == extended_code
    )
}

/// Name of the column behind a `UNIQUE constraint failed: table.column` message.
pub fn violated_column(err: &rusqlite::Error) -> Option<&str> {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(msg)) => msg
            .strip_prefix("UNIQUE constraint failed: ")
            .and_then(|cols| cols.split(", ").next())
            .and_then(|col| col.rsplit('.').next()),
        _ => None,
    }
}
