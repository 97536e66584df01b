use crate::{
    db::{self, Database, SQLITE_CONSTRAINT_FOREIGNKEY, SQLITE_CONSTRAINT_UNIQUE},
    domain::{CredentialStore, MemeRepository},
    errors::{Entity, RepoError},
    models::{
        AuthToken, Meme, MemeOrdering, MemeTemplate, NewMeme, NewMemeTemplate, NewUser,
        RatingOutcome, RatingSummary, User,
    },
};
use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row, TransactionBehavior};
use std::path::Path;
use tracing::{self, info};
use uuid::Uuid;

const USER_COLUMNS: &str = "id, username, email, password, date_joined";
const TEMPLATE_COLUMNS: &str = "id, name, image_url, default_top_text, default_bottom_text";
const MEME_COLUMNS: &str = "id, template_id, top_text, bottom_text, created_by, created_at";

/// SQLite-backed implementation of both store traits.
#[derive(Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Opens the database file at `path`, creating tables as needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RepoError> {
        let path = path.as_ref();
        info!(path = %path.display(), "Initializing SqliteStore");
        Ok(Self::new(Database::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self, RepoError> {
        Ok(Self::new(Database::open_in_memory()?))
    }
}

// Wraps a rusqlite failure with a description of the operation that hit it.
fn backend(err: rusqlite::Error, what: String) -> RepoError {
    RepoError::BackendError(anyhow::Error::new(err).context(what))
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        date_joined: row.get(4)?,
    })
}

fn row_to_template(row: &Row<'_>) -> rusqlite::Result<MemeTemplate> {
    Ok(MemeTemplate {
        id: row.get(0)?,
        name: row.get(1)?,
        image_url: row.get(2)?,
        default_top_text: row.get(3)?,
        default_bottom_text: row.get(4)?,
    })
}

fn row_to_meme(row: &Row<'_>) -> rusqlite::Result<Meme> {
    Ok(Meme {
        id: row.get(0)?,
        template_id: row.get(1)?,
        top_text: row.get(2)?,
        bottom_text: row.get(3)?,
        created_by: row.get(4)?,
        created_at: row.get(5)?,
    })
}

// A fresh opaque key: 128 random bits rendered as 32 lowercase hex chars.
fn generate_token_key() -> String {
    Uuid::new_v4().simple().to_string()
}

#[async_trait]
impl CredentialStore for SqliteStore {
    async fn create_user(&self, user: NewUser) -> Result<User, RepoError> {
        self.db
            .call(move |conn| {
                let date_joined = Utc::now();
                conn.prepare_cached(
                    "INSERT INTO users (username, email, password, date_joined) VALUES (?1, ?2, ?3, ?4)",
                )
                .and_then(|mut stmt| {
                    stmt.execute(params![user.username, user.email, user.password_hash, date_joined])
                })
                .map_err(|err| {
                    if db::is_constraint_violation(&err, SQLITE_CONSTRAINT_UNIQUE) {
                        if let Some(field) = db::violated_column(&err) {
                            return RepoError::Conflict { field: field.to_string() };
                        }
                    }
                    backend(err, format!("SQLite: Failed to insert user '{}'", user.username))
                })?;

                let id = conn.last_insert_rowid();
                tracing::debug!(user_id = id, username = %user.username, "SQLite: User inserted");
                Ok(User {
                    id,
                    username: user.username,
                    email: user.email,
                    password: user.password_hash,
                    date_joined,
                })
            })
            .await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let username = username.to_string();
        self.db
            .call(move |conn| {
                conn.query_row(
                    &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
                    params![username],
                    row_to_user,
                )
                .optional()
                .map_err(|err| backend(err, format!("SQLite: Failed to get user '{}'", username)))
            })
            .await
    }

    async fn get_or_create_token(&self, user_id: i64) -> Result<AuthToken, RepoError> {
        self.db
            .call(move |conn| {
                // The UNIQUE(user_id) constraint makes a concurrent second insert a no-op.
                let inserted = conn
                    .execute(
                        "INSERT INTO tokens (key, user_id, created) VALUES (?1, ?2, ?3) \
                         ON CONFLICT (user_id) DO NOTHING",
                        params![generate_token_key(), user_id, Utc::now()],
                    )
                    .map_err(|err| {
                        if db::is_constraint_violation(&err, SQLITE_CONSTRAINT_FOREIGNKEY) {
                            RepoError::NotFound(Entity::User, user_id)
                        } else {
                            backend(err, format!("SQLite: Failed to insert token for user {}", user_id))
                        }
                    })?;

                let token = conn
                    .query_row(
                        "SELECT key, user_id, created FROM tokens WHERE user_id = ?1",
                        params![user_id],
                        |row| {
                            Ok(AuthToken {
                                key: row.get(0)?,
                                user_id: row.get(1)?,
                                created: row.get(2)?,
                            })
                        },
                    )
                    .map_err(|err| backend(err, format!("SQLite: Failed to read token for user {}", user_id)))?;

                tracing::debug!(user_id, created = (inserted > 0), "SQLite: Token issued");
                Ok(token)
            })
            .await
    }

    async fn find_token_owner(&self, key: &str) -> Result<Option<User>, RepoError> {
        let key = key.to_string();
        self.db
            .call(move |conn| {
                conn.query_row(
                    "SELECT u.id, u.username, u.email, u.password, u.date_joined \
                     FROM tokens t JOIN users u ON u.id = t.user_id WHERE t.key = ?1",
                    params![key],
                    row_to_user,
                )
                .optional()
                .map_err(|err| backend(err, "SQLite: Failed to resolve token owner".to_string()))
            })
            .await
    }

    async fn delete_token(&self, user_id: i64) -> Result<bool, RepoError> {
        self.db
            .call(move |conn| {
                let deleted = conn
                    .execute("DELETE FROM tokens WHERE user_id = ?1", params![user_id])
                    .map_err(|err| backend(err, format!("SQLite: Failed to delete token for user {}", user_id)))?;
                Ok(deleted > 0)
            })
            .await
    }
}

#[async_trait]
impl MemeRepository for SqliteStore {
    async fn create_template(&self, template: NewMemeTemplate) -> Result<MemeTemplate, RepoError> {
        self.db
            .call(move |conn| insert_template(conn, template))
            .await
    }

    async fn get_or_create_template(
        &self,
        template: NewMemeTemplate,
    ) -> Result<(MemeTemplate, bool), RepoError> {
        self.db
            .call(move |conn| {
                let tx = conn
                    .transaction_with_behavior(TransactionBehavior::Immediate)
                    .context("SQLite: Failed to begin template transaction")?;
                let existing = tx
                    .query_row(
                        &format!(
                            "SELECT {TEMPLATE_COLUMNS} FROM meme_templates WHERE name = ?1 AND image_url = ?2 \
                             AND default_top_text = ?3 AND default_bottom_text = ?4 ORDER BY id LIMIT 1"
                        ),
                        params![
                            template.name,
                            template.image_url,
                            template.default_top_text,
                            template.default_bottom_text
                        ],
                        row_to_template,
                    )
                    .optional()
                    .map_err(|err| backend(err, format!("SQLite: Failed to look up template '{}'", template.name)))?;

                let result = match existing {
                    Some(found) => (found, false),
                    None => (insert_template(&tx, template)?, true),
                };
                tx.commit().context("SQLite: Failed to commit template transaction")?;
                Ok(result)
            })
            .await
    }

    async fn get_template(&self, id: i64) -> Result<Option<MemeTemplate>, RepoError> {
        self.db
            .call(move |conn| {
                conn.query_row(
                    &format!("SELECT {TEMPLATE_COLUMNS} FROM meme_templates WHERE id = ?1"),
                    params![id],
                    row_to_template,
                )
                .optional()
                .map_err(|err| backend(err, format!("SQLite: Failed to get template (id: {})", id)))
            })
            .await
    }

    async fn list_templates(&self) -> Result<Vec<MemeTemplate>, RepoError> {
        self.db
            .call(|conn| {
                let mut stmt = conn
                    .prepare_cached(&format!("SELECT {TEMPLATE_COLUMNS} FROM meme_templates ORDER BY id"))
                    .context("SQLite: Failed to prepare template listing")?;
                let templates = stmt
                    .query_map([], row_to_template)
                    .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
                    .context("SQLite: Failed to list templates")?;
                tracing::debug!("SQLite: Listed {} templates", templates.len());
                Ok(templates)
            })
            .await
    }

    async fn create_meme(&self, meme: NewMeme) -> Result<Meme, RepoError> {
        self.db
            .call(move |conn| {
                let created_at = Utc::now();
                let inserted = conn
                    .prepare_cached(
                        "INSERT INTO memes (template_id, created_by, top_text, bottom_text, created_at) \
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                    )
                    .and_then(|mut stmt| {
                        stmt.execute(params![
                            meme.template_id,
                            meme.created_by,
                            meme.top_text,
                            meme.bottom_text,
                            created_at
                        ])
                    });

                if let Err(err) = inserted {
                    if !db::is_constraint_violation(&err, SQLITE_CONSTRAINT_FOREIGNKEY) {
                        return Err(backend(err, "SQLite: Failed to insert meme".to_string()));
                    }
                    // Either parent may be gone; the template is the one callers pick.
                    let template_exists = conn
                        .query_row(
                            "SELECT 1 FROM meme_templates WHERE id = ?1",
                            params![meme.template_id],
                            |_| Ok(()),
                        )
                        .optional()
                        .map_err(|err| {
                            backend(err, format!("SQLite: Failed to check template (id: {})", meme.template_id))
                        })?
                        .is_some();
                    return Err(if template_exists {
                        RepoError::NotFound(Entity::User, meme.created_by)
                    } else {
                        RepoError::NotFound(Entity::Template, meme.template_id)
                    });
                }

                let id = conn.last_insert_rowid();
                info!(meme_id = id, template_id = meme.template_id, "SQLite: Meme inserted");
                Ok(Meme {
                    id,
                    template_id: meme.template_id,
                    top_text: meme.top_text,
                    bottom_text: meme.bottom_text,
                    created_by: meme.created_by,
                    created_at,
                })
            })
            .await
    }

    async fn get_meme(&self, id: i64) -> Result<Option<Meme>, RepoError> {
        self.db
            .call(move |conn| {
                conn.query_row(
                    &format!("SELECT {MEME_COLUMNS} FROM memes WHERE id = ?1"),
                    params![id],
                    row_to_meme,
                )
                .optional()
                .map_err(|err| backend(err, format!("SQLite: Failed to get meme (id: {})", id)))
            })
            .await
    }

    async fn count_memes(&self) -> Result<u64, RepoError> {
        self.db
            .call(|conn| {
                let count: i64 = conn
                    .query_row("SELECT COUNT(*) FROM memes", [], |row| row.get(0))
                    .context("SQLite: Failed to count memes")?;
                u64::try_from(count).map_err(|_| RepoError::DataCorruption(format!("negative meme count {}", count)))
            })
            .await
    }

    async fn list_memes(
        &self,
        ordering: MemeOrdering,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<Meme>, RepoError> {
        let direction = match ordering {
            MemeOrdering::Oldest => "ASC",
            MemeOrdering::Newest => "DESC",
        };
        let offset = i64::try_from(offset)
            .map_err(|_| RepoError::BackendError(anyhow::anyhow!("page offset {} out of range", offset)))?;
        self.db
            .call(move |conn| {
                let mut stmt = conn
                    .prepare_cached(&format!(
                        "SELECT {MEME_COLUMNS} FROM memes ORDER BY id {direction} LIMIT ?1 OFFSET ?2"
                    ))
                    .context("SQLite: Failed to prepare meme listing")?;
                let memes = stmt
                    .query_map(params![limit, offset], row_to_meme)
                    .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
                    .context("SQLite: Failed to list memes")?;
                tracing::debug!(offset, limit, "SQLite: Listed {} memes", memes.len());
                Ok(memes)
            })
            .await
    }

    async fn meme_at(&self, offset: u64) -> Result<Option<Meme>, RepoError> {
        let offset = i64::try_from(offset)
            .map_err(|_| RepoError::BackendError(anyhow::anyhow!("meme offset {} out of range", offset)))?;
        self.db
            .call(move |conn| {
                conn.query_row(
                    &format!("SELECT {MEME_COLUMNS} FROM memes ORDER BY id LIMIT 1 OFFSET ?1"),
                    params![offset],
                    row_to_meme,
                )
                .optional()
                .map_err(|err| backend(err, format!("SQLite: Failed to read meme at offset {}", offset)))
            })
            .await
    }

    async fn upsert_rating(
        &self,
        meme_id: i64,
        user_id: i64,
        score: i64,
    ) -> Result<RatingOutcome, RepoError> {
        self.db
            .call(move |conn| {
                let tx = conn
                    .transaction_with_behavior(TransactionBehavior::Immediate)
                    .context("SQLite: Failed to begin rating transaction")?;

                let meme_exists = tx
                    .query_row("SELECT 1 FROM memes WHERE id = ?1", params![meme_id], |_| Ok(()))
                    .optional()
                    .map_err(|err| backend(err, format!("SQLite: Failed to check meme (id: {})", meme_id)))?
                    .is_some();
                if !meme_exists {
                    return Err(RepoError::NotFound(Entity::Meme, meme_id));
                }

                let now = Utc::now();
                let inserted = tx.execute(
                    "INSERT INTO ratings (meme_id, user_id, score, rated_at) VALUES (?1, ?2, ?3, ?4)",
                    params![meme_id, user_id, score, now],
                );

                let outcome = match inserted {
                    Ok(_) => RatingOutcome::Created(tx.last_insert_rowid()),
                    // The pair is already rated: overwrite that row instead of adding one.
                    Err(err) if db::is_constraint_violation(&err, SQLITE_CONSTRAINT_UNIQUE) => {
                        let id: i64 = tx
                            .query_row(
                                "UPDATE ratings SET score = ?1, rated_at = ?2 \
                                 WHERE meme_id = ?3 AND user_id = ?4 RETURNING id",
                                params![score, now, meme_id, user_id],
                                |row| row.get(0),
                            )
                            .map_err(|err| {
                                backend(err, format!("SQLite: Failed to update rating on meme {}", meme_id))
                            })?;
                        RatingOutcome::Updated(id)
                    }
                    Err(err) => {
                        return Err(backend(err, format!("SQLite: Failed to insert rating on meme {}", meme_id)));
                    }
                };

                tx.commit().context("SQLite: Failed to commit rating transaction")?;
                tracing::debug!(meme_id, user_id, score, ?outcome, "SQLite: Rating stored");
                Ok(outcome)
            })
            .await
    }

    async fn rating_summaries(&self, limit: u32) -> Result<Vec<RatingSummary>, RepoError> {
        self.db
            .call(move |conn| {
                // Inner join: memes without ratings never produce a row.
                let mut stmt = conn
                    .prepare_cached(
                        "SELECT m.id, m.template_id, m.top_text, m.bottom_text, m.created_by, m.created_at, \
                                COUNT(r.id), SUM(r.score) \
                         FROM memes m JOIN ratings r ON r.meme_id = m.id \
                         GROUP BY m.id \
                         ORDER BY AVG(r.score) DESC, m.id ASC \
                         LIMIT ?1",
                    )
                    .context("SQLite: Failed to prepare rating aggregate")?;
                let summaries = stmt
                    .query_map(params![limit], |row| {
                        Ok(RatingSummary {
                            meme: row_to_meme(row)?,
                            rating_count: row.get(6)?,
                            score_total: row.get(7)?,
                        })
                    })
                    .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
                    .context("SQLite: Failed to aggregate ratings")?;
                tracing::debug!("SQLite: Aggregated ratings for {} memes", summaries.len());
                Ok(summaries)
            })
            .await
    }
}

fn insert_template(
    conn: &rusqlite::Connection,
    template: NewMemeTemplate,
) -> Result<MemeTemplate, RepoError> {
    conn.prepare_cached(
        "INSERT INTO meme_templates (name, image_url, default_top_text, default_bottom_text) \
         VALUES (?1, ?2, ?3, ?4)",
    )
    .and_then(|mut stmt| {
        stmt.execute(params![
            template.name,
            template.image_url,
            template.default_top_text,
            template.default_bottom_text
        ])
    })
    .map_err(|err| backend(err, format!("SQLite: Failed to insert template '{}'", template.name)))?;

    let id = conn.last_insert_rowid();
    info!(template_id = id, name = %template.name, "SQLite: Template inserted");
    Ok(MemeTemplate {
        id,
        name: template.name,
        image_url: template.image_url,
        default_top_text: template.default_top_text,
        default_bottom_text: template.default_bottom_text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rating;

    // Every stored rating of one meme, oldest first.
    async fn ratings_for_meme(store: &SqliteStore, meme_id: i64) -> Vec<Rating> {
        store
            .db
            .call(move |conn| {
                let mut stmt = conn
                    .prepare("SELECT id, meme_id, user_id, score, rated_at FROM ratings WHERE meme_id = ?1 ORDER BY id")
                    .context("prepare rating listing")?;
                let ratings = stmt
                    .query_map(params![meme_id], |row| {
                        Ok(Rating {
                            id: row.get(0)?,
                            meme_id: row.get(1)?,
                            user_id: row.get(2)?,
                            score: row.get(3)?,
                            rated_at: row.get(4)?,
                        })
                    })
                    .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
                    .context("list ratings")?;
                Ok(ratings)
            })
            .await
            .unwrap()
    }

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            email: format!("{}@example.com", name),
            password_hash: "$argon2id$stub".to_string(),
        }
    }

    fn new_template(top: &str, bottom: &str) -> NewMemeTemplate {
        NewMemeTemplate {
            name: "Drake".to_string(),
            image_url: "https://example.com/drake.png".to_string(),
            default_top_text: top.to_string(),
            default_bottom_text: bottom.to_string(),
        }
    }

    async fn store_with_meme() -> (SqliteStore, User, Meme) {
        let store = SqliteStore::open_in_memory().unwrap();
        let user = store.create_user(new_user("alice")).await.unwrap();
        let template = store.create_template(new_template("A", "B")).await.unwrap();
        let meme = store
            .create_meme(NewMeme {
                template_id: template.id,
                top_text: "top".into(),
                bottom_text: "bottom".into(),
                created_by: user.id,
            })
            .await
            .unwrap();
        (store, user, meme)
    }

    #[tokio::test]
    async fn duplicate_username_and_email_are_conflicts() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.create_user(new_user("alice")).await.unwrap();

        let mut same_name = new_user("alice");
        same_name.email = "other@example.com".into();
        match store.create_user(same_name).await {
            Err(RepoError::Conflict { field }) => assert_eq!(field, "username"),
            other => panic!("expected username conflict, got {:?}", other),
        }

        let mut same_email = new_user("bob");
        same_email.email = "alice@example.com".into();
        match store.create_user(same_email).await {
            Err(RepoError::Conflict { field }) => assert_eq!(field, "email"),
            other => panic!("expected email conflict, got {:?}", other),
        }

        assert!(store.find_user_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn token_issuance_is_idempotent_until_deleted() {
        let store = SqliteStore::open_in_memory().unwrap();
        let user = store.create_user(new_user("alice")).await.unwrap();

        let first = store.get_or_create_token(user.id).await.unwrap();
        let second = store.get_or_create_token(user.id).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.key.len(), 32);

        let owner = store.find_token_owner(&first.key).await.unwrap().unwrap();
        assert_eq!(owner.id, user.id);

        assert!(store.delete_token(user.id).await.unwrap());
        assert!(!store.delete_token(user.id).await.unwrap());
        assert!(store.find_token_owner(&first.key).await.unwrap().is_none());

        let fresh = store.get_or_create_token(user.id).await.unwrap();
        assert_ne!(fresh.key, first.key);
    }

    #[tokio::test]
    async fn concurrent_logins_share_one_token() {
        let store = SqliteStore::open_in_memory().unwrap();
        let user = store.create_user(new_user("alice")).await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.get_or_create_token(user.id).await.unwrap().key })
            })
            .collect();
        let mut keys = Vec::new();
        for handle in handles {
            keys.push(handle.await.unwrap());
        }
        keys.dedup();
        assert_eq!(keys.len(), 1);
    }

    #[tokio::test]
    async fn rating_twice_keeps_one_row_with_latest_score() {
        let (store, user, meme) = store_with_meme().await;

        let created = store.upsert_rating(meme.id, user.id, 2).await.unwrap();
        assert!(matches!(created, RatingOutcome::Created(_)));

        let updated = store.upsert_rating(meme.id, user.id, 5).await.unwrap();
        assert_eq!(updated, RatingOutcome::Updated(created.rating_id()));

        let ratings = ratings_for_meme(&store, meme.id).await;
        assert_eq!(ratings.len(), 1);
        assert_eq!(ratings[0].score, 5);
    }

    #[tokio::test]
    async fn rating_unknown_meme_creates_nothing() {
        let (store, user, _) = store_with_meme().await;
        match store.upsert_rating(999, user.id, 3).await {
            Err(RepoError::NotFound(Entity::Meme, 999)) => {}
            other => panic!("expected missing meme, got {:?}", other),
        }
        assert!(ratings_for_meme(&store, 999).await.is_empty());
    }

    #[tokio::test]
    async fn meme_with_missing_template_is_not_found() {
        let store = SqliteStore::open_in_memory().unwrap();
        let user = store.create_user(new_user("alice")).await.unwrap();
        let result = store
            .create_meme(NewMeme {
                template_id: 42,
                top_text: String::new(),
                bottom_text: String::new(),
                created_by: user.id,
            })
            .await;
        assert!(matches!(result, Err(RepoError::NotFound(Entity::Template, 42))));
        assert_eq!(store.count_memes().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn meme_with_missing_creator_is_user_not_found() {
        let store = SqliteStore::open_in_memory().unwrap();
        let template = store.create_template(new_template("A", "B")).await.unwrap();
        let result = store
            .create_meme(NewMeme {
                template_id: template.id,
                top_text: String::new(),
                bottom_text: String::new(),
                created_by: 999,
            })
            .await;
        assert!(matches!(result, Err(RepoError::NotFound(Entity::User, 999))));
        assert_eq!(store.count_memes().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn summaries_are_limited_and_tied_means_ordered_by_id() {
        let (store, alice, first) = store_with_meme().await;
        let mut memes = vec![first.clone()];
        for i in 0..11 {
            memes.push(
                store
                    .create_meme(NewMeme {
                        template_id: first.template_id,
                        top_text: format!("{}", i),
                        bottom_text: String::new(),
                        created_by: alice.id,
                    })
                    .await
                    .unwrap(),
            );
        }
        // Rated in reverse so insertion order cannot explain the result.
        for meme in memes.iter().rev() {
            let score = if meme.id == memes[6].id { 5 } else { 2 };
            store.upsert_rating(meme.id, alice.id, score).await.unwrap();
        }

        let summaries = store.rating_summaries(10).await.unwrap();
        let ids: Vec<i64> = summaries.iter().map(|s| s.meme.id).collect();
        let mut expected = vec![memes[6].id];
        expected.extend(memes.iter().filter(|m| m.id != memes[6].id).take(9).map(|m| m.id));
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn summaries_skip_unrated_memes() {
        let (store, alice, rated) = store_with_meme().await;
        let bob = store.create_user(new_user("bob")).await.unwrap();
        store
            .create_meme(NewMeme {
                template_id: rated.template_id,
                top_text: "never".into(),
                bottom_text: "rated".into(),
                created_by: bob.id,
            })
            .await
            .unwrap();

        store.upsert_rating(rated.id, alice.id, 5).await.unwrap();
        store.upsert_rating(rated.id, bob.id, 4).await.unwrap();

        let summaries = store.rating_summaries(10).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].meme.id, rated.id);
        assert_eq!(summaries[0].rating_count, 2);
        assert_eq!(summaries[0].score_total, 9);
    }

    #[tokio::test]
    async fn listing_pages_in_both_orders() {
        let (store, user, first) = store_with_meme().await;
        let second = store
            .create_meme(NewMeme {
                template_id: first.template_id,
                top_text: "2".into(),
                bottom_text: "2".into(),
                created_by: user.id,
            })
            .await
            .unwrap();

        let oldest = store.list_memes(MemeOrdering::Oldest, 0, 1).await.unwrap();
        assert_eq!(oldest.iter().map(|m| m.id).collect::<Vec<_>>(), vec![first.id]);
        let newest = store.list_memes(MemeOrdering::Newest, 0, 10).await.unwrap();
        assert_eq!(newest.iter().map(|m| m.id).collect::<Vec<_>>(), vec![second.id, first.id]);
        assert_eq!(store.meme_at(1).await.unwrap().map(|m| m.id), Some(second.id));
        assert!(store.meme_at(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn get_or_create_template_matches_all_fields() {
        let store = SqliteStore::open_in_memory().unwrap();
        let (first, created) = store.get_or_create_template(new_template("A", "B")).await.unwrap();
        assert!(created);
        let (again, created) = store.get_or_create_template(new_template("A", "B")).await.unwrap();
        assert!(!created);
        assert_eq!(first, again);

        let (_, created) = store.get_or_create_template(new_template("A", "C")).await.unwrap();
        assert!(created);
        assert_eq!(store.list_templates().await.unwrap().len(), 2);
    }
}
