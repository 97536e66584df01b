use crate::errors::RepoError;
use crate::models::{
    AuthToken, Meme, MemeOrdering, MemeTemplate, NewMeme, NewMemeTemplate, NewUser,
    RatingOutcome, RatingSummary, User,
};
use async_trait::async_trait;

/// Users and their single live bearer token.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static { // Send+Sync+'static required for Arc<dyn>
    /// Inserts a user. A taken username or email fails with `RepoError::Conflict`
    /// naming the field, straight from the storage constraint.
    async fn create_user(&self, user: NewUser) -> Result<User, RepoError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    /// Returns the user's token, creating it if the user has none.
    /// Never leaves two live tokens for one user, even under concurrent logins.
    async fn get_or_create_token(&self, user_id: i64) -> Result<AuthToken, RepoError>;

    /// Resolves a token key to the user that owns it.
    async fn find_token_owner(&self, key: &str) -> Result<Option<User>, RepoError>;

    /// Deletes the user's token. Returns false when the user held none.
    async fn delete_token(&self, user_id: i64) -> Result<bool, RepoError>;
}

/// Templates, memes and ratings.
#[async_trait]
pub trait MemeRepository: Send + Sync + 'static {
    async fn create_template(&self, template: NewMemeTemplate) -> Result<MemeTemplate, RepoError>;

    /// Looks up a template equal in every field, inserting it when absent.
    /// The flag is true when a row was inserted.
    async fn get_or_create_template(
        &self,
        template: NewMemeTemplate,
    ) -> Result<(MemeTemplate, bool), RepoError>;

    async fn get_template(&self, id: i64) -> Result<Option<MemeTemplate>, RepoError>;

    /// All templates in insertion order.
    async fn list_templates(&self) -> Result<Vec<MemeTemplate>, RepoError>;

    /// Fails with `RepoError::NotFound(Entity::Template, _)` if the template vanished.
    async fn create_meme(&self, meme: NewMeme) -> Result<Meme, RepoError>;

    /// Retrieves a meme by its ID.
    /// Returns Ok(None) if the meme is not found.
    async fn get_meme(&self, id: i64) -> Result<Option<Meme>, RepoError>;

    async fn count_memes(&self) -> Result<u64, RepoError>;

    async fn list_memes(
        &self,
        ordering: MemeOrdering,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<Meme>, RepoError>;

    /// The meme at `offset` in id order, if any.
    async fn meme_at(&self, offset: u64) -> Result<Option<Meme>, RepoError>;

    /// Creates or overwrites the rating of `user_id` on `meme_id` in one transaction.
    /// Fails with `RepoError::NotFound(Entity::Meme, _)` when the meme does not exist.
    async fn upsert_rating(
        &self,
        meme_id: i64,
        user_id: i64,
        score: i64,
    ) -> Result<RatingOutcome, RepoError>;

    /// Score totals for rated memes only, best mean first, at most `limit` entries.
    async fn rating_summaries(&self, limit: u32) -> Result<Vec<RatingSummary>, RepoError>;
}

/// Password hashing, kept outside the store.
pub trait PasswordHasher: Send + Sync + 'static {
    fn hash(&self, password: &str) -> anyhow::Result<String>;

    fn verify(&self, encoded: &str, password: &str) -> anyhow::Result<bool>;
}
