use chrono::{DateTime, Utc};
use serde::Serialize;

/// A registered account. The password is the encoded hash, never the plaintext.
#[derive(Serialize, Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub date_joined: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// The single live bearer token of a user.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthToken {
    pub key: String,
    pub user_id: i64,
    pub created: DateTime<Utc>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MemeTemplate {
    pub id: i64,
    pub name: String,
    pub image_url: String,
    pub default_top_text: String,
    pub default_bottom_text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMemeTemplate {
    pub name: String,
    pub image_url: String,
    pub default_top_text: String,
    pub default_bottom_text: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Meme {
    pub id: i64,
    pub template_id: i64,
    pub top_text: String,
    pub bottom_text: String,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

/// Meme ready for insertion; captions are already resolved against the template.
#[derive(Debug, Clone)]
pub struct NewMeme {
    pub template_id: i64,
    pub top_text: String,
    pub bottom_text: String,
    pub created_by: i64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Rating {
    pub id: i64,
    pub meme_id: i64,
    pub user_id: i64,
    pub score: i64,
    pub rated_at: DateTime<Utc>,
}

/// Result of a rating upsert, carrying the id of the affected row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingOutcome {
    Created(i64),
    Updated(i64),
}

impl RatingOutcome {
    pub fn rating_id(&self) -> i64 {
        match self {
            RatingOutcome::Created(id) | RatingOutcome::Updated(id) => *id,
        }
    }
}

/// Aggregate over the ratings of one meme. Only memes with at least one rating have a summary.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingSummary {
    pub meme: Meme,
    pub rating_count: i64,
    pub score_total: i64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TopMeme {
    pub id: i64,
    pub template: i64,
    pub top_text: String,
    pub bottom_text: String,
    pub avg_rating: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemeOrdering {
    #[default]
    Oldest,
    Newest,
}

/// One page of a page-number paginated listing.
#[derive(Serialize, Debug, Clone)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<u32>,
    pub previous: Option<u32>,
    pub results: Vec<T>,
}
