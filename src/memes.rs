use serde::Serialize;
use url::Url;

use crate::{
    domain::MemeRepository,
    errors::{AppError, FieldErrors},
    models::{Meme, MemeOrdering, MemeTemplate, NewMeme, NewMemeTemplate, Page, RatingOutcome, User},
    requests::{integer_field, CreateMemeRequest, CreateTemplateRequest, MemeListQuery, RateMemeRequest},
};

const REQUIRED: &str = "This field is required.";
const MAX_TEMPLATE_TEXT_LEN: usize = 100;
const MAX_CAPTION_LEN: usize = 255;
pub const MIN_SCORE: i64 = 1;
pub const MAX_SCORE: i64 = 5;

/// `{id, message}` body returned by the create endpoints.
#[derive(Serialize, Debug)]
pub struct Created {
    pub id: i64,
    pub message: &'static str,
}

fn check_len(errors: &mut FieldErrors, field: &str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.add(field, format!("Ensure this field has no more than {} characters.", max));
    }
}

// Blank captions fall back to the template's default.
fn caption_or_default(value: Option<String>, default: &str) -> String {
    match value {
        Some(text) if !text.trim().is_empty() => text,
        _ => default.to_string(),
    }
}

pub async fn create_template(
    repo: &dyn MemeRepository,
    request: CreateTemplateRequest,
) -> Result<MemeTemplate, AppError> {
    let mut errors = FieldErrors::new();

    let name = request.name.unwrap_or_default();
    if name.trim().is_empty() {
        errors.add("name", "This field may not be blank.");
    } else {
        check_len(&mut errors, "name", &name, MAX_TEMPLATE_TEXT_LEN);
    }

    let image_url = request.image_url.unwrap_or_default();
    if image_url.trim().is_empty() {
        errors.add("image_url", REQUIRED);
    } else if Url::parse(image_url.trim()).is_err() {
        errors.add("image_url", "Enter a valid URL.");
    }

    let default_top_text = request.default_top_text.unwrap_or_default();
    let default_bottom_text = request.default_bottom_text.unwrap_or_default();
    check_len(&mut errors, "default_top_text", &default_top_text, MAX_TEMPLATE_TEXT_LEN);
    check_len(&mut errors, "default_bottom_text", &default_bottom_text, MAX_TEMPLATE_TEXT_LEN);

    errors.into_result()?;

    let template = repo
        .create_template(NewMemeTemplate {
            name,
            image_url: image_url.trim().to_string(),
            default_top_text,
            default_bottom_text,
        })
        .await?;
    tracing::info!(template_id = template.id, "Meme template created");
    Ok(template)
}

/// Creates a meme owned by `creator`, filling blank captions from the template.
pub async fn create_meme(
    repo: &dyn MemeRepository,
    creator: &User,
    request: CreateMemeRequest,
) -> Result<Meme, AppError> {
    let template_id = match request.template.as_ref() {
        None | Some(serde_json::Value::Null) => {
            return Err(AppError::Validation(FieldErrors::single("template", REQUIRED)));
        }
        Some(raw) => integer_field(raw).ok_or_else(|| {
            AppError::Validation(FieldErrors::single("template", "Incorrect type. Expected pk value."))
        })?,
    };

    let template = repo.get_template(template_id).await?.ok_or_else(|| {
        AppError::Validation(FieldErrors::single(
            "template",
            format!("Invalid pk \"{}\" - object does not exist.", template_id),
        ))
    })?;

    let top_text = caption_or_default(request.top_text, &template.default_top_text);
    let bottom_text = caption_or_default(request.bottom_text, &template.default_bottom_text);

    let mut errors = FieldErrors::new();
    check_len(&mut errors, "top_text", &top_text, MAX_CAPTION_LEN);
    check_len(&mut errors, "bottom_text", &bottom_text, MAX_CAPTION_LEN);
    errors.into_result()?;

    let meme = repo
        .create_meme(NewMeme {
            template_id: template.id,
            top_text,
            bottom_text,
            created_by: creator.id,
        })
        .await?;
    tracing::info!(meme_id = meme.id, user_id = creator.id, "Meme created");
    Ok(meme)
}

pub async fn get_meme(repo: &dyn MemeRepository, meme_id: i64) -> Result<Meme, AppError> {
    repo.get_meme(meme_id)
        .await?
        .ok_or(AppError::MemeNotFound(meme_id))
}

fn parse_ordering(raw: Option<&str>) -> Result<MemeOrdering, AppError> {
    match raw.map(str::trim) {
        None | Some("") | Some("id") => Ok(MemeOrdering::Oldest),
        Some("-id") => Ok(MemeOrdering::Newest),
        Some(other) => Err(AppError::Validation(FieldErrors::single(
            "ordering",
            format!("Unsupported ordering \"{}\". Use \"id\" or \"-id\".", other),
        ))),
    }
}

fn parse_page(raw: Option<&str>) -> Result<u32, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(1),
        Some(value) => match value.parse::<u32>() {
            Ok(page) if page >= 1 => Ok(page),
            _ => Err(AppError::InvalidPage),
        },
    }
}

/// One page of memes. Page 1 always exists; later pages must hold at least one meme.
pub async fn list_memes(
    repo: &dyn MemeRepository,
    query: &MemeListQuery,
    page_size: u32,
) -> Result<Page<Meme>, AppError> {
    let ordering = parse_ordering(query.ordering.as_deref())?;
    let page = parse_page(query.page.as_deref())?;

    let count = repo.count_memes().await?;
    let size = u64::from(page_size.max(1));
    let last_page = count.div_ceil(size).max(1);
    if u64::from(page) > last_page {
        return Err(AppError::InvalidPage);
    }

    let offset = u64::from(page - 1) * size;
    let results = repo.list_memes(ordering, offset, page_size.max(1)).await?;
    tracing::debug!(page, count, returned = results.len(), "Listed memes");

    Ok(Page {
        count,
        next: (u64::from(page) < last_page).then(|| page + 1),
        previous: (page > 1).then(|| page - 1),
        results,
    })
}

fn parse_score(request: &RateMemeRequest) -> Result<i64, AppError> {
    let raw = match request.score.as_ref() {
        None | Some(serde_json::Value::Null) => {
            return Err(AppError::Validation(FieldErrors::single("score", REQUIRED)));
        }
        Some(raw) => raw,
    };
    match integer_field(raw) {
        Some(score) if (MIN_SCORE..=MAX_SCORE).contains(&score) => Ok(score),
        _ => Err(AppError::Validation(FieldErrors::single(
            "score",
            format!("\"{}\" is not a valid choice. Scores run from {} to {}.", raw, MIN_SCORE, MAX_SCORE),
        ))),
    }
}

/// Records `rater`'s score for the meme, replacing any earlier score of theirs.
pub async fn rate_meme(
    repo: &dyn MemeRepository,
    meme_id: i64,
    rater: &User,
    request: RateMemeRequest,
) -> Result<RatingOutcome, AppError> {
    let score = parse_score(&request)?;
    let outcome = repo.upsert_rating(meme_id, rater.id, score).await?;
    tracing::info!(meme_id, user_id = rater.id, score, ?outcome, "Meme rated");
    Ok(outcome)
}
