use crate::{
    accounts::{self, LoginResponse, LogoutResponse, SignupResponse},
    auth::AuthenticatedUser,
    errors::AppError,
    memes::{self, Created},
    models::{Meme, MemeTemplate, Page, RatingOutcome, TopMeme},
    ranking,
    requests::{
        CreateMemeRequest, CreateTemplateRequest, LoginRequest, LogoutRequest, MemeListQuery,
        RateMemeRequest, SignupRequest,
    },
    AppState,
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing;

type JsonBody<T> = Result<Json<T>, JsonRejection>;

/// POST /signup
pub async fn signup(
    State(state): State<Arc<AppState>>,
    payload: JsonBody<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), AppError> {
    let Json(request) = payload?;
    let user = accounts::signup(state.credentials.as_ref(), Arc::clone(&state.hasher), request).await?;
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            id: user.id,
            username: user.username,
        }),
    ))
}

/// POST /login
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let Json(request) = payload?;
    let response = accounts::login(state.credentials.as_ref(), Arc::clone(&state.hasher), request).await?;
    Ok(Json(response))
}

/// POST /logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
    payload: JsonBody<LogoutRequest>,
) -> Result<Json<LogoutResponse>, AppError> {
    let Json(request) = payload?;
    let response = accounts::logout(state.credentials.as_ref(), &user, request).await?;
    Ok(Json(response))
}

pub async fn create_meme(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
    payload: JsonBody<CreateMemeRequest>,
) -> Result<(StatusCode, Json<Created>), AppError> {
    let Json(request) = payload?;
    let meme = memes::create_meme(state.memes.as_ref(), &user, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(Created {
            id: meme.id,
            message: "Meme created successfully!",
        }),
    ))
}

pub async fn list_memes(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(_user): AuthenticatedUser,
    query: Result<Query<MemeListQuery>, QueryRejection>,
) -> Result<Json<Page<Meme>>, AppError> {
    let Query(query) = query?;
    tracing::debug!(?query, "Listing memes via handler");
    let page = memes::list_memes(state.memes.as_ref(), &query, state.config.memes_page_size).await?;
    Ok(Json(page))
}

pub async fn get_meme(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(_user): AuthenticatedUser,
    meme_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Meme>, AppError> {
    let Path(meme_id) = meme_id?;
    tracing::debug!(%meme_id, "Fetching meme details via handler");
    let meme = memes::get_meme(state.memes.as_ref(), meme_id).await?;
    Ok(Json(meme))
}

pub async fn create_template(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
    payload: JsonBody<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<Created>), AppError> {
    let Json(request) = payload?;
    let template = memes::create_template(state.memes.as_ref(), request).await?;
    tracing::debug!(template_id = template.id, user_id = user.id, "Template created via handler");
    Ok((
        StatusCode::CREATED,
        Json(Created {
            id: template.id,
            message: "Meme template created successfully!",
        }),
    ))
}

pub async fn list_templates(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(_user): AuthenticatedUser,
) -> Result<Json<Vec<MemeTemplate>>, AppError> {
    let templates = state.memes.list_templates().await?;
    Ok(Json(templates))
}

pub async fn rate_meme(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
    meme_id: Result<Path<i64>, PathRejection>,
    payload: JsonBody<RateMemeRequest>,
) -> Result<(StatusCode, Json<Created>), AppError> {
    let Path(meme_id) = meme_id?;
    let Json(request) = payload?;
    let outcome = memes::rate_meme(state.memes.as_ref(), meme_id, &user, request).await?;
    let message = match outcome {
        RatingOutcome::Created(_) => "Rating created successfully!",
        RatingOutcome::Updated(_) => "Rating updated successfully!",
    };
    Ok((
        StatusCode::CREATED,
        Json(Created {
            id: outcome.rating_id(),
            message,
        }),
    ))
}

pub async fn random_meme(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(_user): AuthenticatedUser,
) -> Result<Json<Meme>, AppError> {
    let meme = ranking::random_meme(state.memes.as_ref()).await?;
    tracing::debug!(meme_id = meme.id, "Random meme selected via handler");
    Ok(Json(meme))
}

pub async fn top_memes(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(_user): AuthenticatedUser,
) -> Result<Json<Vec<TopMeme>>, AppError> {
    let top = ranking::top_rated(state.memes.as_ref()).await?;
    Ok(Json(top))
}
