use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{
        Like, LikeRequest, LikedSongDetail, MessageResponse, RecommendationParams, SearchParams,
        Song, SongId, UserId,
    },
    services::{likes, recommendations, song_search},
};

use super::AppState;

/// Identifiers are SERIAL columns, so anything below 1 cannot exist
fn positive_id(id: i32, name: &str) -> AppResult<i32> {
    if id > 0 {
        Ok(id)
    } else {
        Err(AppError::InvalidInput(format!("{} must be a positive integer", name)))
    }
}

fn path_id(path: Result<Path<i32>, PathRejection>, name: &str) -> AppResult<i32> {
    let Path(id) = path.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    positive_id(id, name)
}

fn like_request(body: Result<Json<LikeRequest>, JsonRejection>) -> AppResult<UserId> {
    let Json(request) = body.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    positive_id(request.user_id, "userId")
}

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// GET /api/songs/search?q=
pub async fn search_songs(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> AppResult<Json<Vec<Song>>> {
    let Query(params) = params.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    let songs = song_search::search_songs(state.catalog.as_ref(), params.q.as_deref()).await?;
    Ok(Json(songs))
}

/// POST /api/songs/:id/like
pub async fn like_song(
    State(state): State<AppState>,
    path: Result<Path<SongId>, PathRejection>,
    body: Result<Json<LikeRequest>, JsonRejection>,
) -> AppResult<Json<Like>> {
    let song_id = path_id(path, "song id")?;
    let user_id = like_request(body)?;

    let like = likes::like_song(
        state.catalog.as_ref(),
        state.likes.as_ref(),
        user_id,
        song_id,
    )
    .await?;

    Ok(Json(like))
}

/// DELETE /api/songs/:id/like
pub async fn unlike_song(
    State(state): State<AppState>,
    path: Result<Path<SongId>, PathRejection>,
    body: Result<Json<LikeRequest>, JsonRejection>,
) -> AppResult<Json<MessageResponse>> {
    let song_id = path_id(path, "song id")?;
    let user_id = like_request(body)?;

    likes::unlike_song(state.likes.as_ref(), user_id, song_id).await?;

    Ok(Json(MessageResponse::new("Song unliked")))
}

/// GET /api/users/:id/liked
pub async fn liked_songs(
    State(state): State<AppState>,
    path: Result<Path<UserId>, PathRejection>,
) -> AppResult<Json<Vec<LikedSongDetail>>> {
    let user_id = path_id(path, "user id")?;
    let liked = likes::liked_songs(state.likes.as_ref(), user_id).await?;
    Ok(Json(liked))
}

/// GET /api/recommendations?userId=
///
/// The user id is validated here, before the engine runs.
pub async fn recommendations(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    params: Result<Query<RecommendationParams>, QueryRejection>,
) -> AppResult<Json<Vec<Song>>> {
    let Query(params) = params.map_err(|_| {
        AppError::InvalidInput("userId query parameter must be an integer".to_string())
    })?;
    let user_id = positive_id(params.user_id, "userId")?;

    tracing::info!(request_id = %request_id, user_id, "Processing recommendation request");

    let songs = recommendations::get_recommendations(
        state.catalog.as_ref(),
        state.likes.as_ref(),
        user_id,
    )
    .await
    .inspect_err(|e| {
        tracing::error!(request_id = %request_id, user_id, error = %e, "Recommendation failed");
    })?;

    tracing::info!(
        request_id = %request_id,
        user_id,
        count = songs.len(),
        "Recommendations served"
    );

    Ok(Json(songs))
}
