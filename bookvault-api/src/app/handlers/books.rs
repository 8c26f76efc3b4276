//! 书目 API handlers（全部需要会话认证）

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use bookvault_core::{Book, CreateBookRequest, UpdateBookRequest};
use tracing::instrument;

use crate::app::{ApiError, AppState};

/// GET /books - 列出所有条目
#[instrument(skip_all)]
pub async fn list_books(State(state): State<AppState>) -> Result<Json<Vec<Book>>, ApiError> {
    let books = state.books.list().await;
    Ok(Json(books))
}

/// POST /books - 创建条目
#[instrument(skip_all)]
pub async fn create_book(
    State(state): State<AppState>,
    Json(req): Json<CreateBookRequest>,
) -> Result<(StatusCode, Json<Book>), ApiError> {
    let book = state.books.create(req).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// GET /books/:id - 获取单个条目
#[instrument(skip_all)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Book>, ApiError> {
    let book = state.books.get(&id).await?;
    Ok(Json(book))
}

/// PUT /books/:id - 更新条目
#[instrument(skip_all)]
pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateBookRequest>,
) -> Result<Json<Book>, ApiError> {
    let book = state.books.update(&id, req).await?;
    Ok(Json(book))
}

/// DELETE /books/:id - 删除条目
#[instrument(skip_all)]
pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.books.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
