//! Staff favorites.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/applications/:id/favorite` | Toggle for the calling staff member |
//! | `GET`  | `/applications/:id/favorite` | Current state for the calling staff member |
//! | `GET`  | `/favorites` | Everyone's favorites, newest first; `?limit&offset` |

use axum::{
  Extension, Json,
  extract::{Path, Query, State},
};
use intake_core::store::{
  ApplicationStore, DEFAULT_PAGE_SIZE, FavoritePage, MAX_PAGE_SIZE, QueryError,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, StaffUser, error::ApiError};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteState {
  pub is_favorite: bool,
}

/// `POST /applications/:id/favorite`
pub async fn toggle<S>(
  State(state): State<AppState<S>>,
  Extension(staff): Extension<StaffUser>,
  Path(id): Path<Uuid>,
) -> Result<Json<FavoriteState>, ApiError>
where
  S: ApplicationStore,
{
  let is_favorite = state
    .store
    .toggle_favorite(&staff.0, id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("application {id} not found")))?;
  Ok(Json(FavoriteState { is_favorite }))
}

/// `GET /applications/:id/favorite`
pub async fn status<S>(
  State(state): State<AppState<S>>,
  Extension(staff): Extension<StaffUser>,
  Path(id): Path<Uuid>,
) -> Result<Json<FavoriteState>, ApiError>
where
  S: ApplicationStore,
{
  let is_favorite = state.store.is_favorite(&staff.0, id).await.map_err(ApiError::store)?;
  Ok(Json(FavoriteState { is_favorite }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PageParams {
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// `GET /favorites[?limit=..&offset=..]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<PageParams>,
) -> Result<Json<FavoritePage>, ApiError>
where
  S: ApplicationStore,
{
  let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE);
  if !(1..=MAX_PAGE_SIZE).contains(&limit) {
    return Err(QueryError::Limit(limit).into());
  }
  let page = state
    .store
    .list_favorites(limit, params.offset.unwrap_or(0))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(page))
}
