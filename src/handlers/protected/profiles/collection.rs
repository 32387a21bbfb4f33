use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    Extension, Json,
};

use crate::app::AppState;
use crate::auth::{Action, Principal};
use crate::database::Profile;
use crate::middleware::{ApiResponse, ApiResult};

use super::utils::{require, CreateProfileRequest, ListQuery, UsernameOnlyRequest};

/// GET /profiles?limit=N - most recent profiles (admin, staff)
pub async fn list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Vec<Profile>> {
    require(&principal, Action::ListAllProfiles, None)?;

    let Query(query) = query?;
    let limit = state.config.list_limit(query.limit);
    let profiles = state.store.list_recent(limit).await?;

    Ok(ApiResponse::success(profiles))
}

/// GET /profiles/bulk - every profile up to the bulk ceiling (admin, staff)
pub async fn bulk(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Vec<Profile>> {
    require(&principal, Action::ReadAllProfilesBulk, None)?;

    let profiles = state.store.list_recent(state.config.api.bulk_limit).await?;
    Ok(ApiResponse::success(profiles))
}

/// POST /profiles - create a profile with every field (admin, staff)
pub async fn create_full(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<CreateProfileRequest>, JsonRejection>,
) -> ApiResult<Profile> {
    // Role check first: it does not depend on the body
    require(&principal, Action::CreateFullProfile, None)?;

    let Json(request) = payload?;
    let new_profile = request.validate(chrono::Utc::now().date_naive())?;

    let id = state.store.insert_full(&new_profile).await?;
    tracing::info!("'{}' created profile {} for '{}'", principal.username(), id, new_profile.username);

    Ok(ApiResponse::created(new_profile.into_profile(id)))
}

/// POST /profiles/username - create a username-only profile
///
/// Any role may call this; a `user` may only create its own profile.
pub async fn create_username_only(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<UsernameOnlyRequest>, JsonRejection>,
) -> ApiResult<Profile> {
    let Json(request) = payload?;
    let username = request.validate()?;

    require(&principal, Action::CreateUsernameOnlyProfile, Some(&username))?;

    let id = state.store.insert_username_only(&username).await?;
    tracing::info!("'{}' created profile {} for '{}'", principal.username(), id, username);

    Ok(ApiResponse::created(Profile::username_only(id, username)))
}
