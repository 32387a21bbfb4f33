use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    Extension, Json,
};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::{Action, Principal};
use crate::database::store::profile_not_found;
use crate::database::Profile;
use crate::middleware::{ApiResponse, ApiResult};

use super::utils::{require, UpdateProfileRequest};

// Each handler resolves the record before evaluating the policy, so a
// missing id is always 404 regardless of who asks.

/// GET /profiles/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Profile> {
    let Path(id) = path?;

    let profile = state.store.get_by_id(id).await?;
    require(&principal, Action::ReadOneProfile, Some(&profile.username))?;

    Ok(ApiResponse::success(profile))
}

/// PUT /profiles/:id - update Location and/or PreferredActivity
pub async fn put(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> ApiResult<Profile> {
    let Path(id) = path?;

    let owner = state.store.get_owner(id).await?;
    require(&principal, Action::UpdateProfile, Some(&owner))?;

    let Json(request) = payload?;
    let update = request.validate()?;

    // Zero rows means the record vanished after the owner lookup
    if state.store.update_partial(id, &update).await? == 0 {
        return Err(profile_not_found(id).into());
    }
    tracing::info!("'{}' updated profile {}", principal.username(), id);

    let profile = state.store.get_by_id(id).await?;
    Ok(ApiResponse::success(profile))
}

/// DELETE /profiles/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Value> {
    let Path(id) = path?;

    let owner = state.store.get_owner(id).await?;
    require(&principal, Action::DeleteProfile, Some(&owner))?;

    if state.store.delete_by_id(id).await? == 0 {
        return Err(profile_not_found(id).into());
    }
    tracing::info!("'{}' deleted profile {} owned by '{}'", principal.username(), id, owner);

    Ok(ApiResponse::success(json!({
        "ProfileID": id,
        "Username": owner,
        "deleted": true
    })))
}
