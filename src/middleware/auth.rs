use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::app::AppState;
use crate::error::ApiError;

/// Identity middleware: verifies the caller named in the identity header and
/// injects the resulting `Principal` into request extensions.
pub async fn identity_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let header_name = state.config.api.identity_header.as_str();

    // A non-UTF-8 header value is treated like a missing one
    let raw_identity = request
        .headers()
        .get(header_name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let principal = match state.authenticator.authenticate(raw_identity.as_deref()).await {
        Ok(principal) => principal,
        Err(e) => {
            tracing::warn!("Authentication failed on {} {}: {}", request.method(), request.uri().path(), e);
            return ApiError::from(e).into_response();
        }
    };

    tracing::debug!(
        "Authenticated '{}' as {} for {} {}",
        principal.username(),
        principal.role(),
        request.method(),
        request.uri().path()
    );

    request.extensions_mut().insert(principal);
    next.run(request).await
}
