use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{error::Error, AppState};

fn bearer_token(req: &Request) -> Result<&str, Error> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| Error::Unauthorized("missing_authorization".into()))?;
    let auth_str = auth_header
        .to_str()
        .map_err(|_| Error::Unauthorized("bad_authorization".into()))?;
    auth_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| Error::Unauthorized("unsupported_scheme".into()))
}

/// Admits only requests carrying a valid instructor session token.
pub async fn require_instructor(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let claims = match bearer_token(&req).and_then(|token| state.auth_service.verify(token)) {
        Ok(claims) => claims,
        Err(e) => return e.into_response(),
    };
    req.extensions_mut().insert(claims);
    next.run(req).await
}
