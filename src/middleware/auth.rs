use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::auth::AuthError;
use crate::response::AppError;
use crate::state::AppState;

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let result = crate::auth::extract_token(req.headers())
        .ok_or(AuthError::MissingToken)
        .and_then(|token| {
            crate::auth::verify_request_token(&token, state.config().jwt_secret.as_deref())
        });

    match result {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(AuthError::MissingToken) => {
            AppError::unauthorized("No token, authorization denied").into_response()
        }
        Err(err) => {
            if matches!(err, AuthError::MissingSecret) {
                tracing::error!("JWT_SECRET is not configured; rejecting authenticated request");
            } else {
                tracing::debug!(error = %err, "token rejected");
            }
            AppError::unauthorized("Token is not valid").into_response()
        }
    }
}
