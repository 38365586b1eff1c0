use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use secrecy::ExposeSecret;
use tower_cookies::Cookie;
use tracing::error;

use crate::errors::AppError;
use crate::storage::identity::decode_claims;
use crate::storage::SessionIdentity;
use crate::InnerState;

pub const AUTH_COOKIE: &str = "auth-token";

/// Resolves the caller's identity and stores it in the request extensions.
///
/// Requests without a token continue anonymously; a token that does not
/// verify is rejected outright.
pub async fn auth_middleware(
    State(inner): State<InnerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let claims = match extract_token(&request) {
        Some(token) => {
            let claims = decode_claims(&token, inner.settings.secret_token.expose_secret())
                .map_err(|e| {
                    error!("JWT validation failed: {:?}", e);
                    StatusCode::UNAUTHORIZED
                })?;
            Some(claims)
        }
        None => None,
    };

    request
        .extensions_mut()
        .insert(SessionIdentity::new(claims));
    Ok(next.run(request).await)
}

/// Refuses callers holding a non-doctor role before the handler reads the
/// request body. Anonymous callers pass; the handler decides how to treat
/// them.
pub async fn reject_non_doctor(request: Request, next: Next) -> Result<Response, AppError> {
    if let Some(identity) = request.extensions().get::<SessionIdentity>() {
        forbid_non_doctor(identity)?;
    }
    Ok(next.run(request).await)
}

pub fn forbid_non_doctor(identity: &SessionIdentity) -> Result<(), AppError> {
    match identity.actor() {
        Some(actor) if !actor.is_doctor() => Err(AppError::Forbidden(
            "Only doctors can manage learning videos".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Extracts JWT from either the `Authorization` header or `Cookie` header.
fn extract_token<B>(req: &axum::http::Request<B>) -> Option<String> {
    if let Some(auth_header) = req.headers().get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    if let Some(cookie_header) = req.headers().get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                if let Ok(parsed) = Cookie::parse(cookie.trim()) {
                    if parsed.name() == AUTH_COOKIE {
                        return Some(parsed.value().to_string());
                    }
                }
            }
        }
    }

    None
}
