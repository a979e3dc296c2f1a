// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::AppError, models::user::Viewer};

/// JWT Claims structure.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - Stores the User ID (as string).
    pub sub: String,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

/// Signs a token for the given user.
///
/// Tokens are normally issued by the identity provider; this exists for
/// tooling and tests that need to speak to the API.
pub fn sign_jwt(id: i64, secret: &str, expiration_seconds: u64) -> Result<String, AppError> {
    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Token(e.to_string()))?
        .as_secs() as usize
        + expiration_seconds as usize;

    let claims = Claims {
        sub: id.to_string(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Token(e.to_string()))
}

/// Verifies and decodes a JWT string.
///
/// Returns the `Claims` if valid, otherwise returns `Unauthorized`.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized)?;

    Ok(token_data.claims)
}

/// Resolves a `Viewer` from an optional `Authorization` header value.
pub fn resolve_viewer(auth_header: Option<&str>, secret: &str) -> Result<Viewer, AppError> {
    let token = match auth_header {
        None => return Ok(Viewer::anonymous()),
        Some(header) => header
            .strip_prefix("Bearer ")
            .ok_or(AppError::Unauthorized)?,
    };

    let claims = verify_jwt(token, secret)?;
    let user_id = claims
        .sub
        .parse::<i64>()
        .map_err(|_| AppError::Unauthorized)?;

    Ok(Viewer::user(user_id))
}

/// Axum Middleware: Identity.
///
/// Validates an optional 'Authorization: Bearer <token>' header and injects a
/// `Viewer` into the request extensions. Requests without the header proceed
/// anonymously; a malformed or invalid token is rejected with 401.
pub async fn identity_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .map(|value| value.to_str().map_err(|_| AppError::Unauthorized))
        .transpose()?;

    let viewer = resolve_viewer(auth_header, &config.jwt_secret)?;
    req.extensions_mut().insert(viewer);

    Ok(next.run(req).await)
}
