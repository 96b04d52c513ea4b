use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::user::Actor;
use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    #[serde(default)]
    pub profile_id: Option<Uuid>,
    pub exp: usize,
}

impl TryFrom<Claims> for Actor {
    type Error = Error;

    fn try_from(claims: Claims) -> Result<Self> {
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| Error::Unauthorized("Token subject is not a user id".to_string()))?;
        Ok(Actor {
            user_id,
            role: claims.role.parse()?,
            profile_id: claims.profile_id,
        })
    }
}

pub fn decode_actor(token: &str, secret: &str) -> Result<Actor> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|_| Error::Unauthorized("Invalid or expired token".to_string()))?;
    data.claims.try_into()
}

fn bearer_token(req: &Request) -> Result<String> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| Error::Unauthorized("Missing authorization header".to_string()))?;
    let value = header
        .to_str()
        .map_err(|_| Error::Unauthorized("Malformed authorization header".to_string()))?;
    value
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
        .ok_or_else(|| Error::Unauthorized("Unsupported authorization scheme".to_string()))
}

/// Resolves the bearer token into an [`Actor`] request extension.
pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Result<Response> {
    let token = bearer_token(&req)?;
    let actor = decode_actor(&token, &state.config.jwt_secret)?;
    req.extensions_mut().insert(actor);
    Ok(next.run(req).await)
}

/// Must be layered inside [`require_auth`].
pub async fn require_admin(req: Request, next: Next) -> Result<Response> {
    let actor = req
        .extensions()
        .get::<Actor>()
        .ok_or_else(|| Error::Unauthorized("Authentication required".to_string()))?;
    if !actor.is_admin() {
        return Err(Error::Forbidden("Admin access required".to_string()));
    }
    Ok(next.run(req).await)
}
