//! Password hashing, JWT issuing and the bearer-token extractors.

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use jiff::{SignedDuration, Timestamp};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    AppState,
    entities::user,
    error::{AppError, AppResult},
    models::AuthResponse,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub id: i32,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
    pub exp: i64,
}

pub fn hash_password(password: &str, cost: u32) -> AppResult<String> {
    Ok(bcrypt::hash(password, cost)?)
}

/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

pub fn issue_token(secret: &str, ttl_hours: i64, user: &user::Model) -> AppResult<AuthResponse> {
    let expiration = Timestamp::now()
        .checked_add(SignedDuration::from_hours(ttl_hours))
        .map_err(anyhow::Error::from)?;

    let claims = Claims {
        id: user.id,
        email: user.email.clone(),
        is_admin: user.is_admin,
        exp: expiration.as_second(),
    };
    let token =
        encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes()))?;

    Ok(AuthResponse { token, expiration })
}

/// Checks signature and expiry with no clock leeway.
pub fn decode_token(secret: &str, token: &str) -> AppResult<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|err| {
            debug!(error = %err, "rejected bearer token");
            AppError::Unauthorized
        })
}

/// Any caller holding a valid token.
#[derive(Clone, Debug)]
pub struct AuthUser(pub Claims);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::Unauthorized)?;

        decode_token(&state.config.jwt_secret, bearer.token()).map(AuthUser)
    }
}

/// A caller whose token carries the admin flag.
#[derive(Clone, Debug)]
pub struct AdminUser(pub Claims);

impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;
        if !claims.is_admin {
            return Err(AppError::Forbidden);
        }
        Ok(AdminUser(claims))
    }
}
