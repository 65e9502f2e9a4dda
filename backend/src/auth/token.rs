//! Bearer tokens and the `AuthUser` extractor every protected route uses.
//!
//! Tokens are HS256 JWTs signed with the configured secret, carrying the
//! account id, username, name parts and role, and expiring after eight hours.
//! `AuthUser` implements `FromRequest` so handlers just add it as a parameter;
//! a missing or invalid `Authorization: Bearer` header rejects with 401 before
//! the handler body runs.

use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};
use chrono::{DateTime, Duration, Utc};
use common::model::user::{Profile, Role, UserAccount};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

const TOKEN_TTL_HOURS: i64 = 8;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub given_names: String,
    pub first_surname: String,
    pub second_surname: String,
    pub role: Role,
    pub exp: usize,
}

pub fn issue(account: &UserAccount, secret: &str) -> Result<String, ApiError> {
    issue_with_expiry(account, secret, Utc::now() + Duration::hours(TOKEN_TTL_HOURS))
}

fn issue_with_expiry(
    account: &UserAccount,
    secret: &str,
    expires_at: DateTime<Utc>,
) -> Result<String, ApiError> {
    let claims = Claims {
        sub: account.id.clone(),
        username: account.username.clone(),
        given_names: account.given_names.clone(),
        first_surname: account.first_surname.clone(),
        second_surname: account.second_surname.clone(),
        role: account.role,
        exp: expires_at.timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("token signing failed: {}", e)))
}

pub fn verify(token: &str, secret: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Unauthorized)
}

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub username: String,
    pub given_names: String,
    pub first_surname: String,
    pub second_surname: String,
    pub role: Role,
}

impl AuthUser {
    pub fn profile(&self) -> Profile {
        Profile::assemble(
            self.id.clone(),
            self.username.clone(),
            self.role,
            &self.given_names,
            &self.first_surname,
            &self.second_surname,
        )
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role == Role::Administrative {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        AuthUser {
            id: claims.sub,
            username: claims.username,
            given_names: claims.given_names,
            first_surname: claims.first_surname,
            second_surname: claims.second_surname,
            role: claims.role,
        }
    }
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(extract(req))
    }
}

fn extract(req: &HttpRequest) -> Result<AuthUser, ApiError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| ApiError::Internal("application state not configured".to_string()))?;
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;
    let token = header.strip_prefix("Bearer ").ok_or(ApiError::Unauthorized)?;
    verify(token, &state.config.jwt_secret).map(AuthUser::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> UserAccount {
        UserAccount {
            id: "u1".to_string(),
            username: "mgarcia".to_string(),
            given_names: "Maria".to_string(),
            first_surname: "Garcia".to_string(),
            second_surname: "Lopez".to_string(),
            role: Role::Specialist,
            active: true,
        }
    }

    #[test]
    fn token_round_trips_claims() {
        let token = issue(&account(), "secret").unwrap();
        let claims = verify(&token, "secret").unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.username, "mgarcia");
        assert_eq!(claims.role, Role::Specialist);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue(&account(), "secret").unwrap();
        assert!(matches!(
            verify(&token, "other"),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token =
            issue_with_expiry(&account(), "secret", Utc::now() - Duration::hours(1)).unwrap();
        assert!(matches!(
            verify(&token, "secret"),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn only_administrative_passes_require_admin() {
        let mut user = AuthUser::from(verify(&issue(&account(), "s").unwrap(), "s").unwrap());
        assert!(matches!(user.require_admin(), Err(ApiError::Forbidden)));
        user.role = Role::Administrative;
        assert!(user.require_admin().is_ok());
    }
}
