use actix_web::{web, HttpResponse};
use common::requests::SetPasswordRequest;
use serde_json::json;

use crate::auth::token::AuthUser;
use crate::db;
use crate::error::ApiError;
use crate::services::users::{BCRYPT_COST, MIN_PASSWORD_LEN};
use crate::state::AppState;

/// Administrative password reset. Tokens already issued to the account stay
/// valid until they expire.
pub async fn process(
    user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<SetPasswordRequest>,
) -> Result<HttpResponse, ApiError> {
    user.require_admin()?;
    let new_password = payload.new_password.trim();
    if new_password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    let password_hash = bcrypt::hash(new_password, BCRYPT_COST)?;
    let conn = db::open(&state.config.db_path)?;
    db::set_user_password(&conn, &path.into_inner(), &password_hash)?;
    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}
