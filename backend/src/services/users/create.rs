use actix_web::{web, HttpResponse};
use common::model::user::UserAccount;
use common::requests::CreateUserRequest;
use rusqlite::Connection;
use uuid::Uuid;

use crate::auth::token::AuthUser;
use crate::db;
use crate::error::ApiError;
use crate::services::users::{BCRYPT_COST, MIN_PASSWORD_LEN};
use crate::state::AppState;

pub async fn process(
    user: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, ApiError> {
    user.require_admin()?;
    let conn = db::open(&state.config.db_path)?;
    let account = create_user(&conn, payload.into_inner())?;
    Ok(HttpResponse::Created().json(account))
}

pub(crate) fn create_user(
    conn: &Connection,
    request: CreateUserRequest,
) -> Result<UserAccount, ApiError> {
    if request.username.trim().is_empty() {
        return Err(ApiError::Validation(
            "username must not be empty".to_string(),
        ));
    }
    if request.given_names.trim().is_empty() || request.first_surname.trim().is_empty() {
        return Err(ApiError::Validation(
            "given names and first surname must not be empty".to_string(),
        ));
    }
    if request.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let password_hash = bcrypt::hash(&request.password, BCRYPT_COST)?;
    let account = UserAccount {
        id: Uuid::new_v4().to_string(),
        username: request.username.trim().to_string(),
        given_names: request.given_names.trim().to_string(),
        first_surname: request.first_surname.trim().to_string(),
        second_surname: request.second_surname.trim().to_string(),
        role: request.role,
        active: true,
    };
    db::insert_user(conn, &account, &password_hash)?;
    Ok(account)
}
