use actix_web::{web, HttpResponse};
use common::model::user::Profile;
use common::requests::{LoginRequest, LoginResponse};
use rusqlite::Connection;

use crate::auth::token;
use crate::db;
use crate::error::ApiError;
use crate::state::AppState;

pub async fn process(
    state: web::Data<AppState>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = payload.into_inner();
    let conn = db::open(&state.config.db_path)?;
    let stored = authenticate(&conn, &request)?;

    let token = token::issue(&stored.account, &state.config.jwt_secret)?;
    let account = stored.account;
    let user = Profile::assemble(
        account.id,
        account.username,
        account.role,
        &account.given_names,
        &account.first_surname,
        &account.second_surname,
    );
    Ok(HttpResponse::Ok().json(LoginResponse { token, user }))
}

/// Checks the credentials against the users table. Deactivated accounts fail
/// exactly like unknown ones.
fn authenticate(conn: &Connection, request: &LoginRequest) -> Result<db::StoredUser, ApiError> {
    if request.username.is_empty() || request.password.is_empty() {
        return Err(ApiError::Unauthorized);
    }
    let stored = db::find_user_by_username(conn, &request.username)?
        .ok_or(ApiError::Unauthorized)?;
    if !stored.account.active {
        return Err(ApiError::Unauthorized);
    }
    if !bcrypt::verify(&request.password, &stored.password_hash)? {
        return Err(ApiError::Unauthorized);
    }
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::model::user::{Role, UserAccount};

    // Minimum bcrypt cost; keeps the hashing in tests fast.
    const TEST_COST: u32 = 4;

    fn seed_user(conn: &Connection, active: bool) {
        let account = UserAccount {
            id: "u1".to_string(),
            username: "ana".to_string(),
            given_names: "Ana".to_string(),
            first_surname: "Rojas".to_string(),
            second_surname: String::new(),
            role: Role::Specialist,
            active,
        };
        let hash = bcrypt::hash("hunter2", TEST_COST).unwrap();
        db::insert_user(conn, &account, &hash).unwrap();
    }

    fn login(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn valid_credentials_authenticate() {
        let conn = db::test_conn();
        seed_user(&conn, true);
        let stored = authenticate(&conn, &login("ana", "hunter2")).unwrap();
        assert_eq!(stored.account.id, "u1");
    }

    #[test]
    fn wrong_password_unknown_user_and_inactive_account_all_reject() {
        let conn = db::test_conn();
        seed_user(&conn, false);
        for request in [
            login("ana", "wrong"),
            login("bob", "hunter2"),
            login("ana", "hunter2"), // right password, deactivated account
            login("", ""),
        ] {
            assert!(matches!(
                authenticate(&conn, &request),
                Err(ApiError::Unauthorized)
            ));
        }
    }
}
