use actix_web::{web, HttpResponse};

use crate::auth::token::AuthUser;
use crate::db;
use crate::error::ApiError;
use crate::state::AppState;

pub async fn process(
    user: AuthUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    user.require_admin()?;
    let conn = db::open(&state.config.db_path)?;
    Ok(HttpResponse::Ok().json(db::list_users(&conn)?))
}
