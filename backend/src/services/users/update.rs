use actix_web::{web, HttpResponse};
use common::requests::SetActiveRequest;
use serde_json::json;

use crate::auth::token::AuthUser;
use crate::db;
use crate::error::ApiError;
use crate::state::AppState;

/// Activates or deactivates an account. Deactivation is the portal's only way
/// to retire a user; records they created stay attributed to them.
pub async fn process(
    user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<SetActiveRequest>,
) -> Result<HttpResponse, ApiError> {
    user.require_admin()?;
    let user_id = path.into_inner();
    if user_id == user.id {
        return Err(ApiError::Validation(
            "cannot change the active state of your own account".to_string(),
        ));
    }
    let conn = db::open(&state.config.db_path)?;
    db::set_user_active(&conn, &user_id, payload.active)?;
    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}
