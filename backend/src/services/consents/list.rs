use actix_web::{web, HttpResponse};
use common::model::user::Role;
use serde::Deserialize;

use crate::auth::token::AuthUser;
use crate::db;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    mine: bool,
}

pub async fn process(
    user: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ApiError> {
    let conn = db::open(&state.config.db_path)?;
    let owner = owner_filter(user.role, &user.id, query.mine);
    let records = db::list_consents(&conn, owner)?;
    Ok(HttpResponse::Ok().json(records))
}

/// Specialists are always restricted to their own records; wider roles only
/// when they explicitly ask for `mine=true`.
fn owner_filter(role: Role, user_id: &str, mine: bool) -> Option<&str> {
    if mine || role == Role::Specialist {
        Some(user_id)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn specialists_are_always_scoped_to_themselves() {
        assert_eq!(owner_filter(Role::Specialist, "u1", false), Some("u1"));
        assert_eq!(owner_filter(Role::Specialist, "u1", true), Some("u1"));
    }

    #[test]
    fn wider_roles_see_everything_unless_they_opt_in() {
        assert_eq!(owner_filter(Role::Administrative, "u1", false), None);
        assert_eq!(owner_filter(Role::Technician, "u1", false), None);
        assert_eq!(owner_filter(Role::Technician, "u1", true), Some("u1"));
    }
}
