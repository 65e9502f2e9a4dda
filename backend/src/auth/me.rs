use actix_web::HttpResponse;

use crate::auth::token::AuthUser;
use crate::error::ApiError;

/// Profile of the caller, taken entirely from the presented token.
pub async fn process(user: AuthUser) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(user.profile()))
}
