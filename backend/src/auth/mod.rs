//! # Authentication Module
//!
//! Credential verification and session tokens for the portal. All other
//! services rely on the [`token::AuthUser`] extractor defined here.
//!
//! ## Registered Routes:
//!
//! *   **`POST /api/auth/login`**:
//!     - **Handler**: `login::process`
//!     - **Description**: Verifies a username/password pair against the stored
//!       bcrypt hash. Unknown users, deactivated accounts and wrong passwords
//!       are all rejected with the same 401 so the response does not reveal
//!       which part failed. On success returns a signed bearer token plus the
//!       caller's profile.
//!
//! *   **`GET /api/auth/me`**:
//!     - **Handler**: `me::process`
//!     - **Description**: Returns the profile carried by the presented token,
//!       with the display and full names pre-assembled for the UI.

mod login;
mod me;
pub mod token;

use actix_web::web::{get, post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/auth";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/login", post().to(login::process))
        .route("/me", get().to(me::process))
}
