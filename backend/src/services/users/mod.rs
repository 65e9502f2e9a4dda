//! # User Management Module
//!
//! Account administration under `/api/users`. Every route requires the
//! administrative role; specialists and technicians are rejected with 403.
//!
//! ## Registered Routes:
//!
//! *   **`POST /api/users`** (`create::process`): creates a staff account with
//!     a bcrypt-hashed password. Usernames are unique.
//! *   **`GET /api/users`** (`list::process`): lists accounts, hashes omitted.
//! *   **`PATCH /api/users/{user_id}`** (`update::process`): activates or
//!     deactivates an account. Deactivating your own account is rejected.
//! *   **`PATCH /api/users/{user_id}/password`** (`password::process`): resets
//!     an account password.

mod create;
mod list;
mod password;
mod update;

use actix_web::web::{get, patch, post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/users";

pub(crate) const MIN_PASSWORD_LEN: usize = 6;
pub(crate) const BCRYPT_COST: u32 = 10;

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", post().to(create::process))
        .route("", get().to(list::process))
        .route("/{user_id}", patch().to(update::process))
        .route("/{user_id}/password", patch().to(password::process))
}
