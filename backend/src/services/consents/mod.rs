//! # Consent Service Module
//!
//! This module aggregates all API endpoints related to consent records. It
//! acts as a router, directing incoming HTTP requests under the `/api/consents`
//! path to the handler logic defined in its sub-modules. Every route requires
//! an authenticated caller.
//!
//! ## Registered Routes:
//!
//! *   **`POST /api/consents/signed`**:
//!     - **Handler**: `generate::process`
//!     - **Description**: The server-side generation pipeline. Validates the
//!       form, resolves the template's coordinate layout, decodes both captured
//!       signatures, renders the filled PDF, uploads it to the document library
//!       and appends a consent record referencing the returned URL.
//!
//! *   **`POST /api/consents`**:
//!     - **Handler**: `create::process`
//!     - **Description**: Accepts an externally produced consent document as
//!       `multipart/form-data` (`document_id`, `recorded_at`, `file`), uploads
//!       it unchanged, and appends the record.
//!
//! *   **`GET /api/consents`**:
//!     - **Handler**: `list::process`
//!     - **Description**: Lists consent records newest-first. Specialists only
//!       ever see their own records; other roles see everything unless they
//!       request `?mine=true`.

mod create;
mod generate;
mod list;

use actix_web::web::{get, post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/consents";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/signed", post().to(generate::process))
        .route("", post().to(create::process))
        .route("", get().to(list::process))
}
