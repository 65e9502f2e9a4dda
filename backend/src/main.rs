mod auth;
mod config;
mod db;
mod error;
mod pdf;
mod services;
mod state;
mod storage;

use std::env;

use actix_web::{web, App, HttpServer};
use common::model::user::{Role, UserAccount};
use env_logger::Env;
use log::info;
use rusqlite::Connection;
use uuid::Uuid;

use crate::config::Config;
use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::SharePointStore;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = Config::from_env()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;

    // Create tables up front so per-request connections only read and write.
    let conn = db::open(&config.db_path).map_err(io_err)?;
    db::init(&conn).map_err(io_err)?;
    bootstrap_admin(&conn).map_err(io_err)?;
    drop(conn);

    let bind = (config.host.clone(), config.port);
    info!("Server running at http://{}:{}", config.host, config.port);

    let state = AppState {
        store: SharePointStore::new(config.graph.clone()),
        config,
    };

    HttpServer::new(move || {
        App::new()
            .app_data(web::JsonConfig::default().limit(10 * 1024 * 1024)) // 10 MB
            .app_data(web::Data::new(state.clone()))
            .service(auth::configure_routes())
            .service(services::consents::configure_routes())
            .service(services::users::configure_routes())
    })
    .bind(bind)?
    .run()
    .await
}

/// Seeds the first administrative account from `ADMIN_USERNAME` and
/// `ADMIN_PASSWORD` when both are set and the username does not exist yet.
/// Lets a fresh deployment log in without poking the database by hand.
fn bootstrap_admin(conn: &Connection) -> Result<(), ApiError> {
    let (username, password) = match (env::var("ADMIN_USERNAME"), env::var("ADMIN_PASSWORD")) {
        (Ok(u), Ok(p)) if !u.is_empty() && !p.is_empty() => (u, p),
        _ => return Ok(()),
    };
    if db::find_user_by_username(conn, &username)?.is_some() {
        return Ok(());
    }
    let account = UserAccount {
        id: Uuid::new_v4().to_string(),
        username: username.clone(),
        given_names: "Portal".to_string(),
        first_surname: "Administrator".to_string(),
        second_surname: String::new(),
        role: Role::Administrative,
        active: true,
    };
    let hash = bcrypt::hash(&password, services::users::BCRYPT_COST)?;
    db::insert_user(conn, &account, &hash)?;
    info!("bootstrap administrative account '{}' created", username);
    Ok(())
}

fn io_err(err: ApiError) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, err.to_string())
}
