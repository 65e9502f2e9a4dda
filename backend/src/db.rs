//! SQLite persistence for staff accounts and consent records.
//!
//! Connections are opened per request against the configured database path;
//! `init` runs once at startup so request handlers only read and write.
//! Consent records are append-only: there is no update or delete statement for
//! them anywhere in this module.

use std::path::Path;

use common::model::consent::ConsentRecord;
use common::model::user::{Role, UserAccount};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::ApiError;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    given_names TEXT NOT NULL,
    first_surname TEXT NOT NULL,
    second_surname TEXT NOT NULL DEFAULT '',
    role TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    active INTEGER NOT NULL DEFAULT 1
);
CREATE TABLE IF NOT EXISTS consents (
    id TEXT PRIMARY KEY,
    document_id TEXT NOT NULL,
    recorded_at TEXT NOT NULL,
    file_url TEXT NOT NULL,
    user_id TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_consents_user ON consents (user_id);
";

/// A user row as stored, including the hash needed to check credentials.
pub struct StoredUser {
    pub account: UserAccount,
    pub password_hash: String,
}

pub fn open(path: &Path) -> Result<Connection, ApiError> {
    Ok(Connection::open(path)?)
}

pub fn init(conn: &Connection) -> Result<(), ApiError> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

pub fn find_user_by_username(
    conn: &Connection,
    username: &str,
) -> Result<Option<StoredUser>, ApiError> {
    let row = conn
        .query_row(
            "SELECT id, username, given_names, first_surname, second_surname, role,
                    password_hash, active
             FROM users WHERE username = ?1",
            params![username],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, bool>(7)?,
                ))
            },
        )
        .optional()?;

    match row {
        None => Ok(None),
        Some((id, username, given_names, first_surname, second_surname, role, hash, active)) => {
            let role = Role::parse(&role)
                .ok_or_else(|| ApiError::Internal(format!("unknown role in database: {}", role)))?;
            Ok(Some(StoredUser {
                account: UserAccount {
                    id,
                    username,
                    given_names,
                    first_surname,
                    second_surname,
                    role,
                    active,
                },
                password_hash: hash,
            }))
        }
    }
}

pub fn insert_user(
    conn: &Connection,
    account: &UserAccount,
    password_hash: &str,
) -> Result<(), ApiError> {
    let result = conn.execute(
        "INSERT INTO users (id, username, given_names, first_surname, second_surname,
                            role, password_hash, active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            account.id,
            account.username,
            account.given_names,
            account.first_surname,
            account.second_surname,
            account.role.as_str(),
            password_hash,
            account.active,
        ],
    );
    match result {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(ApiError::Validation(format!(
                "username '{}' already exists",
                account.username
            )))
        }
        Err(e) => Err(e.into()),
    }
}

pub fn list_users(conn: &Connection) -> Result<Vec<UserAccount>, ApiError> {
    let mut stmt = conn.prepare(
        "SELECT id, username, given_names, first_surname, second_surname, role, active
         FROM users ORDER BY username",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, bool>(6)?,
        ))
    })?;

    let mut users = Vec::new();
    for row in rows {
        let (id, username, given_names, first_surname, second_surname, role, active) = row?;
        let role = Role::parse(&role)
            .ok_or_else(|| ApiError::Internal(format!("unknown role in database: {}", role)))?;
        users.push(UserAccount {
            id,
            username,
            given_names,
            first_surname,
            second_surname,
            role,
            active,
        });
    }
    Ok(users)
}

pub fn set_user_active(conn: &Connection, user_id: &str, active: bool) -> Result<(), ApiError> {
    let changed = conn.execute(
        "UPDATE users SET active = ?2 WHERE id = ?1",
        params![user_id, active],
    )?;
    if changed == 0 {
        return Err(ApiError::NotFound("user"));
    }
    Ok(())
}

pub fn set_user_password(
    conn: &Connection,
    user_id: &str,
    password_hash: &str,
) -> Result<(), ApiError> {
    let changed = conn.execute(
        "UPDATE users SET password_hash = ?2 WHERE id = ?1",
        params![user_id, password_hash],
    )?;
    if changed == 0 {
        return Err(ApiError::NotFound("user"));
    }
    Ok(())
}

pub fn insert_consent(conn: &Connection, record: &ConsentRecord) -> Result<(), ApiError> {
    conn.execute(
        "INSERT INTO consents (id, document_id, recorded_at, file_url, user_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            record.id,
            record.document_id,
            record.recorded_at,
            record.file_url,
            record.user_id,
            record.created_at,
        ],
    )?;
    Ok(())
}

/// Lists consent records newest-first. With `owner` set, only records created
/// by that user are returned; callers decide the scoping from the requester's
/// role.
pub fn list_consents(
    conn: &Connection,
    owner: Option<&str>,
) -> Result<Vec<ConsentRecord>, ApiError> {
    let map_row = |row: &rusqlite::Row<'_>| {
        Ok(ConsentRecord {
            id: row.get(0)?,
            document_id: row.get(1)?,
            recorded_at: row.get(2)?,
            file_url: row.get(3)?,
            user_id: row.get(4)?,
            created_at: row.get(5)?,
        })
    };

    let mut records = Vec::new();
    match owner {
        Some(user_id) => {
            let mut stmt = conn.prepare(
                "SELECT id, document_id, recorded_at, file_url, user_id, created_at
                 FROM consents WHERE user_id = ?1 ORDER BY created_at DESC",
            )?;
            for row in stmt.query_map(params![user_id], map_row)? {
                records.push(row?);
            }
        }
        None => {
            let mut stmt = conn.prepare(
                "SELECT id, document_id, recorded_at, file_url, user_id, created_at
                 FROM consents ORDER BY created_at DESC",
            )?;
            for row in stmt.query_map([], map_row)? {
                records.push(row?);
            }
        }
    }
    Ok(records)
}

#[cfg(test)]
pub(crate) fn test_conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    init(&conn).unwrap();
    conn
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(id: &str, username: &str, role: Role) -> UserAccount {
        UserAccount {
            id: id.to_string(),
            username: username.to_string(),
            given_names: "Ana".to_string(),
            first_surname: "Rojas".to_string(),
            second_surname: String::new(),
            role,
            active: true,
        }
    }

    fn record(id: &str, user_id: &str, created_at: &str) -> ConsentRecord {
        ConsentRecord {
            id: id.to_string(),
            document_id: "1017233841".to_string(),
            recorded_at: created_at.to_string(),
            file_url: format!("https://files.example/{}.pdf", id),
            user_id: user_id.to_string(),
            created_at: created_at.to_string(),
        }
    }

    #[test]
    fn duplicate_username_is_a_validation_error() {
        let conn = test_conn();
        insert_user(&conn, &account("u1", "ana", Role::Specialist), "hash").unwrap();
        let err = insert_user(&conn, &account("u2", "ana", Role::Technician), "hash").unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn find_user_returns_stored_hash_and_role() {
        let conn = test_conn();
        insert_user(&conn, &account("u1", "ana", Role::Administrative), "$2b$fake").unwrap();
        let stored = find_user_by_username(&conn, "ana").unwrap().unwrap();
        assert_eq!(stored.password_hash, "$2b$fake");
        assert_eq!(stored.account.role, Role::Administrative);
        assert!(find_user_by_username(&conn, "bob").unwrap().is_none());
    }

    #[test]
    fn deactivation_requires_an_existing_user() {
        let conn = test_conn();
        insert_user(&conn, &account("u1", "ana", Role::Specialist), "hash").unwrap();
        set_user_active(&conn, "u1", false).unwrap();
        assert!(!find_user_by_username(&conn, "ana").unwrap().unwrap().account.active);
        assert!(matches!(
            set_user_active(&conn, "ghost", false),
            Err(ApiError::NotFound("user"))
        ));
    }

    #[test]
    fn consents_list_newest_first_and_filter_by_owner() {
        let conn = test_conn();
        insert_consent(&conn, &record("c1", "u1", "2026-08-01T10:00:00+00:00")).unwrap();
        insert_consent(&conn, &record("c2", "u2", "2026-08-02T10:00:00+00:00")).unwrap();
        insert_consent(&conn, &record("c3", "u1", "2026-08-03T10:00:00+00:00")).unwrap();

        let all = list_consents(&conn, None).unwrap();
        assert_eq!(
            all.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
            vec!["c3", "c2", "c1"]
        );

        let mine = list_consents(&conn, Some("u1")).unwrap();
        assert_eq!(
            mine.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
            vec!["c3", "c1"]
        );
    }
}
