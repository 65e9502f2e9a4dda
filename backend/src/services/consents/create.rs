//! Upload of an externally produced consent document.
//!
//! The client sends `multipart/form-data` with the patient document number,
//! the capture timestamp and the file itself. The file is pushed to the
//! library unchanged, with the content type guessed from its name, and a
//! record is appended. Unlike the generation flow, a failed record write here
//! fails the whole request.

use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use common::model::consent::ConsentRecord;
use common::requests::ConsentStored;
use futures_util::StreamExt;
use rusqlite::Connection;
use uuid::Uuid;

use crate::auth::token::AuthUser;
use crate::db;
use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::{DocumentStore, FileUpload};

pub async fn process(
    user: AuthUser,
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let form = read_form(payload).await?;
    validate(&form)?;
    let conn = db::open(&state.config.db_path)?;
    let file_url = store_uploaded_consent(&conn, &state.store, &user, form).await?;
    Ok(HttpResponse::Ok().json(ConsentStored {
        ok: true,
        file_url,
    }))
}

struct UploadForm {
    document_id: String,
    recorded_at: String,
    file_name: String,
    bytes: Vec<u8>,
}

async fn read_form(mut payload: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm {
        document_id: String::new(),
        recorded_at: String::new(),
        file_name: String::new(),
        bytes: Vec::new(),
    };

    while let Some(item) = payload.next().await {
        let mut field = item
            .map_err(|e| ApiError::Validation(format!("malformed multipart payload: {}", e)))?;
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));

        match name.as_deref() {
            Some("file") => {
                form.file_name = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
                    .unwrap_or_default();
                while let Some(chunk) = field.next().await {
                    let chunk = chunk.map_err(|e| {
                        ApiError::Validation(format!("upload interrupted: {}", e))
                    })?;
                    form.bytes.extend_from_slice(&chunk);
                }
            }
            Some("document_id") => form.document_id = read_text(&mut field).await?,
            Some("recorded_at") => form.recorded_at = read_text(&mut field).await?,
            _ => {}
        }
    }
    Ok(form)
}

async fn read_text(field: &mut Field) -> Result<String, ApiError> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk =
            chunk.map_err(|e| ApiError::Validation(format!("upload interrupted: {}", e)))?;
        buf.extend_from_slice(&chunk);
    }
    String::from_utf8(buf)
        .map(|s| s.trim().to_string())
        .map_err(|_| ApiError::Validation("form field is not valid UTF-8".to_string()))
}

fn validate(form: &UploadForm) -> Result<(), ApiError> {
    if form.document_id.is_empty() {
        return Err(ApiError::Validation(
            "missing required field: document_id".to_string(),
        ));
    }
    if form.bytes.is_empty() {
        return Err(ApiError::Validation(
            "missing required field: file".to_string(),
        ));
    }
    if form.recorded_at.is_empty() {
        return Err(ApiError::Validation(
            "missing required field: recorded_at".to_string(),
        ));
    }
    DateTime::parse_from_rfc3339(&form.recorded_at)
        .map_err(|_| ApiError::Validation("recorded_at must be an RFC 3339 timestamp".to_string()))?;
    Ok(())
}

async fn store_uploaded_consent<S: DocumentStore>(
    conn: &Connection,
    store: &S,
    user: &AuthUser,
    form: UploadForm,
) -> Result<String, ApiError> {
    let file_name = if form.file_name.is_empty() {
        format!("{}.pdf", form.document_id)
    } else {
        form.file_name.clone()
    };
    let content_type = mime_guess::from_path(&file_name)
        .first_or_octet_stream()
        .to_string();

    let file_url = store
        .upload(
            FileUpload {
                bytes: form.bytes,
                file_name,
                content_type,
            },
            &form.document_id,
        )
        .await?;

    db::insert_consent(
        conn,
        &ConsentRecord {
            id: Uuid::new_v4().to_string(),
            document_id: form.document_id,
            recorded_at: form.recorded_at,
            file_url: file_url.clone(),
            user_id: user.id.clone(),
            created_at: Utc::now().to_rfc3339(),
        },
    )?;
    Ok(file_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::model::user::Role;
    use std::sync::Mutex;

    struct OkStore {
        uploads: Mutex<Vec<FileUpload>>,
    }

    impl DocumentStore for OkStore {
        async fn upload(&self, file: FileUpload, document_id: &str) -> Result<String, ApiError> {
            let url = format!("https://files.example/{}/{}", document_id, file.file_name);
            self.uploads.lock().unwrap().push(file);
            Ok(url)
        }
    }

    fn technician() -> AuthUser {
        AuthUser {
            id: "u9".to_string(),
            username: "tech".to_string(),
            given_names: "Tina".to_string(),
            first_surname: "Mora".to_string(),
            second_surname: String::new(),
            role: Role::Technician,
        }
    }

    fn upload_form() -> UploadForm {
        UploadForm {
            document_id: "900123".to_string(),
            recorded_at: "2026-08-29T10:00:00+00:00".to_string(),
            file_name: "scan.pdf".to_string(),
            bytes: b"%PDF-1.4 fake".to_vec(),
        }
    }

    #[test]
    fn missing_pieces_are_rejected() {
        let mut no_file = upload_form();
        no_file.bytes.clear();
        assert!(matches!(validate(&no_file), Err(ApiError::Validation(_))));

        let mut no_document = upload_form();
        no_document.document_id.clear();
        assert!(matches!(
            validate(&no_document),
            Err(ApiError::Validation(_))
        ));

        let mut bad_date = upload_form();
        bad_date.recorded_at = "yesterday".to_string();
        assert!(matches!(validate(&bad_date), Err(ApiError::Validation(_))));

        assert!(validate(&upload_form()).is_ok());
    }

    #[actix_web::test]
    async fn uploaded_file_is_stored_and_recorded() {
        let conn = db::test_conn();
        let store = OkStore {
            uploads: Mutex::new(Vec::new()),
        };

        let url = store_uploaded_consent(&conn, &store, &technician(), upload_form())
            .await
            .unwrap();
        assert_eq!(url, "https://files.example/900123/scan.pdf");

        let uploads = store.uploads.lock().unwrap();
        assert_eq!(uploads[0].content_type, "application/pdf");

        let records = db::list_consents(&conn, Some("u9")).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].recorded_at, "2026-08-29T10:00:00+00:00");
    }

    #[actix_web::test]
    async fn record_write_failure_fails_the_request() {
        let conn = db::test_conn();
        conn.execute_batch("DROP TABLE consents").unwrap();
        let store = OkStore {
            uploads: Mutex::new(Vec::new()),
        };
        let err = store_uploaded_consent(&conn, &store, &technician(), upload_form())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Database(_)));
    }
}
