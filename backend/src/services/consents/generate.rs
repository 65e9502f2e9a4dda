//! Server-side generation of a signed consent document.
//!
//! One shallow pipeline, strictly in order: validate every field, resolve the
//! template layout, decode both signature data URLs, render the filled PDF,
//! upload the bytes, append the record. All validation happens before the
//! first side effect, and a failed upload means no record is written. The one
//! deliberate asymmetry sits at the very end: if the record write fails after
//! a successful upload, the URL is still returned and the orphaned remote file
//! is only reported in the log.

use std::fs;

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Local};
use common::model::consent::ConsentRecord;
use common::requests::{ConsentStored, SignedConsentForm};
use log::error;
use rusqlite::Connection;
use uuid::Uuid;

use crate::auth::token::AuthUser;
use crate::db;
use crate::error::ApiError;
use crate::pdf::layout::{self, TemplateLayout};
use crate::pdf::render::{self, ConsentText};
use crate::state::AppState;
use crate::storage::{DocumentStore, FileUpload};

pub async fn process(
    user: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<SignedConsentForm>,
) -> Result<HttpResponse, ApiError> {
    let form = payload.into_inner();
    require_fields(&form)?;
    let layout = layout::resolve(&form.template_id).ok_or_else(|| {
        ApiError::Validation(format!("unsupported template: {}", form.template_id))
    })?;
    let patient_signature = render::decode_signature(&form.patient_signature)?;
    let specialist_signature = render::decode_signature(&form.specialist_signature)?;

    let template_path = state.config.templates_dir.join(layout.template_file);
    let template = fs::read(&template_path).map_err(|e| {
        ApiError::Internal(format!(
            "cannot read template asset {}: {}",
            layout.template_file, e
        ))
    })?;

    let conn = db::open(&state.config.db_path)?;
    let file_url = generate_and_store(
        &conn,
        &state.store,
        layout,
        &user,
        &form,
        &template,
        &patient_signature,
        &specialist_signature,
    )
    .await?;
    Ok(HttpResponse::Ok().json(ConsentStored {
        ok: true,
        file_url,
    }))
}

/// Every field of the form is mandatory; there is no partial-render mode.
fn require_fields(form: &SignedConsentForm) -> Result<(), ApiError> {
    let required: [(&str, &str); 9] = [
        ("template_id", &form.template_id),
        ("document_id", &form.document_id),
        ("patient_first_surname", &form.patient_first_surname),
        ("patient_second_surname", &form.patient_second_surname),
        ("patient_given_names", &form.patient_given_names),
        ("patient_age", &form.patient_age),
        ("patient_phone", &form.patient_phone),
        ("patient_signature", &form.patient_signature),
        ("specialist_signature", &form.specialist_signature),
    ];
    for (name, value) in required {
        if value.trim().is_empty() {
            return Err(ApiError::Validation(format!(
                "missing required field: {}",
                name
            )));
        }
    }
    Ok(())
}

/// Assembles the strings drawn onto the template. Patient data comes from the
/// form, the specialist's name from the caller's session, and the date parts
/// from the capture instant.
fn consent_text(
    form: &SignedConsentForm,
    user: &AuthUser,
    now: &DateTime<Local>,
) -> ConsentText {
    let declarant_name = format!(
        "{} {} {}",
        form.patient_first_surname, form.patient_second_surname, form.patient_given_names
    )
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ");

    ConsentText {
        day: now.format("%d").to_string(),
        month: now.format("%m").to_string(),
        year: now.format("%Y").to_string(),
        hour: now.format("%H:%M").to_string(),
        patient_first_surname: form.patient_first_surname.trim().to_string(),
        patient_second_surname: form.patient_second_surname.trim().to_string(),
        patient_given_names: form.patient_given_names.trim().to_string(),
        patient_document: form.document_id.trim().to_string(),
        patient_age: form.patient_age.trim().to_string(),
        patient_phone: form.patient_phone.trim().to_string(),
        specialist_first_surname: user.first_surname.trim().to_string(),
        specialist_second_surname: user.second_surname.trim().to_string(),
        specialist_given_names: user.given_names.trim().to_string(),
        declarant_name,
    }
}

#[allow(clippy::too_many_arguments)]
async fn generate_and_store<S: DocumentStore>(
    conn: &Connection,
    store: &S,
    layout: &TemplateLayout,
    user: &AuthUser,
    form: &SignedConsentForm,
    template: &[u8],
    patient_signature: &[u8],
    specialist_signature: &[u8],
) -> Result<String, ApiError> {
    let now = Local::now();
    let text = consent_text(form, user, &now);
    let pdf = render::fill_template(template, layout, &text, patient_signature, specialist_signature)?;

    let file = FileUpload {
        bytes: pdf,
        file_name: format!(
            "{}-{}-{}.pdf",
            form.template_id,
            form.document_id,
            now.format("%Y-%m-%d")
        ),
        content_type: "application/pdf".to_string(),
    };
    let file_url = store.upload(file, &form.document_id).await?;

    let record = ConsentRecord {
        id: Uuid::new_v4().to_string(),
        document_id: form.document_id.clone(),
        recorded_at: now.to_rfc3339(),
        file_url: file_url.clone(),
        user_id: user.id.clone(),
        created_at: now.to_rfc3339(),
    };
    // The document already sits in the library at this point. A failed record
    // write leaves it orphaned; surface the URL anyway and leave a trail in
    // the log.
    if let Err(err) = db::insert_consent(conn, &record) {
        error!(
            "consent for {} uploaded to {} but record write failed: {}",
            record.document_id, record.file_url, err
        );
    }
    Ok(file_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::render::testutil::{blank_template, png_data_url};
    use common::model::user::Role;
    use std::sync::Mutex;

    struct FakeStore {
        fail: bool,
        uploads: Mutex<Vec<String>>,
    }

    impl FakeStore {
        fn working() -> FakeStore {
            FakeStore {
                fail: false,
                uploads: Mutex::new(Vec::new()),
            }
        }

        fn broken() -> FakeStore {
            FakeStore {
                fail: true,
                uploads: Mutex::new(Vec::new()),
            }
        }
    }

    impl DocumentStore for FakeStore {
        async fn upload(&self, file: FileUpload, _document_id: &str) -> Result<String, ApiError> {
            if self.fail {
                return Err(ApiError::Storage("library unreachable".to_string()));
            }
            self.uploads.lock().unwrap().push(file.file_name.clone());
            Ok(format!("https://files.example/{}", file.file_name))
        }
    }

    fn specialist() -> AuthUser {
        AuthUser {
            id: "u1".to_string(),
            username: "arojas".to_string(),
            given_names: "Andres".to_string(),
            first_surname: "Rojas".to_string(),
            second_surname: "Mora".to_string(),
            role: Role::Specialist,
        }
    }

    fn form() -> SignedConsentForm {
        SignedConsentForm {
            template_id: "FO-HCR-13".to_string(),
            document_id: "1017233841".to_string(),
            patient_first_surname: "Garcia".to_string(),
            patient_second_surname: "Lopez".to_string(),
            patient_given_names: "Maria Fernanda".to_string(),
            patient_age: "54".to_string(),
            patient_phone: "3015551234".to_string(),
            patient_signature: png_data_url(),
            specialist_signature: png_data_url(),
        }
    }

    fn decoded_signature() -> Vec<u8> {
        render::decode_signature(&png_data_url()).unwrap()
    }

    #[test]
    fn any_missing_field_rejects_before_side_effects() {
        let mut incomplete = form();
        incomplete.patient_phone = "  ".to_string();
        let err = require_fields(&incomplete).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(require_fields(&form()).is_ok());
    }

    #[actix_web::test]
    async fn successful_generation_writes_a_record() {
        let conn = db::test_conn();
        let store = FakeStore::working();
        let layout = layout::resolve("FO-HCR-13").unwrap();
        let sig = decoded_signature();

        let url = generate_and_store(
            &conn,
            &store,
            layout,
            &specialist(),
            &form(),
            &blank_template(2),
            &sig,
            &sig,
        )
        .await
        .unwrap();

        assert!(url.starts_with("https://files.example/FO-HCR-13-1017233841-"));
        let records = db::list_consents(&conn, None).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].file_url, url);
        assert_eq!(records[0].user_id, "u1");
        assert_eq!(records[0].document_id, "1017233841");
    }

    #[actix_web::test]
    async fn failed_upload_leaves_no_record() {
        let conn = db::test_conn();
        let store = FakeStore::broken();
        let layout = layout::resolve("FO-HCR-13").unwrap();
        let sig = decoded_signature();

        let err = generate_and_store(
            &conn,
            &store,
            layout,
            &specialist(),
            &form(),
            &blank_template(2),
            &sig,
            &sig,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ApiError::Storage(_)));
        assert!(db::list_consents(&conn, None).unwrap().is_empty());
    }

    #[actix_web::test]
    async fn failed_record_write_still_returns_the_url() {
        let conn = db::test_conn();
        conn.execute_batch("DROP TABLE consents").unwrap();
        let store = FakeStore::working();
        let layout = layout::resolve("FO-HCR-13").unwrap();
        let sig = decoded_signature();

        let url = generate_and_store(
            &conn,
            &store,
            layout,
            &specialist(),
            &form(),
            &blank_template(2),
            &sig,
            &sig,
        )
        .await
        .unwrap();

        assert!(url.starts_with("https://files.example/"));
        assert_eq!(store.uploads.lock().unwrap().len(), 1);
    }

    #[test]
    fn specialist_name_comes_from_the_session() {
        let now = Local::now();
        let text = consent_text(&form(), &specialist(), &now);
        assert_eq!(text.specialist_given_names, "Andres");
        assert_eq!(text.specialist_first_surname, "Rojas");
        assert_eq!(text.declarant_name, "Garcia Lopez Maria Fernanda");
        assert_eq!(text.patient_document, "1017233841");
    }
}
