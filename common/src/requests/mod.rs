use serde::{Deserialize, Serialize};

use crate::model::user::{Profile, Role};

/// Credentials for `POST /api/auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: Profile,
}

/// Payload for the server-side generation endpoint. Every field is mandatory:
/// the renderer has no partial-fill mode. The two signature fields carry
/// `data:image/png;base64,...` data URLs captured from pointer input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedConsentForm {
    pub template_id: String,
    pub document_id: String,
    pub patient_first_surname: String,
    pub patient_second_surname: String,
    pub patient_given_names: String,
    pub patient_age: String,
    pub patient_phone: String,
    pub patient_signature: String,
    pub specialist_signature: String,
}

/// Response of both consent write endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConsentStored {
    pub ok: bool,
    pub file_url: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub given_names: String,
    pub first_surname: String,
    #[serde(default)]
    pub second_surname: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

#[derive(Debug, Deserialize)]
pub struct SetPasswordRequest {
    pub new_password: String,
}
