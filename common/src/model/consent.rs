use serde::{Deserialize, Serialize};

/// A stored reference to a signed consent document.
///
/// The document itself lives in the remote library; this record only links the
/// patient identifier, the capture time, the owning user and the URL the library
/// returned after upload. Records are append-only: they are never mutated or
/// deleted once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentRecord {
    /// Unique record identifier (UUID v4).
    pub id: String,
    /// Patient identity document number the consent belongs to.
    pub document_id: String,
    /// When the consent was captured, RFC 3339.
    pub recorded_at: String,
    /// URL of the uploaded document in the remote library.
    pub file_url: String,
    /// Identifier of the staff account that created the record.
    pub user_id: String,
    /// When the record was written, RFC 3339.
    pub created_at: String,
}
