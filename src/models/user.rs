use serde::Serialize;
use sqlx::FromRow;

/// A persisted submission. `image_path`/`pdf_path` are empty when no
/// file accompanied the submission; otherwise they name a file that was
/// written to storage before this row was inserted.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub image_path: String,
    pub pdf_path: String,
}

/// Fields of a submission about to be inserted
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub image_path: String,
    pub pdf_path: String,
}

/// Reference to an uploaded file already written to blob storage.
/// The client-supplied filename is kept as metadata only; the storage
/// path uses a generated key.
#[derive(Debug, Clone, Serialize)]
pub struct StoredFile {
    pub original_name: String,
    pub storage_path: String,
    pub size_bytes: u64,
}
