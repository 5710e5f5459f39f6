use axum::extract::Multipart;
use bytes::{Bytes, BytesMut};
use uuid::Uuid;

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{NewUser, StoredFile, UserRecord};
use crate::services::UserService;
use crate::storage::BlobStore;

/// Per-endpoint ingestion policy
#[derive(Debug, Clone, Copy)]
pub struct IngestPolicy {
    pub max_body_bytes: u64,
    pub image_required: bool,
    pub pdf_required: bool,
}

impl IngestPolicy {
    /// Lenient policy for the browser form: both files optional
    pub const FORM: IngestPolicy = IngestPolicy {
        max_body_bytes: 50 * 1024 * 1024,
        image_required: false,
        pdf_required: false,
    };

    /// Strict policy for the JSON API: both files required
    pub const API: IngestPolicy = IngestPolicy {
        max_body_bytes: 200 * 1024 * 1024,
        image_required: true,
        pdf_required: true,
    };
}

/// A buffered file part, not yet written to storage
struct FilePart {
    original_name: String,
    data: Bytes,
}

/// Parsed multipart submission. Transient; no storage side effect has
/// happened while this exists.
#[derive(Default)]
struct Submission {
    name: String,
    email: String,
    phone: String,
    city: String,
    image: Option<FilePart>,
    pdf: Option<FilePart>,
}

/// Multipart ingestion pipeline shared by both endpoints.
///
/// Order of effects is deliberate: the whole body is parsed (and size
/// capped) before the first storage write, files are written before the
/// insert, and nothing written is ever retracted. A failure between the
/// file writes and the insert leaves orphaned files behind; that window
/// is accepted, not papered over.
pub struct IngestService;

impl IngestService {
    pub async fn ingest(
        db: Option<&Database>,
        store: &dyn BlobStore,
        policy: &IngestPolicy,
        content_length: Option<u64>,
        multipart: Multipart,
    ) -> Result<UserRecord> {
        // Size gate on the declared length, before the body is touched
        if let Some(declared) = content_length {
            if declared > policy.max_body_bytes {
                return Err(AppError::PayloadTooLarge(policy.max_body_bytes));
            }
        }

        let submission = Self::parse(multipart, policy.max_body_bytes).await?;

        // Image first, then pdf. A missing required pdf aborts after the
        // image write; the image stays on disk as an orphan.
        let image =
            Self::resolve_file(store, submission.image, policy.image_required, "image").await?;
        let pdf = Self::resolve_file(store, submission.pdf, policy.pdf_required, "pdf").await?;

        let db = db.ok_or(AppError::StoreUnavailable)?;

        let new_user = NewUser {
            name: submission.name,
            email: submission.email,
            phone: submission.phone,
            city: submission.city,
            image_path: image.map(|f| f.storage_path).unwrap_or_default(),
            pdf_path: pdf.map(|f| f.storage_path).unwrap_or_default(),
        };

        let id = UserService::insert(db, &new_user).await?;
        tracing::info!(id, "submission persisted");

        Ok(UserRecord {
            id,
            name: new_user.name,
            email: new_user.email,
            phone: new_user.phone,
            city: new_user.city,
            image_path: new_user.image_path,
            pdf_path: new_user.pdf_path,
        })
    }

    /// Decode the multipart body into text fields and buffered file
    /// parts, holding the running byte total under `max_body_bytes` so
    /// chunked bodies without a Content-Length are bounded too.
    async fn parse(mut multipart: Multipart, max_body_bytes: u64) -> Result<Submission> {
        let mut submission = Submission::default();
        let mut total: u64 = 0;

        while let Some(mut field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::MalformedRequest(e.to_string()))?
        {
            let name = field.name().unwrap_or("").to_string();

            match name.as_str() {
                "image" | "pdf" => {
                    let original_name = field.file_name().unwrap_or("").to_string();

                    let mut buf = BytesMut::new();
                    while let Some(chunk) = field
                        .chunk()
                        .await
                        .map_err(|e| AppError::MalformedRequest(e.to_string()))?
                    {
                        total += chunk.len() as u64;
                        if total > max_body_bytes {
                            return Err(AppError::PayloadTooLarge(max_body_bytes));
                        }
                        buf.extend_from_slice(&chunk);
                    }

                    // Browsers submit an empty part for an untouched
                    // file input; treat it as absent.
                    if original_name.is_empty() && buf.is_empty() {
                        continue;
                    }

                    let part = FilePart {
                        original_name,
                        data: buf.freeze(),
                    };
                    if name == "image" {
                        submission.image = Some(part);
                    } else {
                        submission.pdf = Some(part);
                    }
                }
                "name" | "email" | "phone" | "city" => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| AppError::MalformedRequest(e.to_string()))?;
                    total += text.len() as u64;
                    if total > max_body_bytes {
                        return Err(AppError::PayloadTooLarge(max_body_bytes));
                    }
                    match name.as_str() {
                        "name" => submission.name = text,
                        "email" => submission.email = text,
                        "phone" => submission.phone = text,
                        _ => submission.city = text,
                    }
                }
                _ => {}
            }
        }

        Ok(submission)
    }

    /// Write a file part to blob storage, or report it missing if the
    /// policy requires it
    async fn resolve_file(
        store: &dyn BlobStore,
        part: Option<FilePart>,
        required: bool,
        field: &'static str,
    ) -> Result<Option<StoredFile>> {
        match part {
            Some(part) => {
                let key = storage_key(&part.original_name);
                let size_bytes = part.data.len() as u64;
                let storage_path = store.put(&key, part.data).await?;
                tracing::debug!(field, key = %key, size_bytes, "stored uploaded file");
                Ok(Some(StoredFile {
                    original_name: part.original_name,
                    storage_path,
                    size_bytes,
                }))
            }
            None if required => Err(AppError::MissingRequiredFile(field)),
            None => Ok(None),
        }
    }
}

/// Collision-resistant storage key: a random identifier, keeping the
/// original extension only when it is short plain ASCII. The
/// client-supplied filename never becomes part of the path.
fn storage_key(original_name: &str) -> String {
    let ext = std::path::Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| e.len() <= 10 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default();

    format!("{}{}", Uuid::new_v4(), ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_key_keeps_plain_extension() {
        let key = storage_key("photo.PNG");
        assert!(key.ends_with(".png"));
        assert!(!key.contains("photo"));
    }

    #[test]
    fn storage_key_drops_suspicious_names() {
        assert!(!storage_key("../../etc/passwd").contains('/'));
        assert!(!storage_key("x.we?rd").contains('.'));
        assert!(!storage_key("").contains('.'));
    }

    #[test]
    fn storage_keys_are_unique_per_call() {
        assert_ne!(storage_key("doc.pdf"), storage_key("doc.pdf"));
    }
}
