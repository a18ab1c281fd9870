//! Multipart upload handling for assignment materials and submissions.
//!
//! Uploaded files are stored under the configured storage root with a
//! generated filename; the original name, guessed MIME type, and size are
//! recorded as metadata on the owning row.

use axum::extract::Multipart;
use db::models::assignment::StoredFile;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use util::config;

/// Extensions accepted for uploaded material and submission files.
const ALLOWED_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "ppt", "pptx", "xls", "xlsx", "txt", "png", "jpg", "jpeg", "zip",
];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Malformed multipart request")]
    Malformed,
    #[error("File '{0}' exceeds the maximum upload size")]
    TooLarge(String),
    #[error("File type of '{0}' is not allowed")]
    UnsupportedType(String),
    #[error("Failed to store uploaded file")]
    Io(#[from] std::io::Error),
}

/// One file taken out of a multipart request, not yet persisted.
pub struct RawUpload {
    pub original_name: String,
    pub bytes: Vec<u8>,
}

/// The parsed contents of a multipart form: text fields by name, plus
/// every file part in arrival order.
#[derive(Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    pub files: Vec<RawUpload>,
}

impl UploadForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Drains a multipart request into text fields and raw file parts.
pub async fn parse_form(mut multipart: Multipart) -> Result<UploadForm, UploadError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|_| UploadError::Malformed)? {
        let name = field.name().unwrap_or_default().to_owned();

        match field.file_name() {
            Some(file_name) => {
                let original_name = file_name.to_owned();
                let bytes = field.bytes().await.map_err(|_| UploadError::Malformed)?;
                form.files.push(RawUpload {
                    original_name,
                    bytes: bytes.to_vec(),
                });
            }
            None => {
                let value = field.text().await.map_err(|_| UploadError::Malformed)?;
                form.fields.insert(name, value);
            }
        }
    }

    Ok(form)
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
}

/// Persists one upload into `dir`, returning its stored metadata.
///
/// Enforces the size limit and extension allow-list before touching disk.
pub fn store_file(dir: &Path, upload: &RawUpload) -> Result<StoredFile, UploadError> {
    if upload.bytes.len() as u64 > config::max_upload_bytes() {
        return Err(UploadError::TooLarge(upload.original_name.clone()));
    }

    let ext = extension_of(&upload.original_name)
        .filter(|e| ALLOWED_EXTENSIONS.contains(&e.as_str()))
        .ok_or_else(|| UploadError::UnsupportedType(upload.original_name.clone()))?;

    util::paths::ensure_dir(dir.to_path_buf())?;
    let filename = format!("{}.{}", uuid::Uuid::new_v4(), ext);
    std::fs::write(dir.join(&filename), &upload.bytes)?;

    let mime_type = mime_guess::from_path(&upload.original_name)
        .first_or_octet_stream()
        .to_string();

    Ok(StoredFile {
        filename,
        original_name: upload.original_name.clone(),
        mime_type,
        size: upload.bytes.len() as u64,
    })
}

/// Persists every file of a form into `dir`.
pub fn store_all(dir: &Path, form: &UploadForm) -> Result<Vec<StoredFile>, UploadError> {
    form.files.iter().map(|f| store_file(dir, f)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use util::config::AppConfig;

    fn upload(name: &str, bytes: &[u8]) -> RawUpload {
        RawUpload {
            original_name: name.into(),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    #[serial]
    fn stores_allowed_files_with_generated_names() {
        AppConfig::set_max_upload_bytes(1024u64);
        let dir = tempfile::tempdir().unwrap();

        let stored = store_file(dir.path(), &upload("report.pdf", b"%PDF-1.4")).unwrap();
        assert_ne!(stored.filename, "report.pdf");
        assert!(stored.filename.ends_with(".pdf"));
        assert_eq!(stored.original_name, "report.pdf");
        assert_eq!(stored.mime_type, "application/pdf");
        assert_eq!(stored.size, 8);
        assert!(dir.path().join(&stored.filename).exists());
    }

    #[test]
    #[serial]
    fn rejects_disallowed_extensions() {
        AppConfig::set_max_upload_bytes(1024u64);
        let dir = tempfile::tempdir().unwrap();

        let err = store_file(dir.path(), &upload("malware.exe", b"MZ")).unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedType(_)));

        let err = store_file(dir.path(), &upload("no_extension", b"data")).unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedType(_)));
    }

    #[test]
    #[serial]
    fn rejects_oversized_files() {
        AppConfig::set_max_upload_bytes(4u64);
        let dir = tempfile::tempdir().unwrap();

        let err = store_file(dir.path(), &upload("notes.txt", b"too large")).unwrap_err();
        assert!(matches!(err, UploadError::TooLarge(_)));
    }
}
