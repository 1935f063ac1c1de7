#![cfg(not(tarpaulin_include))]
use crate::app::AppState;
use crate::error::{AppError, Result, ValidationError};
use crate::flash;
use axum::{
    body::Bytes,
    extract::{Multipart, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Extensions (lowercase) accepted by the upload form
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["pdf", "xls", "xlsx"];

/// Multipart field carrying the uploaded file
pub const FILE_FIELD: &str = "file";

/// A file as received from the upload form
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Filename supplied by the client, possibly empty
    pub filename: String,

    pub bytes: Bytes,
}

/// Checks whether the file name carries an accepted extension
///
/// The extension is whatever follows the last '.', compared case-insensitively.
pub fn allowed_file(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((_, extension)) => ALLOWED_EXTENSIONS.contains(&extension.to_lowercase().as_str()),
        None => false,
    }
}

/// Validates an upload and writes it into `upload_dir`
///
/// Only the last path component of the client filename is used, so names like
/// `../../etc/passwd.pdf` land inside the upload directory. An existing file
/// with the same name is overwritten.
///
/// # Returns
/// * The path the bytes were written to
///
/// # Errors
/// * `ValidationError::MissingFile` when the form had no file part
/// * `ValidationError::EmptyFilename` when the file part had no name
/// * `ValidationError::UnsupportedExtension` for anything but pdf/xls/xlsx
pub fn accept(upload_dir: &Path, file: Option<UploadedFile>) -> Result<PathBuf> {
    let file = file.ok_or(ValidationError::MissingFile)?;
    if file.filename.is_empty() {
        return Err(ValidationError::EmptyFilename.into());
    }
    if !allowed_file(&file.filename) {
        return Err(ValidationError::UnsupportedExtension(file.filename).into());
    }

    let name = stored_name(&file.filename).ok_or(ValidationError::EmptyFilename)?;
    let path = upload_dir.join(name);
    std::fs::write(&path, &file.bytes)?;
    log::info!("File uploaded successfully to {}", path.display());

    Ok(path)
}

/// Last path component of a client filename, across both separator styles
fn stored_name(filename: &str) -> Option<&str> {
    filename
        .rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
}

/// Pulls the `file` part out of a multipart body
async fn read_file_field(multipart: &mut Multipart) -> Result<Option<UploadedFile>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        return Ok(Some(UploadedFile { filename, bytes }));
    }

    Ok(None)
}

// Web handlers

pub async fn serve_upload_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>)> {
    state.render_page(jar, "upload")
}

/// Handle a file upload
///
/// Success redirects to the dashboard; any validation failure is flashed and
/// sends the user back to the upload form.
pub async fn handle_upload(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut multipart: Multipart,
) -> Result<Response> {
    let file = read_file_field(&mut multipart).await?;

    match accept(&state.config.upload_dir, file) {
        Ok(_) => Ok(Redirect::to("/dashboard").into_response()),
        Err(AppError::Validation(err)) => {
            log::warn!("Rejected upload: {}", err);
            let jar = flash::push(jar, &err.to_string());
            Ok((jar, Redirect::to("/upload")).into_response())
        }
        Err(other) => Err(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, contents: &'static [u8]) -> Option<UploadedFile> {
        Some(UploadedFile {
            filename: name.to_string(),
            bytes: Bytes::from_static(contents),
        })
    }

    #[test]
    fn allowed_file_checks_last_extension_case_insensitively() {
        assert!(allowed_file("report.xlsx"));
        assert!(allowed_file("REPORT.PDF"));
        assert!(allowed_file("archive.tar.xls"));
        assert!(!allowed_file("malware.exe"));
        assert!(!allowed_file("report.xlsx.exe"));
        assert!(!allowed_file("pdf"));
        assert!(!allowed_file("notes."));
    }

    #[test]
    fn accepted_file_is_written_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = accept(dir.path(), upload("report.xlsx", b"PK\x03\x04 sheet")).unwrap();

        assert_eq!(path, dir.path().join("report.xlsx"));
        assert_eq!(std::fs::read(&path).unwrap(), b"PK\x03\x04 sheet");
    }

    #[test]
    fn same_name_overwrites_previous_upload() {
        let dir = tempfile::tempdir().unwrap();
        accept(dir.path(), upload("data.pdf", b"first")).unwrap();
        let path = accept(dir.path(), upload("data.pdf", b"second")).unwrap();

        assert_eq!(std::fs::read(path).unwrap(), b"second");
    }

    #[test]
    fn disallowed_extension_is_rejected_and_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let err = accept(dir.path(), upload("malware.exe", b"MZ")).unwrap_err();

        assert!(matches!(
            err,
            AppError::Validation(ValidationError::UnsupportedExtension(ref name)) if name == "malware.exe"
        ));
        assert!(!dir.path().join("malware.exe").exists());
    }

    #[test]
    fn missing_or_unnamed_files_are_validation_errors() {
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(
            accept(dir.path(), None),
            Err(AppError::Validation(ValidationError::MissingFile))
        ));
        assert!(matches!(
            accept(dir.path(), upload("", b"data")),
            Err(AppError::Validation(ValidationError::EmptyFilename))
        ));
    }

    #[test]
    fn directory_components_are_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let path = accept(dir.path(), upload("../../escape.pdf", b"%PDF")).unwrap();
        assert_eq!(path, dir.path().join("escape.pdf"));

        let path = accept(dir.path(), upload("C:\\Users\\me\\sheet.xls", b"xls")).unwrap();
        assert_eq!(path, dir.path().join("sheet.xls"));
    }
}
