use std::collections::HashMap;

use axum::extract::multipart::MultipartError;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::StatusCode;

use crate::error::AppError;
use crate::files::Upload;

/// A fully buffered `multipart/form-data` body.
///
/// Text parts land in `fields`, parts with a filename in `files`. A trailing
/// `[]` on a part name is dropped, so `gallery[]` is read as `gallery`. File
/// parts with an empty filename (an unselected file input) are ignored.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: HashMap<String, Vec<Upload>>,
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Request body exceeds the upload limit".into())
    } else {
        AppError::Validation(format!("Multipart error: {}", e.body_text()))
    }
}

impl<S> FromRequest<S> for FormData
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;

        let mut form = FormData::default();
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let Some(name) = field.name().map(|n| n.trim_end_matches("[]").to_string()) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let data = field.bytes().await.map_err(multipart_error)?;
                    if file_name.is_empty() {
                        continue;
                    }
                    form.files
                        .entry(name)
                        .or_default()
                        .push(Upload { file_name, data });
                }
                None => {
                    let text = field.text().await.map_err(multipart_error)?;
                    form.fields.insert(name, text);
                }
            }
        }

        Ok(form)
    }
}

impl FormData {
    /// Trimmed text value, empty when the field was not sent.
    pub fn text(&self, name: &str) -> String {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    }

    /// Untrimmed text value, for secrets where whitespace is significant.
    pub fn raw(&self, name: &str) -> String {
        self.fields.get(name).cloned().unwrap_or_default()
    }

    /// Trimmed text value of the first of `names` that was sent.
    pub fn text_any(&self, names: &[&str]) -> String {
        names
            .iter()
            .find_map(|name| self.fields.get(*name))
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    }

    /// Trimmed text value, `None` when the field was not sent or is blank.
    pub fn optional(&self, name: &str) -> Option<String> {
        Some(self.text(name)).filter(|v| !v.is_empty())
    }

    /// Integer id; `None` when missing, blank or not a number.
    pub fn id(&self, name: &str) -> Option<i32> {
        self.fields.get(name).and_then(|v| v.trim().parse().ok())
    }

    /// First file sent under `name`.
    pub fn file(&self, name: &str) -> Option<&Upload> {
        self.files.get(name).and_then(|files| files.first())
    }

    /// Every file sent under `name`, in request order.
    pub fn files(&self, name: &str) -> &[Upload] {
        self.files.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    #[cfg(test)]
    pub fn with_text(mut self, name: &str, value: &str) -> Self {
        self.fields.insert(name.to_string(), value.to_string());
        self
    }
}
