//! Buffered reading of `multipart/form-data` posting forms.

use std::collections::HashMap;

use actix_multipart::Multipart;
use cb_core::{AppError, ImageUpload};
use futures_util::StreamExt;

/// Name of the file input on the thread and reply forms.
pub const IMAGE_FIELD: &str = "image";

/// Cap for a single text field.
pub const MAX_TEXT_BYTES: usize = 64 * 1024;

/// The posting forms have four inputs; anything well past that is refused.
pub const MAX_PARTS: usize = 16;

/// Byte limits applied while draining a posting form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormLimits {
    pub max_file_bytes: usize,
    pub max_text_bytes: usize,
    pub max_total_bytes: usize,
}

impl FormLimits {
    /// One full-size image plus a handful of text fields.
    pub fn for_upload(max_file_bytes: usize) -> Self {
        Self {
            max_file_bytes,
            max_text_bytes: MAX_TEXT_BYTES,
            max_total_bytes: max_file_bytes.saturating_add(4 * MAX_TEXT_BYTES),
        }
    }
}

/// Text fields plus the optional image of a submitted form.
#[derive(Debug, Default)]
pub struct PostedForm {
    fields: HashMap<String, String>,
    image: Option<ImageUpload>,
}

impl PostedForm {
    /// Returns the text field, or an empty string when it was not sent.
    pub fn text(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or_default()
    }

    pub fn optional_text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn take_image(&mut self) -> Option<ImageUpload> {
        self.image.take()
    }
}

/// Drains the payload. A file part over `max_file_bytes`, a text part over
/// `max_text_bytes`, a body over `max_total_bytes` or more than [`MAX_PARTS`]
/// parts is a validation error; a file input left empty counts as no image.
pub async fn read_form(mut payload: Multipart, limits: FormLimits) -> Result<PostedForm, AppError> {
    let mut form = PostedForm::default();
    let mut total = 0usize;
    let mut parts = 0usize;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| AppError::ValidationError(format!("malformed form data: {e}")))?;
        parts += 1;
        if parts > MAX_PARTS {
            return Err(AppError::ValidationError(format!(
                "the form has more than {MAX_PARTS} fields"
            )));
        }
        let disposition = field.content_disposition();
        let name = disposition.get_name().unwrap_or_default().to_string();
        let filename = disposition.get_filename().map(str::to_string);
        let part_limit = if filename.is_some() {
            limits.max_file_bytes
        } else {
            limits.max_text_bytes
        };

        let mut buf = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| AppError::ValidationError(format!("malformed form data: {e}")))?;
            if buf.len() + chunk.len() > part_limit {
                return Err(AppError::ValidationError(format!(
                    "field '{name}' exceeds the {part_limit} byte limit"
                )));
            }
            total += chunk.len();
            if total > limits.max_total_bytes {
                return Err(AppError::ValidationError(format!(
                    "the form exceeds the {} byte limit",
                    limits.max_total_bytes
                )));
            }
            buf.extend_from_slice(&chunk);
        }

        match filename {
            Some(original_name) if name == IMAGE_FIELD => {
                if !buf.is_empty() {
                    form.image = Some(ImageUpload {
                        bytes: buf,
                        original_name,
                    });
                }
            }
            Some(_) => {
                log::debug!("ignoring unexpected file field '{name}'");
            }
            None => {
                let value = String::from_utf8(buf)
                    .map_err(|_| AppError::ValidationError(format!("field '{name}' is not valid UTF-8")))?;
                form.fields.insert(name, value);
            }
        }
    }

    Ok(form)
}
