// src/api/multipart.rs
use actix_multipart::Multipart;
use futures::TryStreamExt;

use crate::errors::{QuizError, Result};

/// A single file part read fully into memory.
#[derive(Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Lower-cased extension without the dot, if the name has one.
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
    }
}

fn bad_upload(e: actix_multipart::MultipartError) -> QuizError {
    QuizError::BadRequest(format!("Malformed upload: {}", e))
}

/// Reads the file sent as form field `field_name`. Other fields are drained
/// and ignored. Fails with `TooLarge` as soon as the part exceeds `max_bytes`.
pub async fn read_file(
    mut payload: Multipart,
    field_name: &str,
    max_bytes: usize,
) -> Result<Option<UploadedFile>> {
    let mut found = None;

    while let Some(mut field) = payload.try_next().await.map_err(bad_upload)? {
        let (name, filename) = match field.content_disposition() {
            Some(cd) => (
                cd.get_name().unwrap_or_default().to_string(),
                cd.get_filename().map(str::to_string),
            ),
            None => (String::new(), None),
        };

        let wanted = found.is_none() && name == field_name;
        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(bad_upload)? {
            if !wanted {
                continue;
            }
            if bytes.len() + chunk.len() > max_bytes {
                return Err(QuizError::TooLarge(format!(
                    "File too large. Maximum size is {} MB.",
                    max_bytes / (1024 * 1024)
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        if wanted {
            found = Some(UploadedFile {
                filename: filename.unwrap_or_default(),
                content_type: field.content_type().map(|m| m.essence_str().to_string()),
                bytes,
            });
        }
    }

    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_is_lower_cased() {
        let file = UploadedFile {
            filename: "Me.JPG".to_string(),
            content_type: None,
            bytes: Vec::new(),
        };
        assert_eq!(file.extension().as_deref(), Some("jpg"));

        let file = UploadedFile {
            filename: "noext".to_string(),
            ..file
        };
        assert_eq!(file.extension(), None);
    }
}
