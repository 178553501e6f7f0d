// src/api/handlers/profile.rs
use actix_multipart::Multipart;
use actix_web::{HttpResponse, Result, web};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::api::AppState;
use crate::api::auth::AuthUser;
use crate::api::multipart::{self, UploadedFile};
use crate::database::users::{self, ProfileUpdate};
use crate::errors::QuizError;
use crate::models::Role;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub profile_image: Option<String>,
}

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
const IMAGE_TYPES: [&str; 4] = ["jpeg", "jpg", "png", "webp"];

/// Extension to store the image under, if both the declared content type and
/// the file name say it is a jpeg, png or webp image.
fn image_extension(file: &UploadedFile) -> Option<String> {
    let mime_ok = file
        .content_type
        .as_deref()
        .is_some_and(|ct| IMAGE_TYPES.iter().any(|t| ct.contains(t)));
    let ext = file.extension()?;
    (mime_ok && IMAGE_TYPES.contains(&ext.as_str())).then_some(ext)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// GET /api/users/profile
pub async fn get_profile(auth: AuthUser) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(&auth.user))
}

/// PUT /api/users/profile (admins only)
pub async fn update_profile(
    state: web::Data<AppState>,
    auth: AuthUser,
    req: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse> {
    if auth.role != Role::Admin {
        return Err(QuizError::Forbidden(
            "Access denied. Only admins can edit profiles.".to_string(),
        )
        .into());
    }

    let req = req.into_inner();
    let update = ProfileUpdate {
        name: non_blank(req.name),
        email: non_blank(req.email),
        mobile: non_blank(req.mobile),
        // An empty string clears the image.
        profile_image: req.profile_image,
    };

    let user = users::update_profile(&state.db_pool, &auth.id, &update).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// POST /api/users/profile/upload (multipart field `profileImage`)
pub async fn upload_profile_image(
    state: web::Data<AppState>,
    auth: AuthUser,
    payload: Multipart,
) -> Result<HttpResponse> {
    let file = multipart::read_file(payload, "profileImage", MAX_IMAGE_BYTES)
        .await?
        .ok_or_else(|| QuizError::BadRequest("No file uploaded".to_string()))?;

    let ext = image_extension(&file).ok_or_else(|| {
        QuizError::BadRequest("Only images (jpeg, jpg, png, webp) are allowed".to_string())
    })?;

    let filename = format!(
        "profile-{}-{}.{}",
        auth.id,
        Utc::now().timestamp_millis(),
        ext
    );
    let dir = &state.config.uploads_dir;
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(QuizError::from)?;
    tokio::fs::write(dir.join(&filename), &file.bytes)
        .await
        .map_err(QuizError::from)?;
    log::info!("Stored profile image {} ({} bytes)", filename, file.bytes.len());

    Ok(HttpResponse::Ok().json(json!({ "imageUrl": format!("/uploads/{}", filename) })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(filename: &str, content_type: Option<&str>) -> UploadedFile {
        UploadedFile {
            filename: filename.to_string(),
            content_type: content_type.map(str::to_string),
            bytes: vec![0xff, 0xd8],
        }
    }

    #[test]
    fn test_image_extension_accepts_known_types() {
        assert_eq!(
            image_extension(&upload("me.JPG", Some("image/jpeg"))).as_deref(),
            Some("jpg")
        );
        assert_eq!(
            image_extension(&upload("me.webp", Some("image/webp"))).as_deref(),
            Some("webp")
        );
    }

    #[test]
    fn test_image_extension_needs_both_type_and_name() {
        assert_eq!(image_extension(&upload("me.png", Some("application/pdf"))), None);
        assert_eq!(image_extension(&upload("me.gif", Some("image/png"))), None);
        assert_eq!(image_extension(&upload("me.png", None)), None);
        assert_eq!(image_extension(&upload("png", Some("image/png"))), None);
    }
}
