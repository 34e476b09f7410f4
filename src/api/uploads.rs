//! Storage for listing images uploaded via multipart forms.
//!
//! Files land in the configured upload directory and are served statically
//! at /uploads. Stored names are uuid-prefixed so concurrent uploads of the
//! same filename never collide.

use std::path::Path;
use uuid::Uuid;

use super::error::ApiError;

/// Whether the filename looks like an image we accept.
pub fn is_image(file_name: &str) -> bool {
    mime_guess::from_path(file_name)
        .first()
        .map(|m| m.type_() == mime_guess::mime::IMAGE)
        .unwrap_or(false)
}

/// Keep only characters that are safe in a filename.
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

/// Persist an uploaded image and return its public URL path.
pub async fn save_image(dir: &Path, file_name: &str, data: &[u8]) -> Result<String, ApiError> {
    if data.is_empty() {
        return Err(ApiError::validation_field("image", "Uploaded file is empty"));
    }
    if !is_image(file_name) {
        return Err(ApiError::validation_field(
            "image",
            "Only image files are accepted",
        ));
    }

    let stored_name = format!(
        "{}-{}",
        Uuid::new_v4().simple(),
        sanitize_file_name(file_name)
    );

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create upload directory: {}", e)))?;
    tokio::fs::write(dir.join(&stored_name), data)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to store upload: {}", e)))?;

    Ok(format!("/uploads/{}", stored_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_detection_by_extension() {
        assert!(is_image("room.jpg"));
        assert!(is_image("front.PNG"));
        assert!(!is_image("notes.pdf"));
        assert!(!is_image("script.sh"));
        assert!(!is_image("no_extension"));
    }

    #[test]
    fn sanitizes_hostile_names() {
        assert_eq!(sanitize_file_name("room photo (1).jpg"), "room_photo__1_.jpg");
        assert_eq!(sanitize_file_name("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_file_name(""), "upload");
    }

    #[tokio::test]
    async fn saves_with_unique_names() {
        let tmp = tempfile::tempdir().unwrap();
        let a = save_image(tmp.path(), "room.jpg", b"fake-jpeg-bytes")
            .await
            .unwrap();
        let b = save_image(tmp.path(), "room.jpg", b"fake-jpeg-bytes")
            .await
            .unwrap();

        assert!(a.starts_with("/uploads/"));
        assert_ne!(a, b);
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 2);
    }

    #[tokio::test]
    async fn rejects_non_images_and_empty_files() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(save_image(tmp.path(), "malware.exe", b"MZ").await.is_err());
        assert!(save_image(tmp.path(), "room.jpg", b"").await.is_err());
    }
}
