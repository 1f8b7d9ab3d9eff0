//! Post image uploads
//!
//! Accepted files are written below the media root as
//! `post_images/{uuid}.{ext}` and referenced by that relative path from the
//! post row. The files are served back under `/media/`.

use std::path::Path;

use anyhow::Context;
use tokio::fs;
use uuid::Uuid;

use crate::config::MediaConfig;

/// Directory below the media root where post images land
pub const POST_IMAGE_DIR: &str = "post_images";

/// Upload failure modes surfaced to the form as validation messages
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Unsupported image type: {0}")]
    TypeNotAllowed(String),

    #[error("Image exceeds the maximum size of {0} bytes")]
    TooLarge(u64),

    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

/// Validate and store an uploaded image, returning its media-relative path.
pub async fn save_post_image(
    media: &MediaConfig,
    content_type: &str,
    data: &[u8],
) -> Result<String, UploadError> {
    if !media.is_type_allowed(content_type) {
        return Err(UploadError::TypeNotAllowed(content_type.to_string()));
    }
    if data.len() as u64 > media.max_file_size {
        return Err(UploadError::TooLarge(media.max_file_size));
    }

    let dir = media.root.join(POST_IMAGE_DIR);
    fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("Failed to create upload directory {:?}", dir))?;

    let filename = format!("{}.{}", Uuid::new_v4(), media.get_extension(content_type));
    let path = dir.join(&filename);
    fs::write(&path, data)
        .await
        .with_context(|| format!("Failed to write upload {:?}", path))?;

    Ok(format!("{}/{}", POST_IMAGE_DIR, filename))
}

/// Remove a stored image, tolerating files already gone.
pub async fn remove_post_image(media: &MediaConfig, relative: &str) {
    // Only paths of our own making are deleted
    if !relative.starts_with(POST_IMAGE_DIR) || relative.contains("..") {
        return;
    }
    let path = media.root.join(Path::new(relative));
    if let Err(e) = fs::remove_file(&path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("Failed to remove image {:?}: {}", path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media_in(dir: &Path) -> MediaConfig {
        MediaConfig {
            root: dir.to_path_buf(),
            max_file_size: 1024,
            allowed_types: vec!["image/png".to_string(), "image/jpeg".to_string()],
        }
    }

    #[tokio::test]
    async fn test_save_post_image() {
        let tmp = tempfile::tempdir().unwrap();
        let media = media_in(tmp.path());

        let relative = save_post_image(&media, "image/png", b"fake-png-bytes")
            .await
            .expect("Upload should succeed");

        assert!(relative.starts_with("post_images/"));
        assert!(relative.ends_with(".png"));
        assert!(tmp.path().join(&relative).exists());
    }

    #[tokio::test]
    async fn test_save_rejects_disallowed_type() {
        let tmp = tempfile::tempdir().unwrap();
        let media = media_in(tmp.path());

        let result = save_post_image(&media, "application/x-sh", b"#!/bin/sh").await;
        assert!(matches!(result, Err(UploadError::TypeNotAllowed(_))));
    }

    #[tokio::test]
    async fn test_save_rejects_oversized_file() {
        let tmp = tempfile::tempdir().unwrap();
        let media = media_in(tmp.path());

        let big = vec![0u8; 2048];
        let result = save_post_image(&media, "image/png", &big).await;
        assert!(matches!(result, Err(UploadError::TooLarge(_))));
    }

    #[tokio::test]
    async fn test_remove_post_image() {
        let tmp = tempfile::tempdir().unwrap();
        let media = media_in(tmp.path());

        let relative = save_post_image(&media, "image/jpeg", b"jpeg").await.unwrap();
        assert!(tmp.path().join(&relative).exists());

        remove_post_image(&media, &relative).await;
        assert!(!tmp.path().join(&relative).exists());

        // Removing again is a no-op
        remove_post_image(&media, &relative).await;
    }

    #[tokio::test]
    async fn test_remove_ignores_foreign_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let media = media_in(tmp.path());

        let outside = tmp.path().join("keep.txt");
        fs::write(&outside, b"data").await.unwrap();

        remove_post_image(&media, "../keep.txt").await;
        assert!(outside.exists());
    }
}
