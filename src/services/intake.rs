use crate::models::{MediaType, UploadedAsset};
use crate::services::stage::UpscaleError;
use crate::utils::validation::validate_upload;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// An uploaded image written to a uniquely named local file.
///
/// The file is removed exactly once: by `cleanup`, or on drop if the
/// request exits before reaching cleanup.
#[derive(Debug)]
pub struct StagedUpload {
    path: PathBuf,
    media_type: MediaType,
    size: usize,
    removed: bool,
}

impl StagedUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub async fn read(&self) -> Result<Vec<u8>, UpscaleError> {
        Ok(tokio::fs::read(&self.path).await?)
    }

    /// Removes the staged file. Consumes the guard so it cannot run twice.
    pub async fn cleanup(mut self) -> Result<(), UpscaleError> {
        self.removed = true;
        tokio::fs::remove_file(&self.path).await?;
        debug!("🧹 Removed staged file {}", self.path.display());
        Ok(())
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("🧹 Removed staged file {} on early exit", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "⚠️  Failed to remove staged file {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

/// `temp_image_<uuid hex>.<ext>`
pub fn staged_file_name(media_type: MediaType) -> String {
    format!(
        "temp_image_{}.{}",
        Uuid::new_v4().simple(),
        media_type.extension()
    )
}

/// Validates the upload and writes it to `temp_dir`.
///
/// Nothing touches the disk until the asset passes validation.
pub async fn stage_upload(
    asset: &UploadedAsset,
    temp_dir: &Path,
    max_file_size: usize,
) -> Result<StagedUpload, UpscaleError> {
    let media_type = validate_upload(
        &asset.filename,
        asset.content_type.as_deref(),
        &asset.bytes,
        max_file_size,
    )
    .map_err(|e| UpscaleError::InputRejected(e.to_string()))?;

    let path = temp_dir.join(staged_file_name(media_type));
    tokio::fs::write(&path, &asset.bytes).await?;

    info!(
        "📥 Staged '{}' ({} bytes, {}) at {}",
        asset.filename,
        asset.bytes.len(),
        media_type.mime(),
        path.display()
    );

    Ok(StagedUpload {
        path,
        media_type,
        size: asset.bytes.len(),
        removed: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const PNG_BYTES: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3, 4];

    #[test]
    fn test_staged_names_are_unique() {
        let names: HashSet<String> = (0..10_000)
            .map(|i| {
                let media = if i % 2 == 0 { MediaType::Jpeg } else { MediaType::Png };
                staged_file_name(media)
            })
            .collect();
        assert_eq!(names.len(), 10_000);
    }

    #[tokio::test]
    async fn test_stage_round_trip_and_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let asset = UploadedAsset::new("pixel.png", Some("image/png"), PNG_BYTES.to_vec());

        let staged = stage_upload(&asset, dir.path(), 1024).await.unwrap();
        assert!(staged.file_name().starts_with("temp_image_"));
        assert!(staged.file_name().ends_with(".png"));
        assert_eq!(staged.read().await.unwrap(), PNG_BYTES);

        let path = staged.path().to_path_buf();
        staged.cleanup().await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_drop_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let asset = UploadedAsset::new("pixel.png", Some("image/png"), PNG_BYTES.to_vec());

        let staged = stage_upload(&asset, dir.path(), 1024).await.unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());
        drop(staged);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_rejected_upload_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let asset = UploadedAsset::new("anim.gif", Some("image/gif"), b"GIF89a".to_vec());

        let err = stage_upload(&asset, dir.path(), 1024).await.unwrap_err();
        assert!(matches!(err, UpscaleError::InputRejected(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_missing_directory_is_local_io() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let asset = UploadedAsset::new("pixel.png", Some("image/png"), PNG_BYTES.to_vec());

        let err = stage_upload(&asset, &missing, 1024).await.unwrap_err();
        assert!(matches!(err, UpscaleError::LocalIo(_)));
    }
}
