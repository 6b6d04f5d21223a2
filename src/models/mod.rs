use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// Smallest and largest upscale factor the remote effect accepts
pub const MIN_SCALE_FACTOR: u8 = 1;
pub const MAX_SCALE_FACTOR: u8 = 4;
pub const DEFAULT_SCALE_FACTOR: u8 = 2;

/// Image types accepted at intake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Jpeg,
    Png,
}

impl MediaType {
    pub fn from_mime(mime: &str) -> Option<Self> {
        let normalized = mime.split(';').next().unwrap_or("").trim().to_lowercase();
        match normalized.as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            _ => None,
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }
}

/// A file as received from the upload form
#[derive(Debug, Clone)]
pub struct UploadedAsset {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadedAsset {
    pub fn new(filename: &str, content_type: Option<&str>, bytes: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.to_string(),
            content_type: content_type.map(|s| s.to_string()),
            bytes: bytes.into(),
        }
    }
}

/// Public identifier of an asset in the remote store, unique per request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct RemoteAssetHandle(String);

impl RemoteAssetHandle {
    /// Generates a fresh `upscale-image-<uuid>` identifier
    pub fn generate() -> Self {
        Self(format!("upscale-image-{}", Uuid::new_v4().simple()))
    }

    pub fn from_public_id(public_id: impl Into<String>) -> Self {
        Self(public_id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteAssetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Upscale factor, always within `MIN_SCALE_FACTOR..=MAX_SCALE_FACTOR`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ScaleFactor(u8);

impl ScaleFactor {
    pub fn new(value: u8) -> Option<Self> {
        (MIN_SCALE_FACTOR..=MAX_SCALE_FACTOR)
            .contains(&value)
            .then_some(Self(value))
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = ScaleFactor> {
        (MIN_SCALE_FACTOR..=MAX_SCALE_FACTOR).map(Self)
    }
}

impl Default for ScaleFactor {
    fn default() -> Self {
        Self(DEFAULT_SCALE_FACTOR)
    }
}

impl fmt::Display for ScaleFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformParameters {
    pub scale_factor: ScaleFactor,
}

impl TransformParameters {
    pub fn new(scale_factor: ScaleFactor) -> Self {
        Self { scale_factor }
    }
}

/// What the remote store reports back after accepting an upload
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadReceipt {
    pub public_id: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub bytes: Option<u64>,
    #[serde(default)]
    pub secure_url: Option<String>,
}

/// A decoded image ready to be placed on the comparison page
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RenderedImage {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub display_width: u32,
    pub display_height: u32,
    #[serde(skip)]
    pub data_uri: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_media_type_allow_list() {
        assert_eq!(MediaType::from_mime("image/jpeg"), Some(MediaType::Jpeg));
        assert_eq!(MediaType::from_mime("image/jpg"), Some(MediaType::Jpeg));
        assert_eq!(MediaType::from_mime("IMAGE/PNG; charset=binary"), Some(MediaType::Png));
        assert_eq!(MediaType::from_mime("image/gif"), None);
        assert_eq!(MediaType::from_extension("JPEG"), Some(MediaType::Jpeg));
        assert_eq!(MediaType::from_extension("gif"), None);
    }

    #[test]
    fn test_scale_factor_bounds() {
        assert!(ScaleFactor::new(0).is_none());
        assert!(ScaleFactor::new(5).is_none());
        assert_eq!(ScaleFactor::new(4).map(|s| s.get()), Some(4));
        assert_eq!(ScaleFactor::default().get(), 2);
        assert_eq!(ScaleFactor::all().count(), 4);
    }

    #[test]
    fn test_handles_do_not_collide() {
        let handles: HashSet<_> = (0..10_000).map(|_| RemoteAssetHandle::generate()).collect();
        assert_eq!(handles.len(), 10_000);
        assert!(handles.iter().all(|h| h.as_str().starts_with("upscale-image-")));
    }
}
