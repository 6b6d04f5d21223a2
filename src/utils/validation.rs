use crate::models::MediaType;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validates file size against maximum limit
pub fn validate_file_size(size: usize, max_size: usize) -> Result<(), ValidationError> {
    if size == 0 {
        return Err(ValidationError {
            code: "EMPTY_FILE",
            message: "Uploaded file is empty".to_string(),
        });
    }
    if size > max_size {
        return Err(ValidationError {
            code: "FILE_TOO_LARGE",
            message: format!(
                "File size {} bytes exceeds maximum allowed {} bytes ({} MB)",
                size,
                max_size,
                max_size / 1024 / 1024
            ),
        });
    }
    Ok(())
}

/// Resolves the declared media type against the allow-list.
///
/// The content type wins when it is specific; generic or missing content
/// types fall back to the filename extension.
pub fn resolve_media_type(
    filename: &str,
    content_type: Option<&str>,
) -> Result<MediaType, ValidationError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");

    let declared = content_type
        .map(|ct| ct.trim())
        .filter(|ct| !ct.is_empty() && !ct.starts_with("application/octet-stream"));

    let resolved = match declared {
        Some(ct) => MediaType::from_mime(ct),
        None => MediaType::from_extension(extension),
    };

    resolved.ok_or_else(|| ValidationError {
        code: "INVALID_MEDIA_TYPE",
        message: format!(
            "'{}' ({}) is not supported. Only JPEG and PNG images are accepted.",
            filename,
            declared.unwrap_or(extension)
        ),
    })
}

/// Sniffs the leading bytes and checks they agree with the declared type
pub fn verify_content(data: &[u8], declared: MediaType) -> Result<(), ValidationError> {
    let detected = infer::get(data).map(|kind| kind.mime_type());

    match detected.and_then(MediaType::from_mime) {
        Some(actual) if actual == declared => Ok(()),
        Some(actual) => Err(ValidationError {
            code: "MEDIA_TYPE_MISMATCH",
            message: format!(
                "File declared as {} but content is {}",
                declared.mime(),
                actual.mime()
            ),
        }),
        None => Err(ValidationError {
            code: "INVALID_CONTENT",
            message: format!(
                "File content is not a JPEG or PNG image (detected: {})",
                detected.unwrap_or("unknown")
            ),
        }),
    }
}

/// Full validation pipeline for uploaded images
pub fn validate_upload(
    filename: &str,
    content_type: Option<&str>,
    data: &[u8],
    max_size: usize,
) -> Result<MediaType, ValidationError> {
    let media_type = resolve_media_type(filename, content_type)?;
    validate_file_size(data.len(), max_size)?;
    verify_content(data, media_type)?;
    Ok(media_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];
    const JPEG_HEADER: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46];
    const GIF_HEADER: &[u8] = b"GIF89a\x01\x00\x01\x00";

    #[test]
    fn test_validate_file_size() {
        assert!(validate_file_size(1024, 2048).is_ok());
        assert!(validate_file_size(2048, 2048).is_ok());
        assert!(validate_file_size(2049, 2048).is_err());
        assert_eq!(validate_file_size(0, 2048).unwrap_err().code, "EMPTY_FILE");
    }

    #[test]
    fn test_resolve_media_type() {
        assert_eq!(
            resolve_media_type("photo.png", Some("image/png")).unwrap(),
            MediaType::Png
        );
        assert_eq!(
            resolve_media_type("photo.jpg", Some("application/octet-stream")).unwrap(),
            MediaType::Jpeg
        );
        assert_eq!(resolve_media_type("photo.JPEG", None).unwrap(), MediaType::Jpeg);
        assert!(resolve_media_type("anim.gif", Some("image/gif")).is_err());
        assert!(resolve_media_type("anim.gif", None).is_err());
        assert!(resolve_media_type("noext", None).is_err());
    }

    #[test]
    fn test_verify_content() {
        assert!(verify_content(PNG_HEADER, MediaType::Png).is_ok());
        assert!(verify_content(JPEG_HEADER, MediaType::Jpeg).is_ok());
        assert_eq!(
            verify_content(PNG_HEADER, MediaType::Jpeg).unwrap_err().code,
            "MEDIA_TYPE_MISMATCH"
        );
        assert_eq!(
            verify_content(GIF_HEADER, MediaType::Png).unwrap_err().code,
            "INVALID_CONTENT"
        );
        assert_eq!(
            verify_content(b"Hello World", MediaType::Png).unwrap_err().code,
            "INVALID_CONTENT"
        );
    }

    #[test]
    fn test_gif_disguised_as_png_rejected() {
        let err = validate_upload("fake.png", Some("image/png"), GIF_HEADER, 1024).unwrap_err();
        assert_eq!(err.code, "INVALID_CONTENT");
    }
}
