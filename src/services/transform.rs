use crate::models::{RemoteAssetHandle, TransformParameters};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

/// Characters escaped inside a single path segment
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

pub const UPSCALE_EFFECT: &str = "upscale";

/// `e_upscale:scale_<n>`
pub fn effect_component(params: &TransformParameters) -> String {
    format!("e_{}:scale_{}", UPSCALE_EFFECT, params.scale_factor)
}

/// Builds the delivery URL asking the store to upscale `handle` by the given factor.
///
/// `{delivery_base}/{cloud_name}/image/upload/e_upscale:scale_{n}/{public_id}`
pub fn build_transform_url(
    delivery_base_url: &str,
    cloud_name: &str,
    handle: &RemoteAssetHandle,
    params: &TransformParameters,
) -> String {
    format!(
        "{}/{}/image/upload/{}/{}",
        delivery_base_url.trim_end_matches('/'),
        utf8_percent_encode(cloud_name, PATH_SEGMENT),
        effect_component(params),
        utf8_percent_encode(handle.as_str(), PATH_SEGMENT)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScaleFactor;
    use std::collections::HashSet;

    fn params(n: u8) -> TransformParameters {
        TransformParameters::new(ScaleFactor::new(n).unwrap())
    }

    #[test]
    fn test_url_layout() {
        let handle = RemoteAssetHandle::from_public_id("upscale-image-abc");
        let url = build_transform_url("https://res.cloudinary.com/", "demo", &handle, &params(2));
        assert_eq!(
            url,
            "https://res.cloudinary.com/demo/image/upload/e_upscale:scale_2/upscale-image-abc"
        );
    }

    #[test]
    fn test_each_factor_encodes_only_itself() {
        let handle = RemoteAssetHandle::generate();
        let urls: HashSet<String> = ScaleFactor::all()
            .map(|factor| {
                let url = build_transform_url(
                    "https://res.cloudinary.com",
                    "demo",
                    &handle,
                    &TransformParameters::new(factor),
                );
                for other in ScaleFactor::all() {
                    let marker = format!("scale_{}/", other);
                    assert_eq!(url.contains(&marker), other == factor, "{}", url);
                }
                url
            })
            .collect();
        assert_eq!(urls.len(), 4);
    }

    #[test]
    fn test_url_is_deterministic() {
        let handle = RemoteAssetHandle::from_public_id("same-id");
        let a = build_transform_url("https://res.cloudinary.com", "demo", &handle, &params(3));
        let b = build_transform_url("https://res.cloudinary.com", "demo", &handle, &params(3));
        assert_eq!(a, b);
    }

    #[test]
    fn test_public_id_is_path_encoded() {
        let handle = RemoteAssetHandle::from_public_id("odd id/with?chars");
        let url = build_transform_url("https://res.cloudinary.com", "demo", &handle, &params(1));
        assert!(url.ends_with("/odd%20id%2Fwith%3Fchars"));
    }
}
