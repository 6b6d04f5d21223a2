use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Parameters that are sent with an upload but never signed
const UNSIGNED_PARAMS: &[&str] = &["file", "cloud_name", "resource_type", "api_key", "signature"];

/// Digest used for upload signatures. Cloudinary accounts verify SHA-1 unless
/// they were switched to SHA-256.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

impl FromStr for SignatureAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha1" | "sha-1" => Ok(Self::Sha1),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            other => Err(format!("unsupported signature algorithm '{}'", other)),
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha1 => write!(f, "sha1"),
            Self::Sha256 => write!(f, "sha256"),
        }
    }
}

/// Builds the `k=v&k=v` string that gets signed: non-empty params sorted by key
pub fn string_to_sign(params: &[(&str, String)]) -> String {
    let mut signed: Vec<&(&str, String)> = params
        .iter()
        .filter(|(k, v)| !UNSIGNED_PARAMS.contains(k) && !v.is_empty())
        .collect();
    signed.sort_by(|a, b| a.0.cmp(b.0));

    signed
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

fn hex_digest<D: Digest>(payload: &str, api_secret: &str) -> String {
    let mut hasher = D::new();
    hasher.update(payload.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hex digest of the sorted params followed by the API secret
pub fn sign_params(
    params: &[(&str, String)],
    api_secret: &str,
    algorithm: SignatureAlgorithm,
) -> String {
    let payload = string_to_sign(params);
    match algorithm {
        SignatureAlgorithm::Sha1 => hex_digest::<Sha1>(&payload, api_secret),
        SignatureAlgorithm::Sha256 => hex_digest::<Sha256>(&payload, api_secret),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_params() -> [(&'static str, String); 2] {
        [
            ("public_id", "sample_image".to_string()),
            ("timestamp", "1315060510".to_string()),
        ]
    }

    #[test]
    fn test_params_sorted_and_filtered() {
        let params = [
            ("timestamp", "1315060510".to_string()),
            ("api_key", "1234".to_string()),
            ("public_id", "sample_image".to_string()),
            ("eager", String::new()),
        ];
        assert_eq!(
            string_to_sign(&params),
            "public_id=sample_image&timestamp=1315060510"
        );
    }

    #[test]
    fn test_sha1_known_vectors() {
        // Nothing to sign leaves only the secret: SHA-1("abc") and SHA-1("")
        assert_eq!(
            sign_params(&[], "abc", SignatureAlgorithm::Sha1),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert_eq!(
            sign_params(&[], "", SignatureAlgorithm::Sha1),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
        assert_eq!(
            sign_params(&[], "abc", SignatureAlgorithm::Sha256),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_default_signature_is_sha1_hex() {
        let sig = sign_params(&sample_params(), "abcd", SignatureAlgorithm::default());

        let expected = Sha1::digest(b"public_id=sample_image&timestamp=1315060510abcd");
        assert_eq!(sig, hex::encode(expected));
        assert_eq!(sig.len(), 40);
    }

    #[test]
    fn test_sha256_signature_is_hex() {
        let sig = sign_params(&sample_params(), "abcd", SignatureAlgorithm::Sha256);

        let expected = Sha256::digest(b"public_id=sample_image&timestamp=1315060510abcd");
        assert_eq!(sig, hex::encode(expected));
        assert_eq!(sig.len(), 64);
    }

    #[test]
    fn test_signature_depends_on_secret() {
        let params = [("public_id", "a".to_string()), ("timestamp", "1".to_string())];
        for algorithm in [SignatureAlgorithm::Sha1, SignatureAlgorithm::Sha256] {
            assert_ne!(
                sign_params(&params, "one", algorithm),
                sign_params(&params, "two", algorithm)
            );
        }
    }

    #[test]
    fn test_parse_algorithm() {
        assert_eq!(
            "SHA1".parse::<SignatureAlgorithm>(),
            Ok(SignatureAlgorithm::Sha1)
        );
        assert_eq!(
            "sha-256".parse::<SignatureAlgorithm>(),
            Ok(SignatureAlgorithm::Sha256)
        );
        assert!("md5".parse::<SignatureAlgorithm>().is_err());
    }
}
