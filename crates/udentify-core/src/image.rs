//! Base64 image data crossing the bridge (selfies, document photos, chip
//! face images).
//!
//! Images are biometric material: the encoded text is zeroized on drop and
//! never printed. Logs use [`ImageData::fingerprint`] instead.

use std::fmt;

use data_encoding::BASE64;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::BridgeError;

/// Validated base64 image payload. Zeroized on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ImageData {
    encoded: String,
}

impl ImageData {
    /// Validate and wrap a base64 string.
    ///
    /// Accepts a `data:image/...;base64,` prefix and surrounding
    /// whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidConfig`] if the input is empty or is
    /// not valid padded base64.
    pub fn from_base64(input: &str) -> Result<Self, BridgeError> {
        let trimmed = input.trim();
        let body = trimmed
            .split_once(";base64,")
            .filter(|(prefix, _)| prefix.starts_with("data:"))
            .map_or(trimmed, |(_, body)| body);

        if body.is_empty() {
            return Err(BridgeError::InvalidConfig("image data is empty".into()));
        }
        let decoded_len = BASE64
            .decode_len(body.len())
            .map_err(|e| BridgeError::InvalidConfig(format!("image is not valid base64: {e}")))?;
        let mut scratch = Zeroizing::new(vec![0u8; decoded_len]);
        BASE64
            .decode_mut(body.as_bytes(), &mut scratch)
            .map_err(|e| {
                BridgeError::InvalidConfig(format!("image is not valid base64: {}", e.error))
            })?;

        Ok(Self {
            encoded: body.to_owned(),
        })
    }

    /// Wrap raw bytes (vendor output) as base64.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            encoded: BASE64.encode(bytes),
        }
    }

    /// Decode to raw bytes. The buffer is zeroized when dropped.
    ///
    /// # Errors
    ///
    /// Only fails if the stored text was corrupted after validation.
    pub fn decode(&self) -> Result<Zeroizing<Vec<u8>>, BridgeError> {
        BASE64
            .decode(self.encoded.as_bytes())
            .map(Zeroizing::new)
            .map_err(|e| BridgeError::InvalidConfig(format!("image is not valid base64: {e}")))
    }

    /// The base64 text, for handing to a vendor SDK.
    #[must_use]
    pub fn expose_base64(&self) -> &str {
        &self.encoded
    }

    /// Length of the base64 text.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        self.encoded.len()
    }

    /// Short BLAKE3 fingerprint, safe to log.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let hash = blake3::hash(self.encoded.as_bytes());
        hash.to_hex().as_str().chars().take(12).collect()
    }
}

impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageData(***, {} chars)", self.encoded.len())
    }
}

impl Serialize for ImageData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encoded)
    }
}

impl<'de> Deserialize<'de> for ImageData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Zeroizing::new(String::deserialize(deserializer)?);
        Self::from_base64(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_and_data_uri() {
        let plain = ImageData::from_base64("aGVsbG8=").unwrap();
        let uri = ImageData::from_base64("data:image/jpeg;base64,aGVsbG8=").unwrap();
        assert_eq!(plain, uri);
        assert_eq!(&*plain.decode().unwrap(), b"hello");
    }

    #[test]
    fn rejects_empty_and_garbage() {
        assert!(matches!(
            ImageData::from_base64("   "),
            Err(BridgeError::InvalidConfig(_))
        ));
        assert!(matches!(
            ImageData::from_base64("not base64!"),
            Err(BridgeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn debug_is_masked() {
        let image = ImageData::from_bytes(b"face");
        let debug = format!("{image:?}");
        assert!(!debug.contains(image.expose_base64()));
        assert!(debug.starts_with("ImageData(***"));
    }

    #[test]
    fn fingerprint_is_stable_and_short() {
        let a = ImageData::from_bytes(b"face");
        let b = ImageData::from_bytes(b"face");
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 12);
        assert_ne!(a.fingerprint(), ImageData::from_bytes(b"other").fingerprint());
    }

    #[test]
    fn serde_validates() {
        let ok: ImageData = serde_json::from_str("\"aGVsbG8=\"").unwrap();
        assert_eq!(ok.expose_base64(), "aGVsbG8=");
        assert!(serde_json::from_str::<ImageData>("\"@@@\"").is_err());
    }
}
