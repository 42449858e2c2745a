//! # Hex Encoding Helpers
//!
//! Byte strings cross every serialization boundary as lowercase hex. Decoding
//! is strict: uppercase or odd-length input is rejected, so each byte string
//! has exactly one textual form. A proof bundle whose stored bytes differ from
//! their canonical re-encoding is therefore always detected.

/// Error from strict hex decoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HexError {
    /// Not valid hex at all.
    #[error("invalid hex: {0}")]
    Invalid(String),
    /// Valid hex, but not in lowercase canonical form.
    #[error("hex must be lowercase")]
    NotCanonical,
}

/// Decode hex, rejecting any non-canonical (uppercase) spelling.
pub fn decode_canonical_hex(s: &str) -> Result<Vec<u8>, HexError> {
    let bytes = hex::decode(s).map_err(|e| HexError::Invalid(e.to_string()))?;
    if hex::encode(&bytes) != s {
        return Err(HexError::NotCanonical);
    }
    Ok(bytes)
}

/// Serde adapter for `Vec<u8>` fields carried as lowercase hex.
pub mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::decode_canonical_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for `Option<Vec<u8>>` fields carried as lowercase hex.
pub mod hex_bytes_opt {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        bytes: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(b) => serializer.serialize_some(&hex::encode(b)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        let s: Option<String> = Option::deserialize(deserializer)?;
        s.map(|s| super::decode_canonical_hex(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
