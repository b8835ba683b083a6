//! Encrypted envelope
//!
//! An [`EncryptedData`] pairs a ciphertext with the IV it was produced
//! under. It has three portable forms:
//!
//! - canonical JSON: `{"iv":"<base64>","data":"<base64>"}`
//! - doubly encoded: Base64 of the canonical JSON, a single opaque token
//!   suitable for cookies or headers
//! - raw bytes: `iv || ciphertext`, decodable when the IV length is known
//!
//! Decoding any form with missing or malformed fields fails with
//! `Error::Decode`. Base64 is written padded and read with or without
//! trailing `=`.

use crate::crypto::BASE64_DECODER;
use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error};

/// IV and ciphertext produced by one encryption
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncryptedData {
    /// Initialization vector used for encryption
    #[serde(with = "base64_bytes")]
    iv: Vec<u8>,
    /// Ciphertext, padding included
    #[serde(with = "base64_bytes")]
    data: Vec<u8>,
}

impl EncryptedData {
    pub fn new(iv: Vec<u8>, data: Vec<u8>) -> Self {
        EncryptedData { iv, data }
    }

    /// Initialization vector
    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    /// Ciphertext bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Split into `(iv, data)`
    pub fn into_parts(self) -> (Vec<u8>, Vec<u8>) {
        (self.iv, self.data)
    }

    /// Get the total size of encrypted data
    pub fn size(&self) -> usize {
        self.iv.len() + self.data.len()
    }

    /// Serialize to the canonical JSON form, `iv` first
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| {
            error!("Could not generate JSON string: `{}`", e);
            Error::Encode(format!("Could not serialize envelope: {}", e))
        })
    }

    /// Parse the canonical JSON form. Field order does not matter.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            error!("Could not map JSON to envelope: `{}`", e);
            debug!("{:?}", e);
            Error::Decode(format!("Invalid envelope JSON: {}", e))
        })
    }

    /// Base64 of the canonical JSON, for embedding as a single token
    pub fn to_base64(&self) -> Result<String> {
        Ok(BASE64.encode(self.to_json()?))
    }

    /// Reverse [`EncryptedData::to_base64`]: strip the outer Base64 layer,
    /// then parse the inner JSON
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let json = BASE64_DECODER
            .decode(encoded.trim())
            .map_err(|e| {
                error!("Input Base64 string is not valid: `{}`", e);
                Error::from(e)
            })
            .and_then(|bytes| {
                String::from_utf8(bytes)
                    .map_err(|e| Error::Decode(format!("Envelope token is not UTF-8: {}", e)))
            })?;

        Self::from_json(&json)
    }

    /// Serialize to bytes for storage
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.size());
        bytes.extend_from_slice(&self.iv);
        bytes.extend_from_slice(&self.data);
        bytes
    }

    /// Deserialize from bytes, the first `iv_len` of which are the IV
    pub fn from_bytes(bytes: &[u8], iv_len: usize) -> Result<Self> {
        if bytes.len() < iv_len {
            return Err(Error::Decode(format!(
                "Data too short: {} bytes, IV alone needs {}",
                bytes.len(),
                iv_len
            )));
        }

        Ok(EncryptedData {
            iv: bytes[..iv_len].to_vec(),
            data: bytes[iv_len..].to_vec(),
        })
    }
}

impl fmt::Display for EncryptedData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// Base64 text serialization for byte fields
mod base64_bytes {
    use crate::crypto::BASE64_DECODER;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        BASE64_DECODER
            .decode(s.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IV: &str = "VSadcPgqXYoegXchXrej2Q==";
    const DATA: &str = "66qbexIcG0VlGHw5E2JHcA==";

    fn sample() -> EncryptedData {
        EncryptedData::new(BASE64.decode(IV).unwrap(), BASE64.decode(DATA).unwrap())
    }

    #[test]
    fn test_from_json() {
        let encrypted = EncryptedData::from_json(&format!(
            "{{\"iv\": \"{}\",\"data\": \"{}\"}}",
            IV, DATA
        ))
        .unwrap();

        assert_eq!(BASE64.encode(encrypted.iv()), IV);
        assert_eq!(BASE64.encode(encrypted.data()), DATA);
    }

    #[test]
    fn test_to_json_is_canonical() {
        let source = format!("{{\"iv\":\"{}\",\"data\":\"{}\"}}", IV, DATA);
        let encrypted = EncryptedData::from_json(&source).unwrap();

        assert_eq!(encrypted.to_json().unwrap(), source);
        assert_eq!(encrypted.to_string(), source);
    }

    #[test]
    fn test_field_order_independent() {
        let reversed = format!("{{\"data\":\"{}\",\"iv\":\"{}\"}}", DATA, IV);
        assert_eq!(EncryptedData::from_json(&reversed).unwrap(), sample());
    }

    #[test]
    fn test_missing_fields_rejected() {
        let no_data = format!("{{\"iv\":\"{}\"}}", IV);
        let no_iv = format!("{{\"data\":\"{}\"}}", DATA);

        assert!(matches!(EncryptedData::from_json(&no_data), Err(Error::Decode(_))));
        assert!(matches!(EncryptedData::from_json(&no_iv), Err(Error::Decode(_))));
        assert!(matches!(EncryptedData::from_json("{"), Err(Error::Decode(_))));
        assert!(matches!(EncryptedData::from_json("[]"), Err(Error::Decode(_))));
    }

    #[test]
    fn test_bad_base64_field_rejected() {
        let json = format!("{{\"iv\":\"%%%\",\"data\":\"{}\"}}", DATA);
        assert!(matches!(EncryptedData::from_json(&json), Err(Error::Decode(_))));
    }

    #[test]
    fn test_json_round_trip() {
        let original = EncryptedData::new(vec![1, 2, 3, 4], (0u8..=255).collect());
        let restored = EncryptedData::from_json(&original.to_json().unwrap()).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_doubly_encoded_round_trip() {
        let original = sample();
        let token = original.to_base64().unwrap();

        assert_eq!(BASE64.decode(&token).unwrap(), original.to_json().unwrap().as_bytes());
        assert_eq!(EncryptedData::from_base64(&token).unwrap(), original);
    }

    #[test]
    fn test_unpadded_fields_accepted() {
        let json = format!(
            "{{\"iv\":\"{}\",\"data\":\"{}\"}}",
            IV.trim_end_matches('='),
            DATA.trim_end_matches('=')
        );
        let encrypted = EncryptedData::from_json(&json).unwrap();

        assert_eq!(encrypted, sample());
        assert_eq!(
            encrypted.to_json().unwrap(),
            format!("{{\"iv\":\"{}\",\"data\":\"{}\"}}", IV, DATA)
        );
    }

    #[test]
    fn test_unpadded_token_accepted() {
        let original = sample();
        let token = original.to_base64().unwrap();
        let stripped = token.trim_end_matches('=');
        assert_ne!(stripped.len(), token.len());

        assert_eq!(EncryptedData::from_base64(stripped).unwrap(), original);
    }

    #[test]
    fn test_from_base64_rejects_garbage() {
        assert!(matches!(EncryptedData::from_base64("not a token"), Err(Error::Decode(_))));

        let not_json = BASE64.encode("hello");
        assert!(matches!(EncryptedData::from_base64(&not_json), Err(Error::Decode(_))));
    }

    #[test]
    fn test_bytes_round_trip() {
        let original = sample();
        let bytes = original.to_bytes();
        assert_eq!(bytes.len(), original.size());

        let restored = EncryptedData::from_bytes(&bytes, 16).unwrap();
        assert_eq!(restored, original);
        assert!(EncryptedData::from_bytes(&bytes[..10], 16).is_err());
    }
}
