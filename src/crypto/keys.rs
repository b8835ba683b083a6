//! Key material and key generation
//!
//! A [`SecretKey`] is raw key bytes tagged with the algorithm it is meant
//! for. Keys come from a [`KeyGenerator`] drawing on a [`RandomSource`], or
//! from caller-held bytes. Key bytes are zeroized on drop and never printed.
//!
//! Key strength is bounded by the algorithm (AES accepts 128, 192 and 256
//! bits) and optionally by a policy ceiling. A generator built with
//! `with_max_key_bits(128)` behaves like a restricted provider installation:
//! [`KeyGenerator::aes256_key`] then fails with `InvalidParameters`, which is
//! expected and not a defect.

use crate::crypto::constants::ALGO_AES;
use crate::crypto::mac::MacAlgorithm;
use crate::crypto::random::{default_random_source, random_source_by_name, RandomSource};
use crate::crypto::BASE64_DECODER;
use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error};
use zeroize::Zeroizing;

/// Symmetric key bytes tagged with an algorithm name
#[derive(Clone)]
pub struct SecretKey {
    algorithm: String,
    material: Zeroizing<Vec<u8>>,
}

impl SecretKey {
    /// Wrap existing key bytes. Empty key material is rejected.
    pub fn new(algorithm: impl Into<String>, material: impl Into<Vec<u8>>) -> Result<Self> {
        let material = Zeroizing::new(material.into());
        if material.is_empty() {
            return Err(Error::InvalidParameters("Key material is empty".to_string()));
        }

        Ok(SecretKey {
            algorithm: algorithm.into(),
            material,
        })
    }

    /// Decode standard Base64 key bytes
    pub fn from_base64(algorithm: impl Into<String>, encoded: &str) -> Result<Self> {
        let bytes = Zeroizing::new(BASE64_DECODER.decode(encoded.trim())?);
        Self::new(algorithm, bytes.to_vec())
    }

    /// Encode the key bytes as standard Base64
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.material.as_slice())
    }

    /// Algorithm tag, e.g. `"AES"` or `"HmacSHA256"`
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// Raw key bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.material
    }

    /// Key length in bytes
    pub fn len(&self) -> usize {
        self.material.len()
    }

    /// Always false; empty keys cannot be constructed
    pub fn is_empty(&self) -> bool {
        self.material.is_empty()
    }

    /// Key length in bits
    pub fn bits(&self) -> usize {
        self.material.len() * 8
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("algorithm", &self.algorithm)
            .field("bits", &self.bits())
            .finish_non_exhaustive()
    }
}

/// Algorithms keys can be generated for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgorithm {
    /// AES block cipher keys (128, 192 or 256 bits)
    Aes,
    /// Keyed-hash keys; any positive whole number of bytes
    Hmac(MacAlgorithm),
}

impl KeyAlgorithm {
    /// Resolve a key algorithm by provider name (case-insensitive)
    pub fn from_name(name: &str) -> Result<Self> {
        if name.eq_ignore_ascii_case(ALGO_AES) {
            return Ok(KeyAlgorithm::Aes);
        }

        MacAlgorithm::from_name(name)
            .map(KeyAlgorithm::Hmac)
            .map_err(|_| Error::UnsupportedAlgorithm(format!("Key algorithm not found: {}", name)))
    }

    /// Canonical provider name
    pub fn name(&self) -> &'static str {
        match self {
            KeyAlgorithm::Aes => ALGO_AES,
            KeyAlgorithm::Hmac(mac) => mac.name(),
        }
    }

    /// Check that `bits` is a valid strength for this algorithm
    pub fn check_strength(&self, bits: u32) -> Result<()> {
        let valid = match self {
            KeyAlgorithm::Aes => matches!(bits, 128 | 192 | 256),
            KeyAlgorithm::Hmac(_) => bits > 0 && bits % 8 == 0,
        };

        if valid {
            Ok(())
        } else {
            Err(Error::InvalidParameters(format!(
                "Invalid key strength for {}: {} bits",
                self.name(),
                bits
            )))
        }
    }
}

impl FromStr for KeyAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        KeyAlgorithm::from_name(s)
    }
}

/// Produces fresh symmetric keys from a secure random source
#[derive(Clone)]
pub struct KeyGenerator {
    random: Arc<dyn RandomSource>,
    max_key_bits: Option<u32>,
}

impl KeyGenerator {
    /// Generator backed by the default system random source
    pub fn new() -> Self {
        Self::with_random(default_random_source())
    }

    /// Generator backed by a caller-supplied random source
    pub fn with_random(random: Arc<dyn RandomSource>) -> Self {
        KeyGenerator {
            random,
            max_key_bits: None,
        }
    }

    /// Refuse key strengths above `bits`, like a restricted provider policy
    pub fn with_max_key_bits(mut self, bits: u32) -> Self {
        self.max_key_bits = Some(bits);
        self
    }

    /// The random source keys are drawn from
    pub fn random_source(&self) -> &Arc<dyn RandomSource> {
        &self.random
    }

    /// Generate a 128-bit AES key
    pub fn aes128_key(&self) -> Result<SecretKey> {
        self.generate(ALGO_AES, 128)
    }

    /// Generate a 256-bit AES key.
    ///
    /// Fails when a policy ceiling below 256 bits is in force.
    pub fn aes256_key(&self) -> Result<SecretKey> {
        self.generate(ALGO_AES, 256)
    }

    /// Generate a key for `algorithm` at `bits` strength.
    ///
    /// The key must be retained by the caller; data encrypted under it cannot
    /// be recovered otherwise.
    pub fn generate(&self, algorithm: &str, bits: u32) -> Result<SecretKey> {
        self.try_generate(algorithm, bits).map_err(|e| {
            error!("Could not generate {} key at {} bits: {}", algorithm, bits, e);
            debug!("{:?}", e);
            e
        })
    }

    fn try_generate(&self, algorithm: &str, bits: u32) -> Result<SecretKey> {
        let key_algorithm = KeyAlgorithm::from_name(algorithm)?;
        key_algorithm.check_strength(bits)?;

        if let Some(max) = self.max_key_bits {
            if bits > max {
                return Err(Error::InvalidParameters(format!(
                    "Requested key strength of {} bits exceeds the allowed maximum of {} bits",
                    bits, max
                )));
            }
        }

        let mut material = Zeroizing::new(vec![0u8; (bits / 8) as usize]);
        self.random.fill(&mut material)?;

        debug!(
            "Generated {}-bit {} key using {}",
            bits,
            key_algorithm.name(),
            self.random.name()
        );

        SecretKey::new(key_algorithm.name(), material.to_vec())
    }
}

impl Default for KeyGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for KeyGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyGenerator")
            .field("random", &self.random.name())
            .field("max_key_bits", &self.max_key_bits)
            .finish()
    }
}

/// A generator with a fresh default-quality random source
pub fn key_generator() -> KeyGenerator {
    KeyGenerator::new()
}

/// A generator using the given random source
pub fn key_generator_with_random(random: Arc<dyn RandomSource>) -> KeyGenerator {
    KeyGenerator::with_random(random)
}

/// A generator using the random source registered under `name`
pub fn key_generator_with_random_named(name: &str) -> Result<KeyGenerator> {
    let random = random_source_by_name(name).map_err(|e| {
        error!("Could not get random source {}: {}", name, e);
        e
    })?;
    Ok(KeyGenerator::with_random(random))
}
