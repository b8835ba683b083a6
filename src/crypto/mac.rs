//! Keyed hashes (HMAC)
//!
//! Digests are returned Base64-encoded and carry no algorithm tag; callers
//! must remember which algorithm produced them. HMAC is independent of the
//! cipher tools: combining the two (encrypt-then-MAC) is up to the caller.
//!
//! SHA-1, SHA-256, SHA-384 and SHA-512 run on `ring`. `ring` has no MD5 or
//! SHA-224 HMAC, so those two use the RustCrypto `hmac` crate; `sign` and
//! `verify` dispatch between the two backends per algorithm.

use crate::crypto::constants::{
    HMAC_MD5, HMAC_SHA1, HMAC_SHA224, HMAC_SHA256, HMAC_SHA384, HMAC_SHA512,
};
use crate::crypto::keys::SecretKey;
use crate::crypto::BASE64_DECODER;
use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use md5::Md5;
use ring::hmac as ring_hmac;
use sha2::Sha224;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, error, trace};

/// Supported keyed-hash algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacAlgorithm {
    HmacMd5,
    HmacSha1,
    HmacSha224,
    HmacSha256,
    HmacSha384,
    HmacSha512,
}

impl MacAlgorithm {
    const ALL: [MacAlgorithm; 6] = [
        MacAlgorithm::HmacMd5,
        MacAlgorithm::HmacSha1,
        MacAlgorithm::HmacSha224,
        MacAlgorithm::HmacSha256,
        MacAlgorithm::HmacSha384,
        MacAlgorithm::HmacSha512,
    ];

    /// Resolve by provider name, e.g. `"HmacSHA256"` (case-insensitive)
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|alg| alg.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                Error::UnsupportedAlgorithm(format!("MAC algorithm not found: {}", name))
            })
    }

    /// Canonical provider name
    pub fn name(&self) -> &'static str {
        match self {
            MacAlgorithm::HmacMd5 => HMAC_MD5,
            MacAlgorithm::HmacSha1 => HMAC_SHA1,
            MacAlgorithm::HmacSha224 => HMAC_SHA224,
            MacAlgorithm::HmacSha256 => HMAC_SHA256,
            MacAlgorithm::HmacSha384 => HMAC_SHA384,
            MacAlgorithm::HmacSha512 => HMAC_SHA512,
        }
    }

    /// Digest length in bytes
    pub fn digest_len(&self) -> usize {
        match self {
            MacAlgorithm::HmacMd5 => 16,
            MacAlgorithm::HmacSha1 => 20,
            MacAlgorithm::HmacSha224 => 28,
            MacAlgorithm::HmacSha256 => 32,
            MacAlgorithm::HmacSha384 => 48,
            MacAlgorithm::HmacSha512 => 64,
        }
    }

    fn sign(&self, key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        match self {
            MacAlgorithm::HmacMd5 => rust_crypto_sign::<Hmac<Md5>>(key, data),
            MacAlgorithm::HmacSha224 => rust_crypto_sign::<Hmac<Sha224>>(key, data),
            MacAlgorithm::HmacSha1 => Ok(ring_sign(
                ring_hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY,
                key,
                data,
            )),
            MacAlgorithm::HmacSha256 => Ok(ring_sign(ring_hmac::HMAC_SHA256, key, data)),
            MacAlgorithm::HmacSha384 => Ok(ring_sign(ring_hmac::HMAC_SHA384, key, data)),
            MacAlgorithm::HmacSha512 => Ok(ring_sign(ring_hmac::HMAC_SHA512, key, data)),
        }
    }

    /// Constant-time comparison against an expected tag
    fn verify(&self, key: &[u8], data: &[u8], tag: &[u8]) -> Result<bool> {
        match self {
            MacAlgorithm::HmacMd5 => rust_crypto_verify::<Hmac<Md5>>(key, data, tag),
            MacAlgorithm::HmacSha224 => rust_crypto_verify::<Hmac<Sha224>>(key, data, tag),
            MacAlgorithm::HmacSha1 => Ok(ring_verify(
                ring_hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY,
                key,
                data,
                tag,
            )),
            MacAlgorithm::HmacSha256 => Ok(ring_verify(ring_hmac::HMAC_SHA256, key, data, tag)),
            MacAlgorithm::HmacSha384 => Ok(ring_verify(ring_hmac::HMAC_SHA384, key, data, tag)),
            MacAlgorithm::HmacSha512 => Ok(ring_verify(ring_hmac::HMAC_SHA512, key, data, tag)),
        }
    }
}

impl FromStr for MacAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        MacAlgorithm::from_name(s)
    }
}

impl fmt::Display for MacAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn ring_sign(algorithm: ring_hmac::Algorithm, key: &[u8], data: &[u8]) -> Vec<u8> {
    let key = ring_hmac::Key::new(algorithm, key);
    ring_hmac::sign(&key, data).as_ref().to_vec()
}

fn ring_verify(algorithm: ring_hmac::Algorithm, key: &[u8], data: &[u8], tag: &[u8]) -> bool {
    let key = ring_hmac::Key::new(algorithm, key);
    ring_hmac::verify(&key, data, tag).is_ok()
}

fn rust_crypto_mac<M: Mac + KeyInit>(key: &[u8], data: &[u8]) -> Result<M> {
    let mut mac = <M as Mac>::new_from_slice(key)
        .map_err(|e| Error::InvalidParameters(format!("Invalid MAC key: {}", e)))?;
    mac.update(data);
    Ok(mac)
}

fn rust_crypto_sign<M: Mac + KeyInit>(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    Ok(rust_crypto_mac::<M>(key, data)?.finalize().into_bytes().to_vec())
}

fn rust_crypto_verify<M: Mac + KeyInit>(key: &[u8], data: &[u8], tag: &[u8]) -> Result<bool> {
    Ok(rust_crypto_mac::<M>(key, data)?.verify_slice(tag).is_ok())
}

/// Computes keyed hashes under one resolved algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyedHasher {
    algorithm: MacAlgorithm,
}

impl KeyedHasher {
    pub fn new(algorithm: MacAlgorithm) -> Self {
        KeyedHasher { algorithm }
    }

    /// Resolve the algorithm by name once, up front
    pub fn for_name(name: &str) -> Result<Self> {
        MacAlgorithm::from_name(name).map(KeyedHasher::new).map_err(|e| {
            error!("Could not find MAC algorithm: `{}`", name);
            e
        })
    }

    pub fn algorithm(&self) -> MacAlgorithm {
        self.algorithm
    }

    /// Raw digest bytes of `data` under `key`
    pub fn digest_bytes(&self, data: &[u8], key: &SecretKey) -> Result<Vec<u8>> {
        let result = check_key(key).and_then(|_| self.algorithm.sign(key.as_bytes(), data));
        match result {
            Ok(tag) => {
                trace!("Computed {} over {} bytes", self.algorithm, data.len());
                Ok(tag)
            }
            Err(e) => {
                error!("Could not compute {}: `{}`", self.algorithm, e);
                debug!("{:?}", e);
                Err(e)
            }
        }
    }

    /// Base64-encoded digest of `data` under `key`
    pub fn digest(&self, data: &[u8], key: &SecretKey) -> Result<String> {
        self.digest_bytes(data, key).map(|tag| BASE64.encode(tag))
    }

    /// Check a Base64 digest produced by [`KeyedHasher::digest`].
    ///
    /// Returns `Error::Cryptographic` on mismatch and `Error::Decode` when
    /// `expected` is not valid Base64.
    pub fn verify(&self, data: &[u8], key: &SecretKey, expected: &str) -> Result<()> {
        let tag = BASE64_DECODER.decode(expected.trim())?;
        check_key(key)?;

        if self.algorithm.verify(key.as_bytes(), data, &tag)? {
            Ok(())
        } else {
            debug!("{} verification failed over {} bytes", self.algorithm, data.len());
            Err(Error::Cryptographic(format!("{} mismatch", self.algorithm)))
        }
    }
}

fn check_key(key: &SecretKey) -> Result<()> {
    if key.is_empty() {
        return Err(Error::InvalidParameters("MAC key is empty".to_string()));
    }
    Ok(())
}

/// HMAC-MD5 of `data`, Base64-encoded
pub fn md5(data: &[u8], key: &SecretKey) -> Result<String> {
    KeyedHasher::new(MacAlgorithm::HmacMd5).digest(data, key)
}

/// HMAC-SHA1 of `data`, Base64-encoded
pub fn sha1(data: &[u8], key: &SecretKey) -> Result<String> {
    KeyedHasher::new(MacAlgorithm::HmacSha1).digest(data, key)
}

/// HMAC-SHA256 of `data`, Base64-encoded
pub fn sha256(data: &[u8], key: &SecretKey) -> Result<String> {
    KeyedHasher::new(MacAlgorithm::HmacSha256).digest(data, key)
}

/// Keyed hash of `data` under the algorithm named `algorithm`, Base64-encoded
pub fn compute(data: &[u8], key: &SecretKey, algorithm: &str) -> Result<String> {
    KeyedHasher::for_name(algorithm)?.digest(data, key)
}
