//! Cipher transformations
//!
//! A transformation string such as `"AES/CBC/PKCS5Padding"` is parsed once
//! into a [`Transformation`] and held by the tool; later calls dispatch on
//! the parsed value instead of looking names up again.
//!
//! Supported today: AES (128/192/256-bit keys by key length), CBC mode,
//! PKCS#5/PKCS#7 padding or no padding. Other names from the catalog parse
//! as `UnsupportedAlgorithm`.

use crate::crypto::constants::{ALGO_AES, MODE_CBC, PAD_NONE, PAD_PKCS5, PAD_PKCS7};
use crate::crypto::BLOCK_SIZE;
use crate::error::{Error, Result};
use aes::cipher::block_padding::{NoPadding, Pkcs7};
use aes::cipher::{BlockCipher, BlockDecryptMut, BlockEncryptMut, KeyInit, KeyIvInit};
use aes::{Aes128, Aes192, Aes256};
use std::fmt;
use std::str::FromStr;

/// Block cipher algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherAlgorithm {
    Aes,
}

impl CipherAlgorithm {
    pub fn from_name(name: &str) -> Result<Self> {
        if name.eq_ignore_ascii_case(ALGO_AES) {
            Ok(CipherAlgorithm::Aes)
        } else {
            Err(Error::UnsupportedAlgorithm(format!("Cipher algorithm not found: {}", name)))
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CipherAlgorithm::Aes => ALGO_AES,
        }
    }

    /// Valid key lengths in bytes
    pub fn key_lengths(&self) -> &'static [usize] {
        match self {
            CipherAlgorithm::Aes => &[16, 24, 32],
        }
    }
}

/// Block chaining mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockMode {
    Cbc,
}

impl BlockMode {
    pub fn from_name(name: &str) -> Result<Self> {
        if name.eq_ignore_ascii_case(MODE_CBC) {
            Ok(BlockMode::Cbc)
        } else {
            Err(Error::UnsupportedAlgorithm(format!("Cipher mode not found: {}", name)))
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BlockMode::Cbc => MODE_CBC,
        }
    }
}

/// Block padding scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Padding {
    /// PKCS#5 / PKCS#7; handles any plaintext length
    Pkcs5,
    /// Plaintext must already be block-aligned
    None,
}

impl Padding {
    pub fn from_name(name: &str) -> Result<Self> {
        if name.eq_ignore_ascii_case(PAD_PKCS5) || name.eq_ignore_ascii_case(PAD_PKCS7) {
            Ok(Padding::Pkcs5)
        } else if name.eq_ignore_ascii_case(PAD_NONE) {
            Ok(Padding::None)
        } else {
            Err(Error::UnsupportedAlgorithm(format!("Padding type not found: {}", name)))
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Padding::Pkcs5 => PAD_PKCS5,
            Padding::None => PAD_NONE,
        }
    }
}

/// A resolved `algorithm/mode/padding` triple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transformation {
    algorithm: CipherAlgorithm,
    mode: BlockMode,
    padding: Padding,
}

impl Transformation {
    pub fn new(algorithm: CipherAlgorithm, mode: BlockMode, padding: Padding) -> Self {
        Transformation {
            algorithm,
            mode,
            padding,
        }
    }

    /// Parse `"ALGORITHM/MODE/PADDING"` (case-insensitive)
    pub fn parse(transformation: &str) -> Result<Self> {
        let parts: Vec<&str> = transformation.split('/').map(str::trim).collect();
        let [algorithm, mode, padding] = parts.as_slice() else {
            return Err(Error::UnsupportedAlgorithm(format!(
                "Invalid transformation format: {}",
                transformation
            )));
        };

        Ok(Transformation {
            algorithm: CipherAlgorithm::from_name(algorithm)?,
            mode: BlockMode::from_name(mode)?,
            padding: Padding::from_name(padding)?,
        })
    }

    pub fn algorithm(&self) -> CipherAlgorithm {
        self.algorithm
    }

    pub fn mode(&self) -> BlockMode {
        self.mode
    }

    pub fn padding(&self) -> Padding {
        self.padding
    }

    pub fn block_size(&self) -> usize {
        match self.algorithm {
            CipherAlgorithm::Aes => BLOCK_SIZE,
        }
    }

    /// IV length the mode requires
    pub fn iv_len(&self) -> usize {
        match self.mode {
            BlockMode::Cbc => self.block_size(),
        }
    }

    /// Check a key is usable with this transformation
    pub fn check_key(&self, key: &[u8]) -> Result<()> {
        let lengths = self.algorithm.key_lengths();
        if lengths.contains(&key.len()) {
            return Ok(());
        }

        let expected = lengths
            .iter()
            .map(|l| l.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Err(Error::InvalidKeyLength {
            expected,
            got: key.len(),
        })
    }

    /// Check an IV is usable with this transformation
    pub fn check_iv(&self, iv: &[u8]) -> Result<()> {
        if iv.len() != self.iv_len() {
            return Err(Error::InvalidParameters(format!(
                "Wrong IV length: must be {} bytes long, got {}",
                self.iv_len(),
                iv.len()
            )));
        }
        Ok(())
    }

    /// Encrypt `plaintext` under (`key`, `iv`)
    pub fn encrypt(&self, key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        self.check_key(key)?;
        self.check_iv(iv)?;

        if self.padding == Padding::None && plaintext.len() % self.block_size() != 0 {
            return Err(Error::Cryptographic(format!(
                "Bad encryption block size: input length {} is not a multiple of {}",
                plaintext.len(),
                self.block_size()
            )));
        }

        match (self.algorithm, self.mode, key.len()) {
            (CipherAlgorithm::Aes, BlockMode::Cbc, 16) => {
                cbc_encrypt::<Aes128>(key, iv, plaintext, self.padding)
            }
            (CipherAlgorithm::Aes, BlockMode::Cbc, 24) => {
                cbc_encrypt::<Aes192>(key, iv, plaintext, self.padding)
            }
            (CipherAlgorithm::Aes, BlockMode::Cbc, _) => {
                cbc_encrypt::<Aes256>(key, iv, plaintext, self.padding)
            }
        }
    }

    /// Decrypt `ciphertext` under (`key`, `iv`) and strip padding
    pub fn decrypt(&self, key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        self.check_key(key)?;
        self.check_iv(iv)?;

        if ciphertext.len() % self.block_size() != 0 {
            return Err(Error::Cryptographic(format!(
                "Bad encryption block size: input length {} is not a multiple of {}",
                ciphertext.len(),
                self.block_size()
            )));
        }

        match (self.algorithm, self.mode, key.len()) {
            (CipherAlgorithm::Aes, BlockMode::Cbc, 16) => {
                cbc_decrypt::<Aes128>(key, iv, ciphertext, self.padding)
            }
            (CipherAlgorithm::Aes, BlockMode::Cbc, 24) => {
                cbc_decrypt::<Aes192>(key, iv, ciphertext, self.padding)
            }
            (CipherAlgorithm::Aes, BlockMode::Cbc, _) => {
                cbc_decrypt::<Aes256>(key, iv, ciphertext, self.padding)
            }
        }
    }
}

impl FromStr for Transformation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Transformation::parse(s)
    }
}

impl fmt::Display for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.algorithm.name(),
            self.mode.name(),
            self.padding.name()
        )
    }
}

fn cbc_encrypt<C>(key: &[u8], iv: &[u8], plaintext: &[u8], padding: Padding) -> Result<Vec<u8>>
where
    C: BlockEncryptMut + BlockCipher + KeyInit,
{
    let encryptor = cbc::Encryptor::<C>::new_from_slices(key, iv)
        .map_err(|e| Error::InvalidParameters(format!("Encryption key or IV is invalid: {}", e)))?;

    Ok(match padding {
        Padding::Pkcs5 => encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        Padding::None => encryptor.encrypt_padded_vec_mut::<NoPadding>(plaintext),
    })
}

fn cbc_decrypt<C>(key: &[u8], iv: &[u8], ciphertext: &[u8], padding: Padding) -> Result<Vec<u8>>
where
    C: BlockDecryptMut + BlockCipher + KeyInit,
{
    let decryptor = cbc::Decryptor::<C>::new_from_slices(key, iv)
        .map_err(|e| Error::InvalidParameters(format!("Decryption key or IV is invalid: {}", e)))?;

    let result = match padding {
        Padding::Pkcs5 => decryptor.decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        Padding::None => decryptor.decrypt_padded_vec_mut::<NoPadding>(ciphertext),
    };

    result.map_err(|_| Error::Cryptographic("Bad padding: wrong key or corrupted data".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::constants::{aes_cbc_pkcs5, transformation, ALGO_DES, MODE_ECB, MODE_GCM};

    #[test]
    fn test_parse_default() {
        let t = Transformation::parse(&aes_cbc_pkcs5()).unwrap();
        assert_eq!(t.algorithm(), CipherAlgorithm::Aes);
        assert_eq!(t.mode(), BlockMode::Cbc);
        assert_eq!(t.padding(), Padding::Pkcs5);
        assert_eq!(t.iv_len(), 16);
        assert_eq!(t.to_string(), "AES/CBC/PKCS5Padding");
    }

    #[test]
    fn test_parse_aliases_and_case() {
        let t: Transformation = "aes/cbc/pkcs7padding".parse().unwrap();
        assert_eq!(t.padding(), Padding::Pkcs5);

        let t: Transformation = "AES/CBC/NoPadding".parse().unwrap();
        assert_eq!(t.padding(), Padding::None);
    }

    #[test]
    fn test_parse_unsupported() {
        for name in [
            transformation(ALGO_DES, MODE_CBC, PAD_PKCS5),
            transformation(ALGO_AES, MODE_GCM, PAD_NONE),
            transformation(ALGO_AES, MODE_ECB, PAD_PKCS5),
            "AES/CBC/ISO10126Padding".to_string(),
            "AES/CBC".to_string(),
            "AES".to_string(),
        ] {
            assert!(
                matches!(Transformation::parse(&name), Err(Error::UnsupportedAlgorithm(_))),
                "{}",
                name
            );
        }
    }

    #[test]
    fn test_key_lengths() {
        let t = Transformation::parse("AES/CBC/PKCS5Padding").unwrap();
        let iv = [0u8; 16];
        for len in [16, 24, 32] {
            let key = vec![7u8; len];
            let ct = t.encrypt(&key, &iv, b"payload").unwrap();
            assert_eq!(t.decrypt(&key, &iv, &ct).unwrap(), b"payload");
        }

        let err = t.encrypt(&[0u8; 15], &iv, b"payload").unwrap_err();
        assert!(matches!(err, Error::InvalidKeyLength { got: 15, .. }));
    }

    #[test]
    fn test_wrong_iv_length() {
        let t = Transformation::parse("AES/CBC/PKCS5Padding").unwrap();
        let result = t.encrypt(&[0u8; 16], &[0u8; 8], b"payload");
        assert!(matches!(result, Err(Error::InvalidParameters(_))));
    }

    #[test]
    fn test_no_padding_requires_alignment() {
        let t = Transformation::parse("AES/CBC/NoPadding").unwrap();
        let key = [1u8; 16];
        let iv = [2u8; 16];

        assert!(matches!(t.encrypt(&key, &iv, b"foobar"), Err(Error::Cryptographic(_))));

        let block = [9u8; 32];
        let ct = t.encrypt(&key, &iv, &block).unwrap();
        assert_eq!(ct.len(), 32);
        assert_eq!(t.decrypt(&key, &iv, &ct).unwrap(), block);
    }

    #[test]
    fn test_pkcs5_pads_to_block() {
        let t = Transformation::parse("AES/CBC/PKCS5Padding").unwrap();
        let ct = t.encrypt(&[1u8; 16], &[2u8; 16], &[0u8; 16]).unwrap();
        assert_eq!(ct.len(), 32);

        let ct = t.encrypt(&[1u8; 16], &[2u8; 16], b"").unwrap();
        assert_eq!(ct.len(), 16);
    }

    #[test]
    fn test_decrypt_misaligned_ciphertext() {
        let t = Transformation::parse("AES/CBC/PKCS5Padding").unwrap();
        let result = t.decrypt(&[1u8; 16], &[2u8; 16], &[0u8; 17]);
        assert!(matches!(result, Err(Error::Cryptographic(_))));
    }
}
