//! Cryptography module for cipherkit
//!
//! Provides AES-CBC encryption with PKCS#5 padding, keyed hashing (HMAC)
//! and symmetric key generation. Algorithms are addressed by their provider
//! names (`"AES"`, `"AES/CBC/PKCS5Padding"`, `"HmacSHA256"`, ...) which are
//! resolved once, when a tool is created.

mod cipher;
pub mod constants;
mod envelope;
mod keys;
mod mac;
mod random;
mod transformation;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

pub use cipher::{AesCipherTool, Cipher, CipherTool, CipherToolBuilder};
pub use envelope::EncryptedData;
pub use keys::{
    key_generator, key_generator_with_random, key_generator_with_random_named, KeyAlgorithm,
    KeyGenerator, SecretKey,
};
pub use mac::{compute, md5, sha1, sha256, KeyedHasher, MacAlgorithm};
pub use random::{
    default_random_source, random_bytes, random_source_by_name, OsRandomSource, RandomSource,
    SeededRandom, SystemRandomSource, PRNG_SEEDED,
};
pub use transformation::{BlockMode, CipherAlgorithm, Padding, Transformation};

/// AES block size in bytes
pub const BLOCK_SIZE: usize = 16;

/// Size of the AES-CBC initialization vector in bytes
pub const AES_IV_SIZE: usize = BLOCK_SIZE;

/// Standard-alphabet Base64 decoder that accepts input with or without `=`
/// padding. Encoding always uses the padded `STANDARD` engine.
pub(crate) const BASE64_DECODER: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);
