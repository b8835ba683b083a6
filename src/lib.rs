//! cipherkit - Symmetric encryption toolkit
//!
//! This library wraps AES-CBC encryption, HMAC keyed hashing and key
//! generation behind a small API. Ciphertexts travel as an envelope holding
//! the IV and the encrypted bytes, serializable to JSON or a single Base64
//! token.

pub mod config;
pub mod crypto;
pub mod error;
pub mod logging;

pub use config::Config;
pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::crypto::{
        AesCipherTool, Cipher, CipherTool, EncryptedData, KeyGenerator, KeyedHasher, SecretKey,
    };
    pub use crate::error::{Error, Result};
}
