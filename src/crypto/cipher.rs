//! Cipher tools
//!
//! A [`CipherTool`] binds a resolved transformation, a fixed IV length and a
//! key, and turns plaintext into [`EncryptedData`] and back. Tools are
//! obtained through [`CipherToolBuilder`], so a tool without a key cannot
//! exist: asking the builder for one fails with `Error::Configuration`.
//!
//! `encrypt` draws a fresh IV for every call. `encrypt_with_iv` takes the IV
//! from the caller and is deterministic: the same key, IV and plaintext give
//! the same ciphertext. Reusing an IV under one key leaks whether two
//! plaintexts share a prefix; only do it when that is acceptable (tests,
//! interoperability with an existing ciphertext).
//!
//! Encryption here is not authenticated. Pair it with a
//! [`KeyedHasher`](super::KeyedHasher) over the ciphertext when tampering
//! must be detected.

use crate::crypto::constants::{aes_cbc_pkcs5, ALGO_AES};
use crate::crypto::envelope::EncryptedData;
use crate::crypto::keys::SecretKey;
use crate::crypto::random::{default_random_source, random_bytes, RandomSource};
use crate::crypto::transformation::{CipherAlgorithm, Transformation};
use crate::crypto::AES_IV_SIZE;
use crate::error::{Error, Result};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, trace};

/// Encryption and decryption under one configured algorithm
pub trait Cipher {
    /// Encrypt `plaintext` under a freshly generated IV
    fn encrypt(&self, plaintext: &[u8]) -> Result<EncryptedData>;

    /// Encrypt `plaintext` under a caller-supplied IV.
    ///
    /// The IV must have the tool's configured length. The caller owns the
    /// consequences of reusing it.
    fn encrypt_with_iv(&self, plaintext: &[u8], iv: &[u8]) -> Result<EncryptedData>;

    /// Recover the plaintext from an envelope
    fn decrypt(&self, encrypted: &EncryptedData) -> Result<Vec<u8>>;
}

/// Collects cipher settings and the key before a [`CipherTool`] exists
pub struct CipherToolBuilder {
    algorithm: String,
    transformation: String,
    iv_size: usize,
    key: Option<SecretKey>,
    random: Option<Arc<dyn RandomSource>>,
}

impl CipherToolBuilder {
    pub fn new(
        algorithm: impl Into<String>,
        transformation: impl Into<String>,
        iv_size: usize,
    ) -> Self {
        CipherToolBuilder {
            algorithm: algorithm.into(),
            transformation: transformation.into(),
            iv_size,
            key: None,
            random: None,
        }
    }

    /// Key used for every operation of the built tool
    pub fn key(mut self, key: SecretKey) -> Self {
        self.key = Some(key);
        self
    }

    /// Source for generated IVs; the system source when not set
    pub fn random_source(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = Some(random);
        self
    }

    /// Resolve names and validate the key.
    ///
    /// A missing key is `Error::Configuration`, the only fatal error in the
    /// crate. Unknown names give `UnsupportedAlgorithm`; an IV size or key
    /// that does not fit the transformation gives `InvalidParameters` or
    /// `InvalidKeyLength`.
    pub fn build(self) -> Result<CipherTool> {
        let Some(key) = self.key else {
            error!("Key is empty. Must set a key prior to performing operations");
            return Err(Error::Configuration(
                "Key is empty. Must set a key prior to performing operations".to_string(),
            ));
        };

        let result = resolve(&self.algorithm, &self.transformation, self.iv_size).and_then(
            |(algorithm, transformation)| {
                check_key(&transformation, &key)?;
                Ok(CipherTool {
                    algorithm,
                    transformation,
                    iv_size: self.iv_size,
                    key,
                    random: self.random.unwrap_or_else(default_random_source),
                })
            },
        );

        match result {
            Ok(tool) => {
                debug!("Created cipher tool for {}", tool.transformation);
                Ok(tool)
            }
            Err(e) => {
                error!("Could not get cipher instance: `{}`", e);
                debug!("{:?}", e);
                Err(e)
            }
        }
    }
}

/// Resolve the algorithm and transformation names and check the IV size
fn resolve(
    algorithm: &str,
    transformation: &str,
    iv_size: usize,
) -> Result<(CipherAlgorithm, Transformation)> {
    let algorithm = CipherAlgorithm::from_name(algorithm)?;
    let transformation = Transformation::parse(transformation)?;

    if transformation.algorithm() != algorithm {
        return Err(Error::InvalidParameters(format!(
            "Transformation {} does not use algorithm {}",
            transformation,
            algorithm.name()
        )));
    }

    if transformation.iv_len() != iv_size {
        return Err(Error::InvalidParameters(format!(
            "IV size {} does not match {} (needs {})",
            iv_size,
            transformation,
            transformation.iv_len()
        )));
    }

    Ok((algorithm, transformation))
}

fn check_key(transformation: &Transformation, key: &SecretKey) -> Result<()> {
    let algorithm = transformation.algorithm().name();
    if !key.algorithm().eq_ignore_ascii_case(algorithm) {
        return Err(Error::InvalidParameters(format!(
            "Wrong key algorithm: {} required, got {}",
            algorithm,
            key.algorithm()
        )));
    }
    transformation.check_key(key.as_bytes())
}

/// A configured, keyed symmetric cipher
///
/// Operations take `&self` and may run concurrently; changing the key or
/// the transformation takes `&mut self`.
pub struct CipherTool {
    algorithm: CipherAlgorithm,
    transformation: Transformation,
    iv_size: usize,
    key: SecretKey,
    random: Arc<dyn RandomSource>,
}

impl CipherTool {
    /// Start configuring a tool
    pub fn builder(
        algorithm: impl Into<String>,
        transformation: impl Into<String>,
        iv_size: usize,
    ) -> CipherToolBuilder {
        CipherToolBuilder::new(algorithm, transformation, iv_size)
    }

    /// Shorthand for `builder(..).key(key).build()`
    pub fn new(
        algorithm: impl Into<String>,
        transformation: impl Into<String>,
        iv_size: usize,
        key: SecretKey,
    ) -> Result<Self> {
        Self::builder(algorithm, transformation, iv_size).key(key).build()
    }

    /// Algorithm name, e.g. `"AES"`
    pub fn algorithm(&self) -> &'static str {
        self.algorithm.name()
    }

    pub fn transformation(&self) -> Transformation {
        self.transformation
    }

    /// Expected IV length in bytes; fixed for the tool's lifetime
    pub fn iv_size(&self) -> usize {
        self.iv_size
    }

    pub fn key(&self) -> &SecretKey {
        &self.key
    }

    /// Replace the key. The old key stays in place if the new one is invalid.
    pub fn set_key(&mut self, key: SecretKey) -> Result<()> {
        check_key(&self.transformation, &key)?;
        self.key = key;
        Ok(())
    }

    /// Switch algorithm and transformation.
    ///
    /// The IV size is fixed, so the new transformation must use the same IV
    /// length and accept the current key. Nothing changes on error.
    pub fn set_algorithm_mode(&mut self, algorithm: &str, transformation: &str) -> Result<()> {
        let (algorithm, transformation) = resolve(algorithm, transformation, self.iv_size)?;
        check_key(&transformation, &self.key)?;

        debug!("Cipher tool switched from {} to {}", self.transformation, transformation);
        self.algorithm = algorithm;
        self.transformation = transformation;
        Ok(())
    }

    fn seal(&self, plaintext: &[u8], iv: Vec<u8>) -> Result<EncryptedData> {
        if iv.len() != self.iv_size {
            return Err(Error::InvalidParameters(format!(
                "Wrong IV length: must be {} bytes long, got {}",
                self.iv_size,
                iv.len()
            )));
        }

        let ciphertext = self
            .transformation
            .encrypt(self.key.as_bytes(), &iv, plaintext)?;

        trace!(
            "Encrypted {} bytes into {} bytes with {}",
            plaintext.len(),
            ciphertext.len(),
            self.transformation
        );
        Ok(EncryptedData::new(iv, ciphertext))
    }
}

impl Cipher for CipherTool {
    fn encrypt(&self, plaintext: &[u8]) -> Result<EncryptedData> {
        random_bytes(self.random.as_ref(), self.iv_size)
            .and_then(|iv| self.seal(plaintext, iv))
            .map_err(|e| log_failure("encrypt", e))
    }

    fn encrypt_with_iv(&self, plaintext: &[u8], iv: &[u8]) -> Result<EncryptedData> {
        self.seal(plaintext, iv.to_vec())
            .map_err(|e| log_failure("encrypt", e))
    }

    fn decrypt(&self, encrypted: &EncryptedData) -> Result<Vec<u8>> {
        self.transformation
            .decrypt(self.key.as_bytes(), encrypted.iv(), encrypted.data())
            .map(|plaintext| {
                trace!(
                    "Decrypted {} bytes into {} bytes with {}",
                    encrypted.data().len(),
                    plaintext.len(),
                    self.transformation
                );
                plaintext
            })
            .map_err(|e| log_failure("decrypt", e))
    }
}

fn log_failure(operation: &str, e: Error) -> Error {
    error!("Could not {}: `{}` ({})", operation, e, e.category());
    debug!("{:?}", e);
    e
}

impl fmt::Debug for CipherTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherTool")
            .field("transformation", &self.transformation.to_string())
            .field("iv_size", &self.iv_size)
            .field("key", &self.key)
            .field("random", &self.random.name())
            .finish()
    }
}

/// AES in CBC mode with PKCS#5 padding and a 16-byte IV
#[derive(Debug)]
pub struct AesCipherTool {
    inner: CipherTool,
}

impl AesCipherTool {
    /// Create a tool for `key`, which must be a 128, 192 or 256-bit AES key
    pub fn new(key: SecretKey) -> Result<Self> {
        Self::from_builder(Self::builder().key(key))
    }

    /// Like [`AesCipherTool::new`], drawing IVs from `random`
    pub fn with_random(key: SecretKey, random: Arc<dyn RandomSource>) -> Result<Self> {
        Self::from_builder(Self::builder().key(key).random_source(random))
    }

    fn builder() -> CipherToolBuilder {
        CipherTool::builder(ALGO_AES, aes_cbc_pkcs5(), AES_IV_SIZE)
    }

    fn from_builder(builder: CipherToolBuilder) -> Result<Self> {
        Ok(AesCipherTool {
            inner: builder.build()?,
        })
    }

    /// The underlying general tool
    pub fn as_tool(&self) -> &CipherTool {
        &self.inner
    }

    pub fn into_inner(self) -> CipherTool {
        self.inner
    }
}

impl Cipher for AesCipherTool {
    fn encrypt(&self, plaintext: &[u8]) -> Result<EncryptedData> {
        self.inner.encrypt(plaintext)
    }

    fn encrypt_with_iv(&self, plaintext: &[u8], iv: &[u8]) -> Result<EncryptedData> {
        self.inner.encrypt_with_iv(plaintext, iv)
    }

    fn decrypt(&self, encrypted: &EncryptedData) -> Result<Vec<u8>> {
        self.inner.decrypt(encrypted)
    }
}
