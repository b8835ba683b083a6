//! Name catalog for ciphers, modes, paddings, random sources and key algorithms
//!
//! Names follow the conventional provider spelling (`"AES/CBC/PKCS5Padding"`,
//! `"HmacSHA256"`, ...). Only a subset resolves to an implementation; see
//! [`Transformation`](super::Transformation), [`MacAlgorithm`](super::MacAlgorithm),
//! [`KeyAlgorithm`](super::KeyAlgorithm) and
//! [`random_source_by_name`](super::random_source_by_name). The rest are
//! listed so callers can name them and get a clean `UnsupportedAlgorithm`.

// Cipher algorithms
pub const ALGO_AES: &str = "AES";
pub const ALGO_AES_WRAP: &str = "AESWrap";
pub const ALGO_ARC4: &str = "ARCFOUR";
pub const ALGO_BLOWFISH: &str = "Blowfish";
pub const ALGO_DES: &str = "DES";
pub const ALGO_DESEDE: &str = "DESede";
pub const ALGO_DESEDE_WRAP: &str = "DESedeWrap";
pub const ALGO_ECIES: &str = "ECIES";
pub const ALGO_RC2: &str = "RC2";
pub const ALGO_RC4: &str = "RC4";
pub const ALGO_RC5: &str = "RC5";
pub const ALGO_RSA: &str = "RSA";

// Modes
pub const MODE_NONE: &str = "NONE";
pub const MODE_CBC: &str = "CBC";
pub const MODE_CCM: &str = "CCM";
pub const MODE_CFB: &str = "CFB";
pub const MODE_CTR: &str = "CTR";
pub const MODE_CTS: &str = "CTS";
pub const MODE_ECB: &str = "ECB";
pub const MODE_GCM: &str = "GCM";
pub const MODE_OFB: &str = "OFB";
pub const MODE_PCBC: &str = "PCBC";

// Paddings
pub const PAD_NONE: &str = "NoPadding";
pub const PAD_ISO10126: &str = "ISO10126Padding";
pub const PAD_OAE: &str = "OAEPadding";
pub const PAD_PKCS1: &str = "PKCS1Padding";
pub const PAD_PKCS5: &str = "PKCS5Padding";
pub const PAD_PKCS7: &str = "PKCS7Padding";
pub const PAD_SSL3: &str = "SSL3Padding";

// Random sources
pub const PRNG_SYSTEM: &str = "SystemRandom";
pub const PRNG_NATIVE: &str = "NativePRNG";
pub const PRNG_NATIVE_BLOCKING: &str = "NativePRNGBlocking";
pub const PRNG_NATIVE_NONBLOCKING: &str = "NativePRNGNonBlocking";
pub const PRNG_PKCS11: &str = "PKCS11";
pub const PRNG_SHA1: &str = "SHA1PRNG";
pub const PRNG_WINDOWS: &str = "Windows-PRNG";

// Keyed hash algorithms (also valid key-generation algorithms)
pub const HMAC_MD5: &str = "HmacMD5";
pub const HMAC_SHA1: &str = "HmacSHA1";
pub const HMAC_SHA224: &str = "HmacSHA224";
pub const HMAC_SHA256: &str = "HmacSHA256";
pub const HMAC_SHA384: &str = "HmacSHA384";
pub const HMAC_SHA512: &str = "HmacSHA512";

/// `"AES/CBC/PKCS5Padding"`
pub fn aes_cbc_pkcs5() -> String {
    transformation(ALGO_AES, MODE_CBC, PAD_PKCS5)
}

/// Join an algorithm, mode and padding into a transformation string
pub fn transformation(algorithm: &str, mode: &str, padding: &str) -> String {
    format!("{}/{}/{}", algorithm, mode, padding)
}
