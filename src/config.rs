//! Configuration management for cipherkit

use crate::crypto::{
    constants, random_source_by_name, CipherAlgorithm, CipherTool, CipherToolBuilder,
    KeyAlgorithm, KeyGenerator, KeyedHasher, MacAlgorithm, SecretKey, Transformation,
    AES_IV_SIZE,
};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Default key strength in bits
pub const DEFAULT_KEY_BITS: u32 = 128;

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Cipher settings
    #[serde(default)]
    pub cipher: CipherSettings,

    /// Keyed hashing settings
    #[serde(default)]
    pub hmac: HmacSettings,

    /// Key generation settings
    #[serde(default)]
    pub keygen: KeyGenSettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Cipher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CipherSettings {
    /// Algorithm name (e.g. "AES")
    pub algorithm: String,

    /// Transformation "algorithm/mode/padding"
    pub transformation: String,

    /// IV size in bytes
    pub iv_size: usize,
}

impl Default for CipherSettings {
    fn default() -> Self {
        CipherSettings {
            algorithm: constants::ALGO_AES.to_string(),
            transformation: constants::aes_cbc_pkcs5(),
            iv_size: AES_IV_SIZE,
        }
    }
}

/// HMAC configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HmacSettings {
    /// MAC algorithm name (e.g. "HmacSHA256")
    pub algorithm: String,
}

impl Default for HmacSettings {
    fn default() -> Self {
        HmacSettings {
            algorithm: constants::HMAC_SHA256.to_string(),
        }
    }
}

/// Key generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyGenSettings {
    /// Key algorithm name
    pub algorithm: String,

    /// Key strength in bits
    pub bits: u32,

    /// Random source name
    #[serde(default = "default_random_source")]
    pub random_source: String,

    /// Policy ceiling on key strength
    #[serde(default)]
    pub max_key_bits: Option<u32>,
}

fn default_random_source() -> String {
    constants::PRNG_SYSTEM.to_string()
}

impl Default for KeyGenSettings {
    fn default() -> Self {
        KeyGenSettings {
            algorithm: constants::ALGO_AES.to_string(),
            bits: DEFAULT_KEY_BITS,
            random_source: default_random_source(),
            max_key_bits: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter level or `EnvFilter` directives, e.g. `info,cipherkit=debug`
    pub level: String,

    /// Include the event target in output
    #[serde(default)]
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: DEFAULT_LOG_LEVEL.to_string(),
            with_target: false,
        }
    }
}

impl Config {
    /// Load configuration from a file (YAML for .yaml/.yml, JSON otherwise)
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let content = std::fs::read_to_string(path_ref)?;

        // Perform environment variable substitution
        let content = Self::substitute_env_vars(&content)?;

        let config: Config = if is_yaml(path_ref) {
            serde_yaml::from_str(&content)
                .map_err(|e| Error::Config(format!("Failed to parse YAML config: {}", e)))?
        } else {
            serde_json::from_str(&content)
                .map_err(|e| Error::Config(format!("Failed to parse JSON config: {}", e)))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Substitute environment variables in config content
    /// Supports ${VAR_NAME} syntax; unset variables are left as written
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| Error::Config(format!("Invalid substitution pattern: {}", e)))?;

        let mut result = content.to_string();
        for cap in re.captures_iter(content) {
            let full_match = &cap[0];
            let var_name = &cap[1];

            if let Ok(value) = std::env::var(var_name) {
                result = result.replace(full_match, &value);
            }
        }

        Ok(result)
    }

    /// Save configuration to a file (format determined by extension)
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path_ref = path.as_ref();

        let content = if is_yaml(path_ref) {
            serde_yaml::to_string(self).map_err(|e| {
                Error::Config(format!("Failed to serialize config to YAML: {}", e))
            })?
        } else {
            serde_json::to_string_pretty(self).map_err(|e| {
                Error::Config(format!("Failed to serialize config to JSON: {}", e))
            })?
        };

        std::fs::write(path_ref, content)?;

        Ok(())
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(transformation) = std::env::var("CIPHERKIT_TRANSFORMATION") {
            let transformation = transformation.trim();
            let algorithm = transformation.split('/').next().unwrap_or_default();
            if !algorithm.is_empty() {
                self.cipher.algorithm = algorithm.to_string();
                self.cipher.transformation = transformation.to_string();
            }
        }

        if let Ok(algorithm) = std::env::var("CIPHERKIT_HMAC_ALGORITHM") {
            let algorithm = algorithm.trim().to_string();
            if !algorithm.is_empty() {
                self.hmac.algorithm = algorithm;
            }
        }

        if let Ok(bits) = std::env::var("CIPHERKIT_KEY_BITS") {
            if let Ok(bits) = bits.trim().parse::<u32>() {
                self.keygen.bits = bits;
            }
        }

        if let Ok(source) = std::env::var("CIPHERKIT_RANDOM_SOURCE") {
            let source = source.trim().to_string();
            if !source.is_empty() {
                self.keygen.random_source = source;
            }
        }

        if let Ok(level) = std::env::var("CIPHERKIT_LOG_LEVEL") {
            let level = level.trim().to_string();
            if !level.is_empty() {
                self.logging.level = level;
            }
        }
    }

    /// Default configuration with environment overrides applied
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        // Cipher settings
        let algorithm = CipherAlgorithm::from_name(&self.cipher.algorithm).map_err(invalid)?;
        let transformation = Transformation::parse(&self.cipher.transformation).map_err(invalid)?;

        if transformation.algorithm() != algorithm {
            return Err(Error::InvalidConfig(format!(
                "Transformation {} does not use algorithm {}",
                self.cipher.transformation, self.cipher.algorithm
            )));
        }

        if transformation.iv_len() != self.cipher.iv_size {
            return Err(Error::InvalidConfig(format!(
                "IV size must be {} for {}, got {}",
                transformation.iv_len(),
                transformation,
                self.cipher.iv_size
            )));
        }

        // HMAC settings
        MacAlgorithm::from_name(&self.hmac.algorithm).map_err(invalid)?;

        // Key generation settings
        if self.keygen.bits == 0 {
            return Err(Error::InvalidConfig(
                "Key size must be greater than 0".to_string(),
            ));
        }

        KeyAlgorithm::from_name(&self.keygen.algorithm)
            .and_then(|key_algorithm| key_algorithm.check_strength(self.keygen.bits))
            .map_err(invalid)?;

        if let Some(max) = self.keygen.max_key_bits {
            if self.keygen.bits > max {
                return Err(Error::InvalidConfig(format!(
                    "Key size of {} bits exceeds the configured maximum of {} bits",
                    self.keygen.bits, max
                )));
            }
        }

        random_source_by_name(&self.keygen.random_source).map_err(invalid)?;

        // Logging settings
        EnvFilter::try_new(&self.logging.level).map_err(|e| {
            Error::InvalidConfig(format!("Invalid log level '{}': {}", self.logging.level, e))
        })?;

        Ok(())
    }

    /// Builder for the configured cipher; a key must still be supplied
    pub fn cipher_builder(&self) -> Result<CipherToolBuilder> {
        let random = random_source_by_name(&self.keygen.random_source)?;
        Ok(CipherTool::builder(
            self.cipher.algorithm.as_str(),
            self.cipher.transformation.as_str(),
            self.cipher.iv_size,
        )
        .random_source(random))
    }

    /// Keyed hasher for the configured MAC algorithm
    pub fn keyed_hasher(&self) -> Result<KeyedHasher> {
        KeyedHasher::for_name(&self.hmac.algorithm)
    }

    /// Key generator using the configured random source and policy ceiling
    pub fn key_generator(&self) -> Result<KeyGenerator> {
        let random = random_source_by_name(&self.keygen.random_source)?;
        let generator = KeyGenerator::with_random(random);

        Ok(match self.keygen.max_key_bits {
            Some(max) => generator.with_max_key_bits(max),
            None => generator,
        })
    }

    /// Generate a key with the configured algorithm and strength
    pub fn generate_key(&self) -> Result<SecretKey> {
        self.key_generator()?
            .generate(&self.keygen.algorithm, self.keygen.bits)
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    )
}

fn invalid(e: Error) -> Error {
    Error::InvalidConfig(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Cipher;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.cipher.transformation, "AES/CBC/PKCS5Padding");
        assert_eq!(config.cipher.iv_size, 16);
        assert_eq!(config.hmac.algorithm, "HmacSHA256");
        assert_eq!(config.keygen.bits, 128);
        assert_eq!(config.keygen.random_source, "SystemRandom");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.hmac.algorithm = "HmacSHA512".to_string();
        config.keygen.bits = 256;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.hmac.algorithm, "HmacSHA512");
        assert_eq!(loaded.keygen.bits, 256);
    }

    #[test]
    fn test_save_and_load_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");

        let mut config = Config::default();
        config.keygen.max_key_bits = Some(128);
        config.logging.level = "debug".to_string();
        config.save(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("transformation: AES/CBC/PKCS5Padding"));

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.keygen.max_key_bits, Some(128));
        assert_eq!(loaded.logging.level, "debug");
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(&path, "hmac:\n  algorithm: HmacMD5\n").unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.hmac.algorithm, "HmacMD5");
        assert_eq!(loaded.cipher.iv_size, 16);
    }

    #[test]
    fn test_env_substitution() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "hmac:\n  algorithm: ${CIPHERKIT_TEST_MAC}\nlogging:\n  level: ${CIPHERKIT_TEST_LEVEL}\n",
        )
        .unwrap();

        // Unset variables stay literal and then fail validation
        std::env::set_var("CIPHERKIT_TEST_LEVEL", "warn");
        assert!(matches!(Config::load(&path), Err(Error::InvalidConfig(_))));

        std::env::set_var("CIPHERKIT_TEST_MAC", "HmacSHA384");
        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.hmac.algorithm, "HmacSHA384");
        assert_eq!(loaded.logging.level, "warn");

        std::env::remove_var("CIPHERKIT_TEST_MAC");
        std::env::remove_var("CIPHERKIT_TEST_LEVEL");
    }

    #[test]
    fn test_env_overrides() {
        std::env::set_var("CIPHERKIT_TRANSFORMATION", "AES/CBC/NoPadding");
        std::env::set_var("CIPHERKIT_HMAC_ALGORITHM", "HmacSHA1");
        std::env::set_var("CIPHERKIT_KEY_BITS", "192");
        std::env::set_var("CIPHERKIT_RANDOM_SOURCE", "NativePRNG");
        std::env::set_var("CIPHERKIT_LOG_LEVEL", "trace");

        let config = Config::from_env().unwrap();
        assert_eq!(config.cipher.algorithm, "AES");
        assert_eq!(config.cipher.transformation, "AES/CBC/NoPadding");
        assert_eq!(config.hmac.algorithm, "HmacSHA1");
        assert_eq!(config.keygen.bits, 192);
        assert_eq!(config.keygen.random_source, "NativePRNG");
        assert_eq!(config.logging.level, "trace");

        std::env::set_var("CIPHERKIT_KEY_BITS", "100");
        assert!(matches!(Config::from_env(), Err(Error::InvalidConfig(_))));

        for var in [
            "CIPHERKIT_TRANSFORMATION",
            "CIPHERKIT_HMAC_ALGORITHM",
            "CIPHERKIT_KEY_BITS",
            "CIPHERKIT_RANDOM_SOURCE",
            "CIPHERKIT_LOG_LEVEL",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let mut config = Config::default();
        config.cipher.transformation = "AES/GCM/NoPadding".to_string();
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = Config::default();
        config.cipher.iv_size = 12;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = Config::default();
        config.hmac.algorithm = "HmacWhirlpool".to_string();
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = Config::default();
        config.keygen.bits = 0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = Config::default();
        config.keygen.bits = 256;
        config.keygen.max_key_bits = Some(128);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = Config::default();
        config.keygen.random_source = "PKCS11".to_string();
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = Config::default();
        config.logging.level = "cipherkit=loud".to_string();
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_filter_directives_accepted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");

        let mut config = Config::default();
        config.logging.level = "info,cipherkit=debug".to_string();
        assert!(config.validate().is_ok());

        config.save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.logging.level, "info,cipherkit=debug");
    }

    #[test]
    fn test_load_missing_or_malformed_file() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Config::load(dir.path().join("absent.json")),
            Err(Error::Io(_))
        ));
        assert!(matches!(
            Config::default().save(dir.path().join("missing").join("config.json")),
            Err(Error::Io(_))
        ));

        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Config::load(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_tools_from_config() {
        let config = Config::default();

        let key = config.generate_key().unwrap();
        assert_eq!(key.bits(), 128);

        let tool = config.cipher_builder().unwrap().key(key.clone()).build().unwrap();
        let encrypted = tool.encrypt(b"configured").unwrap();
        assert_eq!(tool.decrypt(&encrypted).unwrap(), b"configured");

        let hasher = config.keyed_hasher().unwrap();
        let digest = hasher.digest(b"configured", &key).unwrap();
        assert!(hasher.verify(b"configured", &key, &digest).is_ok());

        // No key supplied
        let err = config.cipher_builder().unwrap().build().unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_key_generator_policy_from_config() {
        let mut config = Config::default();
        config.keygen.max_key_bits = Some(128);

        let generator = config.key_generator().unwrap();
        assert!(generator.aes128_key().is_ok());
        assert!(matches!(generator.aes256_key(), Err(Error::InvalidParameters(_))));
    }
}
