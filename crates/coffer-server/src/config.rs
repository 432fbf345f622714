use serde::{Deserialize, Serialize};

/// Optional YAML configuration. Every section falls back to its defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerRuntimeConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
}

pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 3600;
pub const DEFAULT_MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerRuntimeConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
}

impl Default for ServerRuntimeConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_token_ttl_seconds")]
    pub token_ttl_seconds: i64,
    #[serde(default)]
    pub kdf: KdfConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_seconds: default_token_ttl_seconds(),
            kdf: KdfConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KdfConfig {
    #[serde(default = "default_kdf_memory_kb")]
    pub memory_kb: u32,
    #[serde(default = "default_kdf_iterations")]
    pub iterations: u32,
    #[serde(default = "default_kdf_parallelism")]
    pub parallelism: u32,
}

impl Default for KdfConfig {
    fn default() -> Self {
        Self {
            memory_kb: default_kdf_memory_kb(),
            iterations: default_kdf_iterations(),
            parallelism: default_kdf_parallelism(),
        }
    }
}

impl KdfConfig {
    pub fn params(&self) -> coffer_crypto::KdfParams {
        coffer_crypto::KdfParams {
            memory_kb: self.memory_kb,
            iterations: self.iterations,
            parallelism: self.parallelism,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_endpoint")]
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_metrics_endpoint(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_addr() -> String {
    DEFAULT_ADDR.to_string()
}

fn default_token_ttl_seconds() -> i64 {
    DEFAULT_TOKEN_TTL_SECONDS
}

fn default_kdf_memory_kb() -> u32 {
    coffer_crypto::KdfParams::default().memory_kb
}

fn default_kdf_iterations() -> u32 {
    coffer_crypto::KdfParams::default().iterations
}

fn default_kdf_parallelism() -> u32 {
    coffer_crypto::KdfParams::default().parallelism
}

fn default_metrics_endpoint() -> String {
    "/metrics".to_string()
}

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}
