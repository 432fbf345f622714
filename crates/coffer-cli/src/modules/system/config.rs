use std::fs;
use std::path::{Path, PathBuf};

use coffer_crypto::SecretKey;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ADDR: &str = "http://127.0.0.1:8080";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SYNC_TIMEOUT_SECS: u64 = 60;

const CONFIG_FILE: &str = "config.json";
const KEY_FILE: &str = "local.key";
const DB_FILE: &str = "vault.db";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_sync_timeout")]
    pub sync_timeout_secs: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            request_timeout_secs: default_request_timeout(),
            sync_timeout_secs: default_sync_timeout(),
        }
    }
}

fn default_addr() -> String {
    DEFAULT_ADDR.to_string()
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_sync_timeout() -> u64 {
    DEFAULT_SYNC_TIMEOUT_SECS
}

/// Directory holding the config file, the local key and the vault database.
#[derive(Debug, Clone)]
pub struct CofferHome {
    root: PathBuf,
}

impl CofferHome {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `--home` / `COFFER_HOME`, falling back to `~/.coffer`.
    pub fn resolve(arg: Option<PathBuf>) -> anyhow::Result<Self> {
        if let Some(root) = arg {
            return Ok(Self::new(root));
        }
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| anyhow::anyhow!("HOME is not set"))?;
        Ok(Self::new(Path::new(&home).join(".coffer")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn key_path(&self) -> PathBuf {
        self.root.join(KEY_FILE)
    }

    pub fn db_path(&self) -> PathBuf {
        self.root.join(DB_FILE)
    }

    pub fn db_url(&self) -> String {
        format!("sqlite://{}", self.db_path().display())
    }

    pub fn ensure_exists(&self) -> anyhow::Result<()> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }
}

pub fn load_config(home: &CofferHome) -> anyhow::Result<CliConfig> {
    let path = home.config_path();
    if !path.exists() {
        return Ok(CliConfig::default());
    }
    let contents = fs::read_to_string(&path)?;
    serde_json::from_str(&contents)
        .map_err(|err| anyhow::anyhow!("invalid config {}: {err}", path.display()))
}

pub fn save_config(home: &CofferHome, config: &CliConfig) -> anyhow::Result<()> {
    home.ensure_exists()?;
    let contents = serde_json::to_string_pretty(config)?;
    fs::write(home.config_path(), contents)?;
    Ok(())
}

/// Reads the hex key file, generating and persisting a fresh key on first use.
pub fn load_or_create_key(home: &CofferHome) -> anyhow::Result<SecretKey> {
    let path = home.key_path();
    if path.exists() {
        let contents = fs::read_to_string(&path)?;
        return SecretKey::from_hex(&contents)
            .map_err(|err| anyhow::anyhow!("invalid key file {}: {err}", path.display()));
    }
    home.ensure_exists()?;
    let key = SecretKey::generate();
    fs::write(&path, key.to_hex())?;
    restrict_permissions(&path)?;
    tracing::info!(event = "local_key_created", path = %path.display());
    Ok(key)
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> anyhow::Result<()> {
    Ok(())
}
