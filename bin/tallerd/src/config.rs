use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Server configuration, loaded from a TOML file.
///
/// ```toml
/// [storage]
/// data_dir = "/var/lib/taller"
///
/// [jwt]
/// secret = "..."
/// expire_secs = 86400
///
/// [access]
/// admin_code = "..."
/// tech_code = "..."
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub storage: StorageConfig,
    pub jwt: JwtConfig,
    pub access: AccessCodes,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_expire_secs")]
    pub expire_secs: i64,
}

/// Initial access codes, seeded into the config table on first start.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessCodes {
    pub admin_code: String,
    pub tech_code: String,
}

fn default_expire_secs() -> i64 {
    86400 // 24h
}

impl ServerConfig {
    /// Resolve a config name to a path.
    ///
    /// A bare name maps to `/etc/taller/<name>.toml`; anything containing
    /// a `/` or `.` is used as a path directly.
    pub fn resolve_path(name_or_path: &str) -> PathBuf {
        if name_or_path.contains('/') || name_or_path.contains('.') {
            PathBuf::from(name_or_path)
        } else {
            PathBuf::from(format!("/etc/taller/{}.toml", name_or_path))
        }
    }

    /// Load and parse the configuration file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))?;
        let config: ServerConfig = toml::from_str(&text)
            .map_err(|e| anyhow::anyhow!("cannot parse {}: {}", path.display(), e))?;
        Ok(config)
    }
}
