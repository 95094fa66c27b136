//! Bootstrap — first-start checks and access-code seeding.
//!
//! When tallerd starts:
//! 1. Verify the config carries a JWT secret, a data dir, and both
//!    access codes — refuse to start otherwise.
//! 2. Seed the `config/access_codes` record if it does not exist yet.

use auth::service::AuthService;

use crate::config::ServerConfig;

/// Verify server configuration is ready for use.
pub fn verify_config(config: &ServerConfig) -> anyhow::Result<()> {
    if config.jwt.secret.is_empty() {
        anyhow::bail!("JWT secret is empty in configuration.");
    }
    if config.storage.data_dir.is_empty() {
        anyhow::bail!("Storage data_dir is empty in configuration.");
    }
    if config.access.admin_code.is_empty() || config.access.tech_code.is_empty() {
        anyhow::bail!("Both access codes must be set in configuration.");
    }
    if config.access.admin_code == config.access.tech_code {
        anyhow::bail!("Admin and technician access codes must differ.");
    }
    Ok(())
}

/// Ensure the access-code record exists. An already-seeded database is
/// left alone — rotating codes is a manual operation, not a restart.
pub fn ensure_access_codes(svc: &AuthService, config: &ServerConfig) -> anyhow::Result<()> {
    svc.seed_access_codes(&config.access.admin_code, &config.access.tech_code)
        .map_err(|e| anyhow::anyhow!("failed to seed access codes: {}", e))
}
