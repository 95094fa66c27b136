use tracing::info;

use taller_core::Role;

use crate::model::AccessConfig;
use crate::service::{AuthError, AuthService};

/// Well-known id of the singleton access-code record.
pub const ACCESS_CODES_ID: &str = "access_codes";

impl AuthService {
    /// Map an access code to the role it grants.
    ///
    /// The admin code is checked first, then the technician code; any
    /// other string (including the empty string) is rejected. No side
    /// effects.
    pub fn validate_access_code(&self, code: &str) -> Result<Role, AuthError> {
        let config = self.access_config()?;
        if code == config.admin_code {
            Ok(Role::Admin)
        } else if code == config.tech_code {
            Ok(Role::Technician)
        } else {
            Err(AuthError::Validation("invalid access code".into()))
        }
    }

    /// Read the singleton access-code configuration.
    pub fn access_config(&self) -> Result<AccessConfig, AuthError> {
        self.get_record("config", ACCESS_CODES_ID).map_err(|e| match e {
            AuthError::NotFound(_) => {
                AuthError::Internal("access codes are not configured".into())
            }
            other => other,
        })
    }

    /// Seed the access-code record on first start. An existing record
    /// wins; the server config is only the initial value.
    pub fn seed_access_codes(&self, admin_code: &str, tech_code: &str) -> Result<(), AuthError> {
        match self.get_record::<AccessConfig>("config", ACCESS_CODES_ID) {
            Ok(_) => {
                info!("access codes already configured");
                Ok(())
            }
            Err(AuthError::NotFound(_)) => {
                let config = AccessConfig {
                    admin_code: admin_code.to_string(),
                    tech_code: tech_code.to_string(),
                };
                self.insert_record("config", ACCESS_CODES_ID, &config, &[])?;
                info!("seeded access codes");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::AuthConfig;
    use std::sync::Arc;
    use taller_sql::SqliteStore;

    fn test_service() -> Arc<AuthService> {
        let sql = Arc::new(SqliteStore::open_in_memory().unwrap());
        let svc = AuthService::new(sql, AuthConfig::default()).unwrap();
        svc.seed_access_codes("admin-2024", "tech-2024").unwrap();
        svc
    }

    #[test]
    fn codes_map_to_roles() {
        let svc = test_service();
        assert_eq!(svc.validate_access_code("admin-2024").unwrap(), Role::Admin);
        assert_eq!(
            svc.validate_access_code("tech-2024").unwrap(),
            Role::Technician
        );
    }

    #[test]
    fn unknown_codes_are_rejected() {
        let svc = test_service();
        for code in ["", "ADMIN-2024", "admin-2024 ", "nope"] {
            assert!(
                matches!(svc.validate_access_code(code), Err(AuthError::Validation(_))),
                "code {:?} should be rejected",
                code
            );
        }
    }

    #[test]
    fn seed_does_not_overwrite() {
        let svc = test_service();
        svc.seed_access_codes("other-admin", "other-tech").unwrap();
        // First seed wins.
        assert_eq!(svc.validate_access_code("admin-2024").unwrap(), Role::Admin);
        assert!(svc.validate_access_code("other-admin").is_err());
    }

    #[test]
    fn unseeded_codes_are_an_internal_error() {
        let sql = Arc::new(SqliteStore::open_in_memory().unwrap());
        let svc = AuthService::new(sql, AuthConfig::default()).unwrap();
        assert!(matches!(
            svc.validate_access_code("admin-2024"),
            Err(AuthError::Internal(_))
        ));
    }
}
