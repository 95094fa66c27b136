use argon2::Argon2;
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use tracing::info;

use taller_core::{ServiceError, UserDirectory, new_id, now_millis};
use taller_sql::Value;

use crate::model::{RegisterRequest, User};
use crate::service::{AuthError, AuthService};

impl AuthService {
    /// Register a new account.
    ///
    /// The access code decides the role. Emails are unique; a duplicate
    /// registration is a conflict. The password is stored as an argon2id
    /// hash in its own column.
    pub fn register(&self, req: RegisterRequest) -> Result<User, AuthError> {
        let role = self.validate_access_code(&req.access_code)?;

        let email = req.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(AuthError::Validation("a valid email is required".into()));
        }
        if req.password.len() < 6 {
            return Err(AuthError::Validation(
                "password must be at least 6 characters".into(),
            ));
        }
        let dni = req.dni.trim().to_string();
        if dni.is_empty() {
            return Err(AuthError::Validation("dni is required".into()));
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(req.password.as_bytes(), &salt)
            .map_err(|e| AuthError::Internal(format!("password hash failed: {}", e)))?
            .to_string();

        let user = User {
            id: new_id(),
            dni,
            email: email.clone(),
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            role,
            created_at: now_millis(),
        };

        self.insert_record(
            "users",
            &user.id,
            &user,
            &[
                ("email", Value::Text(email.clone())),
                ("role", Value::Text(role.as_str().to_string())),
                ("password_hash", Value::Text(password_hash)),
                ("created_at", Value::Integer(user.created_at)),
            ],
        )
        .map_err(|e| match e {
            AuthError::Conflict(_) => {
                AuthError::Conflict(format!("email {} is already registered", email))
            }
            other => other,
        })?;

        info!(user_id = %user.id, role = %role, "user registered");
        Ok(user)
    }

    /// Verify email+password credentials.
    ///
    /// Unknown emails and wrong passwords produce the same error, so a
    /// caller cannot probe which addresses exist.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let invalid = || AuthError::Unauthorized("invalid credentials".into());

        let email = email.trim().to_lowercase();
        let rows = self
            .sql
            .query(
                "SELECT data, password_hash FROM users WHERE email = ?1",
                &[Value::Text(email)],
            )
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        let row = rows.first().ok_or_else(invalid)?;

        let hash = row
            .get_str("password_hash")
            .ok_or_else(|| AuthError::Internal("missing password_hash column".into()))?;
        let parsed = PasswordHash::new(hash)
            .map_err(|e| AuthError::Internal(format!("stored hash is corrupt: {}", e)))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| invalid())?;

        let data = row
            .get_str("data")
            .ok_or_else(|| AuthError::Internal("missing data column".into()))?;
        serde_json::from_str(data).map_err(|e| AuthError::Internal(e.to_string()))
    }

    /// Get a user by id.
    pub fn get_user(&self, id: &str) -> Result<User, AuthError> {
        self.get_record("users", id)
    }
}

/// Directory lookups offered to the orders module for name enrichment.
impl UserDirectory for AuthService {
    fn full_name(&self, user_id: &str) -> Result<Option<String>, ServiceError> {
        match self.get_user(user_id) {
            Ok(user) => Ok(Some(user.full_name())),
            Err(AuthError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::AuthConfig;
    use std::sync::Arc;
    use taller_core::Role;
    use taller_sql::SqliteStore;

    fn test_service() -> Arc<AuthService> {
        let sql = Arc::new(SqliteStore::open_in_memory().unwrap());
        let svc = AuthService::new(sql, AuthConfig::default()).unwrap();
        svc.seed_access_codes("admin-2024", "tech-2024").unwrap();
        svc
    }

    fn register_req(email: &str, code: &str) -> RegisterRequest {
        RegisterRequest {
            dni: "12345678Z".into(),
            first_name: "Luis".into(),
            last_name: "Vega".into(),
            email: email.into(),
            password: "secreta1".into(),
            access_code: code.into(),
        }
    }

    #[test]
    fn register_derives_role_from_code() {
        let svc = test_service();
        let admin = svc
            .register(register_req("marta@taller.es", "admin-2024"))
            .unwrap();
        assert_eq!(admin.role, Role::Admin);

        let tech = svc
            .register(register_req("luis@taller.es", "tech-2024"))
            .unwrap();
        assert_eq!(tech.role, Role::Technician);
        assert!(tech.created_at > 0);
    }

    #[test]
    fn register_rejects_bad_code_and_bad_input() {
        let svc = test_service();
        assert!(matches!(
            svc.register(register_req("a@b.com", "wrong")),
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            svc.register(register_req("not-an-email", "tech-2024")),
            Err(AuthError::Validation(_))
        ));

        let mut short = register_req("a@b.com", "tech-2024");
        short.password = "abc".into();
        assert!(matches!(
            svc.register(short),
            Err(AuthError::Validation(_))
        ));
    }

    #[test]
    fn register_rejects_duplicate_email() {
        let svc = test_service();
        svc.register(register_req("luis@taller.es", "tech-2024"))
            .unwrap();
        assert!(matches!(
            svc.register(register_req("Luis@Taller.es", "tech-2024")),
            Err(AuthError::Conflict(_))
        ));
    }

    #[test]
    fn authenticate_round_trip() {
        let svc = test_service();
        let user = svc
            .register(register_req("luis@taller.es", "tech-2024"))
            .unwrap();

        let logged_in = svc.authenticate("luis@taller.es", "secreta1").unwrap();
        assert_eq!(logged_in.id, user.id);

        // Same error for wrong password and unknown email.
        assert!(matches!(
            svc.authenticate("luis@taller.es", "wrong"),
            Err(AuthError::Unauthorized(_))
        ));
        assert!(matches!(
            svc.authenticate("nobody@taller.es", "secreta1"),
            Err(AuthError::Unauthorized(_))
        ));
    }

    #[test]
    fn directory_resolves_names_and_tolerates_ghosts() {
        let svc = test_service();
        let user = svc
            .register(register_req("luis@taller.es", "tech-2024"))
            .unwrap();

        assert_eq!(
            svc.full_name(&user.id).unwrap(),
            Some("Luis Vega".to_string())
        );
        assert_eq!(svc.full_name("ghost").unwrap(), None);
    }

    #[test]
    fn directory_falls_back_to_email_local_part() {
        let svc = test_service();
        let mut req = register_req("anon@taller.es", "tech-2024");
        req.first_name = "  ".into();
        req.last_name = "".into();
        let user = svc.register(req).unwrap();
        assert_eq!(svc.full_name(&user.id).unwrap(), Some("anon".to_string()));
    }
}
