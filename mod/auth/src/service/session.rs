use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::info;

use taller_core::{Caller, new_id, now_millis};
use taller_sql::Value;

use crate::model::{Claims, Session, TokenGrant, User};
use crate::service::{AuthError, AuthService};

impl AuthService {
    /// Issue a signed access token for a user and record the session.
    pub fn issue_token(&self, user: &User) -> Result<TokenGrant, AuthError> {
        let session_id = new_id();
        let now = chrono::Utc::now();
        let exp = now + chrono::Duration::seconds(self.config.token_ttl);

        let claims = Claims {
            sub: user.id.clone(),
            name: user.full_name(),
            role: user.role,
            sid: session_id.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        let access_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::Internal(format!("JWT encode failed: {}", e)))?;

        let session = Session {
            id: session_id,
            user_id: user.id.clone(),
            issued_at: now_millis(),
            expires_at: exp.timestamp_millis(),
            revoked: false,
        };

        self.insert_record(
            "sessions",
            &session.id,
            &session,
            &[
                ("user_id", Value::Text(session.user_id.clone())),
                ("revoked", Value::Integer(0)),
                ("issued_at", Value::Integer(session.issued_at)),
            ],
        )?;

        Ok(TokenGrant {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.token_ttl,
        })
    }

    /// Verify and decode an access token.
    ///
    /// Returns the caller identity if the signature and expiry are valid
    /// and the session has not been revoked.
    pub fn verify_token(&self, token: &str) -> Result<Caller, AuthError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| AuthError::Unauthorized(format!("invalid token: {}", e)))?;

        let claims = token_data.claims;

        let session: Session = self
            .get_record("sessions", &claims.sid)
            .map_err(|_| AuthError::Unauthorized("unknown session".into()))?;
        if session.revoked {
            return Err(AuthError::Unauthorized("session has been revoked".into()));
        }

        Ok(Caller {
            user_id: claims.sub,
            name: claims.name,
            role: claims.role,
            session_id: claims.sid,
        })
    }

    /// Revoke a session: its token stops working immediately.
    pub fn revoke_session(&self, session_id: &str) -> Result<(), AuthError> {
        let mut session: Session = self.get_record("sessions", session_id)?;
        session.revoked = true;

        self.update_record(
            "sessions",
            session_id,
            &session,
            &[("revoked", Value::Integer(1))],
        )?;

        info!(session_id, "session revoked");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::model::RegisterRequest;
    use crate::service::{AuthConfig, AuthError, AuthService};
    use std::sync::Arc;
    use taller_sql::SqliteStore;

    fn test_service() -> Arc<AuthService> {
        let sql = Arc::new(SqliteStore::open_in_memory().unwrap());
        let svc = AuthService::new(sql, AuthConfig::default()).unwrap();
        svc.seed_access_codes("admin-2024", "tech-2024").unwrap();
        svc
    }

    fn register(svc: &AuthService, email: &str) -> crate::model::User {
        svc.register(RegisterRequest {
            dni: "12345678Z".into(),
            first_name: "Luis".into(),
            last_name: "Vega".into(),
            email: email.into(),
            password: "secreta1".into(),
            access_code: "tech-2024".into(),
        })
        .unwrap()
    }

    #[test]
    fn issue_and_verify_token() {
        let svc = test_service();
        let user = register(&svc, "luis@taller.es");

        let grant = svc.issue_token(&user).unwrap();
        assert!(!grant.access_token.is_empty());
        assert_eq!(grant.token_type, "Bearer");
        assert_eq!(grant.expires_in, 86400);

        let caller = svc.verify_token(&grant.access_token).unwrap();
        assert_eq!(caller.user_id, user.id);
        assert_eq!(caller.name, "Luis Vega");
        assert_eq!(caller.role, user.role);
    }

    #[test]
    fn revoked_session_is_rejected() {
        let svc = test_service();
        let user = register(&svc, "luis@taller.es");
        let grant = svc.issue_token(&user).unwrap();

        let caller = svc.verify_token(&grant.access_token).unwrap();
        svc.revoke_session(&caller.session_id).unwrap();

        assert!(matches!(
            svc.verify_token(&grant.access_token),
            Err(AuthError::Unauthorized(_))
        ));
    }

    #[test]
    fn garbage_tokens_are_rejected() {
        let svc = test_service();
        assert!(svc.verify_token("this.is.not.a.valid.jwt").is_err());
        assert!(svc.verify_token("").is_err());
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let svc = test_service();
        let user = register(&svc, "luis@taller.es");
        let grant = svc.issue_token(&user).unwrap();

        let other = AuthService::new(
            Arc::new(SqliteStore::open_in_memory().unwrap()),
            AuthConfig {
                jwt_secret: "a-different-secret".into(),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(other.verify_token(&grant.access_token).is_err());
    }
}
