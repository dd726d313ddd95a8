use std::sync::Arc;

use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::auth::dto::PublicUser;
use crate::auth::error::AuthError;
use crate::auth::jwt::JwtKeys;
use crate::auth::password::{hash_password, verify_password};
use crate::state::AppState;
use crate::store::UserStore;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Orchestrates registration, login and token-to-user resolution over the
/// credential store and the signing keys.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    keys: JwtKeys,
    password_min_len: usize,
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            keys: JwtKeys::from_ref(state),
            password_min_len: state.config.password_min_len,
        }
    }
}

impl AuthService {
    /// Create a user and log them in. The only path that creates users.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<(String, PublicUser), AuthError> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            warn!(email = %email, "invalid email");
            return Err(AuthError::Validation("Invalid email".into()));
        }
        if password.len() < self.password_min_len {
            warn!("password too short");
            return Err(AuthError::Validation("Password too short".into()));
        }

        // The store's unique constraint is the authority; a racing insert
        // still surfaces as DuplicateEmail from `create`.
        if self.store.find_by_email(&email).await?.is_some() {
            warn!(email = %email, "email already registered");
            return Err(AuthError::DuplicateUser);
        }

        let hash = hash_password(password).map_err(AuthError::Internal)?;
        let user = self.store.create(&email, name, &hash).await?;
        let token = self.keys.sign(user.id)?;

        info!(user_id = %user.id, email = %user.email, "user registered");
        Ok((token, user.into()))
    }

    /// Verify credentials and issue a fresh token. Unknown email and wrong
    /// password are indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> Result<(String, PublicUser), AuthError> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            warn!(email = %email, "invalid email");
            return Err(AuthError::Validation("Invalid email".into()));
        }

        let user = match self.store.find_by_email(&email).await? {
            Some(u) => u,
            None => {
                warn!(email = %email, "login with unknown email");
                return Err(AuthError::Authentication);
            }
        };

        let ok = verify_password(password, &user.password_hash).map_err(AuthError::Internal)?;
        if !ok {
            warn!(user_id = %user.id, "login with invalid password");
            return Err(AuthError::Authentication);
        }

        let token = self.keys.sign(user.id)?;
        info!(user_id = %user.id, email = %user.email, "user logged in");
        Ok((token, user.into()))
    }

    /// Resolve a presented token to its user. A valid token whose user has
    /// since been deleted is an error, not a stale identity.
    pub async fn resolve_current_user(&self, token: &str) -> Result<PublicUser, AuthError> {
        let claims = self.keys.verify(token)?;
        let user = self.store.find_by_id(claims.sub).await?.ok_or_else(|| {
            warn!(user_id = %claims.sub, "token references a deleted user");
            AuthError::UserNotFound
        })?;
        Ok(user.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use time::{Duration as TimeDuration, OffsetDateTime};
    use uuid::Uuid;

    fn make_service() -> AuthService {
        AuthService::from_ref(&AppState::fake())
    }

    #[tokio::test]
    async fn register_then_login_then_resolve_same_user() {
        let svc = make_service();
        let (token, registered) = svc
            .register("a@x.com", "secret123", Some("Ada"))
            .await
            .expect("register");
        assert_eq!(registered.email, "a@x.com");
        assert_eq!(registered.name.as_deref(), Some("Ada"));

        let (token2, logged_in) = svc.login("a@x.com", "secret123").await.expect("login");
        assert_eq!(logged_in.id, registered.id);

        // both tokens resolve to the same identity
        for t in [token, token2] {
            let resolved = svc.resolve_current_user(&t).await.expect("resolve");
            assert_eq!(resolved.id, registered.id);
            assert_eq!(resolved.email, "a@x.com");
        }
    }

    #[tokio::test]
    async fn register_normalizes_email_case_and_whitespace() {
        let svc = make_service();
        let (_, user) = svc
            .register("  Ada@Example.COM ", "secret123", None)
            .await
            .expect("register");
        assert_eq!(user.email, "ada@example.com");

        let result = svc.login("ada@example.com", "secret123").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email_regardless_of_password() {
        let svc = make_service();
        svc.register("dup@x.com", "secret123", None).await.expect("first");
        let err = svc
            .register("dup@x.com", "another-password", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::DuplicateUser));
    }

    #[tokio::test]
    async fn register_enforces_password_policy_and_email_shape() {
        let svc = make_service();
        assert!(matches!(
            svc.register("a@x.com", "short", None).await.unwrap_err(),
            AuthError::Validation(_)
        ));
        assert!(matches!(
            svc.register("not-an-email", "secret123", None).await.unwrap_err(),
            AuthError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn login_failure_is_identical_for_unknown_email_and_wrong_password() {
        let svc = make_service();
        svc.register("a@x.com", "secret123", None).await.expect("register");

        let unknown = svc.login("b@x.com", "secret123").await.unwrap_err();
        let wrong = svc.login("a@x.com", "wrong-password").await.unwrap_err();

        assert!(matches!(unknown, AuthError::Authentication));
        assert!(matches!(wrong, AuthError::Authentication));
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn resolve_rejects_expired_token() {
        let state = AppState::fake();
        let svc = AuthService::from_ref(&state);
        let (_, user) = svc.register("a@x.com", "secret123", None).await.expect("register");

        // forge a token with the same key material but an elapsed expiry
        let now = OffsetDateTime::now_utc();
        let claims = crate::auth::jwt::Claims {
            sub: user.id,
            iat: (now - TimeDuration::minutes(10)).unix_timestamp() as usize,
            exp: (now - TimeDuration::seconds(1)).unix_timestamp() as usize,
            iss: state.config.jwt.issuer.clone(),
            aud: state.config.jwt.audience.clone(),
        };
        let expired = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(state.config.jwt.secret.as_bytes()),
        )
        .expect("encode");

        let err = svc.resolve_current_user(&expired).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn resolve_fails_when_user_was_deleted_after_issuance() {
        let state = AppState::fake();
        let svc = AuthService::from_ref(&state);
        let (token, user) = svc.register("gone@x.com", "secret123", None).await.expect("register");

        assert!(state.store.delete(user.id).await.expect("delete"));

        let err = svc.resolve_current_user(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));
    }

    #[tokio::test]
    async fn resolve_rejects_token_for_unknown_subject() {
        let svc = make_service();
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let token = keys.sign(Uuid::new_v4()).expect("sign");
        // same fake key material, but the subject never registered
        let err = svc.resolve_current_user(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));
    }
}
