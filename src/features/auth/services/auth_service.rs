use std::sync::Arc;

use axum_extra::extract::cookie::Cookie;
use chrono::Utc;

use crate::core::config::SessionConfig;
use crate::core::error::{AppError, Result};
use crate::features::auth::dtos::{AuthUserDto, LoginRequestDto, RegisterRequestDto};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::models::{NewUser, Session, User};
use crate::features::auth::password::PasswordHasher;
use crate::features::auth::session;
use crate::modules::store::Store;
use crate::shared::constants::MAX_USERNAME_LENGTH;

const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Registration, credential checks and the session guard
pub struct AuthService {
    store: Arc<dyn Store>,
    hasher: PasswordHasher,
    session: SessionConfig,
    /// Verified against when the username is unknown, so both paths cost one hash
    dummy_hash: String,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn Store>,
        hasher: PasswordHasher,
        session: SessionConfig,
    ) -> Result<Self> {
        let dummy_hash = hasher
            .hash(&session::generate_token())
            .map_err(|e| AppError::Internal(format!("Failed to prepare password hasher: {}", e)))?;

        Ok(Self {
            store,
            hasher,
            session,
            dummy_hash,
        })
    }

    /// Register a new user
    pub async fn register(&self, dto: RegisterRequestDto) -> Result<AuthUserDto> {
        if dto.username.chars().count() > MAX_USERNAME_LENGTH {
            return Err(AppError::Validation(format!(
                "Username must be at most {} characters",
                MAX_USERNAME_LENGTH
            )));
        }

        if dto.password != dto.confirmation {
            return Err(AppError::Validation("Passwords do not match".to_string()));
        }

        if self
            .store
            .get_user_by_username(&dto.username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Username already exists".to_string()));
        }

        let password_hash = self
            .hasher
            .hash(&dto.password)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;

        let user = self
            .store
            .create_user(NewUser {
                username: dto.username,
                password_hash,
            })
            .await?;

        tracing::info!("User registered: id={}, username={}", user.id, user.username);

        Ok(user.into())
    }

    /// Verify a username/password pair
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User> {
        let user = self.store.get_user_by_username(username).await?;

        let (hash, user) = match user {
            Some(user) => (user.password_hash.clone(), Some(user)),
            None => (self.dummy_hash.clone(), None),
        };

        let verified = self
            .hasher
            .verify(password, &hash)
            .map_err(|e| AppError::Internal(format!("Failed to verify password: {}", e)))?;

        match user {
            Some(user) if verified => Ok(user),
            _ => {
                tracing::warn!("Failed login attempt for username={}", username);
                Err(AppError::Auth(INVALID_CREDENTIALS.to_string()))
            }
        }
    }

    /// Authenticate and open a new session
    pub async fn login(&self, dto: LoginRequestDto) -> Result<(Session, AuthUserDto)> {
        let user = self.authenticate(&dto.username, &dto.password).await?;

        let now = Utc::now();
        let pruned = self.store.delete_expired_sessions(now).await?;
        if pruned > 0 {
            tracing::debug!("Pruned {} expired sessions", pruned);
        }

        let ttl = chrono::Duration::from_std(self.session.ttl)
            .map_err(|e| AppError::Internal(format!("Invalid session TTL: {}", e)))?;

        let session = self
            .store
            .create_session(Session {
                token: session::generate_token(),
                user_id: user.id,
                created_at: now,
                expires_at: now + ttl,
            })
            .await?;

        tracing::info!("User logged in: id={}", user.id);

        Ok((session, user.into()))
    }

    /// Destroy the session behind `token`, if there is one
    pub async fn logout(&self, token: Option<&str>) -> Result<()> {
        if let Some(token) = token {
            self.store.delete_session(token).await?;
        }
        Ok(())
    }

    /// Resolve a session token into the identity it belongs to.
    ///
    /// Missing, unknown and expired tokens all fail with `Unauthorized`.
    pub async fn require_session(&self, token: Option<&str>) -> Result<AuthenticatedUser> {
        let token =
            token.ok_or_else(|| AppError::Unauthorized("You need to log in first".to_string()))?;

        let session = self
            .store
            .get_session(token)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Session not found".to_string()))?;

        // Expired rows are left for `login` to prune
        if session.is_expired(Utc::now()) {
            return Err(AppError::Unauthorized("Session expired".to_string()));
        }

        let user = self
            .store
            .get_user(session.user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Session user no longer exists".to_string()))?;

        Ok(AuthenticatedUser {
            user_id: user.id,
            username: user.username,
        })
    }

    pub fn session_config(&self) -> &SessionConfig {
        &self.session
    }

    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        session::session_cookie(&self.session, token)
    }

    pub fn removal_cookie(&self) -> Cookie<'static> {
        session::removal_cookie(&self.session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::store::MemoryStore;
    use crate::shared::test_helpers::test_auth_service;

    fn register_dto(username: &str, password: &str, confirmation: &str) -> RegisterRequestDto {
        RegisterRequestDto {
            username: username.to_string(),
            password: password.to_string(),
            confirmation: confirmation.to_string(),
        }
    }

    fn login_dto(username: &str, password: &str) -> LoginRequestDto {
        LoginRequestDto {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_then_duplicate_conflicts() {
        let service = test_auth_service(Arc::new(MemoryStore::new()));

        let alice = service
            .register(register_dto("alice", "pw1", "pw1"))
            .await
            .unwrap();
        assert_eq!(alice.username, "alice");

        let err = service
            .register(register_dto("alice", "pw2", "pw2"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_register_password_mismatch() {
        let store = Arc::new(MemoryStore::new());
        let service = test_auth_service(store.clone());

        let err = service
            .register(register_dto("alice", "pw1", "pw2"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(store.get_user_by_username("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_password_is_stored_hashed() {
        let store = Arc::new(MemoryStore::new());
        let service = test_auth_service(store.clone());
        service
            .register(register_dto("alice", "pw1", "pw1"))
            .await
            .unwrap();

        let stored = store.get_user_by_username("alice").await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "pw1");
        assert!(stored.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_authenticate() {
        let service = test_auth_service(Arc::new(MemoryStore::new()));
        let alice = service
            .register(register_dto("alice", "pw1", "pw1"))
            .await
            .unwrap();

        let wrong = service.authenticate("alice", "wrongpw").await.unwrap_err();
        assert!(matches!(wrong, AppError::Auth(_)));

        let unknown = service.authenticate("nobody", "pw1").await.unwrap_err();
        assert!(matches!(unknown, AppError::Auth(_)));

        let user = service.authenticate("alice", "pw1").await.unwrap();
        assert_eq!(user.id, alice.id);
    }

    #[tokio::test]
    async fn test_login_session_round_trip() {
        let service = test_auth_service(Arc::new(MemoryStore::new()));
        service
            .register(register_dto("alice", "pw1", "pw1"))
            .await
            .unwrap();

        let (session, user) = service.login(login_dto("alice", "pw1")).await.unwrap();
        let resolved = service.require_session(Some(&session.token)).await.unwrap();
        assert_eq!(resolved.user_id, user.id);
        assert_eq!(resolved.username, "alice");

        service.logout(Some(&session.token)).await.unwrap();
        let err = service
            .require_session(Some(&session.token))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_require_session_rejects_missing_and_unknown() {
        let service = test_auth_service(Arc::new(MemoryStore::new()));

        let missing = service.require_session(None).await.unwrap_err();
        assert!(matches!(missing, AppError::Unauthorized(_)));

        let unknown = service.require_session(Some("deadbeef")).await.unwrap_err();
        assert!(matches!(unknown, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_require_session_rejects_expired() {
        let store = Arc::new(MemoryStore::new());
        let service = test_auth_service(store.clone());
        let alice = service
            .register(register_dto("alice", "pw1", "pw1"))
            .await
            .unwrap();

        let now = Utc::now();
        store
            .create_session(Session {
                token: "stale".to_string(),
                user_id: alice.id,
                created_at: now - chrono::Duration::days(8),
                expires_at: now - chrono::Duration::days(1),
            })
            .await
            .unwrap();

        let err = service.require_session(Some("stale")).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        assert!(store.get_session("stale").await.unwrap().is_some());

        service.login(login_dto("alice", "pw1")).await.unwrap();
        assert!(store.get_session("stale").await.unwrap().is_none());
    }
}
