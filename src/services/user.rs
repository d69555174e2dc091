//! User service
//!
//! Registration, login/logout and session validation. Sessions are rows in the
//! `sessions` table keyed by a random token that travels in the `session`
//! cookie.

use crate::db::is_unique_violation;
use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{LoginInput, RegisterInput, Session, User};
use crate::services::password::{hash_password, verify_password};
use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

/// Default session lifetime in days
pub const DEFAULT_SESSION_DAYS: i64 = 7;

const MIN_PASSWORD_LEN: usize = 8;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]{3,30}$").expect("valid username pattern"));

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Invalid credentials
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Username or email already taken
    #[error("Already exists: {0}")]
    Duplicate(String),

    #[error("User not found: {0}")]
    NotFound(i64),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// User service for accounts and login sessions
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_days: i64,
}

impl UserService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
    ) -> Self {
        Self::with_session_lifetime(user_repo, session_repo, DEFAULT_SESSION_DAYS)
    }

    /// Create a user service whose sessions last `session_days`
    pub fn with_session_lifetime(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        session_days: i64,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_days,
        }
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// - `ValidationError` for a malformed username, email or short password
    /// - `Duplicate` if the username or email is taken
    pub async fn register(&self, input: RegisterInput) -> Result<User, UserServiceError> {
        let username = input.username.trim().to_string();
        let email = input.email.trim().to_string();
        validate_registration(&username, &email, &input.password)?;

        if self
            .user_repo
            .get_by_username(&username)
            .await
            .context("Failed to check username")?
            .is_some()
        {
            return Err(UserServiceError::Duplicate(format!(
                "Username '{}' is already taken",
                username
            )));
        }

        if self
            .user_repo
            .get_by_email(&email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(UserServiceError::Duplicate(format!(
                "Email '{}' is already registered",
                email
            )));
        }

        let password_hash = hash_password(&input.password)?;
        let user = User::new(username, email, password_hash);

        let created = match self.user_repo.create(&user).await {
            Ok(created) => created,
            Err(e) if is_unique_violation(&e) => {
                return Err(UserServiceError::Duplicate(
                    "Username or email is already taken".to_string(),
                ))
            }
            Err(e) => return Err(e.context("Failed to create user").into()),
        };

        tracing::info!(user_id = created.id, username = %created.username, "User registered");
        Ok(created)
    }

    /// Check credentials and open a new session
    pub async fn login(&self, input: LoginInput) -> Result<Session, UserServiceError> {
        let invalid =
            || UserServiceError::AuthenticationError("Invalid username or password".to_string());

        let user = self
            .find_by_username_or_email(input.username_or_email.trim())
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(&input.password, &user.password_hash)? {
            tracing::debug!(user_id = user.id, "Login rejected: wrong password");
            return Err(invalid());
        }

        self.start_session(user.id).await
    }

    /// Open a session for an already authenticated user (used right after signup)
    pub async fn start_session(&self, user_id: i64) -> Result<Session, UserServiceError> {
        let session = Session::start(user_id, self.session_days);
        let created = self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;

        tracing::debug!(user_id, "Session started");
        Ok(created)
    }

    /// Drop a session. Unknown tokens are ignored.
    pub async fn logout(&self, token: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(token)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// Resolve a session token to its user.
    ///
    /// Expired sessions are deleted and reported as `None`.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let Some(session) = self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        else {
            return Ok(None);
        };

        if session.is_expired() {
            if let Err(e) = self.session_repo.delete(token).await {
                tracing::warn!("Failed to delete expired session: {:#}", e);
            }
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get session user")?;
        Ok(user)
    }

    /// Get a user by ID
    pub async fn get(&self, id: i64) -> Result<User, UserServiceError> {
        self.user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user")?
            .ok_or(UserServiceError::NotFound(id))
    }

    /// Delete all expired sessions, returning how many were removed
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, UserServiceError> {
        let removed = self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?;
        Ok(removed)
    }

    async fn find_by_username_or_email(
        &self,
        username_or_email: &str,
    ) -> Result<Option<User>, UserServiceError> {
        if let Some(user) = self
            .user_repo
            .get_by_username(username_or_email)
            .await
            .context("Failed to get user by username")?
        {
            return Ok(Some(user));
        }

        let user = self
            .user_repo
            .get_by_email(username_or_email)
            .await
            .context("Failed to get user by email")?;
        Ok(user)
    }
}

fn validate_registration(
    username: &str,
    email: &str,
    password: &str,
) -> Result<(), UserServiceError> {
    if !USERNAME_RE.is_match(username) {
        return Err(UserServiceError::ValidationError(
            "Username must be 3 to 30 letters, digits or underscores".to_string(),
        ));
    }

    if email.is_empty() || !email.contains('@') {
        return Err(UserServiceError::ValidationError(
            "Invalid email format".to_string(),
        ));
    }

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(UserServiceError::ValidationError(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{fixtures, SqlxSessionRepository, SqlxUserRepository};
    use crate::db::DynDatabasePool;
    use chrono::{Duration, Utc};

    async fn setup_test_service() -> (DynDatabasePool, UserService) {
        let pool = fixtures::migrated_pool().await;
        let service = UserService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool.clone()),
        );
        (pool, service)
    }

    fn register_input(username: &str, email: &str, password: &str) -> RegisterInput {
        RegisterInput {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    fn login_input(who: &str, password: &str) -> LoginInput {
        LoginInput {
            username_or_email: who.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let (_pool, service) = setup_test_service().await;

        let user = service
            .register(register_input("alice", "alice@example.com", "password123"))
            .await
            .expect("Failed to register");
        assert!(user.id > 0);
        assert!(user.password_hash.starts_with("$argon2id$"));

        let by_name = service.login(login_input("alice", "password123")).await.unwrap();
        assert_eq!(by_name.user_id, user.id);

        let by_email = service
            .login(login_input("alice@example.com", "password123"))
            .await
            .unwrap();
        assert_ne!(by_email.id, by_name.id);
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let (_pool, service) = setup_test_service().await;
        service
            .register(register_input("alice", "alice@example.com", "password123"))
            .await
            .unwrap();

        let wrong_password = service.login(login_input("alice", "nope-nope")).await;
        assert!(matches!(
            wrong_password,
            Err(UserServiceError::AuthenticationError(_))
        ));

        let unknown = service.login(login_input("nobody", "password123")).await;
        assert!(matches!(unknown, Err(UserServiceError::AuthenticationError(_))));
    }

    #[tokio::test]
    async fn test_register_duplicates_rejected() {
        let (_pool, service) = setup_test_service().await;
        service
            .register(register_input("alice", "alice@example.com", "password123"))
            .await
            .unwrap();

        let same_name = service
            .register(register_input("alice", "other@example.com", "password123"))
            .await;
        assert!(matches!(same_name, Err(UserServiceError::Duplicate(_))));

        let same_email = service
            .register(register_input("alicia", "alice@example.com", "password123"))
            .await;
        assert!(matches!(same_email, Err(UserServiceError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_register_validation() {
        let (_pool, service) = setup_test_service().await;

        for (username, email, password) in [
            ("ab", "ab@example.com", "password123"),
            ("has space", "x@example.com", "password123"),
            ("valid_name", "no-at-sign", "password123"),
            ("valid_name", "x@example.com", "short"),
        ] {
            let result = service
                .register(register_input(username, email, password))
                .await;
            assert!(
                matches!(result, Err(UserServiceError::ValidationError(_))),
                "{} / {} / {} should be rejected",
                username,
                email,
                password
            );
        }
    }

    #[tokio::test]
    async fn test_validate_session_and_logout() {
        let (_pool, service) = setup_test_service().await;
        let user = service
            .register(register_input("alice", "alice@example.com", "password123"))
            .await
            .unwrap();
        let session = service.start_session(user.id).await.unwrap();

        let found = service.validate_session(&session.id).await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));

        service.logout(&session.id).await.unwrap();
        assert!(service.validate_session(&session.id).await.unwrap().is_none());
        assert!(service.validate_session("unknown").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_session_is_deleted() {
        let (pool, service) = setup_test_service().await;
        let user = fixtures::user(&pool, "alice").await;
        let repo = SqlxSessionRepository::new(pool.clone());

        let mut session = Session::start(user.id, 7);
        session.expires_at = Utc::now() - Duration::minutes(1);
        repo.create(&session).await.unwrap();

        assert!(service.validate_session(&session.id).await.unwrap().is_none());
        assert!(repo.get_by_id(&session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_missing_user() {
        let (_pool, service) = setup_test_service().await;
        assert!(matches!(
            service.get(42).await,
            Err(UserServiceError::NotFound(42))
        ));
    }

    mod property_tests {
        use super::super::validate_registration;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn valid_usernames_accepted(name in "[A-Za-z0-9_]{3,30}") {
                prop_assert!(validate_registration(&name, "a@b.c", "password123").is_ok());
            }

            #[test]
            fn long_usernames_rejected(name in "[A-Za-z0-9_]{31,40}") {
                prop_assert!(validate_registration(&name, "a@b.c", "password123").is_err());
            }

            #[test]
            fn short_passwords_rejected(password in ".{0,7}") {
                prop_assert!(validate_registration("alice", "a@b.c", &password).is_err());
            }
        }
    }
}
