//! User service
//!
//! Implements business logic for accounts:
//! - Registration with username/email validation and uniqueness checks
//! - Login by username or email, logout
//! - Session tokens with expiry
//! - Profile updates

use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{ProfileUpdate, Session, User};
use crate::services::password::{hash_password, verify_password};
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use uuid::Uuid;

/// Default session expiration time in days
const DEFAULT_SESSION_EXPIRATION_DAYS: i64 = 7;

/// Usernames may contain letters, digits and `@ . + - _`
static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("username regex is valid"));

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Authentication failed (invalid credentials)
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// User already exists
    #[error("User already exists: {0}")]
    UserExists(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// User service for managing accounts and authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_expiration_days: i64,
}

impl UserService {
    /// Create a new user service with the given repositories
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_expiration_days: DEFAULT_SESSION_EXPIRATION_DAYS,
        }
    }

    /// Create a new user service with custom session expiration
    pub fn with_session_expiration(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        session_expiration_days: i64,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_expiration_days,
        }
    }

    /// Register a new user
    ///
    /// # Errors
    ///
    /// - `ValidationError` if the username, email or password is malformed
    /// - `UserExists` if the username or email is already taken
    /// - `InternalError` for database errors
    pub async fn register(&self, input: RegisterInput) -> Result<User, UserServiceError> {
        self.validate_register_input(&input)?;

        if self
            .user_repo
            .get_by_username(&input.username)
            .await
            .context("Failed to check username")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(format!(
                "Username '{}' is already taken",
                input.username
            )));
        }

        if self
            .user_repo
            .get_by_email(&input.email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(format!(
                "Email '{}' is already registered",
                input.email
            )));
        }

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;

        let user = User::new(input.username, input.email, password_hash);

        let created_user = self
            .user_repo
            .create(&user)
            .await
            .context("Failed to create user")?;

        Ok(created_user)
    }

    /// Login with credentials
    ///
    /// Validates the provided credentials and creates a new session if valid.
    ///
    /// # Errors
    ///
    /// - `AuthenticationError` if credentials are invalid
    /// - `InternalError` for database errors
    pub async fn login(&self, input: LoginInput) -> Result<Session, UserServiceError> {
        let user = self
            .find_user_by_username_or_email(&input.username_or_email)
            .await?
            .ok_or_else(|| {
                UserServiceError::AuthenticationError(
                    "Invalid username or password".to_string(),
                )
            })?;

        let password_valid = verify_password(&input.password, &user.password_hash)
            .context("Failed to verify password")?;

        if !password_valid {
            return Err(UserServiceError::AuthenticationError(
                "Invalid username or password".to_string(),
            ));
        }

        let session = self.create_session(user.id).await?;

        Ok(session)
    }

    /// Logout (invalidate session)
    pub async fn logout(&self, session_id: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(session_id)
            .await
            .context("Failed to delete session")?;

        Ok(())
    }

    /// Validate session token and return the associated user
    ///
    /// Expired sessions are cleaned up on sight and treated as absent.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(s) => s,
            None => return Ok(None),
        };

        if session.is_expired() {
            let _ = self.session_repo.delete(token).await;
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get user")?;

        Ok(user)
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        let user = self
            .user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user by ID")?;

        Ok(user)
    }

    /// Get user by username
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, UserServiceError> {
        let user = self
            .user_repo
            .get_by_username(username)
            .await
            .context("Failed to get user by username")?;

        Ok(user)
    }

    /// Update the actor's own profile fields
    ///
    /// # Errors
    ///
    /// - `ValidationError` if the email is malformed
    /// - `UserExists` if the email belongs to a different account
    pub async fn update_profile(
        &self,
        user: &User,
        input: ProfileInput,
    ) -> Result<User, UserServiceError> {
        if input.email.trim().is_empty() || !input.email.contains('@') {
            return Err(UserServiceError::ValidationError(
                "Invalid email format".to_string(),
            ));
        }

        if let Some(existing) = self
            .user_repo
            .get_by_email(&input.email)
            .await
            .context("Failed to check email")?
        {
            if existing.id != user.id {
                return Err(UserServiceError::UserExists(format!(
                    "Email '{}' is already registered",
                    input.email
                )));
            }
        }

        let updated = User {
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            email: input.email.trim().to_string(),
            ..user.clone()
        };

        let updated = self
            .user_repo
            .update(&updated)
            .await
            .context("Failed to update user")?;

        Ok(updated)
    }

    /// Delete all expired sessions, returning how many were removed
    pub async fn cleanup_expired_sessions(&self) -> Result<i64, UserServiceError> {
        let count = self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?;

        Ok(count)
    }

    // ========================================================================
    // Private helper methods
    // ========================================================================

    fn validate_register_input(&self, input: &RegisterInput) -> Result<(), UserServiceError> {
        if input.username.trim().is_empty() {
            return Err(UserServiceError::ValidationError(
                "Username cannot be empty".to_string(),
            ));
        }

        if !USERNAME_RE.is_match(&input.username) {
            return Err(UserServiceError::ValidationError(
                "Username may only contain letters, digits and @/./+/-/_".to_string(),
            ));
        }

        if input.email.trim().is_empty() {
            return Err(UserServiceError::ValidationError(
                "Email cannot be empty".to_string(),
            ));
        }

        if !input.email.contains('@') {
            return Err(UserServiceError::ValidationError(
                "Invalid email format".to_string(),
            ));
        }

        if input.password.is_empty() {
            return Err(UserServiceError::ValidationError(
                "Password cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    async fn find_user_by_username_or_email(
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

    async fn create_session(&self, user_id: i64) -> Result<Session, UserServiceError> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id,
            expires_at: now + Duration::days(self.session_expiration_days),
            created_at: now,
        };

        let created = self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;

        Ok(created)
    }
}

/// Input for user registration
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterInput {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Input for user login
#[derive(Debug, Clone)]
pub struct LoginInput {
    pub username_or_email: String,
    pub password: String,
}

impl LoginInput {
    pub fn new(username_or_email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username_or_email: username_or_email.into(),
            password: password.into(),
        }
    }
}

/// Input for profile updates
pub type ProfileInput = ProfileUpdate;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxSessionRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations, DynDatabasePool};

    async fn setup_test_service() -> (DynDatabasePool, UserService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool.clone());
        let service = UserService::new(user_repo, session_repo);

        (pool, service)
    }

    // ========================================================================
    // Registration tests
    // ========================================================================

    #[tokio::test]
    async fn test_register_user() {
        let (_pool, service) = setup_test_service().await;

        let input = RegisterInput::new("alice", "alice@example.com", "password123");
        let user = service.register(input).await.expect("Failed to register");

        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@example.com");
        assert!(user.id > 0);
    }

    #[tokio::test]
    async fn test_register_duplicate_username_fails() {
        let (_pool, service) = setup_test_service().await;

        let input1 = RegisterInput::new("testuser", "user1@example.com", "password123");
        service.register(input1).await.expect("Failed to register first user");

        let input2 = RegisterInput::new("testuser", "user2@example.com", "password456");
        let result = service.register(input2).await;

        assert!(matches!(result, Err(UserServiceError::UserExists(_))));
    }

    #[tokio::test]
    async fn test_register_duplicate_email_fails() {
        let (_pool, service) = setup_test_service().await;

        let input1 = RegisterInput::new("user1", "same@example.com", "password123");
        service.register(input1).await.expect("Failed to register first user");

        let input2 = RegisterInput::new("user2", "same@example.com", "password456");
        let result = service.register(input2).await;

        assert!(matches!(result, Err(UserServiceError::UserExists(_))));
    }

    #[tokio::test]
    async fn test_register_empty_fields_fail() {
        let (_pool, service) = setup_test_service().await;

        for input in [
            RegisterInput::new("", "test@example.com", "password123"),
            RegisterInput::new("testuser", "", "password123"),
            RegisterInput::new("testuser", "test@example.com", ""),
        ] {
            let result = service.register(input).await;
            assert!(matches!(result, Err(UserServiceError::ValidationError(_))));
        }
    }

    #[tokio::test]
    async fn test_register_invalid_email_fails() {
        let (_pool, service) = setup_test_service().await;

        let input = RegisterInput::new("testuser", "invalid-email", "password123");
        let result = service.register(input).await;

        assert!(matches!(result, Err(UserServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_register_invalid_username_characters_fail() {
        let (_pool, service) = setup_test_service().await;

        let input = RegisterInput::new("bad name!", "test@example.com", "password123");
        let result = service.register(input).await;

        assert!(matches!(result, Err(UserServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_register_username_allows_word_characters() {
        let (_pool, service) = setup_test_service().await;

        let input = RegisterInput::new("user.name+tag@x", "weird@example.com", "password123");
        service.register(input).await.expect("Should accept @/./+/-/_");
    }

    #[tokio::test]
    async fn test_password_is_hashed() {
        let (_pool, service) = setup_test_service().await;

        let password = "my_secret_password";
        let input = RegisterInput::new("testuser", "test@example.com", password);
        let user = service.register(input).await.expect("Failed to register");

        assert_ne!(user.password_hash, password);
        assert!(user.password_hash.starts_with("$argon2id$"));
    }

    // ========================================================================
    // Login tests
    // ========================================================================

    #[tokio::test]
    async fn test_login_with_username_success() {
        let (_pool, service) = setup_test_service().await;

        let register_input = RegisterInput::new("testuser", "test@example.com", "password123");
        service.register(register_input).await.expect("Failed to register");

        let login_input = LoginInput::new("testuser", "password123");
        let session = service.login(login_input).await.expect("Failed to login");

        assert!(!session.id.is_empty());
        assert!(!session.is_expired());
    }

    #[tokio::test]
    async fn test_login_with_email_success() {
        let (_pool, service) = setup_test_service().await;

        let register_input = RegisterInput::new("testuser", "test@example.com", "password123");
        service.register(register_input).await.expect("Failed to register");

        let login_input = LoginInput::new("test@example.com", "password123");
        let session = service.login(login_input).await.expect("Failed to login");

        assert!(!session.id.is_empty());
    }

    #[tokio::test]
    async fn test_login_wrong_password_fails() {
        let (_pool, service) = setup_test_service().await;

        let register_input = RegisterInput::new("testuser", "test@example.com", "password123");
        service.register(register_input).await.expect("Failed to register");

        let login_input = LoginInput::new("testuser", "wrongpassword");
        let result = service.login(login_input).await;

        assert!(matches!(result, Err(UserServiceError::AuthenticationError(_))));
    }

    #[tokio::test]
    async fn test_login_nonexistent_user_fails() {
        let (_pool, service) = setup_test_service().await;

        let login_input = LoginInput::new("nonexistent", "password123");
        let result = service.login(login_input).await;

        assert!(matches!(result, Err(UserServiceError::AuthenticationError(_))));
    }

    // ========================================================================
    // Session validation tests
    // ========================================================================

    #[tokio::test]
    async fn test_validate_session_success() {
        let (_pool, service) = setup_test_service().await;

        let register_input = RegisterInput::new("testuser", "test@example.com", "password123");
        let registered_user = service.register(register_input).await.expect("Failed to register");

        let login_input = LoginInput::new("testuser", "password123");
        let session = service.login(login_input).await.expect("Failed to login");

        let user = service
            .validate_session(&session.id)
            .await
            .expect("Failed to validate session")
            .expect("User not found");

        assert_eq!(user.id, registered_user.id);
        assert_eq!(user.username, "testuser");
    }

    #[tokio::test]
    async fn test_validate_session_nonexistent_returns_none() {
        let (_pool, service) = setup_test_service().await;

        let result = service
            .validate_session("nonexistent-session-id")
            .await
            .expect("Failed to validate session");

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_validate_expired_session_returns_none() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool.clone());

        // -1 day expiration: sessions are born expired
        let service = UserService::with_session_expiration(user_repo, session_repo, -1);

        let register_input = RegisterInput::new("testuser", "test@example.com", "password123");
        service.register(register_input).await.expect("Failed to register");

        let login_input = LoginInput::new("testuser", "password123");
        let session = service.login(login_input).await.expect("Failed to login");

        let result = service
            .validate_session(&session.id)
            .await
            .expect("Failed to validate session");

        assert!(result.is_none());
    }

    // ========================================================================
    // Logout tests
    // ========================================================================

    #[tokio::test]
    async fn test_logout_invalidates_session() {
        let (_pool, service) = setup_test_service().await;

        let register_input = RegisterInput::new("testuser", "test@example.com", "password123");
        service.register(register_input).await.expect("Failed to register");

        let login_input = LoginInput::new("testuser", "password123");
        let session = service.login(login_input).await.expect("Failed to login");

        service.logout(&session.id).await.expect("Failed to logout");

        let result = service
            .validate_session(&session.id)
            .await
            .expect("Failed to validate session");

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_logout_nonexistent_session_succeeds() {
        let (_pool, service) = setup_test_service().await;

        let result = service.logout("nonexistent-session-id").await;
        assert!(result.is_ok());
    }

    // ========================================================================
    // Profile update tests
    // ========================================================================

    #[tokio::test]
    async fn test_update_profile() {
        let (_pool, service) = setup_test_service().await;

        let input = RegisterInput::new("profiled", "profiled@example.com", "password123");
        let user = service.register(input).await.expect("Failed to register");

        let updated = service
            .update_profile(
                &user,
                ProfileInput {
                    first_name: "Ada".into(),
                    last_name: "Lovelace".into(),
                    email: "ada@example.com".into(),
                },
            )
            .await
            .expect("Failed to update profile");

        assert_eq!(updated.first_name, "Ada");
        assert_eq!(updated.last_name, "Lovelace");
        assert_eq!(updated.email, "ada@example.com");
        assert_eq!(updated.username, "profiled");
    }

    #[tokio::test]
    async fn test_update_profile_keeping_own_email() {
        let (_pool, service) = setup_test_service().await;

        let input = RegisterInput::new("keeper", "keeper@example.com", "password123");
        let user = service.register(input).await.expect("Failed to register");

        let updated = service
            .update_profile(
                &user,
                ProfileInput {
                    first_name: "K".into(),
                    last_name: String::new(),
                    email: "keeper@example.com".into(),
                },
            )
            .await
            .expect("Own email should be accepted");

        assert_eq!(updated.first_name, "K");
    }

    #[tokio::test]
    async fn test_update_profile_rejects_taken_email() {
        let (_pool, service) = setup_test_service().await;

        service
            .register(RegisterInput::new("first", "first@example.com", "pw123456"))
            .await
            .unwrap();
        let second = service
            .register(RegisterInput::new("second", "second@example.com", "pw123456"))
            .await
            .unwrap();

        let result = service
            .update_profile(
                &second,
                ProfileInput {
                    first_name: String::new(),
                    last_name: String::new(),
                    email: "first@example.com".into(),
                },
            )
            .await;

        assert!(matches!(result, Err(UserServiceError::UserExists(_))));
    }

    #[tokio::test]
    async fn test_update_profile_rejects_bad_email() {
        let (_pool, service) = setup_test_service().await;

        let user = service
            .register(RegisterInput::new("emailer", "emailer@example.com", "pw123456"))
            .await
            .unwrap();

        let result = service
            .update_profile(
                &user,
                ProfileInput {
                    first_name: String::new(),
                    last_name: String::new(),
                    email: "not-an-email".into(),
                },
            )
            .await;

        assert!(matches!(result, Err(UserServiceError::ValidationError(_))));
    }

    // ========================================================================
    // Cleanup tests
    // ========================================================================

    #[tokio::test]
    async fn test_cleanup_expired_sessions() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool.clone());

        let service = UserService::with_session_expiration(user_repo, session_repo, -1);

        let register_input = RegisterInput::new("testuser", "test@example.com", "password123");
        service.register(register_input).await.expect("Failed to register");

        let login_input = LoginInput::new("testuser", "password123");
        service.login(login_input).await.expect("Failed to login");

        let count = service
            .cleanup_expired_sessions()
            .await
            .expect("Failed to cleanup");

        assert_eq!(count, 1);
    }
}
