//! # User Repository
//!
//! Database operations for staff and admin accounts.
//!
//! Passwords are stored as argon2 PHC strings. Credential verification
//! lives here; session/token issuance is the calling layer's concern.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use cellstock_core::validation::{validate_email, validate_password, validate_username};
use cellstock_core::{Role, User};

/// Column list shared by every user SELECT.
const SELECT_USER: &str = "SELECT id, username, email, password_hash, role, is_active, \
     created_at, last_seen FROM users";

/// Input for creating a user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Creates a user account with a hashed password.
    ///
    /// ## Errors
    /// - `Validation` if username/email/password is malformed
    /// - `UniqueViolation` if the username or email is taken
    pub async fn create(&self, new: NewUser) -> DbResult<User> {
        validate_username(&new.username)?;
        validate_email(&new.email)?;
        validate_password(&new.password)?;

        let username = new.username.trim().to_string();
        let email = new.email.trim().to_string();

        if self.get_by_username(&username).await?.is_some() {
            return Err(DbError::duplicate("username", &username));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            username,
            email,
            password_hash: hash_password(&new.password)?,
            role: new.role,
            is_active: true,
            created_at: now,
            last_seen: now,
        };

        debug!(id = %user.id, username = %user.username, "Creating user");

        sqlx::query(
            r#"
            INSERT INTO users (
                id, username, email, password_hash, role,
                is_active, created_at, last_seen
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.last_seen)
        .execute(&self.pool)
        .await?;

        Ok(user)
    }

    /// Gets a user by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("{SELECT_USER} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Gets a user by username.
    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("{SELECT_USER} WHERE username = ?1"))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Lists all users, oldest account first.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!("{SELECT_USER} ORDER BY created_at"))
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    /// Verifies a username/password pair.
    ///
    /// Returns the user on a match, `None` on unknown username or wrong
    /// password. Callers decide what an inactive account may do.
    pub async fn verify_password(&self, username: &str, password: &str) -> DbResult<Option<User>> {
        let Some(user) = self.get_by_username(username).await? else {
            return Ok(None);
        };

        if verify_hash(password, &user.password_hash) {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Activates or deactivates an account.
    ///
    /// Deactivated users cannot own new sales.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET is_active = ?2 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    /// Updates the last-seen timestamp.
    pub async fn touch_last_seen(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();
        let result = sqlx::query("UPDATE users SET last_seen = ?2 WHERE id = ?1")
            .bind(id)
            .bind(now)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    // =========================================================================
    // Coordinator-only operations
    // =========================================================================

    /// Fetches a user by ID on an existing connection.
    pub(crate) async fn fetch_by_id(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("{SELECT_USER} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(user)
    }
}

// =============================================================================
// Password Hashing
// =============================================================================

/// Hashes a password into an argon2 PHC string.
fn hash_password(password: &str) -> DbResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Internal(format!("password hashing failed: {e}")))?;

    Ok(hash.to_string())
}

/// Verifies a password against a stored argon2 hash.
fn verify_hash(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_verify_user() {
        let db = setup().await;
        let users = db.users();

        let user = users
            .create(NewUser {
                username: "amira".to_string(),
                email: "amira@example.com".to_string(),
                password: "correct horse".to_string(),
                role: Role::Staff,
            })
            .await
            .unwrap();

        assert!(user.is_active);
        assert_ne!(user.password_hash, "correct horse");

        let verified = users
            .verify_password("amira", "correct horse")
            .await
            .unwrap();
        assert!(verified.is_some());

        let rejected = users.verify_password("amira", "wrong").await.unwrap();
        assert!(rejected.is_none());

        let unknown = users.verify_password("nobody", "whatever").await.unwrap();
        assert!(unknown.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let db = setup().await;
        let users = db.users();

        let new_user = NewUser {
            username: "amira".to_string(),
            email: "amira@example.com".to_string(),
            password: "correct horse".to_string(),
            role: Role::Staff,
        };
        users.create(new_user.clone()).await.unwrap();

        let err = users.create(new_user).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_set_active() {
        let db = setup().await;
        let users = db.users();

        let user = users
            .create(NewUser {
                username: "amira".to_string(),
                email: "amira@example.com".to_string(),
                password: "correct horse".to_string(),
                role: Role::Admin,
            })
            .await
            .unwrap();

        users.set_active(&user.id, false).await.unwrap();
        let reloaded = users.get_by_id(&user.id).await.unwrap().unwrap();
        assert!(!reloaded.is_active);

        let err = users.set_active("missing-id", true).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_weak_password_rejected() {
        let db = setup().await;

        let err = db
            .users()
            .create(NewUser {
                username: "amira".to_string(),
                email: "amira@example.com".to_string(),
                password: "short".to_string(),
                role: Role::Staff,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }
}
