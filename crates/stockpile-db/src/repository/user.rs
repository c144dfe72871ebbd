//! # User Repository
//!
//! Accounts, password hashing and login.
//!
//! Passwords are stored as argon2 PHC strings (`$argon2id$v=19$...`) with a
//! random salt per user. The hash is read only inside this module; callers
//! get a [`User`] without it.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use stockpile_core::validation::{validate_password, validate_username};
use stockpile_core::{Role, User};

#[derive(Debug, Clone, sqlx::FromRow)]
struct UserRecord {
    id: i64,
    username: String,
    password_hash: String,
    role: Role,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        User {
            id: record.id,
            username: record.username,
            role: record.role,
        }
    }
}

/// Repository for user accounts.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Creates an account.
    ///
    /// ## Returns
    /// * `Ok(User)` - The new account
    /// * `Err(DbError::Domain(Validation))` - Bad username or short password
    /// * `Err(DbError::UniqueViolation)` - Username taken
    pub async fn create(&self, username: &str, password: &str, role: Role) -> DbResult<User> {
        validate_username(username)?;
        validate_password(password)?;

        debug!(username, %role, "Creating user");

        let password_hash = hash_password(password)?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users (username, password_hash, role)
            VALUES (?1, ?2, ?3)
            RETURNING id
            "#,
        )
        .bind(username)
        .bind(&password_hash)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("username", username),
            other => other,
        })?;

        info!(id, username, %role, "User created");

        Ok(User {
            id,
            username: username.to_string(),
            role,
        })
    }

    /// Checks a username and password.
    ///
    /// ## Returns
    /// `Some(User)` when the credentials match, `None` for an unknown user
    /// or a wrong password.
    pub async fn authenticate(&self, username: &str, password: &str) -> DbResult<Option<User>> {
        let Some(record) = self.find_record(username).await? else {
            warn!(username, "Login for unknown user");
            return Ok(None);
        };

        if verify_password(password, &record.password_hash) {
            debug!(username, "Login succeeded");
            Ok(Some(record.into()))
        } else {
            warn!(username, "Login with wrong password");
            Ok(None)
        }
    }

    /// Gets an account by username.
    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        Ok(self.find_record(username).await?.map(User::from))
    }

    /// Gets an account by id.
    ///
    /// ## Returns
    /// * `Ok(User)` - The account
    /// * `Err(DbError::NotFound)` - No account has this id
    pub async fn get_by_id(&self, id: i64) -> DbResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, password_hash, role FROM users WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        record
            .map(User::from)
            .ok_or_else(|| DbError::not_found("User", id))
    }

    /// Lists accounts ordered by id.
    pub async fn list_all(&self) -> DbResult<Vec<User>> {
        let records = sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, password_hash, role FROM users ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(User::from).collect())
    }

    /// Deletes an account. Returns whether it existed.
    pub async fn remove_by_id(&self, id: i64) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Changes an account's role. Returns whether it existed.
    pub async fn set_role(&self, id: i64, role: Role) -> DbResult<bool> {
        let result = sqlx::query("UPDATE users SET role = ?2 WHERE id = ?1")
            .bind(id)
            .bind(role)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts accounts with the given role.
    pub async fn count_with_role(&self, role: Role) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = ?1")
            .bind(role)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Creates the bootstrap admin account unless that username exists.
    ///
    /// Returns `true` if the account was created.
    pub async fn ensure_default_admin(&self, username: &str, password: &str) -> DbResult<bool> {
        if self.find_record(username).await?.is_some() {
            return Ok(false);
        }

        match self.create(username, password, Role::Admin).await {
            Ok(_) => {
                info!(username, "Default admin account created");
                Ok(true)
            }
            // Another process created it between the lookup and the insert.
            Err(err) if err.is_unique_violation() => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn find_record(&self, username: &str) -> DbResult<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, password_hash, role FROM users WHERE username = ?1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }
}

fn hash_password(password: &str) -> DbResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
