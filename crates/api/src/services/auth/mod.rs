//! Authentication service.
//!
//! Password accounts with Argon2id hashes and HS256 bearer tokens.

mod error;
pub mod jwt;

pub use error::AuthError;
pub use jwt::JwtKeys;

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use serde::Serialize;

use stepup_core::{Email, UserId, UserRole};

use crate::db::{RepositoryError, Store, UserStore};
use crate::models::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum display name length.
const MAX_NAME_LENGTH: usize = 100;

/// Verified against on unknown emails, so every failed login costs one Argon2 run.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("stepup-unknown-account").ok());

/// The authenticated caller, decoded from a bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: UserId,
    pub role: UserRole,
}

impl AuthUser {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Admins may access anything; customers only what they own.
    #[must_use]
    pub fn can_access(&self, owner: UserId) -> bool {
        self.is_admin() || self.id == owner
    }
}

/// Successful login payload.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub role: UserRole,
}

/// Authentication service.
///
/// Handles registration, login and user lookups for admins.
pub struct AuthService<'a> {
    store: &'a dyn Store,
    jwt: &'a JwtKeys,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a dyn Store, jwt: &'a JwtKeys) -> Self {
        Self { store, jwt }
    }

    /// Register a new customer account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[tracing::instrument(skip(self, password, name))]
    pub async fn register(&self, email: &str, password: &str, name: &str) -> Result<User, AuthError> {
        let user = create_account(self.store, email, password, name, UserRole::Customer).await?;
        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Login with email and password and issue a bearer token.
    ///
    /// Unknown emails and wrong passwords fail identically.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let Some(user) = self.store.user_by_email(&email).await? else {
            return Err(reject_unknown_account(password));
        };

        verify_password(password, &user.password_hash)?;

        let token = self.jwt.issue(user.id, user.role)?;
        tracing::info!(user_id = %user.id, role = %user.role, "User logged in");

        Ok(LoginResponse {
            token,
            role: user.role,
        })
    }

    /// All accounts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the store fails.
    pub async fn list_users(&self) -> Result<Vec<User>, AuthError> {
        Ok(self.store.list_users().await?)
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.store
            .user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

/// Validate, hash and insert a new account with the given role.
///
/// Self-registration always passes `UserRole::Customer`. The CLI uses this to
/// create admins.
///
/// # Errors
///
/// Returns a validation error, `AuthError::UserAlreadyExists` on a duplicate
/// email, or `AuthError::Repository`.
pub async fn create_account<S: UserStore + ?Sized>(
    store: &S,
    email: &str,
    password: &str,
    name: &str,
    role: UserRole,
) -> Result<User, AuthError> {
    let email = Email::parse(email)?;
    validate_password(password)?;
    let name = validate_name(name)?;

    let user = User {
        id: UserId::generate(),
        email,
        password_hash: hash_password(password)?,
        role,
        name,
        created_at: Utc::now(),
    };

    store.insert_user(&user).await.map_err(|e| match e {
        RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
        other => AuthError::Repository(other),
    })?;

    Ok(user)
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<String, AuthError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AuthError::InvalidName("name cannot be empty".to_owned()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AuthError::InvalidName(format!(
            "name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(name.to_owned())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Spend the same hashing work as a wrong password, then fail.
fn reject_unknown_account(password: &str) -> AuthError {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
    AuthError::InvalidCredentials
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use secrecy::SecretString;

    use super::*;
    use crate::db::MemoryStore;

    fn jwt() -> JwtKeys {
        JwtKeys::new(
            &SecretString::from("k9$Vq2!mZ7@pR4#tL8&wX1^cN6*bH3%e"),
            Duration::from_secs(600),
        )
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    /// The unknown-account hash uses the same Argon2 parameters as real ones.
    #[test]
    fn test_unknown_account_pays_full_hash_cost() {
        let dummy = DUMMY_HASH.as_deref().unwrap();
        let real = hash_password("correct horse").unwrap();
        let params = |hash: &str| hash.rsplitn(3, '$').nth(2).unwrap().to_owned();
        assert_eq!(params(dummy), params(&real));

        assert!(matches!(
            reject_unknown_account("stepup-unknown-account-2"),
            AuthError::InvalidCredentials
        ));
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("eightch!").is_ok());
    }

    #[test]
    fn test_can_access() {
        let owner = UserId::generate();
        let customer = AuthUser {
            id: owner,
            role: UserRole::Customer,
        };
        let stranger = AuthUser {
            id: UserId::generate(),
            role: UserRole::Customer,
        };
        let admin = AuthUser {
            id: UserId::generate(),
            role: UserRole::Admin,
        };
        assert!(customer.can_access(owner));
        assert!(!stranger.can_access(owner));
        assert!(admin.can_access(owner));
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let store = MemoryStore::new();
        let jwt = jwt();
        let auth = AuthService::new(&store, &jwt);

        let user = auth
            .register(" Rina@Example.com ", "s3cure-pass", "Rina")
            .await
            .unwrap();
        assert_eq!(user.email.as_str(), "rina@example.com");
        assert_eq!(user.role, UserRole::Customer);

        let login = auth.login("rina@example.com", "s3cure-pass").await.unwrap();
        assert_eq!(login.role, UserRole::Customer);
        let caller = jwt.verify(&login.token).unwrap();
        assert_eq!(caller.id, user.id);
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        let jwt = jwt();
        let auth = AuthService::new(&store, &jwt);

        auth.register("dup@example.com", "password1", "A").await.unwrap();
        let err = auth
            .register("DUP@example.com", "password2", "B")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserAlreadyExists));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let store = MemoryStore::new();
        let jwt = jwt();
        let auth = AuthService::new(&store, &jwt);
        auth.register("budi@example.com", "password1", "Budi")
            .await
            .unwrap();

        let wrong_password = auth.login("budi@example.com", "password2").await;
        let unknown_user = auth.login("nobody@example.com", "password1").await;
        assert!(matches!(wrong_password, Err(AuthError::InvalidCredentials)));
        assert!(matches!(unknown_user, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_create_admin_account() {
        let store = MemoryStore::new();
        let admin = create_account(&store, "ops@example.com", "password1", "Ops", UserRole::Admin)
            .await
            .unwrap();
        assert!(admin.role.is_admin());
        assert!(matches!(
            create_account(&store, "x@example.com", "password1", "   ", UserRole::Admin).await,
            Err(AuthError::InvalidName(_))
        ));
    }
}
