//! Admin credentials.

use crate::repository::{PollRepository, RepoError};
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use once_cell::sync::Lazy;

static ARGON2: Lazy<Argon2<'static>> = Lazy::new(Argon2::default);

pub fn get_argon2() -> &'static Argon2<'static> {
    &ARGON2
}

/// Hashes a password into a PHC string with a fresh salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(get_argon2()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// False for a wrong password and for a malformed stored hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => get_argon2()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            log::error!("Stored password hash is malformed: {}", e);
            false
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum LoginResultStatus {
    Success,
    BadName,
    BadPassword,
}

#[derive(Debug)]
pub struct LoginResult {
    pub result: LoginResultStatus,
    pub user_id: Option<i32>,
    pub username: Option<String>,
}

impl LoginResult {
    fn success(user_id: i32, username: String) -> Self {
        Self {
            result: LoginResultStatus::Success,
            user_id: Some(user_id),
            username: Some(username),
        }
    }

    fn fail(result: LoginResultStatus) -> Self {
        Self {
            result,
            user_id: None,
            username: None,
        }
    }
}

pub async fn login(
    repo: &dyn PollRepository,
    name: &str,
    pass: &str,
) -> Result<LoginResult, RepoError> {
    let admin = match repo.get_admin_by_name(name).await? {
        Some(admin) => admin,
        None => return Ok(LoginResult::fail(LoginResultStatus::BadName)),
    };

    if !verify_password(pass, &admin.password_hash) {
        return Ok(LoginResult::fail(LoginResultStatus::BadPassword));
    }

    Ok(LoginResult::success(admin.id, admin.username))
}

/// Creates an admin account or resets the password of an existing one.
pub async fn create_admin(
    repo: &dyn PollRepository,
    name: &str,
    pass: &str,
) -> Result<i32, anyhow::Error> {
    let hash = hash_password(pass).map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e))?;
    let admin = repo.save_admin(name, &hash).await?;
    Ok(admin.id)
}
