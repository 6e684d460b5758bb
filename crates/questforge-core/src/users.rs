//! User registration and login against the storage layer.
//!
//! Credentials are stored as salted, iterated SHA-256 digests in per-user
//! JSON records under the "users" container. A short list of usernames is
//! reserved for admin and shared features.

use std::sync::Arc;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::errors::EngineError;
use crate::storage::FileStorage;

const USERS_CONTAINER: &str = "users";
const HASH_ITERATIONS: u32 = 10_000;
const RESTRICTED_USERNAMES: [&str; 5] = ["common", "admin", "administrator", "root", "shared"];

#[derive(Debug, Serialize, Deserialize)]
struct UserRecord {
    salt: String,
    hash: String,
}

pub struct UserService {
    storage: Arc<dyn FileStorage>,
}

impl UserService {
    pub fn new(storage: Arc<dyn FileStorage>) -> Self {
        Self { storage }
    }

    pub async fn user_exists(&self, username: &str) -> Result<bool, EngineError> {
        let record = self
            .storage
            .load_text_or_default(USERS_CONTAINER, &record_path(username))
            .await?;
        Ok(record.is_some())
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<(), EngineError> {
        let username = username.to_lowercase();
        if RESTRICTED_USERNAMES.contains(&username.as_str()) {
            return Err(EngineError::Validation(
                "this username is restricted, please choose another".to_string(),
            ));
        }
        if username.is_empty() || password.is_empty() {
            return Err(EngineError::Validation(
                "username and password must not be empty".to_string(),
            ));
        }
        if self.user_exists(&username).await? {
            return Err(EngineError::Validation(
                "a user already exists with this username, log in instead".to_string(),
            ));
        }

        let mut salt = [0u8; 16];
        rand::rng().fill_bytes(&mut salt);
        let record = UserRecord {
            salt: to_hex(&salt),
            hash: to_hex(&hash_password(password, &salt)),
        };

        self.storage
            .save_text(
                USERS_CONTAINER,
                &record_path(&username),
                &serde_json::to_string(&record)?,
            )
            .await
    }

    /// Verify a username/password pair. Unknown users and wrong passwords
    /// both come back as `false`.
    pub async fn login(&self, username: &str, password: &str) -> Result<bool, EngineError> {
        let username = username.to_lowercase();
        let Some(json) = self
            .storage
            .load_text_or_default(USERS_CONTAINER, &record_path(&username))
            .await?
        else {
            return Ok(false);
        };

        let record: UserRecord = serde_json::from_str(&json)?;
        let salt = from_hex(&record.salt)
            .ok_or_else(|| EngineError::Parsing("corrupt salt in user record".to_string()))?;
        let computed = to_hex(&hash_password(password, &salt));
        Ok(computed == record.hash)
    }
}

fn record_path(username: &str) -> String {
    format!("{}.json", username)
}

fn hash_password(password: &str, salt: &[u8]) -> [u8; 32] {
    let mut digest = Sha256::new()
        .chain_update(salt)
        .chain_update(password.as_bytes())
        .finalize();
    for _ in 1..HASH_ITERATIONS {
        digest = Sha256::digest(&digest);
    }
    digest.into()
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn from_hex(text: &str) -> Option<Vec<u8>> {
    if text.len() % 2 != 0 {
        return None;
    }
    (0..text.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&text[i..i + 2], 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStorage;

    fn service() -> UserService {
        UserService::new(Arc::new(MemoryStorage::new()))
    }

    #[tokio::test]
    async fn register_and_login_round_trip() {
        let service = service();
        service.register("Aria", "hunter2").await.unwrap();

        assert!(service.login("aria", "hunter2").await.unwrap());
        // Usernames are case-insensitive.
        assert!(service.login("ARIA", "hunter2").await.unwrap());
        assert!(!service.login("aria", "wrong").await.unwrap());
    }

    #[tokio::test]
    async fn unknown_user_fails_login() {
        let service = service();
        assert!(!service.login("nobody", "password").await.unwrap());
    }

    #[tokio::test]
    async fn restricted_usernames_are_rejected() {
        let service = service();
        let err = service.register("Admin", "password").await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let service = service();
        service.register("aria", "hunter2").await.unwrap();
        let err = service.register("aria", "other").await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn hex_round_trip() {
        let bytes = [0u8, 1, 0xab, 0xff];
        assert_eq!(from_hex(&to_hex(&bytes)).unwrap(), bytes);
        assert!(from_hex("abc").is_none());
        assert!(from_hex("zz").is_none());
    }
}
