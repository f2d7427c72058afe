//! bcrypt hashing run on the blocking pool.

use tokio::task;
use zeroize::Zeroizing;

use crate::domain::ports::UserPersistenceError;

/// Work factor applied to stored password hashes.
pub(crate) const BCRYPT_COST: u32 = 12;

/// Hash `password` with `cost` without stalling the async executor.
pub(crate) async fn hash_password(
    password: &str,
    cost: u32,
) -> Result<String, UserPersistenceError> {
    let secret = Zeroizing::new(password.to_owned());
    task::spawn_blocking(move || bcrypt::hash(secret.as_str(), cost))
        .await
        .map_err(|err| UserPersistenceError::query(format!("hashing task failed: {err}")))?
        .map_err(|err| UserPersistenceError::query(format!("password hashing failed: {err}")))
}

/// Check `password` against a stored hash.
///
/// A malformed stored hash is reported as a query failure, not a mismatch.
pub(crate) async fn verify_password(
    password: &str,
    hashed: String,
) -> Result<bool, UserPersistenceError> {
    let secret = Zeroizing::new(password.to_owned());
    task::spawn_blocking(move || bcrypt::verify(secret.as_str(), hashed.trim_end()))
        .await
        .map_err(|err| UserPersistenceError::query(format!("verify task failed: {err}")))?
        .map_err(|err| UserPersistenceError::query(format!("stored hash unreadable: {err}")))
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    // The minimum cost keeps these tests fast; production uses BCRYPT_COST.
    const TEST_COST: u32 = 4;

    #[rstest]
    #[tokio::test]
    async fn hashes_verify_against_original_password() {
        let hashed = hash_password("pa55word", TEST_COST).await.expect("hash");
        assert_eq!(hashed.len(), 60);
        assert!(verify_password("pa55word", hashed.clone()).await.expect("verify"));
        assert!(!verify_password("wrong-password", hashed).await.expect("verify"));
    }

    #[rstest]
    #[tokio::test]
    async fn malformed_hash_is_an_error() {
        let result = verify_password("pa55word", "not-a-hash".to_owned()).await;
        assert!(matches!(result, Err(UserPersistenceError::Query { .. })));
    }
}
