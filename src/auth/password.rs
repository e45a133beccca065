use anyhow::{Context, Result};

/// bcrypt work factor for stored passwords
pub const HASH_COST: u32 = 10;

fn hash_password_sync(password: &str, cost: u32) -> Result<String> {
    bcrypt::hash(password, cost).context("Failed to hash password")
}

fn verify_password_sync(password: &str, hash: &str) -> bool {
    // A corrupt stored hash is a failed sign-in, not a server error
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// Hash on the blocking pool so the runtime keeps serving requests
pub async fn hash_password(password: String, cost: u32) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password_sync(&password, cost))
        .await
        .context("Password hashing task failed")?
}

pub async fn verify_password(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify_password_sync(&password, &hash))
        .await
        .context("Password verification task failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hash = hash_password("secret".to_string(), 4).await.unwrap();
        assert!(hash.starts_with("$2"));
        assert!(verify_password("secret".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_password("wrong".to_string(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_default_cost_is_recorded_in_hash() {
        let hash = hash_password("secret".to_string(), HASH_COST).await.unwrap();
        assert!(hash.contains("$10$"));
    }

    #[tokio::test]
    async fn test_corrupt_hash_does_not_verify() {
        assert!(!verify_password("secret".to_string(), "not-a-hash".to_string())
            .await
            .unwrap());
    }
}
