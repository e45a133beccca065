use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use rand_core::{OsRng, RngCore};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info};

use super::password::{hash_password, verify_password, HASH_COST};
use super::types::{Credentials, PublicUser, User, UserFile, MIN_PASSWORD_LEN};

#[derive(Error, Debug)]
pub enum CreateUserError {
    #[error("username '{0}' is already taken")]
    UsernameTaken(String),
    #[error("email '{0}' is already registered")]
    EmailTaken(String),
    #[error("invalid account details: {}", .0.join("; "))]
    Invalid(Vec<String>),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Load the user file. A missing file is an empty store.
pub fn load_user_file(path: &Path) -> Result<UserFile> {
    if !path.exists() {
        return Ok(UserFile::new());
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open user store at {}", path.display()))?;

    let users: UserFile = serde_json::from_reader(file)
        .with_context(|| format!("Failed to load user store at {}", path.display()))?;

    if users.version != 1 {
        anyhow::bail!("Unsupported user store version: {}", users.version);
    }

    Ok(users)
}

/// Write the user file atomically, creating its directory if needed
pub fn save_user_file(path: &Path, users: &UserFile) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    serde_json::to_writer_pretty(&mut file, users).context("Failed to serialize user store")?;

    file.commit().context("Failed to save user store")?;

    Ok(())
}

fn new_user_id() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Accounts backed by a JSON file.
///
/// `users` is the in-memory copy and is never held across an await.
/// `writer` serializes file writes, which run on the blocking pool.
pub struct UserStore {
    path: PathBuf,
    cost: u32,
    users: Mutex<UserFile>,
    writer: AsyncMutex<()>,
}

impl UserStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with_cost(path, HASH_COST)
    }

    /// Open with a custom bcrypt cost (tests use the minimum)
    pub fn open_with_cost(path: impl Into<PathBuf>, cost: u32) -> Result<Self> {
        let path = path.into();
        let users = load_user_file(&path)?;
        debug!(path = %path.display(), count = users.users.len(), "loaded user store");
        Ok(Self {
            path,
            cost,
            users: Mutex::new(users),
            writer: AsyncMutex::new(()),
        })
    }

    fn lock(&self) -> MutexGuard<'_, UserFile> {
        self.users.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.lock().users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find_by_username(&self, username: &str) -> Option<User> {
        self.lock()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned()
    }

    pub fn find_by_id(&self, id: &str) -> Option<User> {
        self.lock().users.iter().find(|u| u.id == id).cloned()
    }

    fn check_unique(users: &UserFile, username: &str, email: &str) -> Result<(), CreateUserError> {
        if users.users.iter().any(|u| u.username == username) {
            return Err(CreateUserError::UsernameTaken(username.to_string()));
        }
        if users.users.iter().any(|u| u.email.eq_ignore_ascii_case(email)) {
            return Err(CreateUserError::EmailTaken(email.to_string()));
        }
        Ok(())
    }

    /// Create and persist an account with a bcrypt-hashed password
    pub async fn create_user(
        &self,
        name: &str,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<PublicUser, CreateUserError> {
        let username = username.trim();
        let email = email.trim();

        let mut problems = Vec::new();
        if username.is_empty() {
            problems.push("username: required".to_string());
        }
        if !email.contains('@') {
            problems.push(format!("email: '{}' is not an email address", email));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            problems.push(format!(
                "password: must be at least {} characters",
                MIN_PASSWORD_LEN
            ));
        }
        if !problems.is_empty() {
            return Err(CreateUserError::Invalid(problems));
        }

        Self::check_unique(&self.lock(), username, email)?;

        let hash = hash_password(password.to_string(), self.cost).await?;

        let user = User {
            id: new_user_id(),
            name: name.trim().to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password: hash,
        };

        let _writer = self.writer.lock().await;
        let next = {
            let users = self.lock();
            // Another caller may have taken the name while we were hashing
            Self::check_unique(&users, username, email)?;
            let mut next = users.clone();
            next.users.push(user.clone());
            next
        };

        let path = self.path.clone();
        let saved = tokio::task::spawn_blocking(move || save_user_file(&path, &next).map(|()| next))
            .await
            .context("User store write task failed")??;
        *self.lock() = saved;

        info!(username = %user.username, "created user");
        Ok(PublicUser::from(&user))
    }

    /// Check credentials. Unknown users and wrong passwords are `None`.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<Option<PublicUser>> {
        if credentials.validate().is_err() {
            return Ok(None);
        }

        let Some(user) = self.find_by_username(credentials.username.trim()) else {
            debug!(username = %credentials.username, "sign-in for unknown user");
            return Ok(None);
        };

        if verify_password(credentials.password.clone(), user.password.clone()).await? {
            Ok(Some(PublicUser::from(&user)))
        } else {
            debug!(username = %user.username, "sign-in with wrong password");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(username: &str, password: &str) -> Credentials {
        Credentials {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    fn temp_store() -> (tempfile::TempDir, UserStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = UserStore::open_with_cost(dir.path().join("users.json"), 4).unwrap();
        (dir, store)
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let (_dir, store) = temp_store();
        assert!(store.is_empty());
    }

    #[test]
    fn test_unsupported_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, r#"{"version":2,"users":[]}"#).unwrap();
        let err = load_user_file(&path).unwrap_err();
        assert!(err.to_string().contains("Unsupported user store version"));
    }

    #[tokio::test]
    async fn test_create_user_persists() {
        let (dir, store) = temp_store();
        let user = store
            .create_user("Admin", "admin", "admin@example.com", "secret1")
            .await
            .unwrap();
        assert_eq!(user.username, "admin");
        assert_eq!(user.id.len(), 32);

        let reopened = UserStore::open(dir.path().join("users.json")).unwrap();
        let stored = reopened.find_by_username("admin").unwrap();
        assert_eq!(stored.id, user.id);
        assert_ne!(stored.password, "secret1");
        assert!(reopened.find_by_id(&user.id).is_some());
    }

    #[tokio::test]
    async fn test_create_user_in_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("users.json");
        let store = UserStore::open_with_cost(&path, 4).unwrap();
        store
            .create_user("A", "a", "a@example.com", "12345")
            .await
            .unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_duplicate_username_and_email() {
        let (_dir, store) = temp_store();
        store
            .create_user("Admin", "admin", "admin@example.com", "secret1")
            .await
            .unwrap();

        let err = store
            .create_user("Other", "admin", "other@example.com", "secret1")
            .await
            .unwrap_err();
        assert!(matches!(err, CreateUserError::UsernameTaken(_)));

        let err = store
            .create_user("Other", "other", "ADMIN@example.com", "secret1")
            .await
            .unwrap_err();
        assert!(matches!(err, CreateUserError::EmailTaken(_)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_creates_all_persist() {
        let (dir, store) = temp_store();
        let (a, b, c) = tokio::join!(
            store.create_user("A", "alice", "alice@example.com", "secret1"),
            store.create_user("B", "bob", "bob@example.com", "secret1"),
            store.create_user("C", "carol", "carol@example.com", "secret1"),
        );
        a.unwrap();
        b.unwrap();
        c.unwrap();
        assert_eq!(store.len(), 3);

        let reopened = UserStore::open(dir.path().join("users.json")).unwrap();
        assert_eq!(reopened.len(), 3);
        for name in ["alice", "bob", "carol"] {
            assert!(reopened.find_by_username(name).is_some(), "{} missing", name);
        }
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_create_keeps_one() {
        let (dir, store) = temp_store();
        let (a, b) = tokio::join!(
            store.create_user("A", "admin", "a@example.com", "secret1"),
            store.create_user("B", "admin", "b@example.com", "secret1"),
        );
        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
        let err = a.err().or(b.err()).unwrap();
        assert!(matches!(err, CreateUserError::UsernameTaken(_)));

        let reopened = UserStore::open(dir.path().join("users.json")).unwrap();
        assert_eq!(reopened.len(), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the parent directory should be
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, "x").unwrap();
        let store = UserStore::open_with_cost(blocker.join("users.json"), 4).unwrap();

        let err = store
            .create_user("A", "a", "a@example.com", "12345")
            .await
            .unwrap_err();
        assert!(matches!(err, CreateUserError::Other(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_create_user_validation() {
        let (_dir, store) = temp_store();
        let err = store.create_user("", " ", "nope", "123").await.unwrap_err();
        match err {
            CreateUserError::Invalid(problems) => assert_eq!(problems.len(), 3),
            other => panic!("unexpected error: {}", other),
        }
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_authenticate() {
        let (_dir, store) = temp_store();
        store
            .create_user("Admin", "admin", "admin@example.com", "secret1")
            .await
            .unwrap();

        let user = store.authenticate(&creds("admin", "secret1")).await.unwrap();
        assert_eq!(user.map(|u| u.email), Some("admin@example.com".to_string()));

        assert!(store.authenticate(&creds("admin", "secret2")).await.unwrap().is_none());
        assert!(store.authenticate(&creds("nobody", "secret1")).await.unwrap().is_none());
        assert!(store.authenticate(&creds("admin", "123")).await.unwrap().is_none());
    }
}
