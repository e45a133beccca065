use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimum password length accepted at sign-in and account creation
pub const MIN_PASSWORD_LEN: usize = 5;

/// Stored account. `password` is a bcrypt hash, never plaintext.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Account as shown to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

/// On-disk user store layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserFile {
    pub version: u32,
    #[serde(default)]
    pub users: Vec<User>,
}

impl UserFile {
    pub fn new() -> Self {
        Self {
            version: 1,
            users: Vec::new(),
        }
    }
}

impl Default for UserFile {
    fn default() -> Self {
        Self::new()
    }
}

/// Sign-in request body
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    /// Returns all problems at once
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if self.username.trim().is_empty() {
            errors.push("username: required".to_string());
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(format!(
                "password: must be at least {} characters",
                MIN_PASSWORD_LEN
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Issued sign-in session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub token: String,
    pub user: PublicUser,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
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

    #[test]
    fn test_credentials_validate() {
        assert!(creds("admin", "12345").validate().is_ok());
        assert_eq!(
            creds("admin", "1234").validate().unwrap_err(),
            vec!["password: must be at least 5 characters"]
        );
        assert_eq!(creds("  ", "").validate().unwrap_err().len(), 2);
    }

    #[test]
    fn test_password_length_counts_characters() {
        // Five CJK characters are fifteen bytes but still five characters
        assert!(creds("学生", "一二三四五").validate().is_ok());
        assert!(creds("学生", "一二三四").validate().is_err());
    }

    #[test]
    fn test_public_user_hides_hash() {
        let user = User {
            id: "u1".into(),
            name: "Admin".into(),
            username: "admin".into(),
            email: "admin@example.com".into(),
            password: "$2b$10$hash".into(),
        };
        let public = serde_json::to_value(PublicUser::from(&user)).unwrap();
        assert!(public.get("password").is_none());
        assert_eq!(public["username"], "admin");
    }

    #[test]
    fn test_user_file_defaults() {
        let file: UserFile = serde_json::from_str(r#"{"version":1}"#).unwrap();
        assert_eq!(file.version, 1);
        assert!(file.users.is_empty());
    }
}
