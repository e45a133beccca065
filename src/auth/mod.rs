//! Credential sign-in: bcrypt-hashed accounts in a JSON file and
//! in-memory bearer-token sessions.

pub mod password;
pub mod session;
pub mod store;
pub mod types;

pub use session::SessionStore;
pub use store::{CreateUserError, UserStore};
pub use types::{Credentials, PublicUser, Session, User};
