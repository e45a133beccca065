pub mod auth;
pub mod gaokao;
pub mod health;
pub mod proxy;
pub mod rank;
