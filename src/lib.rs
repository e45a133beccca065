pub mod auth;
pub mod backend;
pub mod config;
pub mod dataset;
pub mod output;
pub mod query;
pub mod ranking;
pub mod server;
