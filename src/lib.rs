//! Project Management Client
//!
//! Client-side state synchronization for the project management backend:
//! REST fetchers, session persistence in local SQLite storage, and a push
//! channel for live notifications.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod push;
pub mod state;
pub mod sync;
pub mod view;

pub use config::Config;
pub use errors::ClientError;
pub use sync::{SyncClient, SyncReport};

#[cfg(test)]
mod tests;
