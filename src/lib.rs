//! Agora - the systems core of an opinion-clustering deliberation platform.
//!
//! This library provides notification scheduling, versioned result caching,
//! and cluster-assignment resolution over externally computed clustering
//! snapshots.

pub mod cache;
pub mod clock;
pub mod config;
pub mod notify;
pub mod resolver;
pub mod scheduler;
pub mod server;
pub mod store;
pub mod types;

#[cfg(test)]
pub mod test_utils;
