//! Marketplace API client

pub mod agents;
pub mod chat;
pub mod client;
pub mod deployments;
