//! Deployment wizard library
//!
//! Framework-independent controller for configuring and deploying marketplace
//! agents: the configuration draft, the step state machine, and the gateway
//! that performs the deployment request.

pub mod cache;
pub mod chat;
pub mod deploy;
pub mod errors;
pub mod filesys;
pub mod http;
pub mod logs;
pub mod models;
pub mod storage;
pub mod utils;
