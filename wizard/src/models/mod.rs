//! Domain models

pub mod agent;
pub mod deployment;
