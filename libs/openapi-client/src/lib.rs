//! Marketplace API client models

pub mod models;
