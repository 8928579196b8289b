//! In-memory caches

pub mod sessions;
