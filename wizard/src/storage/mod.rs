//! Local storage

pub mod layout;
pub mod receipts;
pub mod settings;
