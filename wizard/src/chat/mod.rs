//! Agent chat demo

pub mod session;
