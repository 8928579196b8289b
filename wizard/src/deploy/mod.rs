//! Deployment workflow

pub mod fsm;
pub mod gateway;
