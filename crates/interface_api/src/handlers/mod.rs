//! Request handlers

pub mod commissions;
pub mod health;
