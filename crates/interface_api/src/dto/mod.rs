//! Request and response DTOs

pub mod commission;
