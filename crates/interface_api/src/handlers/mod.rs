//! Request handlers

pub mod calculations;
pub mod health;
