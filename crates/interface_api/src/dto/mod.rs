//! Request and response bodies

pub mod calculation;
