//! HTTP middleware

pub mod logging;
