pub mod auth;
pub mod service;
pub mod universities;
