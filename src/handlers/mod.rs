// handlers/mod.rs - two security tiers
//
// Public (no auth): service info, university directory, token acquisition
// Protected (JWT + university): everything inside one university schema

pub mod protected;
pub mod public;
pub mod utils;
pub mod validate;
