pub mod manager;
pub mod models;
pub mod named_params;

pub use manager::{DatabaseError, DatabaseManager};
pub use named_params::{query_university, sql_with_named_params, NamedQuery};
