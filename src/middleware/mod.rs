pub mod auth;
pub mod response;
pub mod university;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use response::{ApiResponse, ApiResult};
pub use university::{requested_university, university_middleware, UniversityContext};
