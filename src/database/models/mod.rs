pub mod assignment;
pub mod course;
pub mod lecture;
pub mod presentation;
pub mod refresh_token;
pub mod topic;
pub mod university;
pub mod user;

pub use assignment::Assignment;
pub use course::Course;
pub use lecture::Lecture;
pub use presentation::Presentation;
pub use refresh_token::RefreshToken;
pub use topic::Topic;
pub use university::University;
pub use user::{Role, User};
