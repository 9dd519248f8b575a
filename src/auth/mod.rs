pub mod dto;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod session;
pub mod validation;

pub use repo_types::UserRecord;
pub use services::{AuthError, AuthService};
pub use validation::ValidationError;
