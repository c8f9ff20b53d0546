mod auth_service;
mod permission;
mod token_generator;

pub use auth_service::*;
pub use permission::*;
pub use token_generator::*;
