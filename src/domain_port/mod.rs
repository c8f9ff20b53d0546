// store

mod token_store;

pub use token_store::*;

// collaborators

mod authorization_info;
mod request_context;

pub use authorization_info::*;
pub use request_context::*;
