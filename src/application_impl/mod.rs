mod auth_service_impl;
mod permission_gate;
mod token_generator_impl;

pub use auth_service_impl::*;
pub use permission_gate::*;
pub use token_generator_impl::*;
