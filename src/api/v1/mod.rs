mod context;
mod error;
mod handler;
mod router;

pub use context::HeaderRequestContext;
pub use error::{ApiErrorCode, recover_error};
pub use handler::ApiResponse;
pub use router::{authenticated, authorized, routes};
