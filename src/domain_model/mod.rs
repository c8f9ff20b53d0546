mod login_id;
mod subject;

pub use login_id::*;
pub use subject::*;
