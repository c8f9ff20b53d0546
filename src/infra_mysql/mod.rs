mod janitor;
mod token_store_mysql;

pub use janitor::*;
pub use token_store_mysql::*;
