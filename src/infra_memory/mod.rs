mod sweeper;
mod token_store_memory;
mod ttl_cache;

pub use sweeper::*;
pub use token_store_memory::*;
pub use ttl_cache::*;
