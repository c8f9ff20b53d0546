//! Settings come from a TOML file, `settings/dev.toml` in debug builds and
//! `settings/release.toml` otherwise. See `bin/settings_demo.rs`.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
