//! Shared utilities

pub mod config;
pub mod context;
pub mod hash;
pub mod path_cache;
pub mod pathconv;
pub mod process;
pub mod strtools;

pub use config::Config;
pub use context::GlobalContext;
pub use path_cache::PathCache;
pub use process::ProcessRunner;
