pub mod config;
pub mod stats;
pub mod store;
pub mod util;
