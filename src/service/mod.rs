pub mod adapter;
pub mod capability;
pub mod config;
pub mod fallback;
pub mod server;
