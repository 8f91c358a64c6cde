pub mod cases;
pub mod common;
pub mod completions;
pub mod config;
pub mod export;
pub mod inventory;
pub mod open;
pub mod pending;
pub mod status;
pub mod sync;
pub mod watch;
