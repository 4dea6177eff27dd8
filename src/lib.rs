pub mod config;
pub mod conversation;
pub mod errors;
pub mod logging;
pub mod search;
pub mod session;
pub mod ui;
