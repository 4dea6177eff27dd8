//! CLI command implementations.
//!
//! | Module   | Commands handled       |
//! |----------|------------------------|
//! | `chat`   | `Chat` (the default)   |
//! | `search` | `Search`               |
//! | `config` | `Config`               |

pub mod chat;
pub mod config;
pub mod search;

pub use chat::cmd_chat;
pub use config::cmd_config;
pub use search::{SearchArgs, cmd_search};
