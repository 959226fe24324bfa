pub mod aggregator;
pub mod cli;
pub mod commands;
pub mod counter;
pub mod error;
pub mod fanout;
pub mod logging;
pub mod ranking;
pub mod settings;
pub mod slack;

pub use cli::{Cli, Commands};
pub use error::{AppError, Result};

pub fn load_token() -> Result<String> {
    std::env::var("SLACK_TOKEN")
        .ok()
        .filter(|token| !token.is_empty())
        .ok_or(AppError::MissingToken)
}
