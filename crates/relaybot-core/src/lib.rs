pub mod config;
pub mod error;
pub mod markdown;
pub mod types;

pub use config::RelayConfig;
pub use error::RelayError;
pub use types::{ChatId, InboundMessage, Model, UserId};
