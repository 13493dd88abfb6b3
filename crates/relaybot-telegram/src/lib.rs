pub mod adapter;
pub mod error;
pub mod handler;
pub mod send;

pub use adapter::TelegramAdapter;
pub use error::TelegramError;
pub use send::TelegramMessenger;
