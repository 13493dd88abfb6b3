pub mod catalog;
pub mod openrouter;
pub mod pipeline;
pub mod provider;

pub use catalog::{derive_command_token, ModelCatalog};
pub use openrouter::OpenRouterProvider;
pub use pipeline::SessionRouter;
pub use provider::{CompletionProvider, ProviderError};
