pub mod prompt;
pub mod provider;
pub mod providers;

pub use prompt::{build_messages, NO_ANSWER};
pub use provider::{LlmError, LlmProvider, Message, Role};
pub use providers::create_provider;
