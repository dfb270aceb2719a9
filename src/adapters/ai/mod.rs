//! Reasoning capability adapters.
//!
//! - `OpenAIProvider` - chat completions with function tools
//! - `AnthropicProvider` - messages API with tool_use blocks
//! - `MockAIProvider` - scripted replies for tests
//! - `ProviderResolver` - per-request provider selection

mod anthropic_provider;
mod mock_provider;
mod openai_provider;
mod provider_resolver;

pub use anthropic_provider::{AnthropicConfig, AnthropicProvider};
pub use mock_provider::{MockAIProvider, MockError, MockResponse};
pub use openai_provider::{OpenAIConfig, OpenAIProvider};
pub use provider_resolver::{FixedResolver, ProviderResolver};
