//! Generation backend abstraction layer.
//!
//! Provides a trait-based interface over the model that writes judge replies
//! and episode scripts:
//! - OpenAI-compatible chat completions (OpenRouter, vLLM, Ollama, etc.)
//! - Mock backend for testing

pub mod mock;
pub mod openai;
pub mod traits;

pub use mock::{MockBackend, MockReply};
pub use openai::OpenAiBackend;
pub use traits::{
    FinishReason, Generation, GenerationBackend, GenerationError, GenerationPurpose,
    GenerationRequest, Message, MessageRole, ResponseFormat, Usage,
};
