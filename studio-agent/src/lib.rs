//! Studio Agent - generation backends for the Clank Tank show
//!
//! Every judge reply, verdict and episode script comes from a
//! [`GenerationBackend`]. The show pipeline only ever talks to this trait, so
//! a scripted [`MockBackend`] can stand in for the real model in tests.
//!
//! # Example
//!
//! ```
//! use studio_agent::{GenerationBackend, GenerationPurpose, GenerationRequest, MockBackend};
//!
//! # tokio_test::block_on(async {
//! let backend = MockBackend::new("judge-model").with_response("INNOVATION_SCORE: 8");
//! let request = GenerationRequest::user("Score this project")
//!     .for_purpose(GenerationPurpose::Scoring);
//!
//! let generation = backend.generate(request).await.unwrap();
//! assert_eq!(generation.content, "INNOVATION_SCORE: 8");
//! # });
//! ```

pub mod backend;

// Re-export main types for convenience
pub use backend::{
    FinishReason, Generation, GenerationBackend, GenerationError, GenerationPurpose,
    GenerationRequest, Message, MessageRole, MockBackend, MockReply, OpenAiBackend,
    ResponseFormat, Usage,
};
