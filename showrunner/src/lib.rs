//! Showrunner - the Clank Tank judging show pipeline
//!
//! Takes hackathon submissions from research to a broadcast-ready episode:
//!
//! - **Lifecycle**: forward-only status machine with contract assertions
//! - **Round 1**: four judges score each submission, one after another
//! - **Round 2**: community reactions become a cohort-normalized bonus and
//!   each judge gives a final verdict
//! - **Episodes**: generated scripts are validated, cast-repaired once and
//!   accepted or rejected
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Showrunner                           │
//! │                                                              │
//! │  ┌──────────┐   ┌──────────┐   ┌───────────┐   ┌──────────┐  │
//! │  │ Research │──▶│ Round 1  │──▶│ Synthesis │──▶│ Episode  │  │
//! │  └──────────┘   └──────────┘   └───────────┘   └────┬─────┘  │
//! │        │              │               │             │        │
//! │  ┌─────▼──────────────▼───────────────▼──┐    ┌─────▼─────┐  │
//! │  │              ShowStore                │    │   Gate    │  │
//! │  └───────────────────────────────────────┘    └───────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod episode;
pub mod generation;
pub mod leaderboard;
pub mod lifecycle;
pub mod producer;
pub mod round_one;
pub mod show;
pub mod store;
pub mod synthesis;
pub mod types;

// Re-export main types
pub use config::ShowConfig;
pub use episode::{EpisodeDraft, EpisodeGate, EpisodeReview, Violation};
pub use generation::GenerationClient;
pub use leaderboard::LeaderboardEntry;
pub use lifecycle::{LifecycleViolation, SubmissionStatus, Transition};
pub use show::Showrunner;
pub use store::{MemoryStore, ShowStore, StoreError};
pub use types::*;
