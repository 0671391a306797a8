//! Judging panel for the Clank Tank hackathon show
//!
//! This crate holds the pure judging domain: who the judges are, how they
//! weigh the four criteria, what they are asked, and how their replies become
//! score records.
//!
//! - **Judges**: a closed roster of four personas, each with a fixed weight vector
//! - **Prompts**: Round 1 evaluation and Round 2 verdict prompts
//! - **Parser**: tolerant extraction of scores and reasoning from free text
//! - **Scoring**: weighted totals, neutral fallbacks and verdict records
//! - **Community**: reaction tallies and cohort-normalized bonuses
//!
//! # Example
//!
//! ```
//! use panel::{Judge, ProjectFields, PromptAssembler, ScoringEngine};
//!
//! let project = ProjectFields::new("Agent Bazaar", "Agents hiring agents.");
//! let prompt = PromptAssembler::build_evaluation_prompt(Judge::Shaw, &project, None);
//! assert!(prompt.user.contains("TECHNICAL_SCORE"));
//!
//! let score = ScoringEngine::score_reply("sub-1", Judge::Shaw, "TECHNICAL_SCORE: 9");
//! assert_eq!(score.scores.technical_execution, 9);
//! ```

pub mod community;
pub mod judges;
pub mod parser;
pub mod prompt;
pub mod scoring;
pub mod types;
pub mod weights;

// Re-export main types
pub use community::{
    community_bonus, final_score, Cohort, ReactionCategory, ReactionEvent, ReactionTally,
    VotePolicy, MAX_COMMUNITY_BONUS,
};
pub use judges::{persona, PersonaProvider};
pub use parser::{parse_evaluation, ParsedEvaluation};
pub use prompt::{JudgePrompt, PromptAssembler};
pub use scoring::ScoringEngine;
pub use types::*;
pub use weights::{round2, weighted_total, WeightVector};
