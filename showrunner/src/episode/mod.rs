//! Episode format enforcement.
//!
//! Generated episode scripts must follow a fixed seven-scene template with
//! fixed casts. The [`EpisodeGate`] validates a draft, repairs scene casts
//! once, and validates again before accepting or rejecting it.

pub mod contract;
pub mod gate;
pub mod repair;
pub mod types;
pub mod validator;

pub use contract::{CastRoster, SceneKind, VerdictToken};
pub use gate::{EpisodeGate, EpisodeReview};
pub use repair::{dialogue_fingerprint, repair_casts, RepairedScene};
pub use types::{DialogueLine, EpisodeDraft, Scene};
pub use validator::{EpisodeValidator, Violation, ViolationKind, SCENE_COUNT};
