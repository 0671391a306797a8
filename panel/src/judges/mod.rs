//! Judge personas.
//!
//! Each judge provides a weight vector, a judging focus and a system prompt
//! fragment that keeps its replies in character.

pub mod marc;
pub mod peepo;
pub mod shaw;
pub mod spartan;

pub use marc::MarcPersona;
pub use peepo::PeepoPersona;
pub use shaw::ShawPersona;
pub use spartan::SpartanPersona;

use crate::types::Judge;
use crate::weights::WeightVector;

/// Trait for judge-specific persona content.
pub trait PersonaProvider: Send + Sync {
    /// The judge this persona belongs to
    fn judge(&self) -> Judge;

    /// Fixed weight vector for this judge
    fn weights(&self) -> WeightVector;

    /// One-line description of what this judge looks for
    fn focus(&self) -> &'static str;

    /// Persona fragment for the system prompt
    fn prompt_fragment(&self) -> String;
}

/// Persona provider for a judge.
pub fn persona(judge: Judge) -> &'static dyn PersonaProvider {
    match judge {
        Judge::Marc => &MarcPersona,
        Judge::Shaw => &ShawPersona,
        Judge::Spartan => &SpartanPersona,
        Judge::Peepo => &PeepoPersona,
    }
}

impl Judge {
    /// Fixed weight vector for this judge.
    pub fn weights(&self) -> WeightVector {
        persona(*self).weights()
    }
}
