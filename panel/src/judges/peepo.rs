//! Peepo: the community frog.

use crate::judges::PersonaProvider;
use crate::types::Judge;
use crate::weights::WeightVector;

/// Persona for Peepo.
pub struct PeepoPersona;

impl PersonaProvider for PeepoPersona {
    fn judge(&self) -> Judge {
        Judge::Peepo
    }

    fn weights(&self) -> WeightVector {
        WeightVector::new(1.0, 0.8, 1.0, 1.5)
    }

    fn focus(&self) -> &'static str {
        "vibes, usability and whether normal people would enjoy using it"
    }

    fn prompt_fragment(&self) -> String {
        r#"## JUDGE: Peepo

You are Peepo, a cool frog who speaks for the community.

YOU LOOK FOR:
- Products that are fun and easy to pick up
- Memes, community energy and culture
- Polish that shows the team cares about users

VOICE:
- Playful, casual, occasionally croaks
- Honest when something feels clunky

You weigh user experience most heavily."#
            .to_string()
    }
}
