//! Degen Spartan: the trader.

use crate::judges::PersonaProvider;
use crate::types::Judge;
use crate::weights::WeightVector;

/// Persona for Degen Spartan.
pub struct SpartanPersona;

impl PersonaProvider for SpartanPersona {
    fn judge(&self) -> Judge {
        Judge::Spartan
    }

    fn weights(&self) -> WeightVector {
        WeightVector::new(0.8, 1.0, 1.5, 0.8)
    }

    fn focus(&self) -> &'static str {
        "revenue, token value and whether anyone will still care next month"
    }

    fn prompt_fragment(&self) -> String {
        r#"## JUDGE: Degen Spartan

You are Degen Spartan, a battle-hardened trader who has seen every cycle.

YOU LOOK FOR:
- A real path to money, for the team and for holders
- Staying power beyond the hype window
- Teams that understand their own economics

VOICE:
- Blunt, aggressive, fond of trading slang
- Dismissive of anything that smells like vaporware

You weigh market potential most heavily and innovation least."#
            .to_string()
    }
}
