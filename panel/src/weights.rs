//! Weighted scoring.
//!
//! Each judge converts four raw criterion scores into one weighted total
//! using its own weight vector. Weights encode emphasis and need not sum to 1.

use crate::types::{CriterionScores, PerCriterion};

/// Per-criterion multipliers for one judge.
pub type WeightVector = PerCriterion<f64>;

impl WeightVector {
    /// Build a weight vector in reply order.
    pub const fn new(innovation: f64, technical: f64, market: f64, experience: f64) -> Self {
        Self {
            innovation,
            technical_execution: technical,
            market_potential: market,
            user_experience: experience,
        }
    }

    /// Every criterion weighted equally.
    pub const fn uniform() -> Self {
        Self::new(1.0, 1.0, 1.0, 1.0)
    }

    /// Highest total reachable with these weights.
    pub fn max_total(&self) -> f64 {
        weighted_total(&CriterionScores::from_fn(|_| crate::types::MAX_CRITERION_SCORE), self)
    }
}

/// Compute `Σ score[c] * weight[c]`, rounded to 2 decimals.
pub fn weighted_total(scores: &CriterionScores, weights: &WeightVector) -> f64 {
    let sum: f64 = scores
        .iter()
        .map(|(criterion, score)| f64::from(*score) * weights.get(criterion))
        .sum();
    round2(sum)
}

/// Round to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_innovation_heavy_example() {
        let weights = WeightVector::new(1.5, 1.0, 1.0, 1.0);
        let scores = CriterionScores::clamped(7, 6, 5, 8);
        assert_eq!(weighted_total(&scores, &weights), 29.5);
    }

    #[test]
    fn test_rounding_to_two_decimals() {
        let weights = WeightVector::new(1.333, 0.0, 0.0, 0.0);
        let scores = CriterionScores::clamped(7, 0, 0, 0);
        // 7 * 1.333 = 9.331
        assert_eq!(weighted_total(&scores, &weights), 9.33);
    }

    #[test]
    fn test_deterministic_across_calls() {
        let weights = WeightVector::new(1.2, 0.8, 1.5, 1.0);
        let scores = CriterionScores::clamped(3, 9, 4, 6);
        let first = weighted_total(&scores, &weights);
        for _ in 0..10 {
            assert_eq!(weighted_total(&scores, &weights), first);
        }
    }

    #[test]
    fn test_max_total() {
        assert_eq!(WeightVector::uniform().max_total(), 40.0);
    }
}
