use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::breeds::{limits_for, BreedLimits};

/// Random perturbation applied on top of the parent average, per trait.
const PERTURBATION: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBlock {
    pub friendliness: i32,
    pub playfulness: i32,
    pub energy: i32,
    pub loyalty: i32,
    pub curiosity: i32,
}

impl StatBlock {
    pub fn uniform(value: i32) -> Self {
        Self {
            friendliness: value,
            playfulness: value,
            energy: value,
            loyalty: value,
            curiosity: value,
        }
    }

    pub fn values(&self) -> [i32; 5] {
        [
            self.friendliness,
            self.playfulness,
            self.energy,
            self.loyalty,
            self.curiosity,
        ]
    }
}

/// Derives a baby's five traits from its parents: per trait, the parent
/// average plus a uniform perturbation in [-10, +10], clamped to the
/// breed's configured range.
pub fn generate_baby_stats(mother: &StatBlock, father: &StatBlock, breed: &str) -> StatBlock {
    let limits = limits_for(breed);
    let mut rng = rand::thread_rng();
    let mut derive = |m: i32, f: i32, range: crate::breeds::TraitRange| {
        let average = (m + f) as f64 / 2.0;
        let wobble = rng.gen_range(-PERTURBATION..=PERTURBATION);
        range.clamp((average + wobble as f64).round() as i32)
    };

    let stats = StatBlock {
        friendliness: derive(mother.friendliness, father.friendliness, limits.friendliness),
        playfulness: derive(mother.playfulness, father.playfulness, limits.playfulness),
        energy: derive(mother.energy, father.energy, limits.energy),
        loyalty: derive(mother.loyalty, father.loyalty, limits.loyalty),
        curiosity: derive(mother.curiosity, father.curiosity, limits.curiosity),
    };

    // Second pass through the same limits. Redundant today, but it keeps
    // the result bounded even if the derivation above ever changes.
    enforce_breed_limits(&stats, breed)
}

/// Re-clamps a full stat block against the breed configuration. Also called
/// by the litter validation pipeline as an independent enforcement pass.
pub fn enforce_breed_limits(stats: &StatBlock, breed: &str) -> StatBlock {
    clamp_to(stats, &limits_for(breed))
}

fn clamp_to(stats: &StatBlock, limits: &BreedLimits) -> StatBlock {
    StatBlock {
        friendliness: limits.friendliness.clamp(stats.friendliness),
        playfulness: limits.playfulness.clamp(stats.playfulness),
        energy: limits.energy.clamp(stats.energy),
        loyalty: limits.loyalty.clamp(stats.loyalty),
        curiosity: limits.curiosity.clamp(stats.curiosity),
    }
}
