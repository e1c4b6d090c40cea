use serde::{Deserialize, Serialize};

use crate::breeds::{is_breed_allowed, is_tortie, TRAIT_CEILING, TRAIT_FLOOR};
use crate::constants::{MAX_LITTER_SIZE, MIN_LITTER_SIZE};
use crate::genetics::{assign_gender, distribute_litter_breeds, Gender};
use crate::stats::{enforce_breed_limits, generate_baby_stats, StatBlock};

/// The pieces of a breeding pair the pipeline needs.
#[derive(Debug, Clone)]
pub struct PairSnapshot {
    pub litter_size: i32,
}

/// The pieces of a parent record the pipeline needs.
#[derive(Debug, Clone)]
pub struct ParentSnapshot {
    pub name: String,
    pub breed: Option<String>,
    pub stats: StatBlock,
}

/// A fully validated baby, ready for persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BabyCandidate {
    pub name: String,
    pub breed: String,
    pub gender: Gender,
    pub stats: StatBlock,
    pub mother_breed: String,
    pub father_breed: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LitterError {
    MissingPair,
    InvalidLitterSize(i32),
    DisallowedParentBreed { parent: String, breed: String },
    InvalidBabies(Vec<String>),
}

impl std::fmt::Display for LitterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LitterError::MissingPair => write!(f, "Breeding pair not found"),
            LitterError::InvalidLitterSize(n) => {
                write!(f, "Litter size {} is outside the allowed range 1-6", n)
            }
            LitterError::DisallowedParentBreed { parent, breed } => {
                write!(f, "{} cannot breed: breed '{}' is not eligible", parent, breed)
            }
            LitterError::InvalidBabies(messages) => {
                write!(f, "Litter failed validation: {}", messages.join("; "))
            }
        }
    }
}

impl std::error::Error for LitterError {}

/// Guarantees the Tortie gender invariant for one baby, correcting the
/// gender in place instead of erroring. A male Tortie is an internal
/// logic gap, not bad user input, so this is the one rule that fails
/// safe rather than loud. Called at every boundary where a baby record
/// is produced or re-read.
pub fn enforce_tortie_invariant(breed: &str, gender: Gender) -> Gender {
    if is_tortie(breed) && gender != Gender::Female {
        log::warn!("corrected male Tortie to female (invariant violation)");
        return Gender::Female;
    }
    gender
}

/// Runs the full multi-stage pipeline: pair preconditions, parent breed
/// gating, breed distribution, gender assignment with invariant
/// enforcement, stat generation with an independent re-clamp, per-field
/// validation, and a final litter-level Tortie sweep. Either every baby
/// comes back persistence-ready or the whole litter fails; there is no
/// partial result.
pub fn build_litter(
    pair: Option<&PairSnapshot>,
    mother: &ParentSnapshot,
    father: &ParentSnapshot,
) -> Result<Vec<BabyCandidate>, LitterError> {
    // Stage 1: pair preconditions.
    let pair = pair.ok_or(LitterError::MissingPair)?;
    if !(MIN_LITTER_SIZE..=MAX_LITTER_SIZE).contains(&pair.litter_size) {
        return Err(LitterError::InvalidLitterSize(pair.litter_size));
    }

    // Stage 2: parent breed gating. Mixed and hybrid animals never breed.
    let mother_breed = resolve_parent_breed(mother)?;
    let father_breed = resolve_parent_breed(father)?;

    // Stage 3: breed distribution.
    let breeds = distribute_litter_breeds(
        Some(&mother_breed),
        Some(&father_breed),
        pair.litter_size,
    );

    let mut babies = Vec::with_capacity(breeds.len());
    for (index, breed) in breeds.into_iter().enumerate() {
        // Stage 4: gender, with the invariant enforced at assignment and
        // again on the assembled record.
        let gender = enforce_tortie_invariant(&breed, assign_gender(&breed));

        // Stage 5: stats, plus the independent breed-limit pass.
        let stats = generate_baby_stats(&mother.stats, &father.stats, &breed);
        let stats = enforce_breed_limits(&stats, &breed);

        babies.push(BabyCandidate {
            name: format!("{} baby {}", breed, index + 1),
            breed,
            gender,
            stats,
            mother_breed: mother_breed.clone(),
            father_breed: father_breed.clone(),
        });
    }

    // Stage 6: per-field validation, aggregated into one failure.
    let problems = validate_babies(&babies);
    if !problems.is_empty() {
        return Err(LitterError::InvalidBabies(problems));
    }

    // Stage 7: final sweep over the assembled litter.
    for baby in &mut babies {
        baby.gender = enforce_tortie_invariant(&baby.breed, baby.gender);
    }

    Ok(babies)
}

fn resolve_parent_breed(parent: &ParentSnapshot) -> Result<String, LitterError> {
    let breed = parent.breed.as_deref().unwrap_or("").trim().to_string();
    if !is_breed_allowed(&breed) {
        return Err(LitterError::DisallowedParentBreed {
            parent: parent.name.clone(),
            breed,
        });
    }
    Ok(breed)
}

/// Field-level checks over an assembled litter. Returns human-readable
/// messages; an empty list means the litter is clean.
pub fn validate_babies(babies: &[BabyCandidate]) -> Vec<String> {
    let mut problems = Vec::new();
    for (index, baby) in babies.iter().enumerate() {
        let label = format!("baby {}", index + 1);
        if baby.name.trim().is_empty() {
            problems.push(format!("{}: name is empty", label));
        }
        if baby.breed.trim().is_empty() {
            problems.push(format!("{}: breed is empty", label));
        } else if !is_breed_allowed(&baby.breed) {
            problems.push(format!("{}: breed '{}' is not eligible", label, baby.breed));
        }
        for (trait_name, value) in [
            ("friendliness", baby.stats.friendliness),
            ("playfulness", baby.stats.playfulness),
            ("energy", baby.stats.energy),
            ("loyalty", baby.stats.loyalty),
            ("curiosity", baby.stats.curiosity),
        ] {
            if !(TRAIT_FLOOR..=TRAIT_CEILING).contains(&value) {
                problems.push(format!(
                    "{}: {} value {} is outside 1-100",
                    label, trait_name, value
                ));
            }
        }
    }
    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breeds::limits_for;

    fn parent(name: &str, breed: &str, level: i32) -> ParentSnapshot {
        ParentSnapshot {
            name: name.to_string(),
            breed: Some(breed.to_string()),
            stats: StatBlock::uniform(level),
        }
    }

    #[test]
    fn test_missing_pair_fails() {
        let mother = parent("Luna", "Tortie", 50);
        let father = parent("Rex", "Persian", 50);
        assert_eq!(
            build_litter(None, &mother, &father).unwrap_err(),
            LitterError::MissingPair
        );
    }

    #[test]
    fn test_invalid_litter_size_fails() {
        let mother = parent("Luna", "Tortie", 50);
        let father = parent("Rex", "Persian", 50);
        for size in [0, -1, 7, 100] {
            let pair = PairSnapshot { litter_size: size };
            assert_eq!(
                build_litter(Some(&pair), &mother, &father).unwrap_err(),
                LitterError::InvalidLitterSize(size)
            );
        }
    }

    #[test]
    fn test_disallowed_parent_breed_fails() {
        let pair = PairSnapshot { litter_size: 3 };
        let father = parent("Rex", "Persian", 50);
        for breed in ["Mixed", "Labrador Cross", "unknown", ""] {
            let mother = ParentSnapshot {
                name: "Luna".to_string(),
                breed: if breed.is_empty() { None } else { Some(breed.to_string()) },
                stats: StatBlock::uniform(50),
            };
            let err = build_litter(Some(&pair), &mother, &father).unwrap_err();
            assert!(matches!(err, LitterError::DisallowedParentBreed { .. }));
        }
    }

    #[test]
    fn test_happy_path_litter() {
        let pair = PairSnapshot { litter_size: 3 };
        let mother = parent("Daisy", "Golden Retriever", 50);
        let father = parent("Storm", "Husky", 60);

        for _ in 0..200 {
            let babies = build_litter(Some(&pair), &mother, &father).unwrap();
            assert_eq!(babies.len(), 3);
            assert!(babies
                .iter()
                .all(|b| b.breed == "Golden Retriever" || b.breed == "Husky"));
            assert!(babies.iter().any(|b| b.breed == "Golden Retriever"));
            assert!(babies.iter().any(|b| b.breed == "Husky"));
            for baby in &babies {
                let limits = limits_for(&baby.breed);
                assert!(baby.stats.friendliness >= limits.friendliness.min);
                assert!(baby.stats.friendliness <= limits.friendliness.max);
                assert!(baby.stats.energy >= limits.energy.min);
                assert!(baby.stats.energy <= limits.energy.max);
                assert_eq!(baby.mother_breed, "Golden Retriever");
                assert_eq!(baby.father_breed, "Husky");
                assert!(!baby.name.trim().is_empty());
            }
        }
    }

    #[test]
    fn test_tortie_babies_always_female() {
        let pair = PairSnapshot { litter_size: 6 };
        let mother = parent("Luna", "Tortie", 55);
        let father = parent("Rex", "Persian", 45);

        for _ in 0..1_000 {
            let babies = build_litter(Some(&pair), &mother, &father).unwrap();
            for baby in babies {
                if baby.breed == "Tortie" {
                    assert_eq!(baby.gender, Gender::Female);
                }
            }
        }
    }

    #[test]
    fn test_enforce_tortie_invariant_corrects_in_place() {
        assert_eq!(enforce_tortie_invariant("Tortie", Gender::Male), Gender::Female);
        assert_eq!(enforce_tortie_invariant("Tortie", Gender::Female), Gender::Female);
        assert_eq!(enforce_tortie_invariant("Husky", Gender::Male), Gender::Male);
    }

    #[test]
    fn test_enforce_tortie_invariant_idempotent() {
        let once = enforce_tortie_invariant("Tortie", Gender::Male);
        let twice = enforce_tortie_invariant("Tortie", once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_validate_babies_aggregates_messages() {
        let babies = vec![BabyCandidate {
            name: "  ".to_string(),
            breed: "Mixed".to_string(),
            gender: Gender::Female,
            stats: StatBlock {
                friendliness: 0,
                playfulness: 101,
                energy: 50,
                loyalty: 50,
                curiosity: 50,
            },
            mother_breed: "Mixed".to_string(),
            father_breed: "Mixed".to_string(),
        }];
        let problems = validate_babies(&babies);
        assert_eq!(problems.len(), 4);
        assert!(problems.iter().any(|p| p.contains("name is empty")));
        assert!(problems.iter().any(|p| p.contains("not eligible")));
        assert!(problems.iter().any(|p| p.contains("friendliness")));
        assert!(problems.iter().any(|p| p.contains("playfulness")));
    }

    #[test]
    fn test_validate_babies_clean_litter() {
        let pair = PairSnapshot { litter_size: 4 };
        let mother = parent("Daisy", "Beagle", 70);
        let father = parent("Storm", "Beagle", 80);
        let babies = build_litter(Some(&pair), &mother, &father).unwrap();
        assert!(validate_babies(&babies).is_empty());
    }
}
