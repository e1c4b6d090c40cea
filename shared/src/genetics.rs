use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::breeds::{is_tortie, MIXED_BREED_SENTINEL};
use crate::constants::{MAX_LITTER_SIZE, MIN_LITTER_SIZE};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum Gender {
    Male,
    Female,
}

/// Derives the breed of each baby in a litter from the two parent breeds.
///
/// Same-breed parents produce a uniform litter. Otherwise a litter of two
/// or more is seeded with one baby of each parent breed, the remaining
/// slots are independent coin flips, and the whole sequence is shuffled so
/// breed does not correlate with birth order. A singleton litter is a
/// uniform pick between the two breeds.
pub fn distribute_litter_breeds(
    mother_breed: Option<&str>,
    father_breed: Option<&str>,
    litter_size: i32,
) -> Vec<String> {
    let mother = resolve_breed(mother_breed);
    let father = resolve_breed(father_breed);
    let size = litter_size.clamp(MIN_LITTER_SIZE, MAX_LITTER_SIZE) as usize;

    let mut rng = rand::thread_rng();

    if mother == father {
        return vec![mother.to_string(); size];
    }

    if size == 1 {
        let pick = if rng.gen_bool(0.5) { mother } else { father };
        return vec![pick.to_string()];
    }

    let mut breeds = Vec::with_capacity(size);
    breeds.push(mother.to_string());
    breeds.push(father.to_string());
    for _ in 2..size {
        let pick = if rng.gen_bool(0.5) { mother } else { father };
        breeds.push(pick.to_string());
    }
    breeds.shuffle(&mut rng);
    breeds
}

/// Assigns a gender for a baby of the given breed. Uniform 50/50 for
/// every breed except Tortie, which is always female: tortoiseshell
/// coloration requires two X chromosomes, so a male Tortie is genetically
/// impossible rather than merely unlikely.
pub fn assign_gender(breed: &str) -> Gender {
    if is_tortie(breed) {
        return Gender::Female;
    }
    if rand::thread_rng().gen_bool(0.5) {
        Gender::Male
    } else {
        Gender::Female
    }
}

fn resolve_breed(breed: Option<&str>) -> &str {
    match breed {
        Some(b) if !b.trim().is_empty() => b,
        _ => MIXED_BREED_SENTINEL,
    }
}
