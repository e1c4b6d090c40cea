use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// The one breed with a hard genetic gender constraint: tortoiseshell
/// coloration is X-linked, so a Tortie is always female.
pub const TORTIE_BREED: &str = "Tortie";

/// Sentinel used when a parent record somehow reaches the genetics code
/// without a breed. Upstream validation rejects such parents first.
pub const MIXED_BREED_SENTINEL: &str = "Mixed";

/// Absolute trait range; per-breed ranges always sit inside this.
pub const TRAIT_FLOOR: i32 = 1;
pub const TRAIT_CEILING: i32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraitRange {
    pub min: i32,
    pub max: i32,
}

impl TraitRange {
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: i32) -> i32 {
        value.clamp(self.min, self.max)
    }
}

/// Legal ranges for the five traits of one breed, in the fixed order
/// friendliness, playfulness, energy, loyalty, curiosity.
#[derive(Debug, Clone, Copy)]
pub struct BreedLimits {
    pub friendliness: TraitRange,
    pub playfulness: TraitRange,
    pub energy: TraitRange,
    pub loyalty: TraitRange,
    pub curiosity: TraitRange,
}

pub const DEFAULT_LIMITS: BreedLimits = BreedLimits {
    friendliness: TraitRange::new(TRAIT_FLOOR, TRAIT_CEILING),
    playfulness: TraitRange::new(TRAIT_FLOOR, TRAIT_CEILING),
    energy: TraitRange::new(TRAIT_FLOOR, TRAIT_CEILING),
    loyalty: TraitRange::new(TRAIT_FLOOR, TRAIT_CEILING),
    curiosity: TraitRange::new(TRAIT_FLOOR, TRAIT_CEILING),
};

static BREED_LIMITS: Lazy<HashMap<&'static str, BreedLimits>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert(
        "Golden Retriever",
        BreedLimits {
            friendliness: TraitRange::new(70, 100),
            playfulness: TraitRange::new(60, 95),
            energy: TraitRange::new(50, 90),
            loyalty: TraitRange::new(70, 100),
            curiosity: TraitRange::new(40, 85),
        },
    );
    m.insert(
        "Husky",
        BreedLimits {
            friendliness: TraitRange::new(50, 90),
            playfulness: TraitRange::new(60, 100),
            energy: TraitRange::new(75, 100),
            loyalty: TraitRange::new(45, 85),
            curiosity: TraitRange::new(55, 95),
        },
    );
    m.insert(
        "Persian",
        BreedLimits {
            friendliness: TraitRange::new(40, 80),
            playfulness: TraitRange::new(25, 65),
            energy: TraitRange::new(15, 55),
            loyalty: TraitRange::new(35, 75),
            curiosity: TraitRange::new(30, 70),
        },
    );
    m.insert(
        TORTIE_BREED,
        BreedLimits {
            friendliness: TraitRange::new(35, 80),
            playfulness: TraitRange::new(45, 90),
            energy: TraitRange::new(40, 85),
            loyalty: TraitRange::new(30, 70),
            curiosity: TraitRange::new(60, 100),
        },
    );
    m.insert(
        "Tabby",
        BreedLimits {
            friendliness: TraitRange::new(45, 85),
            playfulness: TraitRange::new(50, 90),
            energy: TraitRange::new(45, 85),
            loyalty: TraitRange::new(40, 80),
            curiosity: TraitRange::new(50, 95),
        },
    );
    m.insert(
        "Beagle",
        BreedLimits {
            friendliness: TraitRange::new(60, 95),
            playfulness: TraitRange::new(55, 95),
            energy: TraitRange::new(60, 95),
            loyalty: TraitRange::new(50, 85),
            curiosity: TraitRange::new(65, 100),
        },
    );
    m
});

/// Looks up the configured trait limits for a breed. Unknown breeds get
/// the default full range rather than an error.
pub fn limits_for(breed: &str) -> BreedLimits {
    BREED_LIMITS.get(breed).copied().unwrap_or(DEFAULT_LIMITS)
}

pub fn is_known_breed(breed: &str) -> bool {
    BREED_LIMITS.contains_key(breed)
}

pub fn is_tortie(breed: &str) -> bool {
    breed == TORTIE_BREED
}

static DISALLOWED_BREED_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(mixed|mix|cross|hybrid|unknown)").unwrap());

/// Mixed and hybrid animals cannot breed; matches the disallowed terms
/// case-insensitively anywhere in the breed name.
pub fn is_breed_allowed(breed: &str) -> bool {
    let trimmed = breed.trim();
    !trimmed.is_empty() && !DISALLOWED_BREED_PATTERN.is_match(trimmed)
}
