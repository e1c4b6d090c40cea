use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use shared::lifecycle::PairState;
use shared::litter::ParentSnapshot;
use shared::stats::StatBlock;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct BreedingPairRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub parent_one_id: Uuid,
    pub parent_two_id: Uuid,
    pub litter_size: i32,
    pub is_born: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub birth_date: OffsetDateTime,
    pub is_weaned: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub wean_date: Option<OffsetDateTime>,
    pub is_completed: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl BreedingPairRow {
    pub fn state(&self) -> PairState {
        PairState {
            is_born: self.is_born,
            is_weaned: self.is_weaned,
            is_completed: self.is_completed,
            created_at: self.created_at.unix_timestamp(),
            birth_date: self.birth_date.unix_timestamp(),
            wean_date: self.wean_date.map(|d| d.unix_timestamp()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct PetRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub display_name: String,
    pub breed: String,
    pub gender: String,
    pub friendliness: i32,
    pub playfulness: i32,
    pub energy: i32,
    pub loyalty: i32,
    pub curiosity: i32,
    pub locked_for_breeding: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub breeding_cooldown_until: Option<OffsetDateTime>,
}

impl PetRow {
    pub fn stats(&self) -> StatBlock {
        StatBlock {
            friendliness: self.friendliness,
            playfulness: self.playfulness,
            energy: self.energy,
            loyalty: self.loyalty,
            curiosity: self.curiosity,
        }
    }

    pub fn snapshot(&self) -> ParentSnapshot {
        ParentSnapshot {
            name: self.display_name.clone(),
            breed: if self.breed.trim().is_empty() {
                None
            } else {
                Some(self.breed.clone())
            },
            stats: self.stats(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct LitterBabyRow {
    pub id: Uuid,
    pub pair_id: Uuid,
    pub display_name: String,
    pub breed: String,
    pub gender: String,
    pub friendliness: i32,
    pub playfulness: i32,
    pub energy: i32,
    pub loyalty: i32,
    pub curiosity: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub birth_date: OffsetDateTime,
    pub mother_breed: String,
    pub father_breed: String,
    pub description: String,
}

/// A pair together with its display projection.
#[derive(Debug, Serialize)]
pub struct PairView {
    #[serde(flatten)]
    pub pair: BreedingPairRow,
    pub phase: shared::lifecycle::Phase,
    pub progress_percent: i32,
}

impl PairView {
    pub fn at(pair: BreedingPairRow, now: OffsetDateTime) -> Self {
        let state = pair.state();
        PairView {
            phase: shared::lifecycle::phase(&state),
            progress_percent: shared::lifecycle::progress_percent(&state, now.unix_timestamp()),
            pair,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn pair_row(now: OffsetDateTime) -> BreedingPairRow {
        BreedingPairRow {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            parent_one_id: Uuid::new_v4(),
            parent_two_id: Uuid::new_v4(),
            litter_size: 3,
            is_born: false,
            birth_date: now + Duration::days(3),
            is_weaned: false,
            wean_date: None,
            is_completed: false,
            created_at: now,
        }
    }

    #[test]
    fn test_pair_state_mapping() {
        let now = OffsetDateTime::now_utc();
        let row = pair_row(now);
        let state = row.state();
        assert!(!state.is_born);
        assert_eq!(state.created_at, now.unix_timestamp());
        assert_eq!(state.birth_date - state.created_at, 3 * 86_400);
        assert!(state.wean_date.is_none());
    }

    #[test]
    fn test_pair_view_projection() {
        let now = OffsetDateTime::now_utc();
        let row = pair_row(now);
        let view = PairView::at(row, now);
        assert_eq!(view.phase, shared::lifecycle::Phase::AwaitingConception);
        assert_eq!(view.progress_percent, 0);
    }

    #[test]
    fn test_parent_snapshot_blank_breed_is_none() {
        let pet = PetRow {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            display_name: "Luna".to_string(),
            breed: "  ".to_string(),
            gender: "Female".to_string(),
            friendliness: 50,
            playfulness: 50,
            energy: 50,
            loyalty: 50,
            curiosity: 50,
            locked_for_breeding: false,
            breeding_cooldown_until: None,
        };
        assert!(pet.snapshot().breed.is_none());
    }
}
