use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use shared::constants::NOT_YET_DUE_ERROR;
use shared::genetics::Gender;
use shared::lifecycle::{collect_blocker, CollectBlocker};
use shared::litter::enforce_tortie_invariant;

use crate::auth::UserId;
use crate::error::BreedingError;
use crate::events::BreedingEvent;
use crate::models::{BreedingPairRow, LitterBabyRow};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct CollectResponse {
    pub success: bool,
    pub babies_transferred: i64,
}

#[derive(Debug, Serialize)]
pub struct ReleaseResponse {
    pub success: bool,
    pub parents_released: bool,
}

/// Moves a weaned litter into the owner's permanent collection: every
/// baby becomes an owned pet with its name, breed, gender and traits
/// carried over verbatim, the litter rows are removed, the pair is
/// closed out, and both parents are unlocked. One transaction; a partial
/// transfer is never observable.
pub async fn collect_litter(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(pair_id): Path<Uuid>,
) -> Result<Json<CollectResponse>, BreedingError> {
    let mut tx = state.pool.begin().await?;

    let pair = sqlx::query_as::<_, BreedingPairRow>(
        "SELECT * FROM breeding_pairs WHERE id = $1 FOR UPDATE",
    )
    .bind(pair_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(BreedingError::NotFound("Breeding pair"))?;

    if pair.owner_id != user_id.0 {
        return Err(BreedingError::NotOwner);
    }

    let babies = sqlx::query_as::<_, LitterBabyRow>(
        "SELECT * FROM litter_babies WHERE pair_id = $1 FOR UPDATE",
    )
    .bind(pair_id)
    .fetch_all(&mut *tx)
    .await?;

    let now = OffsetDateTime::now_utc();
    if let Some(blocker) = collect_blocker(&pair.state(), now.unix_timestamp(), babies.len() as i64)
    {
        return Err(BreedingError::Precondition(match blocker {
            CollectBlocker::NotBorn => "The litter has not been born yet".to_string(),
            CollectBlocker::NotWeaned => NOT_YET_DUE_ERROR.to_string(),
            CollectBlocker::NoBabies => "There are no babies to collect".to_string(),
            CollectBlocker::AlreadyCompleted => {
                "This litter has already been collected".to_string()
            }
        }));
    }

    for baby in &babies {
        // Last write boundary for a baby record; the invariant is
        // asserted once more before it becomes a permanent pet.
        let gender = baby
            .gender
            .parse::<Gender>()
            .map(|g| enforce_tortie_invariant(&baby.breed, g).to_string())
            .unwrap_or_else(|_| baby.gender.clone());

        sqlx::query(
            "INSERT INTO pets (
                id, owner_id, display_name, breed, gender,
                friendliness, playfulness, energy, loyalty, curiosity,
                locked_for_breeding, breeding_cooldown_until, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, false, NULL, $11)",
        )
        .bind(Uuid::new_v4())
        .bind(user_id.0)
        .bind(&baby.display_name)
        .bind(&baby.breed)
        .bind(gender)
        .bind(baby.friendliness)
        .bind(baby.playfulness)
        .bind(baby.energy)
        .bind(baby.loyalty)
        .bind(baby.curiosity)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query("DELETE FROM litter_babies WHERE pair_id = $1")
        .bind(pair_id)
        .execute(&mut *tx)
        .await?;

    // Guarded completion; a racing collect sees zero rows and aborts.
    let completed = sqlx::query(
        "UPDATE breeding_pairs SET is_weaned = true, is_completed = true
         WHERE id = $1 AND is_completed = false",
    )
    .bind(pair_id)
    .execute(&mut *tx)
    .await?;
    if completed.rows_affected() == 0 {
        return Err(BreedingError::Precondition(
            "This litter has already been collected".to_string(),
        ));
    }

    unlock_parents(&mut tx, &pair).await?;

    tx.commit().await?;

    let transferred = babies.len() as i64;
    state.events.publish(BreedingEvent::LitterCollected {
        pair_id,
        count: transferred,
    });
    state.events.publish(BreedingEvent::PairUpdated { pair_id });
    info!(
        "🏡 User {} collected {} babies from pair {}",
        user_id.0, transferred, pair_id
    );

    Ok(Json(CollectResponse {
        success: true,
        babies_transferred: transferred,
    }))
}

/// Escape hatch for pairs whose automatic parent release never happened.
/// A no-op on pairs that are not completed yet.
pub async fn release_parents(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(pair_id): Path<Uuid>,
) -> Result<Json<ReleaseResponse>, BreedingError> {
    let mut tx = state.pool.begin().await?;

    let pair = sqlx::query_as::<_, BreedingPairRow>(
        "SELECT * FROM breeding_pairs WHERE id = $1 FOR UPDATE",
    )
    .bind(pair_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(BreedingError::NotFound("Breeding pair"))?;

    if pair.owner_id != user_id.0 {
        return Err(BreedingError::NotOwner);
    }

    if !pair.is_completed {
        return Ok(Json(ReleaseResponse {
            success: true,
            parents_released: false,
        }));
    }

    unlock_parents(&mut tx, &pair).await?;
    tx.commit().await?;

    info!("🔓 User {} released parents of pair {}", user_id.0, pair_id);
    Ok(Json(ReleaseResponse {
        success: true,
        parents_released: true,
    }))
}

async fn unlock_parents(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    pair: &BreedingPairRow,
) -> Result<(), BreedingError> {
    sqlx::query(
        "UPDATE pets SET locked_for_breeding = false, breeding_cooldown_until = NULL
         WHERE id = $1 OR id = $2",
    )
    .bind(pair.parent_one_id)
    .bind(pair.parent_two_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
