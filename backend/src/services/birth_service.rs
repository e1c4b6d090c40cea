use axum::{
    extract::{Extension, Path, State},
    Json,
};
use once_cell::sync::Lazy;
use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};
use time::{Duration, OffsetDateTime, Time};
use tracing::{error, info};
use uuid::Uuid;

use shared::constants::{ACCELERATION_COST, WEAN_DAYS};
use shared::lifecycle::due_for_birth;
use shared::litter::{build_litter, BabyCandidate, PairSnapshot};

use crate::auth::UserId;
use crate::error::BreedingError;
use crate::events::BreedingEvent;
use crate::models::{BreedingPairRow, PetRow};
use crate::AppState;

/// Keeps the reconciliation pass from running concurrently with itself;
/// a second invocation while one is in flight is a no-op.
static RECONCILE_GUARD: Lazy<tokio::sync::Mutex<()>> = Lazy::new(|| tokio::sync::Mutex::new(()));

#[derive(Debug, Serialize)]
pub struct AccelerateResponse {
    pub success: bool,
    pub new_balance: i32,
    pub babies_born: usize,
}

#[derive(Debug, Serialize)]
pub struct ReconcileReport {
    pub births_fired: u64,
    pub litters_repaired: u64,
    pub weans_fired: u64,
    pub skipped: bool,
}

/// Paid acceleration of the conception wait. The fee debit, the birth
/// transition and the litter insert commit together; when the balance is
/// short nothing changes and nothing is charged. Weaning is never
/// accelerated.
pub async fn accelerate_conception(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(pair_id): Path<Uuid>,
) -> Result<Json<AccelerateResponse>, BreedingError> {
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
    if pair.is_born {
        return Err(BreedingError::Precondition(
            "The litter has already been born".to_string(),
        ));
    }

    let new_balance = super::currency_service::debit_balance(&mut tx, user_id.0, ACCELERATION_COST).await?;

    let now = OffsetDateTime::now_utc();
    let wean_date = now + Duration::days(WEAN_DAYS);
    let babies = give_birth(&mut tx, &pair, now, wean_date).await?;
    let babies_born = babies.len();

    tx.commit().await?;

    // The audit record is non-critical; the charge already committed.
    super::currency_service::record_transaction(
        &state.pool,
        user_id.0,
        -ACCELERATION_COST,
        "conception_acceleration",
    )
    .await;

    state.events.publish(BreedingEvent::PairUpdated { pair_id });
    info!(
        "⚡ User {} accelerated conception of pair {} for {} pax, {} babies born",
        user_id.0, pair_id, ACCELERATION_COST, babies_born
    );

    Ok(Json(AccelerateResponse {
        success: true,
        new_balance,
        babies_born,
    }))
}

/// Fires the birth transition inside the caller's transaction: generates
/// and validates the litter, inserts the babies, and flips the pair to
/// born. The pair update is guarded on `is_born = false` so a duplicate
/// trigger observing the same due pair becomes a no-op.
async fn give_birth(
    tx: &mut Transaction<'_, Postgres>,
    pair: &BreedingPairRow,
    birth_date: OffsetDateTime,
    wean_date: OffsetDateTime,
) -> Result<Vec<BabyCandidate>, BreedingError> {
    let updated = sqlx::query(
        "UPDATE breeding_pairs
         SET is_born = true, birth_date = $1, wean_date = $2
         WHERE id = $3 AND is_born = false",
    )
    .bind(birth_date)
    .bind(wean_date)
    .bind(pair.id)
    .execute(&mut **tx)
    .await?;

    if updated.rows_affected() == 0 {
        // Someone else already processed the birth.
        return Ok(Vec::new());
    }

    let babies = generate_litter(tx, pair).await?;
    insert_babies(tx, pair.id, &babies, birth_date).await?;
    Ok(babies)
}

async fn generate_litter(
    tx: &mut Transaction<'_, Postgres>,
    pair: &BreedingPairRow,
) -> Result<Vec<BabyCandidate>, BreedingError> {
    let mother = fetch_parent(tx, pair.parent_one_id).await?;
    let father = fetch_parent(tx, pair.parent_two_id).await?;

    let snapshot = PairSnapshot {
        litter_size: pair.litter_size,
    };
    let babies = build_litter(Some(&snapshot), &mother.snapshot(), &father.snapshot())?;
    Ok(babies)
}

async fn fetch_parent(
    tx: &mut Transaction<'_, Postgres>,
    pet_id: Uuid,
) -> Result<PetRow, BreedingError> {
    sqlx::query_as::<_, PetRow>(
        "SELECT id, owner_id, display_name, breed, gender,
                friendliness, playfulness, energy, loyalty, curiosity,
                locked_for_breeding, breeding_cooldown_until
         FROM pets WHERE id = $1",
    )
    .bind(pet_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(BreedingError::NotFound("Parent pet"))
}

async fn insert_babies(
    tx: &mut Transaction<'_, Postgres>,
    pair_id: Uuid,
    babies: &[BabyCandidate],
    birth_date: OffsetDateTime,
) -> Result<(), BreedingError> {
    for baby in babies {
        sqlx::query(
            "INSERT INTO litter_babies (
                id, pair_id, display_name, breed, gender,
                friendliness, playfulness, energy, loyalty, curiosity,
                birth_date, mother_breed, father_breed, description
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, '')",
        )
        .bind(Uuid::new_v4())
        .bind(pair_id)
        .bind(&baby.name)
        .bind(&baby.breed)
        .bind(baby.gender.to_string())
        .bind(baby.stats.friendliness)
        .bind(baby.stats.playfulness)
        .bind(baby.stats.energy)
        .bind(baby.stats.loyalty)
        .bind(baby.stats.curiosity)
        .bind(birth_date)
        .bind(&baby.mother_breed)
        .bind(&baby.father_breed)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

/// Wean date for the scheduled path: 14 days after birth, normalized to
/// start of day.
fn scheduled_wean_date(birth_date: OffsetDateTime) -> OffsetDateTime {
    (birth_date + Duration::days(WEAN_DAYS)).replace_time(Time::MIDNIGHT)
}

/// Handler wrapper around the reconciliation pass, so a UI poll can
/// trigger the same idempotent transitions as the interval task or a
/// server-side scheduler.
pub async fn run_reconciliation(
    State(state): State<AppState>,
    Extension(_user_id): Extension<UserId>,
) -> Result<Json<ReconcileReport>, BreedingError> {
    let report = reconcile_breeding_pairs(&state.pool, &state.events).await?;
    Ok(Json(report))
}

/// Scans every pair and fires any due transitions: births, repairs for
/// born pairs whose babies were never inserted, and weans. Every
/// mutation is guarded on its pre-transition flag, so this pass may race
/// a server-side scheduled job, or itself on a later tick, harmlessly.
pub async fn reconcile_breeding_pairs(
    pool: &PgPool,
    events: &crate::events::EventBus,
) -> Result<ReconcileReport, BreedingError> {
    let _guard = match RECONCILE_GUARD.try_lock() {
        Ok(guard) => guard,
        Err(_) => {
            return Ok(ReconcileReport {
                births_fired: 0,
                litters_repaired: 0,
                weans_fired: 0,
                skipped: true,
            })
        }
    };

    let now = OffsetDateTime::now_utc();
    let now_secs = now.unix_timestamp();

    // (a) due births
    let mut births_fired = 0u64;
    let due_pairs = sqlx::query_as::<_, BreedingPairRow>(
        "SELECT * FROM breeding_pairs
         WHERE is_born = false AND is_completed = false AND birth_date <= $1",
    )
    .bind(now)
    .fetch_all(pool)
    .await?;

    for pair in due_pairs {
        if !due_for_birth(&pair.state(), now_secs) {
            continue;
        }
        let mut tx = pool.begin().await?;
        match give_birth(&mut tx, &pair, now, scheduled_wean_date(now)).await {
            Ok(babies) if !babies.is_empty() => {
                tx.commit().await?;
                births_fired += 1;
                events.publish(BreedingEvent::PairUpdated { pair_id: pair.id });
                info!("🐣 Pair {} gave birth to {} babies", pair.id, babies.len());
            }
            Ok(_) => {
                // Lost the race to another trigger; nothing to commit.
                tx.commit().await?;
            }
            Err(e) => {
                error!("Birth transition failed for pair {}: {:?}", pair.id, e);
            }
        }
    }

    // (b) born pairs missing their babies
    let mut litters_repaired = 0u64;
    let orphaned = sqlx::query_as::<_, BreedingPairRow>(
        "SELECT p.* FROM breeding_pairs p
         WHERE p.is_born = true AND p.is_completed = false
         AND NOT EXISTS (SELECT 1 FROM litter_babies b WHERE b.pair_id = p.id)",
    )
    .fetch_all(pool)
    .await?;

    for pair in orphaned {
        let mut tx = pool.begin().await?;
        match generate_litter(&mut tx, &pair).await {
            Ok(babies) => {
                if let Err(e) = insert_babies(&mut tx, pair.id, &babies, pair.birth_date).await {
                    error!("Litter repair insert failed for pair {}: {:?}", pair.id, e);
                    continue;
                }
                tx.commit().await?;
                litters_repaired += 1;
                events.publish(BreedingEvent::PairUpdated { pair_id: pair.id });
                info!("🩹 Repaired missing litter for pair {} ({} babies)", pair.id, babies.len());
            }
            Err(e) => {
                error!("Litter repair failed for pair {}: {:?}", pair.id, e);
            }
        }
    }

    // (c) due weans, as one conditional set-based update
    let weans_fired = run_wean_transitions(pool, now).await?;
    if weans_fired > 0 {
        info!("🍼 Weaned {} litters", weans_fired);
    }

    Ok(ReconcileReport {
        births_fired,
        litters_repaired,
        weans_fired,
        skipped: false,
    })
}

/// Flips due pairs to weaned. Guarded on `is_weaned = false`, so firing
/// it twice over the same pair set changes nothing the second time.
pub async fn run_wean_transitions(pool: &PgPool, now: OffsetDateTime) -> Result<u64, BreedingError> {
    let result = sqlx::query(
        "UPDATE breeding_pairs
         SET is_weaned = true
         WHERE is_born = true AND is_weaned = false AND is_completed = false
         AND wean_date IS NOT NULL AND wean_date <= $1",
    )
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduled_wean_date_is_normalized() {
        let birth = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let wean = scheduled_wean_date(birth);
        assert_eq!(wean.time(), Time::MIDNIGHT);
        let span = wean - birth;
        assert!(span > Duration::days(WEAN_DAYS - 1));
        assert!(span <= Duration::days(WEAN_DAYS));
    }

    #[test]
    fn test_accelerated_wean_date_is_full_period() {
        let now = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let wean = now + Duration::days(WEAN_DAYS);
        assert_eq!((wean - now).whole_days(), WEAN_DAYS);
    }
}
