use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::info;
use uuid::Uuid;

use shared::breeds::is_breed_allowed;
use shared::constants::{
    CONCEPTION_DAYS, LICENSES_PER_PAIR, MAX_LITTER_SIZE, MIN_LITTER_SIZE, REBREED_COOLDOWN_DAYS,
};
use shared::genetics::Gender;
use shared::naming::{validate_baby_description, validate_pet_name};

use crate::auth::UserId;
use crate::error::BreedingError;
use crate::events::BreedingEvent;
use crate::models::{BreedingPairRow, LitterBabyRow, PairView, PetRow};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePairRequest {
    pub parent_one_id: Uuid,
    pub parent_two_id: Uuid,
    pub litter_size: i32,
}

#[derive(Debug, Serialize)]
pub struct CreatePairResponse {
    pub success: bool,
    pub pair_id: Uuid,
    pub licenses_remaining: i32,
}

#[derive(Debug, Serialize)]
pub struct PairDetail {
    #[serde(flatten)]
    pub view: PairView,
    pub babies: Vec<LitterBabyRow>,
}

/// Commits two eligible parents to a breeding attempt. Consumes two
/// breeding licenses and locks both parents until collection releases
/// them.
pub async fn create_pair(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Json(payload): Json<CreatePairRequest>,
) -> Result<Json<CreatePairResponse>, BreedingError> {
    if !(MIN_LITTER_SIZE..=MAX_LITTER_SIZE).contains(&payload.litter_size) {
        return Err(BreedingError::Precondition(format!(
            "Litter size {} is outside the allowed range 1-6",
            payload.litter_size
        )));
    }
    if payload.parent_one_id == payload.parent_two_id {
        return Err(BreedingError::Precondition(
            "A pet cannot be bred with itself".to_string(),
        ));
    }

    let mut tx = state.pool.begin().await?;

    let mother = fetch_owned_pet(&mut tx, payload.parent_one_id, user_id.0).await?;
    let father = fetch_owned_pet(&mut tx, payload.parent_two_id, user_id.0).await?;

    let now = OffsetDateTime::now_utc();
    check_parent_eligibility(&mother, now)?;
    check_parent_eligibility(&father, now)?;

    let mother_gender: Gender = mother
        .gender
        .parse()
        .map_err(|_| BreedingError::Precondition(format!("{} has no valid gender", mother.display_name)))?;
    let father_gender: Gender = father
        .gender
        .parse()
        .map_err(|_| BreedingError::Precondition(format!("{} has no valid gender", father.display_name)))?;
    if mother_gender == father_gender {
        return Err(BreedingError::Precondition(
            "A breeding pair needs one female and one male".to_string(),
        ));
    }

    let licenses_remaining =
        super::currency_service::spend_licenses(&mut tx, user_id.0, LICENSES_PER_PAIR).await?;

    let pair_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO breeding_pairs (
            id, owner_id, parent_one_id, parent_two_id, litter_size,
            is_born, birth_date, is_weaned, wean_date, is_completed, created_at
        ) VALUES ($1, $2, $3, $4, $5, false, $6, false, NULL, false, $7)",
    )
    .bind(pair_id)
    .bind(user_id.0)
    .bind(mother.id)
    .bind(father.id)
    .bind(payload.litter_size)
    .bind(now + Duration::days(CONCEPTION_DAYS))
    .bind(now)
    .execute(&mut *tx)
    .await?;

    // Stamp the re-breed cooldown alongside the lock. Collection (or a
    // manual release) clears it early as part of finishing the pair.
    sqlx::query(
        "UPDATE pets SET locked_for_breeding = true, breeding_cooldown_until = $1
         WHERE id = $2 OR id = $3",
    )
    .bind(now + Duration::days(REBREED_COOLDOWN_DAYS))
    .bind(mother.id)
    .bind(father.id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    state.events.publish(BreedingEvent::PairUpdated { pair_id });
    info!(
        "💞 User {} paired {} with {} (litter size {})",
        user_id.0, mother.display_name, father.display_name, payload.litter_size
    );

    Ok(Json(CreatePairResponse {
        success: true,
        pair_id,
        licenses_remaining,
    }))
}

fn check_parent_eligibility(pet: &PetRow, now: OffsetDateTime) -> Result<(), BreedingError> {
    if !is_breed_allowed(&pet.breed) {
        return Err(BreedingError::Precondition(format!(
            "{} cannot breed: breed '{}' is not eligible",
            pet.display_name, pet.breed
        )));
    }
    if pet.locked_for_breeding {
        return Err(BreedingError::Precondition(format!(
            "{} is already part of an active breeding pair",
            pet.display_name
        )));
    }
    if let Some(cooldown) = pet.breeding_cooldown_until {
        if cooldown > now {
            return Err(BreedingError::Precondition(format!(
                "{} is still on breeding cooldown",
                pet.display_name
            )));
        }
    }
    Ok(())
}

async fn fetch_owned_pet(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    pet_id: Uuid,
    owner_id: Uuid,
) -> Result<PetRow, BreedingError> {
    sqlx::query_as::<_, PetRow>(
        "SELECT id, owner_id, display_name, breed, gender,
                friendliness, playfulness, energy, loyalty, curiosity,
                locked_for_breeding, breeding_cooldown_until
         FROM pets WHERE id = $1 AND owner_id = $2
         FOR UPDATE",
    )
    .bind(pet_id)
    .bind(owner_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(BreedingError::NotFound("Pet"))
}

pub async fn list_pairs(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<Vec<PairView>>, BreedingError> {
    let pairs = sqlx::query_as::<_, BreedingPairRow>(
        "SELECT * FROM breeding_pairs WHERE owner_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id.0)
    .fetch_all(&state.pool)
    .await?;

    let now = OffsetDateTime::now_utc();
    Ok(Json(pairs.into_iter().map(|p| PairView::at(p, now)).collect()))
}

pub async fn get_pair(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(pair_id): Path<Uuid>,
) -> Result<Json<PairDetail>, BreedingError> {
    let pair = sqlx::query_as::<_, BreedingPairRow>("SELECT * FROM breeding_pairs WHERE id = $1")
        .bind(pair_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(BreedingError::NotFound("Breeding pair"))?;

    if pair.owner_id != user_id.0 {
        return Err(BreedingError::NotOwner);
    }

    let babies = fetch_litter(&state.pool, pair_id).await?;
    Ok(Json(PairDetail {
        view: PairView::at(pair, OffsetDateTime::now_utc()),
        babies,
    }))
}

/// Reads a pair's litter, re-asserting the Tortie invariant on the way
/// out: a corrupt row is served corrected, never served wrong.
pub async fn fetch_litter(
    pool: &sqlx::PgPool,
    pair_id: Uuid,
) -> Result<Vec<LitterBabyRow>, BreedingError> {
    let mut babies = sqlx::query_as::<_, LitterBabyRow>(
        "SELECT * FROM litter_babies WHERE pair_id = $1 ORDER BY display_name",
    )
    .bind(pair_id)
    .fetch_all(pool)
    .await?;

    for baby in &mut babies {
        if let Ok(gender) = baby.gender.parse::<Gender>() {
            baby.gender = shared::litter::enforce_tortie_invariant(&baby.breed, gender).to_string();
        }
    }
    Ok(babies)
}

#[derive(Debug, Deserialize)]
pub struct UpdateBabyRequest {
    pub new_name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpdateBabyResponse {
    pub success: bool,
}

/// Display-only edits on an uncollected baby: rename and description.
pub async fn update_baby(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(baby_id): Path<Uuid>,
    Json(payload): Json<UpdateBabyRequest>,
) -> Result<Json<UpdateBabyResponse>, BreedingError> {
    let owner: Option<Uuid> = sqlx::query_scalar(
        "SELECT p.owner_id FROM litter_babies b
         JOIN breeding_pairs p ON b.pair_id = p.id
         WHERE b.id = $1",
    )
    .bind(baby_id)
    .fetch_optional(&state.pool)
    .await?;

    match owner {
        None => return Err(BreedingError::NotFound("Litter baby")),
        Some(owner) if owner != user_id.0 => return Err(BreedingError::NotOwner),
        Some(_) => {}
    }

    if let Some(new_name) = &payload.new_name {
        let trimmed = new_name.trim().to_string();
        validate_pet_name(&trimmed).map_err(BreedingError::Precondition)?;
        sqlx::query("UPDATE litter_babies SET display_name = $1 WHERE id = $2")
            .bind(&trimmed)
            .bind(baby_id)
            .execute(&state.pool)
            .await?;
        info!("🏷️ User {} renamed baby {} to '{}'", user_id.0, baby_id, trimmed);
    }

    if let Some(description) = &payload.description {
        validate_baby_description(description).map_err(BreedingError::Precondition)?;
        sqlx::query("UPDATE litter_babies SET description = $1 WHERE id = $2")
            .bind(description)
            .bind(baby_id)
            .execute(&state.pool)
            .await?;
    }

    Ok(Json(UpdateBabyResponse { success: true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pet() -> PetRow {
        PetRow {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            display_name: "Biscuit".to_string(),
            breed: "Beagle".to_string(),
            gender: "Female".to_string(),
            friendliness: 50,
            playfulness: 50,
            energy: 50,
            loyalty: 50,
            curiosity: 50,
            locked_for_breeding: false,
            breeding_cooldown_until: None,
        }
    }

    #[test]
    fn test_eligibility_allows_rested_parent() {
        let now = OffsetDateTime::now_utc();
        assert!(check_parent_eligibility(&sample_pet(), now).is_ok());

        let mut rested = sample_pet();
        rested.breeding_cooldown_until = Some(now - Duration::days(1));
        assert!(check_parent_eligibility(&rested, now).is_ok());
    }

    #[test]
    fn test_eligibility_blocks_active_cooldown() {
        let now = OffsetDateTime::now_utc();
        let mut cooling = sample_pet();
        cooling.breeding_cooldown_until = Some(now + Duration::days(REBREED_COOLDOWN_DAYS));
        match check_parent_eligibility(&cooling, now) {
            Err(BreedingError::Precondition(msg)) => {
                assert!(msg.contains("cooldown"), "unexpected message: {msg}")
            }
            other => panic!("expected cooldown rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_eligibility_blocks_locked_parent() {
        let mut locked = sample_pet();
        locked.locked_for_breeding = true;
        assert!(check_parent_eligibility(&locked, OffsetDateTime::now_utc()).is_err());
    }
}
