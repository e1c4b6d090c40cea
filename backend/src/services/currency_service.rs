use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::BreedingError;

/// Debits a user's pax balance inside the caller's transaction. The
/// balance check and the decrement are one conditional statement, so two
/// concurrent debits can never both succeed past the available balance.
pub async fn debit_balance(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    amount: i32,
) -> Result<i32, BreedingError> {
    let new_balance: Option<i32> = sqlx::query_scalar(
        "UPDATE users
         SET currency_balance = currency_balance - $1
         WHERE id = $2 AND currency_balance >= $1
         RETURNING currency_balance",
    )
    .bind(amount)
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await?;

    match new_balance {
        Some(balance) => Ok(balance),
        None => Err(BreedingError::InsufficientBalance),
    }
}

/// Consumes breeding licenses, same conditional-decrement shape as the
/// pax debit.
pub async fn spend_licenses(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    count: i32,
) -> Result<i32, BreedingError> {
    let remaining: Option<i32> = sqlx::query_scalar(
        "UPDATE users
         SET breeding_licenses = breeding_licenses - $1
         WHERE id = $2 AND breeding_licenses >= $1
         RETURNING breeding_licenses",
    )
    .bind(count)
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await?;

    match remaining {
        Some(remaining) => Ok(remaining),
        None => Err(BreedingError::InsufficientLicenses),
    }
}

/// Writes the audit record for a charge. Non-critical: a failure here
/// must never abort the action the charge paid for, so it is logged and
/// swallowed.
pub async fn record_transaction(pool: &PgPool, user_id: Uuid, amount: i32, kind: &str) {
    let result = sqlx::query(
        "INSERT INTO currency_transactions (id, user_id, amount, kind, status, created_at)
         VALUES ($1, $2, $3, $4, 'completed', NOW())",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(amount)
    .bind(kind)
    .execute(pool)
    .await;

    match result {
        Ok(_) => log::info!("💰 Recorded {} transaction of {} pax for user {}", kind, amount, user_id),
        Err(e) => log::error!("Failed to record {} transaction for user {}: {}", kind, user_id, e),
    }
}

pub async fn get_balance(pool: &PgPool, user_id: Uuid) -> Result<i32, BreedingError> {
    let balance: Option<i32> =
        sqlx::query_scalar("SELECT currency_balance FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
    balance.ok_or(BreedingError::NotFound("User"))
}
