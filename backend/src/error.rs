use axum::body::Body;
use axum::http::StatusCode;
use axum::response::Response;
use serde_json::json;

/// Error surface of the breeding service. Precondition failures carry the
/// user-facing message directly; store failures are folded into a small
/// set of categories before reaching the client.
#[derive(Debug)]
pub enum BreedingError {
    NotFound(&'static str),
    NotOwner,
    Precondition(String),
    InsufficientBalance,
    InsufficientLicenses,
    Database(DbErrorCategory),
}

/// User-facing categories for store write failures, derived from the
/// driver's error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbErrorCategory {
    GenderConstraint,
    BreedConstraint,
    Relationship,
    Duplicate,
    Permission,
    Network,
    Unknown,
}

impl DbErrorCategory {
    pub fn message(&self) -> &'static str {
        match self {
            DbErrorCategory::GenderConstraint => "A gender constraint was violated",
            DbErrorCategory::BreedConstraint => "A breed constraint was violated",
            DbErrorCategory::Relationship => "A related record is missing",
            DbErrorCategory::Duplicate => "This record already exists",
            DbErrorCategory::Permission => "Permission denied by the data store",
            DbErrorCategory::Network => "Could not reach the data store",
            DbErrorCategory::Unknown => "Something went wrong, please try again",
        }
    }
}

/// Maps raw driver error text onto a user-facing category, falling back
/// to a generic failure when nothing matches.
pub fn categorize_db_error(message: &str) -> DbErrorCategory {
    let lower = message.to_lowercase();
    if lower.contains("gender") {
        DbErrorCategory::GenderConstraint
    } else if lower.contains("breed") {
        DbErrorCategory::BreedConstraint
    } else if lower.contains("foreign key") || lower.contains("violates foreign") {
        DbErrorCategory::Relationship
    } else if lower.contains("duplicate") || lower.contains("unique constraint") {
        DbErrorCategory::Duplicate
    } else if lower.contains("permission") || lower.contains("denied") {
        DbErrorCategory::Permission
    } else if lower.contains("connection") || lower.contains("timed out") || lower.contains("network")
    {
        DbErrorCategory::Network
    } else {
        DbErrorCategory::Unknown
    }
}

impl From<sqlx::Error> for BreedingError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("database error: {}", err);
        BreedingError::Database(categorize_db_error(&err.to_string()))
    }
}

impl From<shared::litter::LitterError> for BreedingError {
    fn from(err: shared::litter::LitterError) -> Self {
        BreedingError::Precondition(err.to_string())
    }
}

impl axum::response::IntoResponse for BreedingError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            BreedingError::NotFound(what) => {
                (StatusCode::NOT_FOUND, format!("{} not found", what))
            }
            BreedingError::NotOwner => (
                StatusCode::FORBIDDEN,
                shared::constants::NOT_OWNER_ERROR.to_string(),
            ),
            BreedingError::Precondition(message) => (StatusCode::BAD_REQUEST, message),
            BreedingError::InsufficientBalance => (
                StatusCode::BAD_REQUEST,
                shared::constants::INSUFFICIENT_BALANCE_ERROR.to_string(),
            ),
            BreedingError::InsufficientLicenses => (
                StatusCode::BAD_REQUEST,
                shared::constants::INSUFFICIENT_LICENSES_ERROR.to_string(),
            ),
            BreedingError::Database(category) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                category.message().to_string(),
            ),
        };

        Response::builder()
            .status(status)
            .header("Content-Type", "application/json")
            .body(Body::from(
                serde_json::to_string(&json!({ "error": message })).unwrap(),
            ))
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_constraint_errors() {
        assert_eq!(
            categorize_db_error("new row violates check constraint \"litter_babies_gender_check\""),
            DbErrorCategory::GenderConstraint
        );
        assert_eq!(
            categorize_db_error("check constraint breed_not_empty failed"),
            DbErrorCategory::BreedConstraint
        );
    }

    #[test]
    fn test_categorize_relationship_and_duplicate() {
        assert_eq!(
            categorize_db_error("insert violates foreign key constraint"),
            DbErrorCategory::Relationship
        );
        assert_eq!(
            categorize_db_error("duplicate key value violates unique constraint"),
            DbErrorCategory::Duplicate
        );
    }

    #[test]
    fn test_categorize_permission_and_network() {
        assert_eq!(
            categorize_db_error("permission denied for table pets"),
            DbErrorCategory::Permission
        );
        assert_eq!(
            categorize_db_error("connection refused"),
            DbErrorCategory::Network
        );
        assert_eq!(categorize_db_error("pool timed out"), DbErrorCategory::Network);
    }

    #[test]
    fn test_unrecognized_errors_are_generic() {
        assert_eq!(
            categorize_db_error("some exotic failure"),
            DbErrorCategory::Unknown
        );
    }
}
