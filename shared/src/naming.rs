use rustrict::CensorStr;

use crate::constants::{MAX_BABY_DESCRIPTION_LENGTH, MAX_PET_NAME_LENGTH};

/// Validates a user-supplied pet or baby name: non-empty, length-capped,
/// and clean.
pub fn validate_pet_name(name: &str) -> Result<(), String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Name cannot be empty".to_string());
    }
    if trimmed.len() > MAX_PET_NAME_LENGTH {
        return Err(format!(
            "Name cannot be longer than {} characters",
            MAX_PET_NAME_LENGTH
        ));
    }
    if trimmed.is_inappropriate() {
        return Err(format!("Inappropriate language detected: {}", trimmed));
    }
    Ok(())
}

pub fn validate_baby_description(description: &str) -> Result<(), String> {
    if description.len() > MAX_BABY_DESCRIPTION_LENGTH {
        return Err(format!(
            "Description cannot be longer than {} characters",
            MAX_BABY_DESCRIPTION_LENGTH
        ));
    }
    if description.is_inappropriate() {
        return Err("Inappropriate language detected in description".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(validate_pet_name("Luna").is_ok());
        assert!(validate_pet_name("  Rex  ").is_ok());
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(validate_pet_name("").is_err());
        assert!(validate_pet_name("   ").is_err());
    }

    #[test]
    fn test_overlong_name_rejected() {
        assert!(validate_pet_name(&"a".repeat(21)).is_err());
        assert!(validate_pet_name(&"a".repeat(20)).is_ok());
    }

    #[test]
    fn test_overlong_description_rejected() {
        assert!(validate_baby_description(&"a".repeat(201)).is_err());
        assert!(validate_baby_description("A playful little pup.").is_ok());
    }
}
