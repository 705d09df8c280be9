//! The todo entity and its validation rules.

use crate::error::TodoError;
use serde::{Deserialize, Serialize};

/// Maximum accepted todo name length, in characters.
pub const MAX_NAME_LEN: usize = 140;

/// A persisted todo item.
///
/// `id` is assigned by the store on creation, is unique, monotonically
/// increasing, and never reused. `name` is immutable after creation.
/// `done` starts `false` and may transition to `true` exactly once; no
/// un-done operation exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Store-assigned identity.
    pub id: i64,
    /// The todo text, 1 to 140 characters inclusive.
    pub name: String,
    /// Completion flag, monotone false → true.
    pub done: bool,
}

/// Validate a todo name against the length contract.
///
/// Validation happens in the service layer before any store call, so a
/// rejected name has no side effects.
///
/// # Errors
///
/// Returns [`TodoError::Validation`] if the name is empty or longer than
/// [`MAX_NAME_LEN`] characters.
pub fn validate_name(name: &str) -> Result<(), TodoError> {
    if name.is_empty() {
        return Err(TodoError::Validation {
            reason: "todo name must not be empty".to_string(),
        });
    }

    // Characters, not bytes: "140 characters" is the user-facing contract.
    if name.chars().count() > MAX_NAME_LEN {
        return Err(TodoError::Validation {
            reason: format!("todo name must be {MAX_NAME_LEN} characters or less"),
        });
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_name_is_rejected() {
        assert!(matches!(
            validate_name(""),
            Err(TodoError::Validation { .. })
        ));
    }

    #[test]
    fn boundary_lengths() {
        assert!(validate_name("x").is_ok());
        assert!(validate_name(&"x".repeat(140)).is_ok());
        assert!(validate_name(&"x".repeat(141)).is_err());
    }

    #[test]
    fn length_is_counted_in_characters() {
        // 140 multi-byte characters exceed 140 bytes but are still valid.
        let name = "\u{00e9}".repeat(140);
        assert!(name.len() > 140);
        assert!(validate_name(&name).is_ok());
    }

    proptest! {
        #[test]
        fn names_within_bounds_validate(len in 1usize..=140) {
            let name = "a".repeat(len);
            prop_assert!(validate_name(&name).is_ok());
        }

        #[test]
        fn names_over_bounds_reject(len in 141usize..500) {
            let name = "a".repeat(len);
            prop_assert!(validate_name(&name).is_err());
        }
    }
}
