//! Section and entity name validation.
//!
//! Valid section names:
//! - Must be non-empty
//! - Must not contain whitespace or `.` (dots are filter path separators)
//! - Must not start with `$`
//!
//! Entity names only need to be non-empty.

use crate::error::{StoreError, StoreResult};

/// Validate a section name, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use nodm_store::names::validate_section;
///
/// assert!(validate_section("butas").is_ok());
/// assert!(validate_section("").is_err());
/// assert!(validate_section("a.b").is_err());
/// ```
pub fn validate_section(section: &str) -> StoreResult<()> {
    let reject = |reason: &str| {
        Err(StoreError::InvalidSection {
            section: section.to_string(),
            reason: reason.to_string(),
        })
    };

    if section.is_empty() {
        return reject("section name must not be empty");
    }
    if section.chars().any(char::is_whitespace) {
        return reject("must not contain whitespace");
    }
    if section.contains('.') {
        return reject("must not contain '.'");
    }
    if section.starts_with('$') {
        return reject("must not start with '$'");
    }
    Ok(())
}

/// Validate an entity name within `section`.
pub fn validate_name(section: &str, name: &str) -> StoreResult<()> {
    if name.is_empty() {
        return Err(StoreError::InvalidName {
            section: section.to_string(),
            reason: "entity name must not be empty".into(),
        });
    }
    Ok(())
}

/// Validate a full `(section, name)` key.
pub fn validate_key(section: &str, name: &str) -> StoreResult<()> {
    validate_section(section)?;
    validate_name(section, name)
}
