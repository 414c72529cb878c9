//! Input validation for account data.
//!
//! Every function returns the normalized value on success so callers store
//! exactly what was checked.

use validator::ValidateEmail;

use super::error::UserError;
use super::types::ContactKind;

/// Validates and normalizes an email address (trimmed, lowercased).
///
/// # Errors
///
/// Returns `UserError::Validation` for malformed addresses.
pub fn email(value: &str) -> Result<String, UserError> {
    let normalized = value.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(UserError::validation("Email is required"));
    }
    if !normalized.validate_email() {
        return Err(UserError::validation("Invalid email format"));
    }
    Ok(normalized)
}

/// Validates and normalizes a phone number.
///
/// Accepts an optional leading `+` followed by 10 to 15 digits; spaces and
/// dashes are dropped.
///
/// # Errors
///
/// Returns `UserError::Validation` for anything else.
pub fn phone(value: &str) -> Result<String, UserError> {
    let compact: String = value
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .collect();
    if compact.is_empty() {
        return Err(UserError::validation("Phone number is required"));
    }

    let digits = compact.strip_prefix('+').unwrap_or(&compact);
    if !(10..=15).contains(&digits.len()) || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(UserError::validation("Invalid phone number format"));
    }
    Ok(compact)
}

/// Validates a contact value of the given kind.
///
/// # Errors
///
/// See [`email`] and [`phone`].
pub fn contact(kind: ContactKind, value: &str) -> Result<String, UserError> {
    match kind {
        ContactKind::Email => email(value),
        ContactKind::Phone => phone(value),
    }
}

/// Validates a login name: 3 to 30 characters of letters, digits, `_` or `.`.
///
/// # Errors
///
/// Returns `UserError::Validation` when the rule is broken.
pub fn username(value: &str) -> Result<String, UserError> {
    let trimmed = value.trim();
    let valid_chars = trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    if !(3..=30).contains(&trimmed.len()) || !valid_chars {
        return Err(UserError::validation(
            "Username must be 3-30 characters of letters, digits, '_' or '.'",
        ));
    }
    Ok(trimmed.to_string())
}

/// Validates a non-blank name of at most 100 characters.
///
/// # Errors
///
/// Returns `UserError::Validation` when blank or too long.
pub fn full_name(value: &str) -> Result<String, UserError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(UserError::validation("Full name is required"));
    }
    if trimmed.chars().count() > 100 {
        return Err(UserError::validation("Full name is too long"));
    }
    Ok(trimmed.to_string())
}

/// Validates a new password and its confirmation.
///
/// At least 8 characters with at least one letter and one digit.
///
/// # Errors
///
/// Returns `UserError::Validation` when the rule is broken or the
/// confirmation differs.
pub fn password(value: &str, confirm: &str) -> Result<(), UserError> {
    if value != confirm {
        return Err(UserError::validation("Password confirmation does not match"));
    }
    let has_letter = value.chars().any(char::is_alphabetic);
    let has_digit = value.chars().any(|c| c.is_ascii_digit());
    if value.chars().count() < 8 || !has_letter || !has_digit {
        return Err(UserError::validation(
            "Password must be at least 8 characters and contain letters and digits",
        ));
    }
    Ok(())
}

/// Validates a transaction PIN: exactly six digits.
///
/// # Errors
///
/// Returns `UserError::Validation` otherwise.
pub fn pin(value: &str) -> Result<(), UserError> {
    if value.len() != 6 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(UserError::validation("PIN must be exactly 6 digits"));
    }
    Ok(())
}

/// Validates a new PIN and its confirmation.
///
/// # Errors
///
/// Returns `UserError::Validation` when malformed or the confirmation differs.
pub fn new_pin(value: &str, confirm: &str) -> Result<(), UserError> {
    pin(value)?;
    if value != confirm {
        return Err(UserError::validation("PIN confirmation does not match"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("  Budi@Example.COM ", Some("budi@example.com"))]
    #[case("not-an-email", None)]
    #[case("", None)]
    fn test_email(#[case] input: &str, #[case] expected: Option<&str>) {
        assert_eq!(email(input).ok().as_deref(), expected);
    }

    #[rstest]
    #[case("081234567890", Some("081234567890"))]
    #[case("+62 812-3456-7890", Some("+6281234567890"))]
    #[case("12345", None)]
    #[case("08123abc7890", None)]
    #[case("+", None)]
    fn test_phone(#[case] input: &str, #[case] expected: Option<&str>) {
        assert_eq!(phone(input).ok().as_deref(), expected);
    }

    #[rstest]
    #[case("budi_s", true)]
    #[case("b.santoso99", true)]
    #[case("bs", false)]
    #[case("budi santoso", false)]
    fn test_username(#[case] input: &str, #[case] ok: bool) {
        assert_eq!(username(input).is_ok(), ok);
    }

    #[rstest]
    #[case("rahasia123", "rahasia123", true)]
    #[case("rahasia123", "rahasia124", false)]
    #[case("short1", "short1", false)]
    #[case("onlyletters", "onlyletters", false)]
    #[case("1234567890", "1234567890", false)]
    fn test_password(#[case] value: &str, #[case] confirm: &str, #[case] ok: bool) {
        assert_eq!(password(value, confirm).is_ok(), ok);
    }

    #[rstest]
    #[case("123456", true)]
    #[case("12345", false)]
    #[case("1234567", false)]
    #[case("12a456", false)]
    fn test_pin(#[case] value: &str, #[case] ok: bool) {
        assert_eq!(pin(value).is_ok(), ok);
    }

    #[test]
    fn test_new_pin_confirmation() {
        assert!(new_pin("123456", "123456").is_ok());
        let err = new_pin("123456", "654321").unwrap_err();
        assert_eq!(err.to_string(), "PIN confirmation does not match");
    }

    #[test]
    fn test_full_name() {
        assert_eq!(full_name("  Budi Santoso ").unwrap(), "Budi Santoso");
        assert!(full_name("   ").is_err());
    }
}
