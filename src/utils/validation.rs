//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! Limits match the storefront UX; SurrealDB strings carry no built-in
//! length enforcement so everything is checked at the handler boundary.

use crate::utils::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: product titles, category names, customer names
pub const MAX_NAME_LEN: usize = 200;

/// Slugs (categories, products)
pub const MAX_SLUG_LEN: usize = 100;

/// Notes, descriptions
pub const MAX_NOTE_LEN: usize = 500;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Passwords (before hashing)
pub const MAX_PASSWORD_LEN: usize = 128;
pub const MIN_PASSWORD_LEN: usize = 8;

/// Address lines (area, block, street, avenue, house number)
pub const MAX_ADDRESS_LEN: usize = 200;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty after trimming and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        )));
    }
    Ok(())
}

/// Validate a Kuwaiti local phone number: exactly 8 digits after stripping
/// any separators. Returns the normalized digit string.
pub fn validate_phone(phone: &str) -> Result<String, AppError> {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != 8 {
        return Err(AppError::validation("Phone must be exactly 8 digits"));
    }
    Ok(digits)
}

/// Minimal email shape check: `local@domain` with a dot in the domain.
pub fn is_valid_email(email: &str) -> bool {
    if email.len() > MAX_EMAIL_LEN {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

/// Validate a URL slug: lowercase letters, digits and hyphens only.
pub fn validate_slug(slug: &str, field: &str) -> Result<(), AppError> {
    if slug.is_empty() || slug.len() > MAX_SLUG_LEN {
        return Err(AppError::validation(format!(
            "{field} must be 1-{MAX_SLUG_LEN} characters"
        )));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(AppError::validation(format!(
            "{field} must contain only lowercase letters, numbers, and hyphens"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_accepts_exactly_eight_digits() {
        assert_eq!(validate_phone("51234567").unwrap(), "51234567");
        assert_eq!(validate_phone("5123 4567").unwrap(), "51234567");
        assert_eq!(validate_phone("5123-4567").unwrap(), "51234567");
    }

    #[test]
    fn phone_rejects_wrong_length() {
        assert!(validate_phone("1234567").is_err());
        assert!(validate_phone("123456789").is_err());
        assert!(validate_phone("").is_err());
        assert!(validate_phone("+96551234567").is_err());
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("first.last@shop.example.org"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("@b.com"));
        assert!(!is_valid_email("a@"));
        assert!(!is_valid_email("a@nodot"));
    }

    #[test]
    fn slug_charset() {
        assert!(validate_slug("protein-bars-24", "slug").is_ok());
        assert!(validate_slug("Protein", "slug").is_err());
        assert!(validate_slug("has space", "slug").is_err());
        assert!(validate_slug("", "slug").is_err());
    }

    #[test]
    fn required_text_trims() {
        assert!(validate_required_text("  ", "name", MAX_NAME_LEN).is_err());
        assert!(validate_required_text("ok", "name", MAX_NAME_LEN).is_ok());
    }
}
