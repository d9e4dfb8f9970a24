//! Input validation and normalization for tenant identity fields

use once_cell::sync::Lazy;
use regex::Regex;

/// Slug length bounds
pub const MIN_SLUG_LENGTH: usize = 3;
pub const MAX_SLUG_LENGTH: usize = 40;

static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid slug regex"));

/// Slug validation errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug must be at least {MIN_SLUG_LENGTH} characters")]
    TooShort,

    #[error("slug must be at most {MAX_SLUG_LENGTH} characters")]
    TooLong,

    #[error("slug may only contain lowercase letters, digits, and single hyphens")]
    InvalidCharacters,

    #[error("slug {0} is reserved")]
    Reserved(String),
}

/// Slugs that would collide with platform-owned subdomains
const RESERVED_SLUGS: &[&str] = &["www", "api", "admin", "app", "billing", "status", "mail"];

/// Validate a tenant code (slug): lowercase alphanum plus single interior
/// hyphens, bounded length, not a reserved platform name.
pub fn validate_slug(slug: &str) -> Result<(), SlugError> {
    if slug.len() < MIN_SLUG_LENGTH {
        return Err(SlugError::TooShort);
    }
    if slug.len() > MAX_SLUG_LENGTH {
        return Err(SlugError::TooLong);
    }
    if !SLUG_RE.is_match(slug) {
        return Err(SlugError::InvalidCharacters);
    }
    if RESERVED_SLUGS.contains(&slug) {
        return Err(SlugError::Reserved(slug.to_string()));
    }
    Ok(())
}

/// Normalize a host domain for lookup: trim, lowercase, strip any port.
///
/// `Host` headers legally carry a port; the registry stores bare domains.
pub fn normalize_domain(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_port = match trimmed.rsplit_once(':') {
        // Only strip when the suffix is numeric; IPv6 literals keep their colons
        Some((host, port)) if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => host,
        _ => trimmed,
    };
    without_port.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_slugs() {
        assert!(validate_slug("ma-boutique").is_ok());
        assert!(validate_slug("acme").is_ok());
        assert!(validate_slug("shop-42").is_ok());
    }

    #[test]
    fn test_slug_length_bounds() {
        assert_eq!(validate_slug("ab"), Err(SlugError::TooShort));
        let long = "a".repeat(MAX_SLUG_LENGTH + 1);
        assert_eq!(validate_slug(&long), Err(SlugError::TooLong));
    }

    #[test]
    fn test_slug_rejects_bad_characters() {
        assert_eq!(validate_slug("Ma-Boutique"), Err(SlugError::InvalidCharacters));
        assert_eq!(validate_slug("shop_42"), Err(SlugError::InvalidCharacters));
        assert_eq!(validate_slug("-edge"), Err(SlugError::InvalidCharacters));
        assert_eq!(validate_slug("edge-"), Err(SlugError::InvalidCharacters));
        assert_eq!(validate_slug("a--b"), Err(SlugError::InvalidCharacters));
    }

    #[test]
    fn test_reserved_slugs() {
        assert_eq!(validate_slug("admin"), Err(SlugError::Reserved("admin".into())));
    }

    #[test]
    fn test_normalize_domain() {
        assert_eq!(normalize_domain("  Shop.Example.COM  "), "shop.example.com");
        assert_eq!(normalize_domain("shop.example.com:8443"), "shop.example.com");
        assert_eq!(normalize_domain("shop.example.com:"), "shop.example.com:");
    }
}
