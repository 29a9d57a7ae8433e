//! E.164 phone number validation and masking
//!
//! Destination numbers must never reach logs or client-visible payloads in
//! full. Every component that mentions a destination goes through
//! [`mask_phone`].

use once_cell::sync::Lazy;
use regex::Regex;

/// E.164: `+`, a leading digit 1-9, then 6 to 14 further digits.
///
/// ASCII digit class only (`\d` in the regex crate is Unicode-aware).
static E164_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+[1-9][0-9]{6,14}$").expect("E.164 pattern is a valid regex"));

/// Placeholder used when no destination was supplied at all
pub const MASK_MISSING: &str = "N/A";

/// Returns true iff `phone` is a well-formed E.164 number
///
/// No trimming or normalization is applied: `" +12025551234"` is invalid.
pub fn is_e164(phone: &str) -> bool {
    E164_PATTERN.is_match(phone)
}

/// Mask a phone number for logs and responses
///
/// Keeps the first 3 and last 4 characters (`+12025551234` → `+12***1234`).
/// Values too short to mask meaningfully are fully hidden.
pub fn mask_phone(phone: &str) -> String {
    let chars: Vec<char> = phone.trim().chars().collect();
    if chars.is_empty() {
        return MASK_MISSING.to_string();
    }
    if chars.len() < 8 {
        return "***".to_string();
    }

    let prefix: String = chars[..3].iter().collect();
    let suffix: String = chars[chars.len() - 4..].iter().collect();
    format!("{}***{}", prefix, suffix)
}

/// Mask an optional phone number (`None` → `"N/A"`)
pub fn mask_optional(phone: Option<&str>) -> String {
    phone.map(mask_phone).unwrap_or_else(|| MASK_MISSING.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_e164_accepts_international_numbers() {
        assert!(is_e164("+573222063010")); // Colombia
        assert!(is_e164("+12025551234")); // US
        assert!(is_e164("+525512345678")); // Mexico
        assert!(is_e164("+1234567")); // 7 digits total, minimum
        assert!(is_e164("+123456789012345")); // 15 digits total, maximum
    }

    #[test]
    fn test_e164_rejects_malformed_numbers() {
        assert!(!is_e164("573222063010"), "missing leading +");
        assert!(!is_e164("+0123456"), "leading digit must be 1-9");
        assert!(!is_e164("+123456"), "too short");
        assert!(!is_e164("+1234567890123456"), "too long");
        assert!(!is_e164("+1 202 555 1234"), "no separators");
        assert!(!is_e164("+1202555123a"));
        assert!(!is_e164(""));
        assert!(!is_e164(" +12025551234"));
        assert!(!is_e164("+12025551234\n"));
    }

    #[test]
    fn test_e164_rejects_non_ascii_digits() {
        // Arabic-Indic digits
        assert!(!is_e164("+١٢٣٤٥٦٧٨"));
    }

    #[test]
    fn test_mask_keeps_prefix_and_suffix() {
        assert_eq!(mask_phone("+12025551234"), "+12***1234");
        assert_eq!(mask_phone("+573222063010"), "+57***3010");
    }

    #[test]
    fn test_mask_never_echoes_short_values() {
        assert_eq!(mask_phone("+12345"), "***");
        assert_eq!(mask_phone("1234567"), "***");
    }

    #[test]
    fn test_mask_missing() {
        assert_eq!(mask_phone(""), "N/A");
        assert_eq!(mask_phone("   "), "N/A");
        assert_eq!(mask_optional(None), "N/A");
        assert_eq!(mask_optional(Some("+12025551234")), "+12***1234");
    }
}
