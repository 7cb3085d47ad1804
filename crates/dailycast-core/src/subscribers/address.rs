use crate::{Error, Result};

const COUNTRY_PREFIX: char = '1';
const MIN_DIGITS: usize = 8;

/// Normalize a raw messaging address to canonical form: digits only,
/// with the country prefix prepended when absent. Everything stored or
/// matched downstream uses this form.
pub fn normalize_address(raw: &str) -> Result<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() < MIN_DIGITS {
        return Err(Error::InvalidAddress(format!(
            "address '{}' has too few digits",
            raw
        )));
    }

    if digits.starts_with(COUNTRY_PREFIX) {
        Ok(digits)
    } else {
        Ok(format!("{}{}", COUNTRY_PREFIX, digits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatted_number_normalizes() {
        assert_eq!(normalize_address("(555) 123-4567").unwrap(), "15551234567");
    }

    #[test]
    fn test_bare_number_gets_prefix() {
        assert_eq!(normalize_address("5551234567").unwrap(), "15551234567");
    }

    #[test]
    fn test_prefixed_number_unchanged() {
        assert_eq!(normalize_address("15551234567").unwrap(), "15551234567");
    }

    #[test]
    fn test_equivalent_inputs_collapse() {
        let canonical = normalize_address("15551234567").unwrap();
        assert_eq!(normalize_address("(555) 123-4567").unwrap(), canonical);
        assert_eq!(normalize_address("5551234567").unwrap(), canonical);
    }

    #[test]
    fn test_too_few_digits_rejected() {
        assert!(matches!(
            normalize_address("12345"),
            Err(Error::InvalidAddress(_))
        ));
        assert!(matches!(
            normalize_address("not a number"),
            Err(Error::InvalidAddress(_))
        ));
    }
}
