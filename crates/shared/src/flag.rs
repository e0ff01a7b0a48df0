//! String-encoded boolean flags.
//!
//! The web application stores several toggles as text (`'true'` / `'false'`).
//! They are converted to `bool` once, at the boundary, with [`parse_flag`].

/// Interprets a stored flag. Only `true` (any case, surrounding whitespace
/// ignored) is truthy; every other value, including an empty one, is false.
pub fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

/// Same as [`parse_flag`] for nullable columns.
pub fn parse_optional_flag(value: Option<&str>) -> bool {
    value.map(parse_flag).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag_true_variants() {
        assert!(parse_flag("true"));
        assert!(parse_flag("TRUE"));
        assert!(parse_flag(" True "));
    }

    #[test]
    fn test_parse_flag_everything_else_is_false() {
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
        assert!(!parse_flag("1"));
        assert!(!parse_flag("yes"));
    }

    #[test]
    fn test_parse_optional_flag() {
        assert!(parse_optional_flag(Some("true")));
        assert!(!parse_optional_flag(None));
    }
}
