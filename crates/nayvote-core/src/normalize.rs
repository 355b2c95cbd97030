//! Input normalization.
//!
//! Missing and whitespace-only text is not an error: it normalizes to the
//! empty string, which every tier treats as "no evidence".

/// Trims the given text, mapping a missing value to the empty string.
pub fn normalize(text: Option<&str>) -> &str {
    text.map(str::trim).unwrap_or("")
}

/// Returns true if the text carries no evidence after trimming.
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_normalizes_to_empty() {
        assert_eq!(normalize(None), "");
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(normalize(Some("  Vote nay \n")), "Vote nay");
    }

    #[test]
    fn whitespace_only_is_blank() {
        assert_eq!(normalize(Some(" \t\n ")), "");
        assert!(is_blank(" \t\n "));
        assert!(is_blank(""));
        assert!(!is_blank(" - "));
    }
}
