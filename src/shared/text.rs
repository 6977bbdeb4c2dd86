use crate::core::error::{AppError, Result};

/// Normalize a user-supplied display name.
///
/// Trims, collapses runs of whitespace into single spaces and capitalizes every
/// word: first letter upper case, the rest lower case.
///
/// ```ignore
/// assert_eq!(normalize_name("  my   goals"), "My Goals");
/// ```
pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalize `raw` and check it is non-empty and at most `max_chars` long.
///
/// `label` names the field in the error message.
pub fn normalized_name(raw: &str, max_chars: usize, label: &str) -> Result<String> {
    let name = normalize_name(raw);
    if name.is_empty() {
        return Err(AppError::Validation(format!("{} is required", label)));
    }
    if name.chars().count() > max_chars {
        return Err(AppError::Validation(format!(
            "{} must be at most {} characters",
            label, max_chars
        )));
    }
    Ok(name)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };

    let mut upper = first.to_uppercase();
    let mut out = String::with_capacity(word.len());
    // Keep letters whose upper case spans several chars (e.g. 'ß') as they are
    match (upper.next(), upper.next()) {
        (Some(single), None) => out.push(single),
        _ => out.push(first),
    }
    out.push_str(&chars.as_str().to_lowercase());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_examples() {
        assert_eq!(normalize_name("  my   goals"), "My Goals");
        assert_eq!(normalize_name("work"), "Work");
        assert_eq!(normalize_name("hEALTH and FITNESS"), "Health And Fitness");
        assert_eq!(normalize_name("\tread\nbooks "), "Read Books");
        assert_eq!(normalize_name("élan vital"), "Élan Vital");
    }

    #[test]
    fn test_normalize_blank_is_empty() {
        assert_eq!(normalize_name(""), "");
        assert_eq!(normalize_name("   \t "), "");
    }

    #[test]
    fn test_normalize_keeps_multi_char_uppercase() {
        assert_eq!(normalize_name("ßtraße"), "ßtraße");
    }

    #[test]
    fn test_normalized_name_bounds() {
        assert_eq!(normalized_name(" work ", 100, "Name").unwrap(), "Work");
        assert!(matches!(
            normalized_name("   ", 100, "Name"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            normalized_name("abcdef", 5, "Name"),
            Err(AppError::Validation(_))
        ));
    }

    proptest! {
        /// Normalizing twice gives the same result as normalizing once.
        #[test]
        fn normalize_is_idempotent(raw in "[a-zA-Z0-9äöüÄÖÜßéÉ \\t\\n]{0,40}") {
            let once = normalize_name(&raw);
            prop_assert_eq!(normalize_name(&once), once);
        }

        /// Output never carries leading, trailing or doubled spaces.
        #[test]
        fn normalize_collapses_whitespace(raw in "[a-z \\t]{0,40}") {
            let normalized = normalize_name(&raw);
            prop_assert_eq!(normalized.trim(), normalized.as_str());
            prop_assert!(!normalized.contains("  "));
        }
    }
}
