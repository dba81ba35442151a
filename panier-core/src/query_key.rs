//! Cache key normalization.
//!
//! Set-equal token lists must produce identical keys regardless of order or
//! case; cache correctness depends on it.

/// Build the canonical cache key for a discovery request.
pub fn normalize_key(
    ingredients: &[String],
    budget_raw: &str,
    allergies: &[String],
    filters: &[String],
) -> String {
    format!(
        "ingredients:{}-budget:{}-allergies:{}-filters:{}",
        normalize_tokens(ingredients),
        budget_raw.trim(),
        normalize_tokens(allergies),
        normalize_tokens(filters),
    )
}

/// Lowercase, trim, drop empties, sort and dedupe, join with commas.
fn normalize_tokens(tokens: &[String]) -> String {
    let mut cleaned: Vec<String> = tokens
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    cleaned.sort();
    cleaned.dedup();
    cleaned.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_key_is_order_independent() {
        let a = normalize_key(
            &strings(&["Poulet", "riz"]),
            "25",
            &strings(&["gluten"]),
            &strings(&["rapide"]),
        );
        let b = normalize_key(
            &strings(&["riz", "poulet"]),
            "25",
            &strings(&["gluten"]),
            &strings(&["rapide"]),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_is_case_independent() {
        let a = normalize_key(&strings(&["POULET", "Riz"]), "", &[], &[]);
        let b = normalize_key(&strings(&["poulet", "riz"]), "", &[], &[]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_dedupes_and_trims_tokens() {
        let a = normalize_key(&strings(&[" poulet ", "poulet", ""]), "", &[], &[]);
        let b = normalize_key(&strings(&["poulet"]), "", &[], &[]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_template_shape() {
        let key = normalize_key(
            &strings(&["riz", "poulet"]),
            " 25 ",
            &strings(&["gluten"]),
            &[],
        );
        assert_eq!(key, "ingredients:poulet,riz-budget:25-allergies:gluten-filters:");
    }
}
