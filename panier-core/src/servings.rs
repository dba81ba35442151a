//! Servings extraction from free text.
//!
//! An ordered pattern list shared by the search client (title+snippet
//! back-fill) and the content extractor (page text fallback). The first
//! matching pattern wins; values outside (0, 50] are rejected.

use regex::Regex;
use std::sync::LazyLock;

/// Servings above this are treated as noise (batch yields, typos).
pub const MAX_SERVINGS: u32 = 50;

static FOR_N: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:for|pour)\s+(\d{1,3})\s+(?:servings?|portions?|personnes?|people|convives)\b")
        .expect("Invalid for-N regex")
});

static RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,3})\s*(?:-|–|à|to)\s*(\d{1,3})\s*(?:servings?|portions?|personnes?)\b")
        .expect("Invalid range regex")
});

static PARENTHESIZED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\(\s*(\d{1,3})\s*(?:servings?|portions?|personnes?|parts?)\s*\)")
        .expect("Invalid parenthesized regex")
});

static ABBREVIATED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,3})\s*(?:pers|port)\b\.?").expect("Invalid abbreviation regex")
});

static SERVES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bserves?\s+(\d{1,3})\b").expect("Invalid serves regex"));

static PLAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,3})\s+(?:servings?|portions?|personnes?)\b")
        .expect("Invalid plain regex")
});

static YIELDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:yields?|makes|donne|rend)\s+(\d{1,3})\b").expect("Invalid yields regex")
});

/// A dish volume implies roughly four servings per liter.
static DISH_LITERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:plat|dish|pot)\s+(?:de|of)\s+(\d{1,2})\s*(?:litres?|liters?|l)\b")
        .expect("Invalid dish-liters regex")
});

/// Extract a servings count from free text. First matching pattern wins.
pub fn parse_servings(text: &str) -> Option<u32> {
    let value = if let Some(cap) = FOR_N.captures(text) {
        cap[1].parse::<u32>().ok()?
    } else if let Some(cap) = RANGE.captures(text) {
        let low = cap[1].parse::<u32>().ok()?;
        let high = cap[2].parse::<u32>().ok()?;
        (low + high) / 2
    } else if let Some(cap) = PARENTHESIZED.captures(text) {
        cap[1].parse::<u32>().ok()?
    } else if let Some(cap) = ABBREVIATED.captures(text) {
        cap[1].parse::<u32>().ok()?
    } else if let Some(cap) = SERVES.captures(text) {
        cap[1].parse::<u32>().ok()?
    } else if let Some(cap) = PLAIN.captures(text) {
        cap[1].parse::<u32>().ok()?
    } else if let Some(cap) = YIELDS.captures(text) {
        cap[1].parse::<u32>().ok()?
    } else if let Some(cap) = DISH_LITERS.captures(text) {
        cap[1].parse::<u32>().ok()? * 4
    } else {
        return None;
    };

    valid_servings(value)
}

/// Bounds check shared with structured-data extraction.
pub fn valid_servings(value: u32) -> Option<u32> {
    if value > 0 && value <= MAX_SERVINGS {
        Some(value)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_n_servings() {
        assert_eq!(parse_servings("Delicious stew for 6 servings"), Some(6));
        assert_eq!(parse_servings("Ragoût pour 4 personnes"), Some(4));
    }

    #[test]
    fn test_range_takes_midpoint() {
        assert_eq!(parse_servings("Lasagne, 4-6 portions"), Some(5));
        assert_eq!(parse_servings("soup for 2 to 4 servings"), Some(3));
    }

    #[test]
    fn test_parenthesized_count() {
        assert_eq!(parse_servings("Poulet au beurre (8 portions)"), Some(8));
    }

    #[test]
    fn test_abbreviations() {
        assert_eq!(parse_servings("Gratin dauphinois 6 pers."), Some(6));
        assert_eq!(parse_servings("Serves 10, easily doubled"), Some(10));
    }

    #[test]
    fn test_plain_count() {
        assert_eq!(parse_servings("Chili végétarien 12 portions"), Some(12));
    }

    #[test]
    fn test_yields() {
        assert_eq!(parse_servings("donne 8 généreuses assiettes"), Some(8));
        assert_eq!(parse_servings("yields 4"), Some(4));
    }

    #[test]
    fn test_dish_liters_estimates_four_per_liter() {
        assert_eq!(parse_servings("soupe dans un plat de 3 litres"), Some(12));
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        assert_eq!(parse_servings("for 0 servings"), None);
        assert_eq!(parse_servings("for 120 servings"), None);
    }

    #[test]
    fn test_no_match() {
        assert_eq!(parse_servings("Poulet rôti du dimanche"), None);
    }
}
