//! Ingredient parsing module.
//!
//! Parses raw ingredient strings (e.g. "2 tasses de farine", "1/2 cup sugar")
//! into structured data. This is a best-effort, priority-ordered micro-parser,
//! not a grammar: shapes are tried in a fixed order and anything unrecognized
//! collapses into the ingredient name.

use regex::Regex;
use std::sync::LazyLock;

use crate::types::Ingredient;

/// Cooking units, French and English (lowercase for matching).
/// Sorted by length at runtime (longest first) so multi-word units like
/// "cuillère à soupe" match before "cuillère". Size adjectives (medium,
/// grosse, ...) are deliberately absent: they belong to the name.
static UNITS_SORTED: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    let mut units = UNITS_RAW.to_vec();
    units.sort_by(|a, b| b.len().cmp(&a.len()));
    units
});

const UNITS_RAW: &[&str] = &[
    // Volume - French
    "cuillères à soupe",
    "cuillère à soupe",
    "c. à soupe",
    "c. à s.",
    "cuillères à thé",
    "cuillère à thé",
    "c. à thé",
    "cuillères à café",
    "cuillère à café",
    "c. à café",
    "tasses",
    "tasse",
    "millilitres",
    "millilitre",
    "litres",
    "litre",
    // Volume - English
    "fluid ounces",
    "fluid ounce",
    "tablespoons",
    "tablespoon",
    "teaspoons",
    "teaspoon",
    "cups",
    "cup",
    "tbsp",
    "tsp",
    "milliliters",
    "milliliter",
    "liters",
    "liter",
    "ml",
    "l",
    // Weight
    "kilogrammes",
    "kilogramme",
    "kilograms",
    "kilogram",
    "grammes",
    "gramme",
    "grams",
    "gram",
    "livres",
    "livre",
    "pounds",
    "pound",
    "onces",
    "once",
    "ounces",
    "ounce",
    "kg",
    "lbs",
    "lb",
    "oz",
    "g",
    // Count-like
    "gousses",
    "gousse",
    "pincées",
    "pincée",
    "bottes",
    "botte",
    "boîtes",
    "boîte",
    "conserves",
    "conserve",
    "sachets",
    "sachet",
    "tranches",
    "tranche",
    "poignées",
    "poignée",
    "branches",
    "branche",
    "tiges",
    "tige",
    "enveloppes",
    "enveloppe",
    "handfuls",
    "handful",
    "cloves",
    "clove",
    "pinches",
    "pinch",
    "bunches",
    "bunch",
    "slices",
    "slice",
    "sprigs",
    "sprig",
    "stalks",
    "stalk",
    "sticks",
    "stick",
    "heads",
    "head",
    "packages",
    "package",
    "cans",
    "can",
];

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

/// Leading quantity: mixed number, fraction, decimal or integer.
static QUANTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((?:\d+\s+\d+/\d+)|(?:\d+/\d+)|(?:\d+(?:[.,]\d+)?))\s+(.+)$")
        .expect("Invalid quantity regex")
});

/// "phrase CONNECTOR name" split, handling both "de la farine" and "d'huile".
static CONNECTOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?)(?:\s+(?:of|des|du|de)\s+|\s+d['’]\s*)(.+)$")
        .expect("Invalid connector regex")
});

/// Parse a single ingredient line.
///
/// Shapes tried in order: "qty unit-phrase CONNECTOR name",
/// "qty unit-phrase name", "qty name", then "unit CONNECTOR name" with an
/// implied quantity of 1. Strings shorter than two characters are rejected.
pub fn parse_ingredient_line(raw: &str) -> Option<Ingredient> {
    let text = WHITESPACE.replace_all(raw.trim(), " ").to_string();
    if text.chars().count() < 2 {
        return None;
    }

    if let Some(cap) = QUANTITY.captures(&text) {
        let quantity = cap[1].to_string();
        let rest = cap[2].trim().to_string();

        // Shape 1: "qty unit-phrase of/de name". The middle phrase must
        // validate against the vocabulary, otherwise it is part of the name
        // (a size adjective, not a unit).
        if let Some(c) = CONNECTOR.captures(&rest) {
            let middle = c[1].trim().to_string();
            if is_known_unit(&middle) {
                return Some(Ingredient {
                    name: strip_article(c[2].trim()).to_string(),
                    quantity: Some(quantity),
                    unit: Some(middle),
                });
            }
        }

        // Shape 2: "qty unit-phrase name" with no connector; the unit is
        // matched as a vocabulary prefix at a word boundary.
        if let Some((unit, name)) = split_unit_prefix(&rest) {
            if !name.is_empty() {
                return Some(Ingredient {
                    name,
                    quantity: Some(quantity),
                    unit: Some(unit),
                });
            }
        }

        // Shape 3: "qty name".
        return Some(Ingredient {
            name: rest,
            quantity: Some(quantity),
            unit: None,
        });
    }

    // Special case: "unit of name" with an implied quantity of 1.
    if let Some(c) = CONNECTOR.captures(&text) {
        let middle = c[1].trim().to_string();
        if is_known_unit(&middle) {
            return Some(Ingredient {
                name: strip_article(c[2].trim()).to_string(),
                quantity: Some("1".to_string()),
                unit: Some(middle),
            });
        }
    }

    // Nothing matched: the whole string is the name.
    Some(Ingredient {
        name: text,
        quantity: None,
        unit: None,
    })
}

/// Parse multiple ingredient lines, dropping the unparsable ones.
pub fn parse_ingredient_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Vec<Ingredient> {
    lines.into_iter().filter_map(parse_ingredient_line).collect()
}

/// Validate a captured phrase against the unit vocabulary.
///
/// Bidirectional substring match: the phrase may contain a unit as a whole
/// word ("grosses tasses") or be a fragment of a longer unit ("cuillère").
fn is_known_unit(phrase: &str) -> bool {
    let p = phrase.to_lowercase();
    if p.is_empty() {
        return false;
    }
    let padded = format!(" {} ", p);
    UNITS_SORTED.iter().any(|u| {
        *u == p || padded.contains(&format!(" {} ", u)) || (p.len() >= 2 && u.contains(p.as_str()))
    })
}

/// Match a unit from the vocabulary as a prefix of `s`, at a word boundary.
/// Returns (unit, remaining name).
fn split_unit_prefix(s: &str) -> Option<(String, String)> {
    let lower = s.to_lowercase();
    for unit in UNITS_SORTED.iter() {
        if lower.starts_with(unit) {
            let after = &s[unit.len()..];
            if after.is_empty() || after.starts_with(' ') {
                return Some(((*unit).to_string(), after.trim().to_string()));
            }
        }
    }
    None
}

/// Drop a leading French article left over after the connector split
/// ("de la sauce" → name "sauce").
fn strip_article(name: &str) -> &str {
    for article in ["la ", "le ", "les ", "l'", "l’"] {
        if let Some(stripped) = name.strip_prefix(article) {
            return stripped.trim_start();
        }
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_french_quantity_unit_connector() {
        let result = parse_ingredient_line("2 tasses de farine").unwrap();
        assert_eq!(result.quantity.as_deref(), Some("2"));
        assert_eq!(result.unit.as_deref(), Some("tasses"));
        assert_eq!(result.name, "farine");
    }

    #[test]
    fn test_fraction_with_elided_connector() {
        let result = parse_ingredient_line("1/2 cuillère à soupe d'huile").unwrap();
        assert_eq!(result.quantity.as_deref(), Some("1/2"));
        assert_eq!(result.unit.as_deref(), Some("cuillère à soupe"));
        assert_eq!(result.name, "huile");
    }

    #[test]
    fn test_size_adjective_is_not_a_unit() {
        let result = parse_ingredient_line("8 medium sized shrimp").unwrap();
        assert_eq!(result.quantity.as_deref(), Some("8"));
        assert_eq!(result.unit, None);
        assert_eq!(result.name, "medium sized shrimp");
    }

    #[test]
    fn test_unit_of_name_implies_quantity_one() {
        let result = parse_ingredient_line("handful of bean sprouts").unwrap();
        assert_eq!(result.quantity.as_deref(), Some("1"));
        assert_eq!(result.unit.as_deref(), Some("handful"));
        assert_eq!(result.name, "bean sprouts");
    }

    #[test]
    fn test_unit_without_connector() {
        let result = parse_ingredient_line("500 g boeuf haché").unwrap();
        assert_eq!(result.quantity.as_deref(), Some("500"));
        assert_eq!(result.unit.as_deref(), Some("g"));
        assert_eq!(result.name, "boeuf haché");
    }

    #[test]
    fn test_quantity_only() {
        let result = parse_ingredient_line("3 oeufs").unwrap();
        assert_eq!(result.quantity.as_deref(), Some("3"));
        assert_eq!(result.unit, None);
        assert_eq!(result.name, "oeufs");
    }

    #[test]
    fn test_mixed_number() {
        let result = parse_ingredient_line("1 1/2 tasses de sucre").unwrap();
        assert_eq!(result.quantity.as_deref(), Some("1 1/2"));
        assert_eq!(result.unit.as_deref(), Some("tasses"));
        assert_eq!(result.name, "sucre");
    }

    #[test]
    fn test_article_stripped_after_connector() {
        let result = parse_ingredient_line("2 tasses de la sauce tomate").unwrap();
        assert_eq!(result.unit.as_deref(), Some("tasses"));
        assert_eq!(result.name, "sauce tomate");
    }

    #[test]
    fn test_bare_name() {
        let result = parse_ingredient_line("sel et poivre").unwrap();
        assert_eq!(result.quantity, None);
        assert_eq!(result.unit, None);
        assert_eq!(result.name, "sel et poivre");
    }

    #[test]
    fn test_too_short_rejected() {
        assert!(parse_ingredient_line("x").is_none());
        assert!(parse_ingredient_line("  ").is_none());
    }

    #[test]
    fn test_whitespace_collapsed() {
        let result = parse_ingredient_line("  2   tasses   de   farine  ").unwrap();
        assert_eq!(result.name, "farine");
    }

    #[test]
    fn test_unrecognized_middle_with_connector_falls_to_name() {
        // "bols" is not in the vocabulary; the whole rest becomes the name.
        let result = parse_ingredient_line("2 bols of rice").unwrap();
        assert_eq!(result.quantity.as_deref(), Some("2"));
        assert_eq!(result.unit, None);
        assert_eq!(result.name, "bols of rice");
    }
}
