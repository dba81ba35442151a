//! Filtering funnel: a sequential set of pure predicates over candidate
//! lists.
//!
//! Stage order is chosen for cost (cheap string checks first), not
//! correctness, and the composed funnel is idempotent: re-running it on an
//! already-filtered list changes nothing.

use regex::Regex;
use std::sync::LazyLock;

use crate::types::CandidateRecipe;

/// A filter tag definition: opaque id, validation terms, strict/optional
/// split. Strict tags require textual proof; optional tags are descriptive
/// and always pass.
#[derive(Debug, Clone, Copy)]
pub struct FilterToken {
    pub id: &'static str,
    pub terms: &'static [&'static str],
    pub optional: bool,
}

/// Fixed registry of known filter tags.
pub const FILTER_TOKENS: &[FilterToken] = &[
    FilterToken {
        id: "vegetarien",
        terms: &["végétarien", "végétarienne", "vegetarian", "veggie", "sans viande"],
        optional: false,
    },
    FilterToken {
        id: "vegane",
        terms: &["végane", "végan", "vegan", "végétalien", "végétalienne"],
        optional: false,
    },
    FilterToken {
        id: "sans-gluten",
        terms: &["sans gluten", "gluten-free", "gluten free"],
        optional: false,
    },
    FilterToken {
        id: "sans-lactose",
        terms: &["sans lactose", "sans produits laitiers", "lactose-free", "dairy-free"],
        optional: false,
    },
    FilterToken {
        id: "keto",
        terms: &["keto", "cétogène", "low carb", "faible en glucides"],
        optional: false,
    },
    FilterToken {
        id: "rapide",
        terms: &["rapide", "express", "quick", "30 minutes"],
        optional: true,
    },
    FilterToken {
        id: "economique",
        terms: &["économique", "pas cher", "abordable", "budget"],
        optional: true,
    },
    FilterToken {
        id: "familial",
        terms: &["familial", "famille", "family"],
        optional: true,
    },
    FilterToken {
        id: "reconfortant",
        terms: &["réconfortant", "comfort"],
        optional: true,
    },
    FilterToken {
        id: "sante",
        terms: &["santé", "healthy", "léger", "light"],
        optional: true,
    },
];

/// Look up a filter tag by id (case-insensitive, spaces treated as dashes).
pub fn filter_token(id: &str) -> Option<&'static FilterToken> {
    let normalized = id.trim().to_lowercase().replace(' ', "-");
    FILTER_TOKENS.iter().find(|t| t.id == normalized)
}

/// Bilingual exclusion terms per allergy tag.
const ALLERGY_TERMS: &[(&str, &[&str])] = &[
    (
        "gluten",
        &["gluten", "blé", "wheat", "farine", "flour", "orge", "barley", "seigle", "rye"],
    ),
    (
        "lactose",
        &["lait", "milk", "fromage", "cheese", "beurre", "butter", "crème", "cream", "yogourt", "yogurt"],
    ),
    (
        "noix",
        &["noix", "nut", "amande", "almond", "arachide", "peanut", "cajou", "cashew", "noisette", "hazelnut", "pacane", "pecan", "pistache", "pistachio"],
    ),
    ("oeufs", &["œuf", "oeuf", "egg"]),
    (
        "fruits-de-mer",
        &["crevette", "shrimp", "homard", "lobster", "crabe", "crab", "moule", "mussel", "huître", "oyster", "pétoncle", "scallop"],
    ),
    (
        "poisson",
        &["poisson", "fish", "saumon", "salmon", "thon", "tuna", "morue", "cod", "truite", "trout"],
    ),
    ("soja", &["soja", "soy", "tofu", "edamame", "tamari"]),
    ("sesame", &["sésame", "sesame", "tahini"]),
];

/// Dessert vocabulary excluded when the effective meal type is dinner.
const DESSERT_TERMS: &[&str] = &[
    "dessert",
    "gâteau",
    "gateau",
    "cake",
    "biscuit",
    "cookie",
    "brownie",
    "muffin",
    "cupcake",
    "tarte au sucre",
    "tarte aux pommes",
    "tarte au citron",
    "pouding",
    "pudding",
    "crème glacée",
    "ice cream",
    "sorbet",
    "sucre à la crème",
    "beigne",
    "donut",
    "doughnut",
    "macaron",
    "meringue",
    "clafoutis",
    "croustade",
    "crumble",
    "fudge",
    "chocolat chaud",
    "mousse au chocolat",
    "pain aux bananes",
    "banana bread",
    "shortcake",
    "cheesecake",
    "tiramisu",
    "glaçage",
    "frosting",
    "bonbon",
    "candy",
    "friandise",
];

/// Advice and how-to vocabulary marking tip pages rather than recipes.
static ADVICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:how\s+to|comment\s+(?:faire|choisir|réussir|préparer|conserver)|tips|astuces?|conseils?|guide)\b",
    )
    .expect("Invalid advice regex")
});

/// "12 recettes", "30 ideas" and friends: compilations, not recipes.
static COUNTED_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b\d+\s+(?:recipes|recettes|ideas|idées|ways|façons|meals|repas|trucs)\b")
        .expect("Invalid counted-list regex")
});

static COMPILATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:roundup|collection|compilation|galerie|gallery|palmarès|top\s+\d+|meilleures\s+recettes|best\s+recipes)\b",
    )
    .expect("Invalid compilation regex")
});

/// Aggregator sites whose listing-style paths never point at one recipe.
const AGGREGATOR_DOMAINS: &[&str] = &[
    "pinterest",
    "yummly",
    "allrecipes",
    "food.com",
    "buzzfeed",
    "tasty.co",
];

const LISTING_PATH_HINTS: &[&str] = &[
    "/search",
    "/collection",
    "/board",
    "/galerie",
    "/gallery",
    "/ideas",
    "/idees",
    "/list",
    "/category",
    "/categorie",
];

/// English-only recipe markers. A candidate matching these with no French
/// marker is rejected; anything ambiguous is accepted.
const ENGLISH_MARKERS: &[&str] = &[
    "cup",
    "tablespoon",
    "teaspoon",
    "tbsp",
    "preheat",
    "bake",
    "stir",
    "whisk",
    "simmer",
    "directions",
    "servings",
    "skillet",
    "oven",
];

const FRENCH_MARKERS: &[&str] = &[
    "tasse",
    "cuillère",
    "préchauffer",
    "mélanger",
    "cuire",
    "mijoter",
    "fouetter",
    "ingrédients",
    "préparation",
    "portions",
    "recette",
    "four",
    "poêle",
];

/// Everything the funnel needs to evaluate one candidate.
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    /// Disallowed domains, matched by substring.
    pub blocked_domains: Vec<String>,
    pub allergies: Vec<String>,
    pub filters: Vec<String>,
    pub meal_type: Option<String>,
}

/// Run the funnel over a candidate list.
pub fn apply_funnel(
    candidates: Vec<CandidateRecipe>,
    criteria: &FilterCriteria,
) -> Vec<CandidateRecipe> {
    candidates
        .into_iter()
        .filter(|c| passes(c, criteria))
        .collect()
}

fn passes(candidate: &CandidateRecipe, criteria: &FilterCriteria) -> bool {
    let text = format!("{} {}", candidate.title, candidate.snippet).to_lowercase();

    !domain_blocked(candidate, &criteria.blocked_domains)
        && !is_listicle(candidate, &text)
        && !contains_allergen(&text, &criteria.allergies)
        && !off_meal_context(&text, criteria.meal_type.as_deref())
        && passes_strict_filters(&text, &criteria.filters)
        && passes_language(&text)
}

fn domain_blocked(candidate: &CandidateRecipe, blocked: &[String]) -> bool {
    let domain = candidate.source_domain.to_lowercase();
    blocked.iter().any(|b| domain.contains(&b.to_lowercase()))
}

fn is_listicle(candidate: &CandidateRecipe, text: &str) -> bool {
    if ADVICE.is_match(text) || COUNTED_LIST.is_match(text) || COMPILATION.is_match(text) {
        return true;
    }
    let domain = candidate.source_domain.to_lowercase();
    if AGGREGATOR_DOMAINS.iter().any(|d| domain.contains(d)) {
        let url = candidate.url.to_lowercase();
        return LISTING_PATH_HINTS.iter().any(|p| url.contains(p));
    }
    false
}

fn contains_allergen(text: &str, allergies: &[String]) -> bool {
    allergies.iter().any(|id| {
        let key = id.trim().to_lowercase().replace(' ', "-");
        match ALLERGY_TERMS.iter().find(|(k, _)| *k == key) {
            Some((_, terms)) => terms.iter().any(|t| text.contains(t)),
            // Unknown tag: the id itself still excludes literal matches.
            None => text.contains(key.trim_matches('-')),
        }
    })
}

fn off_meal_context(text: &str, meal_type: Option<&str>) -> bool {
    let is_dinner = matches!(
        meal_type.map(|m| m.trim().to_lowercase()).as_deref(),
        Some("souper") | Some("dinner") | Some("supper")
    );
    if !is_dinner {
        return false;
    }
    DESSERT_TERMS.iter().any(|t| text.contains(t))
}

/// Every selected strict tag must show at least one of its validation terms.
/// A selection of only optional tags skips the stage entirely.
fn passes_strict_filters(text: &str, selected: &[String]) -> bool {
    for id in selected {
        match filter_token(id) {
            Some(token) if !token.optional => {
                if !token.terms.iter().any(|t| text.contains(t)) {
                    return false;
                }
            }
            Some(_) => {}
            None => {
                tracing::debug!(filter = %id, "unknown filter tag treated as descriptive");
            }
        }
    }
    true
}

fn passes_language(text: &str) -> bool {
    let english = ENGLISH_MARKERS.iter().any(|m| text.contains(m));
    if !english {
        return true;
    }
    FRENCH_MARKERS.iter().any(|m| text.contains(m))
}
