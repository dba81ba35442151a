//! On-demand single-recipe content extraction.
//!
//! Invoked for one selected recipe, never during bulk discovery. The flow:
//! robots advisory, page fetch (8s timeout), then an ordered list of
//! extraction strategies with first-success semantics. Sites publishing
//! structured data are treated as having signaled consent to mechanical
//! extraction, so that strategy runs first. Page content never outlives the
//! parsing step.

mod robots;

pub use robots::disallows_all;

use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::error::{ExtractError, FetchError};
use crate::http::HttpClient;
use crate::ingredient_parser::parse_ingredient_line;
use crate::servings::{parse_servings, valid_servings};
use crate::types::{ExtractedRecipe, ExtractionMethod, Ingredient};

/// Regex to find embedded JSON-LD script blocks without full DOM parsing.
static JSONLD_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]*type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("Invalid JSON-LD regex")
});

/// Ordered structural patterns for ingredient list items; the first pattern
/// yielding at least one match wins.
const INGREDIENT_SELECTORS: &[&str] = &[
    r#"[itemprop="recipeIngredient"]"#,
    r#"[itemprop="ingredients"]"#,
    ".wprm-recipe-ingredient",
    ".jetpack-recipe-ingredient",
    ".tasty-recipes-ingredients li",
    ".recipe-ingredients li",
    "ul.ingredients li",
    "li.ingredient",
];

static SCRIPT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").expect("Invalid script regex"));
static STYLE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").expect("Invalid style regex"));
static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("Invalid HTML tag regex"));

/// Extract one recipe's ingredient list and servings from its page.
pub async fn extract_recipe(
    http: &dyn HttpClient,
    url: &str,
) -> Result<ExtractedRecipe, ExtractError> {
    // Robots advisory first; an unavailable robots.txt is treated as allowed.
    if let Some(origin) = origin_of(url) {
        if let Ok(body) = http.fetch_text(&format!("{}/robots.txt", origin)).await {
            if disallows_all(&body) {
                tracing::info!(url, "extraction blocked by robots policy");
                return Err(ExtractError::PolicyBlocked);
            }
        }
    }

    let html = http.fetch_text(url).await.map_err(|e| match e {
        FetchError::Timeout(_) => ExtractError::Timeout,
        FetchError::RequestFailed(ref err) if err.is_timeout() => ExtractError::Timeout,
        _ => ExtractError::AccessDenied,
    })?;

    parse_page(&html, url).ok_or(ExtractError::NoIngredients)
}

/// Run the strategy chain over fetched markup. Pure and synchronous; the
/// parsed DOM never crosses an await point.
fn parse_page(html: &str, url: &str) -> Option<ExtractedRecipe> {
    type Strategy = fn(&str) -> Option<Vec<Ingredient>>;
    const STRATEGIES: &[(ExtractionMethod, Strategy)] = &[
        (ExtractionMethod::StructuredData, structured_data_ingredients),
        (ExtractionMethod::MarkupPattern, markup_pattern_ingredients),
    ];

    for (method, strategy) in STRATEGIES {
        if let Some(ingredients) = strategy(html) {
            let servings = structured_data_servings(html).or_else(|| text_servings(html));
            tracing::debug!(url, ?method, count = ingredients.len(), "extraction succeeded");
            return Some(ExtractedRecipe {
                ingredients,
                servings,
                source: url.to_string(),
                method: *method,
            });
        }
    }
    None
}

/// Structured-data strategy: scan JSON-LD blocks for an entry whose declared
/// type denotes a recipe, and parse its ingredient list (two known field
/// name variants).
fn structured_data_ingredients(html: &str) -> Option<Vec<Ingredient>> {
    for cap in JSONLD_BLOCK.captures_iter(html) {
        let json_text = match cap.get(1) {
            Some(m) => m.as_str(),
            None => continue,
        };

        let sanitized = sanitize_json(json_text);
        let json: serde_json::Value = match serde_json::from_str(&sanitized) {
            Ok(v) => v,
            Err(_) => continue, // Try next script block
        };

        let Some(recipe) = find_recipe_in_json(&json) else {
            continue;
        };

        let list = recipe
            .get("recipeIngredient")
            .or_else(|| recipe.get("ingredients"))
            .and_then(|v| v.as_array());
        let Some(list) = list else { continue };

        let parsed: Vec<Ingredient> = list
            .iter()
            .filter_map(|v| v.as_str())
            .filter_map(parse_ingredient_line)
            .collect();
        if !parsed.is_empty() {
            return Some(parsed);
        }
    }
    None
}

/// Markup-pattern strategy: ordered structural selectors, first pattern with
/// a match wins, deduped by case-insensitive ingredient name.
fn markup_pattern_ingredients(html: &str) -> Option<Vec<Ingredient>> {
    let document = Html::parse_document(html);

    for selector_str in INGREDIENT_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };

        let mut seen = HashSet::new();
        let parsed: Vec<Ingredient> = document
            .select(&selector)
            .map(|el| el.text().collect::<String>())
            .filter_map(|text| parse_ingredient_line(&text))
            .filter(|ingredient| seen.insert(ingredient.name.to_lowercase()))
            .collect();

        if !parsed.is_empty() {
            return Some(parsed);
        }
    }
    None
}

/// Servings from structured data (`recipeYield`), with the same priority the
/// ingredient strategies have over free text.
fn structured_data_servings(html: &str) -> Option<u32> {
    for cap in JSONLD_BLOCK.captures_iter(html) {
        let Some(json_text) = cap.get(1) else {
            continue;
        };
        let sanitized = sanitize_json(json_text.as_str());
        let Ok(json) = serde_json::from_str::<serde_json::Value>(&sanitized) else {
            continue;
        };
        let Some(recipe) = find_recipe_in_json(&json) else {
            continue;
        };
        let Some(yield_value) = recipe.get("recipeYield") else {
            continue;
        };
        if let Some(servings) = servings_from_yield(yield_value) {
            return Some(servings);
        }
    }
    None
}

fn servings_from_yield(value: &serde_json::Value) -> Option<u32> {
    match value {
        serde_json::Value::Number(n) => valid_servings(n.as_u64()? as u32),
        serde_json::Value::String(s) => {
            if let Ok(n) = s.trim().parse::<u32>() {
                return valid_servings(n);
            }
            parse_servings(s)
        }
        serde_json::Value::Array(arr) => arr.iter().find_map(servings_from_yield),
        _ => None,
    }
}

/// Free-text fallback: strip scripts, styles and tags, then run the servings
/// pattern list over what remains.
fn text_servings(html: &str) -> Option<u32> {
    let without_scripts = SCRIPT_BLOCK.replace_all(html, " ");
    let without_styles = STYLE_BLOCK.replace_all(&without_scripts, " ");
    let text = HTML_TAG.replace_all(&without_styles, " ");
    parse_servings(&text)
}

/// Recursively search for a Recipe object in JSON-LD.
/// Handles @graph arrays, type arrays and nested structures.
fn find_recipe_in_json(json: &serde_json::Value) -> Option<&serde_json::Value> {
    match json {
        serde_json::Value::Object(obj) => {
            if let Some(type_val) = obj.get("@type") {
                let is_recipe = match type_val {
                    serde_json::Value::String(s) => s == "Recipe",
                    serde_json::Value::Array(arr) => arr.iter().any(|v| v == "Recipe"),
                    _ => false,
                };
                if is_recipe {
                    return Some(json);
                }
            }

            if let Some(graph) = obj.get("@graph") {
                if let Some(recipe) = find_recipe_in_json(graph) {
                    return Some(recipe);
                }
            }

            for (_, value) in obj {
                if let Some(recipe) = find_recipe_in_json(value) {
                    return Some(recipe);
                }
            }
        }
        serde_json::Value::Array(arr) => {
            for item in arr {
                if let Some(recipe) = find_recipe_in_json(item) {
                    return Some(recipe);
                }
            }
        }
        _ => {}
    }
    None
}

/// Escape literal control characters inside JSON strings. Some sites embed
/// raw newlines in their structured data.
fn sanitize_json(json: &str) -> String {
    let mut result = String::with_capacity(json.len());
    let mut in_string = false;
    let mut prev_char = '\0';

    for c in json.chars() {
        if c == '"' && prev_char != '\\' {
            in_string = !in_string;
            result.push(c);
        } else if in_string {
            match c {
                '\n' => result.push_str("\\n"),
                '\r' => result.push_str("\\r"),
                '\t' => result.push_str("\\t"),
                c if c.is_control() => {}
                _ => result.push(c),
            }
        } else {
            result.push(c);
        }
        prev_char = c;
    }

    result
}

fn origin_of(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(match parsed.port() {
        Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
        None => format!("{}://{}", parsed.scheme(), host),
    })
}
