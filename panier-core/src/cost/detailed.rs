//! Per-ingredient detailed costing.
//!
//! Heavier, on-demand path: each extracted ingredient resolves a base unit
//! price through the external lookup, then scales by its parsed quantity and
//! unit with fixed conversion factors. A failed lookup defaults that single
//! line to a placeholder price rather than aborting the whole computation.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{CostLine, DetailedCost, Ingredient};

/// Used for a line whose price lookup failed.
pub const PLACEHOLDER_UNIT_PRICE: f64 = 3.0;

/// Per-line clamp bounds: never below 5 cents, never above 1.5x base.
const LINE_MIN: f64 = 0.05;
const LINE_MAX_FACTOR: f64 = 1.5;

/// Count-like items are assumed sold by the dozen.
const COUNT_PACKAGE_SIZE: f64 = 12.0;

#[derive(Error, Debug)]
#[error("price lookup failed: {0}")]
pub struct PriceLookupError(pub String);

/// A resolved base unit price (per kg for weight, per L for volume, per
/// package for count-like items).
#[derive(Debug, Clone)]
pub struct UnitPrice {
    pub unit_price: f64,
    pub source_label: String,
}

/// Narrow seam over the external unit price collaborator.
#[async_trait]
pub trait UnitPriceLookup: Send + Sync {
    async fn unit_price(
        &self,
        ingredient_name: &str,
        region_hint: Option<&str>,
    ) -> Result<UnitPrice, PriceLookupError>;
}

enum UnitKind {
    /// Kilograms per unit.
    Weight(f64),
    /// Liters per unit.
    Volume(f64),
    /// Items per unit.
    Count(f64),
}

fn unit_kind(unit: Option<&str>) -> UnitKind {
    let Some(unit) = unit else {
        return UnitKind::Count(1.0);
    };
    let unit = unit.trim().to_lowercase();

    match unit.as_str() {
        "g" | "gramme" | "grammes" | "gram" | "grams" => return UnitKind::Weight(0.001),
        "kg" | "kilogramme" | "kilogrammes" | "kilogram" | "kilograms" => {
            return UnitKind::Weight(1.0)
        }
        "lb" | "lbs" | "livre" | "livres" | "pound" | "pounds" => return UnitKind::Weight(0.454),
        "oz" | "once" | "onces" | "ounce" | "ounces" => return UnitKind::Weight(0.0284),
        "ml" | "millilitre" | "millilitres" | "milliliter" | "milliliters" => {
            return UnitKind::Volume(0.001)
        }
        "l" | "litre" | "litres" | "liter" | "liters" => return UnitKind::Volume(1.0),
        "tasse" | "tasses" | "cup" | "cups" => return UnitKind::Volume(0.25),
        "tbsp" | "tablespoon" | "tablespoons" => return UnitKind::Volume(0.015),
        "tsp" | "teaspoon" | "teaspoons" => return UnitKind::Volume(0.005),
        "pincée" | "pincées" | "pinch" | "pinches" => return UnitKind::Volume(0.0005),
        _ => {}
    }

    // Spoon variants spelled out ("cuillère à soupe", "c. à thé", ...).
    if unit.contains("soupe") {
        return UnitKind::Volume(0.015);
    }
    if unit.contains("thé") || unit.contains("café") {
        return UnitKind::Volume(0.005);
    }

    UnitKind::Count(1.0)
}

/// Parse a raw quantity token ("2", "1/2", "1 1/2", "2,5"). Defaults to 1.
fn parse_quantity(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else {
        return 1.0;
    };
    let raw = raw.trim();

    if let Some((whole, frac)) = raw.split_once(' ') {
        if let (Ok(w), Some(f)) = (whole.parse::<f64>(), parse_fraction(frac)) {
            return w + f;
        }
    }
    if let Some(f) = parse_fraction(raw) {
        return f;
    }
    raw.replace(',', ".").parse().unwrap_or(1.0)
}

fn parse_fraction(s: &str) -> Option<f64> {
    let (num, den) = s.split_once('/')?;
    let num: f64 = num.trim().parse().ok()?;
    let den: f64 = den.trim().parse().ok()?;
    if den == 0.0 {
        None
    } else {
        Some(num / den)
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Cost a recipe's ingredient list. Lookups run concurrently; the final
/// ordering matches the input list.
pub async fn cost_recipe(
    ingredients: &[Ingredient],
    servings: Option<u32>,
    lookup: &dyn UnitPriceLookup,
    region_hint: Option<&str>,
) -> DetailedCost {
    let resolved = futures::future::join_all(ingredients.iter().map(|ingredient| async move {
        let price = lookup.unit_price(&ingredient.name, region_hint).await;
        (ingredient, price)
    }))
    .await;

    let mut breakdown = Vec::with_capacity(resolved.len());
    let mut total = 0.0;
    for (ingredient, price) in resolved {
        let (base, source_label) = match price {
            Ok(p) => (p.unit_price, p.source_label),
            Err(e) => {
                tracing::warn!(
                    ingredient = %ingredient.name,
                    error = %e,
                    "price lookup failed, using placeholder"
                );
                (PLACEHOLDER_UNIT_PRICE, "défaut".to_string())
            }
        };

        let quantity = parse_quantity(ingredient.quantity.as_deref());
        let scaled = match unit_kind(ingredient.unit.as_deref()) {
            UnitKind::Weight(kg_per_unit) => base * kg_per_unit * quantity,
            UnitKind::Volume(liters_per_unit) => base * liters_per_unit * quantity,
            UnitKind::Count(items_per_unit) => {
                base / COUNT_PACKAGE_SIZE * items_per_unit * quantity
            }
        };
        let line_max = (base * LINE_MAX_FACTOR).max(LINE_MIN);
        let cost = round_cents(scaled.clamp(LINE_MIN, line_max));

        total += cost;
        breakdown.push(CostLine {
            name: ingredient.name.clone(),
            quantity: ingredient.quantity.clone(),
            unit: ingredient.unit.clone(),
            cost,
            source_label,
        });
    }

    let total = round_cents(total);
    let cost_per_serving = servings
        .filter(|s| *s > 0)
        .map(|s| round_cents(total / s as f64));

    DetailedCost {
        total_cost: total,
        cost_per_serving,
        breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct TablePrices(HashMap<String, f64>);

    impl TablePrices {
        fn new(entries: &[(&str, f64)]) -> Self {
            Self(
                entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), *v))
                    .collect(),
            )
        }
    }

    #[async_trait]
    impl UnitPriceLookup for TablePrices {
        async fn unit_price(
            &self,
            ingredient_name: &str,
            _region_hint: Option<&str>,
        ) -> Result<UnitPrice, PriceLookupError> {
            self.0
                .get(ingredient_name)
                .map(|price| UnitPrice {
                    unit_price: *price,
                    source_label: "table".to_string(),
                })
                .ok_or_else(|| PriceLookupError(format!("unknown: {}", ingredient_name)))
        }
    }

    fn ingredient(name: &str, quantity: Option<&str>, unit: Option<&str>) -> Ingredient {
        Ingredient {
            name: name.to_string(),
            quantity: quantity.map(String::from),
            unit: unit.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_weight_scales_per_kg() {
        let prices = TablePrices::new(&[("boeuf haché", 14.0)]);
        let cost = cost_recipe(
            &[ingredient("boeuf haché", Some("500"), Some("g"))],
            None,
            &prices,
            None,
        )
        .await;
        assert_eq!(cost.breakdown[0].cost, 7.0);
    }

    #[tokio::test]
    async fn test_volume_scales_per_liter() {
        let prices = TablePrices::new(&[("lait", 3.2)]);
        let cost = cost_recipe(
            &[ingredient("lait", Some("2"), Some("tasses"))],
            None,
            &prices,
            None,
        )
        .await;
        // 2 cups = 0.5 L at 3.20/L
        assert_eq!(cost.breakdown[0].cost, 1.6);
    }

    #[tokio::test]
    async fn test_count_assumes_dozen_packaging() {
        let prices = TablePrices::new(&[("oeufs", 4.8)]);
        let cost = cost_recipe(&[ingredient("oeufs", Some("3"), None)], None, &prices, None).await;
        // 3 eggs out of a 4.80 dozen.
        assert_eq!(cost.breakdown[0].cost, 1.2);
    }

    #[tokio::test]
    async fn test_line_never_below_five_cents() {
        let prices = TablePrices::new(&[("sel", 2.0)]);
        let cost = cost_recipe(
            &[ingredient("sel", Some("1"), Some("pincée"))],
            None,
            &prices,
            None,
        )
        .await;
        assert_eq!(cost.breakdown[0].cost, 0.05);
    }

    #[tokio::test]
    async fn test_line_never_above_1_5x_base() {
        let prices = TablePrices::new(&[("safran", 10.0)]);
        let cost = cost_recipe(
            &[ingredient("safran", Some("40"), Some("kg"))],
            None,
            &prices,
            None,
        )
        .await;
        assert_eq!(cost.breakdown[0].cost, 15.0);
    }

    #[tokio::test]
    async fn test_lookup_failure_uses_placeholder() {
        let prices = TablePrices::new(&[]);
        let cost = cost_recipe(
            &[ingredient("ingrédient mystère", Some("1"), Some("kg"))],
            None,
            &prices,
            None,
        )
        .await;
        assert_eq!(cost.breakdown[0].cost, PLACEHOLDER_UNIT_PRICE);
        assert_eq!(cost.breakdown[0].source_label, "défaut");
    }

    #[tokio::test]
    async fn test_total_and_per_serving() {
        let prices = TablePrices::new(&[("boeuf haché", 14.0), ("lait", 3.2)]);
        let cost = cost_recipe(
            &[
                ingredient("boeuf haché", Some("500"), Some("g")),
                ingredient("lait", Some("2"), Some("tasses")),
            ],
            Some(4),
            &prices,
            None,
        )
        .await;
        assert_eq!(cost.total_cost, 8.6);
        assert_eq!(cost.cost_per_serving, Some(2.15));
    }

    #[tokio::test]
    async fn test_fraction_and_mixed_quantities() {
        let prices = TablePrices::new(&[("farine", 2.0)]);
        let cost = cost_recipe(
            &[ingredient("farine", Some("1 1/2"), Some("tasses"))],
            None,
            &prices,
            None,
        )
        .await;
        // 1.5 cups = 0.375 L at 2.00/L
        assert_eq!(cost.breakdown[0].cost, 0.75);
    }
}
