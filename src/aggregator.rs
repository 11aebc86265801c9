// 🧮 Ingredient Aggregator
// Folds the ingredients of every planned recipe into one shopping line per
// (name, unit), scaled by each entry's serving multiplier.

use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use crate::categorizer::categorize;
use crate::models::{GroceryCategory, MealPlanEntry, Recipe};

/// One merged shopping line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedIngredient {
    /// Spelling of the first occurrence
    pub name: String,

    /// Sum of the present scaled quantities; None when no occurrence had one
    pub quantity: Option<f64>,

    pub unit: Option<String>,
    pub category: GroceryCategory,
}

/// Serving multiplier for one entry against its recipe
pub fn scale_factor(entry: &MealPlanEntry, recipe: &Recipe) -> f64 {
    match entry.servings_override() {
        Some(servings) if recipe.servings > 0 => f64::from(servings) / f64::from(recipe.servings),
        _ => 1.0,
    }
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Aggregate the ingredients of every entry that resolves to a recipe.
///
/// Entries that are placeholders (eat out, leftovers) or whose recipe id
/// is not in `recipes` contribute nothing. Same name with a different unit
/// stays a separate line. Output is ordered by category display order,
/// then by first appearance.
pub fn aggregate(entries: &[MealPlanEntry], recipes: &[Recipe]) -> Vec<AggregatedIngredient> {
    let recipes_by_id: HashMap<&str, &Recipe> =
        recipes.iter().map(|r| (r.id.as_str(), r)).collect();

    let mut lines: Vec<AggregatedIngredient> = Vec::new();
    let mut index: HashMap<(String, Option<String>), usize> = HashMap::new();

    for entry in entries {
        let Some(recipe_id) = entry.recipe_id() else {
            continue;
        };
        let Some(recipe) = recipes_by_id.get(recipe_id) else {
            debug!(entry_id = %entry.id, recipe_id, "skipping entry with unknown recipe");
            continue;
        };

        let factor = scale_factor(entry, recipe);

        for ingredient in &recipe.ingredients {
            let unit = ingredient
                .unit
                .as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty());
            let key = (normalize(&ingredient.name), unit.map(normalize));
            let scaled = ingredient.quantity.map(|q| q * factor);

            match index.get(&key) {
                Some(&at) => {
                    let line = &mut lines[at];
                    line.quantity = match (line.quantity, scaled) {
                        (Some(a), Some(b)) => Some(a + b),
                        (a, b) => a.or(b),
                    };
                }
                None => {
                    index.insert(key, lines.len());
                    lines.push(AggregatedIngredient {
                        name: ingredient.name.trim().to_string(),
                        quantity: scaled,
                        unit: unit.map(str::to_string),
                        category: categorize(&ingredient.name),
                    });
                }
            }
        }
    }

    // stable: keeps insertion order inside a category
    lines.sort_by_key(|line| line.category.sort_order());
    lines
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntryKind, Ingredient, MealSlot};
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn recipe(title: &str, servings: u32, ingredients: Vec<Ingredient>) -> Recipe {
        Recipe::new("house", title, servings, ingredients)
    }

    fn cook(recipe: &Recipe, servings: Option<u32>) -> MealPlanEntry {
        MealPlanEntry::recipe("house", day(3), MealSlot::Dinner, &recipe.id, servings)
    }

    #[test]
    fn test_override_scaling_merges_into_one_line() {
        let chili = recipe("Chili", 4, vec![Ingredient::new("Ground Beef", Some(1.5), Some("lb"))]);
        let entries = vec![cook(&chili, Some(4)), cook(&chili, Some(8))];

        let lines = aggregate(&entries, &[chili]);

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, Some(4.5)); // 1.5 * (4/4) + 1.5 * (8/4)
        assert_eq!(lines[0].unit.as_deref(), Some("lb"));
        assert_eq!(lines[0].category, GroceryCategory::Meat);
    }

    #[test]
    fn test_sum_is_order_independent() {
        let a = recipe("A", 2, vec![Ingredient::new("rice", Some(1.0), Some("cup"))]);
        let b = recipe("B", 3, vec![Ingredient::new("Rice", Some(2.0), Some("cup"))]);
        let recipes = vec![a.clone(), b.clone()];

        let forward = aggregate(&[cook(&a, Some(3)), cook(&b, Some(6))], &recipes);
        let backward = aggregate(&[cook(&b, Some(6)), cook(&a, Some(3))], &recipes);

        // 1.0 * 1.5 + 2.0 * 2.0
        assert_eq!(forward[0].quantity, Some(5.5));
        assert_eq!(backward[0].quantity, Some(5.5));
    }

    #[test]
    fn test_name_match_is_case_insensitive_and_keeps_first_spelling() {
        let a = recipe("A", 1, vec![Ingredient::new("Garlic ", Some(2.0), None)]);
        let b = recipe("B", 1, vec![Ingredient::new("garlic", Some(3.0), None)]);

        let lines = aggregate(&[cook(&a, None), cook(&b, None)], &[a.clone(), b.clone()]);

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].name, "Garlic");
        assert_eq!(lines[0].quantity, Some(5.0));
        assert_eq!(lines[0].unit, None);
    }

    #[test]
    fn test_unit_mismatch_keeps_separate_lines() {
        let a = recipe("A", 1, vec![Ingredient::new("butter", Some(2.0), Some("tbsp"))]);
        let b = recipe("B", 1, vec![Ingredient::new("butter", Some(1.0), Some("cup"))]);

        let lines = aggregate(&[cook(&a, None), cook(&b, None)], &[a.clone(), b.clone()]);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].unit.as_deref(), Some("tbsp"));
        assert_eq!(lines[0].quantity, Some(2.0));
        assert_eq!(lines[1].unit.as_deref(), Some("cup"));
        assert_eq!(lines[1].quantity, Some(1.0));
    }

    #[test]
    fn test_unit_compare_ignores_case() {
        let a = recipe("A", 1, vec![Ingredient::new("sugar", Some(1.0), Some("Cup"))]);
        let b = recipe("B", 1, vec![Ingredient::new("sugar", Some(1.0), Some("cup "))]);

        let lines = aggregate(&[cook(&a, None), cook(&b, None)], &[a.clone(), b.clone()]);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, Some(2.0));
    }

    #[test]
    fn test_missing_quantities() {
        let a = recipe("A", 1, vec![Ingredient::new("salt", None, None)]);
        let b = recipe("B", 1, vec![Ingredient::new("salt", Some(1.0), None)]);

        let only_missing = aggregate(&[cook(&a, None), cook(&a, None)], &[a.clone()]);
        assert_eq!(only_missing[0].quantity, None);

        let mixed = aggregate(&[cook(&a, None), cook(&b, None)], &[a.clone(), b.clone()]);
        assert_eq!(mixed[0].quantity, Some(1.0));
    }

    #[test]
    fn test_placeholders_and_dangling_ids_are_skipped() {
        let a = recipe("A", 1, vec![Ingredient::new("onion", Some(1.0), None)]);
        let entries = vec![
            MealPlanEntry::with_kind("house", day(4), MealSlot::Lunch, EntryKind::EatOut),
            MealPlanEntry::with_kind("house", day(4), MealSlot::Dinner, EntryKind::Leftovers),
            MealPlanEntry::recipe("house", day(5), MealSlot::Dinner, "no-such-recipe", Some(2)),
        ];

        assert!(aggregate(&entries, &[a]).is_empty());
    }

    #[test]
    fn test_output_follows_category_display_order() {
        let a = recipe(
            "Everything",
            1,
            vec![
                Ingredient::new("paper towels", None, None),
                Ingredient::new("frozen peas", Some(1.0), Some("bag")),
                Ingredient::new("flour", Some(2.0), Some("cup")),
                Ingredient::new("chicken breast", Some(1.0), Some("lb")),
                Ingredient::new("whole milk", Some(1.0), Some("qt")),
                Ingredient::new("spinach", Some(1.0), Some("bunch")),
                Ingredient::new("rice", Some(1.0), Some("cup")),
            ],
        );

        let lines = aggregate(&[cook(&a, None)], &[a.clone()]);
        let names: Vec<&str> = lines.iter().map(|l| l.name.as_str()).collect();

        assert_eq!(
            names,
            vec!["spinach", "whole milk", "chicken breast", "flour", "rice", "frozen peas", "paper towels"]
        );
    }

    #[test]
    fn test_scale_factor_without_override_is_one() {
        let a = recipe("A", 4, vec![]);
        assert_eq!(scale_factor(&cook(&a, None), &a), 1.0);
        assert_eq!(scale_factor(&cook(&a, Some(2)), &a), 0.5);
    }
}
