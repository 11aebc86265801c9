// 🛒 Grocery Lists & Items
//
// A household has at most one current list. Items belong to exactly one
// list and are ordered by category rank, then by their sort_order.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PlannerError;

// ============================================================================
// CATEGORY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroceryCategory {
    Produce,
    Dairy,
    Meat,
    Pantry,
    Frozen,
    Beverages,
    VerifyPantry,
    Other,
}

impl GroceryCategory {
    /// All categories in display order
    pub const ALL: [GroceryCategory; 8] = [
        GroceryCategory::Produce,
        GroceryCategory::Dairy,
        GroceryCategory::Meat,
        GroceryCategory::Pantry,
        GroceryCategory::Frozen,
        GroceryCategory::Beverages,
        GroceryCategory::VerifyPantry,
        GroceryCategory::Other,
    ];

    /// Display/sort rank. This is NOT the categorizer's match priority.
    pub fn sort_order(&self) -> u8 {
        match self {
            GroceryCategory::Produce => 0,
            GroceryCategory::Dairy => 1,
            GroceryCategory::Meat => 2,
            GroceryCategory::Pantry => 3,
            GroceryCategory::Frozen => 4,
            GroceryCategory::Beverages => 5,
            GroceryCategory::VerifyPantry => 6,
            GroceryCategory::Other => 7,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GroceryCategory::Produce => "produce",
            GroceryCategory::Dairy => "dairy",
            GroceryCategory::Meat => "meat",
            GroceryCategory::Pantry => "pantry",
            GroceryCategory::Frozen => "frozen",
            GroceryCategory::Beverages => "beverages",
            GroceryCategory::VerifyPantry => "verify_pantry",
            GroceryCategory::Other => "other",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            GroceryCategory::Produce => "Produce",
            GroceryCategory::Dairy => "Dairy",
            GroceryCategory::Meat => "Meat & Seafood",
            GroceryCategory::Pantry => "Pantry",
            GroceryCategory::Frozen => "Frozen",
            GroceryCategory::Beverages => "Beverages",
            GroceryCategory::VerifyPantry => "Check Pantry First",
            GroceryCategory::Other => "Other",
        }
    }
}

impl fmt::Display for GroceryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroceryCategory {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GroceryCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| PlannerError::invalid("category", format!("unknown category '{s}'")))
    }
}

// ============================================================================
// PROVENANCE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSource {
    MealPlan,
    Manual,
    PantryStaple,
}

impl ItemSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemSource::MealPlan => "meal_plan",
            ItemSource::Manual => "manual",
            ItemSource::PantryStaple => "pantry_staple",
        }
    }
}

impl FromStr for ItemSource {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "meal_plan" => Ok(ItemSource::MealPlan),
            "manual" => Ok(ItemSource::Manual),
            "pantry_staple" => Ok(ItemSource::PantryStaple),
            other => Err(PlannerError::invalid("item source", format!("unknown source '{other}'"))),
        }
    }
}

// ============================================================================
// LIST & ITEM
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroceryList {
    pub id: String,
    pub household_id: String,
    pub week_start: NaiveDate,
    pub is_current: bool,
    pub generated_at: DateTime<Utc>,
}

impl GroceryList {
    /// New list, marked current
    pub fn new_current(household_id: &str, week_start: NaiveDate, generated_at: DateTime<Utc>) -> Self {
        GroceryList {
            id: uuid::Uuid::new_v4().to_string(),
            household_id: household_id.to_string(),
            week_start,
            is_current: true,
            generated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroceryItem {
    pub id: String,
    pub list_id: String,
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    pub category: GroceryCategory,
    pub checked: bool,
    pub sort_order: i64,
    pub source: ItemSource,
}

impl GroceryItem {
    pub fn new(
        list_id: &str,
        name: &str,
        quantity: Option<f64>,
        unit: Option<String>,
        category: GroceryCategory,
        sort_order: i64,
        source: ItemSource,
    ) -> Self {
        GroceryItem {
            id: uuid::Uuid::new_v4().to_string(),
            list_id: list_id.to_string(),
            name: name.to_string(),
            quantity,
            unit,
            category,
            checked: false,
            sort_order,
            source,
        }
    }

    /// "2 cup flour", "3 eggs", "salt"
    pub fn label(&self) -> String {
        let mut parts = Vec::new();
        if let Some(q) = self.quantity {
            parts.push(format_quantity(q));
        }
        if let Some(unit) = &self.unit {
            parts.push(unit.clone());
        }
        parts.push(self.name.clone());
        parts.join(" ")
    }
}

/// Trim float noise from scaled quantities (1.5000000001 -> "1.5")
pub fn format_quantity(q: f64) -> String {
    let rounded = (q * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{rounded}")
    }
}

/// Sort items the way a list is displayed
pub fn sort_for_display(items: &mut [GroceryItem]) {
    items.sort_by(|a, b| {
        a.category
            .sort_order()
            .cmp(&b.category.sort_order())
            .then(a.sort_order.cmp(&b.sort_order))
    });
}

// ============================================================================
// PANTRY STAPLE
// ============================================================================

/// An ingredient the household keeps stocked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PantryStaple {
    pub id: String,
    pub household_id: String,
    pub name: String,
}

impl PantryStaple {
    pub fn new(household_id: &str, name: &str) -> Self {
        PantryStaple {
            id: uuid::Uuid::new_v4().to_string(),
            household_id: household_id.to_string(),
            name: name.trim().to_string(),
        }
    }

    /// Case-insensitive containment in either direction
    pub fn covers(&self, ingredient_name: &str) -> bool {
        let staple = self.name.to_lowercase();
        let ingredient = ingredient_name.trim().to_lowercase();
        !staple.is_empty() && !ingredient.is_empty() && (ingredient.contains(&staple) || staple.contains(&ingredient))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_sort_order_is_declared_order() {
        let orders: Vec<u8> = GroceryCategory::ALL.iter().map(|c| c.sort_order()).collect();
        assert_eq!(orders, vec![0, 1, 2, 3, 4, 5, 6, 7]);
        assert!(GroceryCategory::Pantry.sort_order() < GroceryCategory::Frozen.sort_order());
    }

    #[test]
    fn test_category_string_roundtrip() {
        for category in GroceryCategory::ALL {
            assert_eq!(category.as_str().parse::<GroceryCategory>().unwrap(), category);
        }
        assert!("snacks".parse::<GroceryCategory>().is_err());
    }

    #[test]
    fn test_item_label() {
        let mut item = GroceryItem::new(
            "list",
            "flour",
            Some(1.5000000001),
            Some("cup".to_string()),
            GroceryCategory::Pantry,
            0,
            ItemSource::MealPlan,
        );
        assert_eq!(item.label(), "1.5 cup flour");

        item.quantity = Some(3.0);
        item.unit = None;
        assert_eq!(item.label(), "3 flour");

        item.quantity = None;
        assert_eq!(item.label(), "flour");
    }

    #[test]
    fn test_sort_for_display() {
        let mut items = vec![
            GroceryItem::new("l", "peas", None, None, GroceryCategory::Frozen, 0, ItemSource::Manual),
            GroceryItem::new("l", "rice", None, None, GroceryCategory::Pantry, 5, ItemSource::Manual),
            GroceryItem::new("l", "kale", None, None, GroceryCategory::Produce, 9, ItemSource::Manual),
            GroceryItem::new("l", "oats", None, None, GroceryCategory::Pantry, 2, ItemSource::Manual),
        ];
        sort_for_display(&mut items);

        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["kale", "oats", "rice", "peas"]);
    }

    #[test]
    fn test_staple_covers() {
        let staple = PantryStaple::new("h", "Olive Oil");
        assert!(staple.covers("extra virgin olive oil"));
        assert!(staple.covers("olive oil"));
        assert!(!staple.covers("butter"));
    }
}
