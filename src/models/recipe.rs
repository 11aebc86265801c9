// 🍲 Recipe Entity
//
// A recipe belongs to one household and carries its base serving count
// plus an ordered ingredient list. Meal-plan entries reference it by id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};

/// One line of a recipe's ingredient list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Ingredient {
    pub fn new(name: &str, quantity: Option<f64>, unit: Option<&str>) -> Self {
        Ingredient {
            name: name.to_string(),
            quantity,
            unit: unit.map(str::to_string),
            notes: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub household_id: String,
    pub title: String,

    /// Base serving count the ingredient quantities are written for
    pub servings: u32,

    pub ingredients: Vec<Ingredient>,
    pub created_at: DateTime<Utc>,
}

impl Recipe {
    pub fn new(household_id: &str, title: &str, servings: u32, ingredients: Vec<Ingredient>) -> Self {
        Recipe {
            id: uuid::Uuid::new_v4().to_string(),
            household_id: household_id.to_string(),
            title: title.to_string(),
            servings,
            ingredients,
            created_at: Utc::now(),
        }
    }

    /// Reject recipes the aggregator could not scale
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(PlannerError::invalid("title", "recipe title is empty"));
        }
        if self.servings == 0 {
            return Err(PlannerError::invalid("servings", "must be at least 1"));
        }
        if let Some(bad) = self.ingredients.iter().find(|i| i.name.trim().is_empty()) {
            return Err(PlannerError::invalid(
                "ingredients",
                format!("ingredient with empty name (quantity {:?})", bad.quantity),
            ));
        }
        Ok(())
    }
}

/// Recipe as written in an import file (no ids, no timestamps)
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeDraft {
    pub title: String,
    #[serde(default = "default_servings")]
    pub servings: u32,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
}

fn default_servings() -> u32 {
    4
}

impl RecipeDraft {
    pub fn into_recipe(self, household_id: &str) -> Result<Recipe> {
        let recipe = Recipe::new(household_id, &self.title, self.servings, self.ingredients);
        recipe.validate()?;
        Ok(recipe)
    }

    /// Replace the editable fields of an existing recipe, keeping its identity
    pub fn revise(self, existing: Recipe) -> Result<Recipe> {
        let recipe = Recipe {
            title: self.title,
            servings: self.servings,
            ingredients: self.ingredients,
            ..existing
        };
        recipe.validate()?;
        Ok(recipe)
    }
}
