// 📅 Meal Plan Entry
//
// A (date, slot) assignment of either a recipe or a placeholder.
// The recipe reference and the eat-out/leftovers flags are mutually
// exclusive, so they live in one enum.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{PlannerError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealSlot::Breakfast => "breakfast",
            MealSlot::Lunch => "lunch",
            MealSlot::Dinner => "dinner",
        }
    }

    /// Position within a day, for ordering entries
    pub fn rank(&self) -> u8 {
        match self {
            MealSlot::Breakfast => 0,
            MealSlot::Lunch => 1,
            MealSlot::Dinner => 2,
        }
    }
}

impl fmt::Display for MealSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealSlot {
    type Err = PlannerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "breakfast" => Ok(MealSlot::Breakfast),
            "lunch" => Ok(MealSlot::Lunch),
            "dinner" => Ok(MealSlot::Dinner),
            other => Err(PlannerError::invalid("meal slot", format!("unknown slot '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntryKind {
    Recipe {
        recipe_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        servings_override: Option<u32>,
    },
    EatOut,
    Leftovers,
}

impl EntryKind {
    /// Storage tag for the `entry_type` column
    pub fn tag(&self) -> &'static str {
        match self {
            EntryKind::Recipe { .. } => "recipe",
            EntryKind::EatOut => "eat_out",
            EntryKind::Leftovers => "leftovers",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlanEntry {
    pub id: String,
    pub household_id: String,
    pub date: NaiveDate,
    pub slot: MealSlot,
    pub kind: EntryKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl MealPlanEntry {
    pub fn recipe(
        household_id: &str,
        date: NaiveDate,
        slot: MealSlot,
        recipe_id: &str,
        servings_override: Option<u32>,
    ) -> Self {
        Self::with_kind(
            household_id,
            date,
            slot,
            EntryKind::Recipe {
                recipe_id: recipe_id.to_string(),
                servings_override,
            },
        )
    }

    pub fn with_kind(household_id: &str, date: NaiveDate, slot: MealSlot, kind: EntryKind) -> Self {
        MealPlanEntry {
            id: uuid::Uuid::new_v4().to_string(),
            household_id: household_id.to_string(),
            date,
            slot,
            kind,
            notes: None,
        }
    }

    /// Recipe entries need a recipe id and a positive serving override
    pub fn validate(&self) -> Result<()> {
        if let EntryKind::Recipe { recipe_id, servings_override } = &self.kind {
            if recipe_id.trim().is_empty() {
                return Err(PlannerError::invalid("recipe_id", "recipe id is empty"));
            }
            if *servings_override == Some(0) {
                return Err(PlannerError::invalid("servings_override", "must be at least 1"));
            }
        }
        Ok(())
    }

    /// Referenced recipe id, if this entry cooks something
    pub fn recipe_id(&self) -> Option<&str> {
        match &self.kind {
            EntryKind::Recipe { recipe_id, .. } => Some(recipe_id),
            _ => None,
        }
    }

    pub fn servings_override(&self) -> Option<u32> {
        match &self.kind {
            EntryKind::Recipe { servings_override, .. } => *servings_override,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_parse_is_case_insensitive() {
        assert_eq!("Dinner".parse::<MealSlot>().unwrap(), MealSlot::Dinner);
        assert_eq!(" lunch ".parse::<MealSlot>().unwrap(), MealSlot::Lunch);
        assert!("brunch".parse::<MealSlot>().is_err());
    }

    #[test]
    fn test_placeholder_entries_have_no_recipe() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
        let out = MealPlanEntry::with_kind("h", date, MealSlot::Dinner, EntryKind::EatOut);
        assert_eq!(out.recipe_id(), None);
        assert_eq!(out.servings_override(), None);

        let cooked = MealPlanEntry::recipe("h", date, MealSlot::Dinner, "r1", Some(6));
        assert_eq!(cooked.recipe_id(), Some("r1"));
        assert_eq!(cooked.servings_override(), Some(6));
    }

    #[test]
    fn test_validate_rejects_zero_servings_and_empty_recipe() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
        assert!(MealPlanEntry::recipe("h", date, MealSlot::Dinner, "r1", Some(2)).validate().is_ok());
        assert!(MealPlanEntry::with_kind("h", date, MealSlot::Lunch, EntryKind::EatOut).validate().is_ok());

        let zero = MealPlanEntry::recipe("h", date, MealSlot::Dinner, "r1", Some(0));
        assert!(matches!(zero.validate(), Err(PlannerError::Invalid { field: "servings_override", .. })));

        let blank = MealPlanEntry::recipe("h", date, MealSlot::Dinner, " ", None);
        assert!(matches!(blank.validate(), Err(PlannerError::Invalid { field: "recipe_id", .. })));
    }

    #[test]
    fn test_entry_kind_serializes_with_tag() {
        let kind = EntryKind::Leftovers;
        let json = serde_json::to_value(&kind).unwrap();
        assert_eq!(json, serde_json::json!({"type": "leftovers"}));
    }
}
