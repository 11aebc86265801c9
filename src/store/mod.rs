// 🗄️ Storage seam
//
// Services receive a `GroceryStore` explicitly; there is no global client.
// `SqliteStore` is the production implementation, tests can wrap it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{GroceryItem, GroceryList, MealPlanEntry, PantryStaple, Recipe};

pub mod sqlite;

pub use sqlite::{setup_database, SqliteStore};

/// What the grocery planner needs from persistent storage
pub trait GroceryStore {
    /// All recipes of a household
    fn recipes_for_household(&self, household_id: &str) -> Result<Vec<Recipe>>;

    /// Plan entries with `start <= date <= end`, ordered by date then slot
    fn meal_plan_entries(
        &self,
        household_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MealPlanEntry>>;

    /// Every list flagged current (should be at most one)
    fn current_lists(&self, household_id: &str) -> Result<Vec<GroceryList>>;

    /// Demote the household's current list(s), insert `list` and `items`.
    /// All or nothing. Returns the ids of the demoted lists.
    fn replace_current_list(&self, list: &GroceryList, items: &[GroceryItem]) -> Result<Vec<String>>;

    fn list_items(&self, list_id: &str) -> Result<Vec<GroceryItem>>;

    fn get_item(&self, item_id: &str) -> Result<GroceryItem>;

    fn insert_item(&self, item: &GroceryItem) -> Result<()>;

    /// Insert several items into existing lists. All or nothing.
    fn insert_items(&self, items: &[GroceryItem]) -> Result<()>;

    fn set_item_checked(&self, item_id: &str, checked: bool) -> Result<()>;

    fn delete_item(&self, item_id: &str) -> Result<()>;

    fn pantry_staples(&self, household_id: &str) -> Result<Vec<PantryStaple>>;

    fn record_event(&self, event: &Event) -> Result<()>;
}

impl<T: GroceryStore + ?Sized> GroceryStore for &T {
    fn recipes_for_household(&self, household_id: &str) -> Result<Vec<Recipe>> {
        (**self).recipes_for_household(household_id)
    }

    fn meal_plan_entries(
        &self,
        household_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MealPlanEntry>> {
        (**self).meal_plan_entries(household_id, start, end)
    }

    fn current_lists(&self, household_id: &str) -> Result<Vec<GroceryList>> {
        (**self).current_lists(household_id)
    }

    fn replace_current_list(&self, list: &GroceryList, items: &[GroceryItem]) -> Result<Vec<String>> {
        (**self).replace_current_list(list, items)
    }

    fn list_items(&self, list_id: &str) -> Result<Vec<GroceryItem>> {
        (**self).list_items(list_id)
    }

    fn get_item(&self, item_id: &str) -> Result<GroceryItem> {
        (**self).get_item(item_id)
    }

    fn insert_item(&self, item: &GroceryItem) -> Result<()> {
        (**self).insert_item(item)
    }

    fn insert_items(&self, items: &[GroceryItem]) -> Result<()> {
        (**self).insert_items(items)
    }

    fn set_item_checked(&self, item_id: &str, checked: bool) -> Result<()> {
        (**self).set_item_checked(item_id, checked)
    }

    fn delete_item(&self, item_id: &str) -> Result<()> {
        (**self).delete_item(item_id)
    }

    fn pantry_staples(&self, household_id: &str) -> Result<Vec<PantryStaple>> {
        (**self).pantry_staples(household_id)
    }

    fn record_event(&self, event: &Event) -> Result<()> {
        (**self).record_event(event)
    }
}

/// The one current list, if any. When several are flagged, the newest wins.
pub fn current_list<S: GroceryStore + ?Sized>(store: &S, household_id: &str) -> Result<Option<GroceryList>> {
    let mut lists = store.current_lists(household_id)?;
    lists.sort_by(|a, b| b.generated_at.cmp(&a.generated_at));
    Ok(lists.into_iter().next())
}

/// Audit trail entry ("every change is an event")
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl Event {
    pub fn new(
        event_type: &str,
        entity_type: &str,
        entity_id: &str,
        data: serde_json::Value,
        actor: &str,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: actor.to_string(),
        }
    }
}
