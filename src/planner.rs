// 📝 Grocery List Lifecycle
//
// generate = read plan → aggregate → categorize → replace current list.
// The replacement (demote old, insert new list, insert items) is a single
// store call that either fully applies or leaves the old list current.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::aggregator::{aggregate, AggregatedIngredient};
use crate::categorizer::categorize;
use crate::dates::{current_week_start, format_date, week_range, week_start};
use crate::error::{PlannerError, Result};
use crate::models::{
    GroceryCategory, GroceryItem, GroceryList, ItemSource, MealPlanEntry, PantryStaple, Recipe,
};
use crate::store::{current_list, Event, GroceryStore};

#[derive(Debug, Clone)]
pub struct PlannerOptions {
    /// Move generated items the household keeps stocked into VerifyPantry
    pub flag_pantry_staples: bool,

    /// Recorded as the actor of audit events
    pub actor: String,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        PlannerOptions {
            flag_pantry_staples: false,
            actor: "grocery_planner".to_string(),
        }
    }
}

/// A list together with its items in display order
#[derive(Debug, Clone, Serialize)]
pub struct ListView {
    pub list: GroceryList,
    pub items: Vec<GroceryItem>,
}

pub struct GroceryPlanner<S> {
    store: S,
    options: PlannerOptions,
}

impl<S: GroceryStore> GroceryPlanner<S> {
    pub fn new(store: S) -> Self {
        Self::with_options(store, PlannerOptions::default())
    }

    pub fn with_options(store: S, options: PlannerOptions) -> Self {
        GroceryPlanner { store, options }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ========================================================================
    // GENERATION
    // ========================================================================

    /// Build a new current list for this week from the given entries.
    pub fn generate(
        &self,
        household_id: &str,
        entries: &[MealPlanEntry],
        recipes: &[Recipe],
    ) -> Result<GroceryList> {
        let now = Utc::now();
        self.generate_at(household_id, entries, recipes, current_week_start(now), now)
    }

    /// Read the week containing `day` from the store and generate from it.
    /// Read failures abort before anything is written.
    pub fn generate_for_week(&self, household_id: &str, day: NaiveDate) -> Result<GroceryList> {
        let (start, end) = week_range(day);
        let recipes = self.store.recipes_for_household(household_id)?;
        let entries = self.store.meal_plan_entries(household_id, start, end)?;

        self.generate_at(household_id, &entries, &recipes, start, Utc::now())
    }

    pub fn generate_at(
        &self,
        household_id: &str,
        entries: &[MealPlanEntry],
        recipes: &[Recipe],
        week_start: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<GroceryList> {
        let mut lines = aggregate(entries, recipes);

        if self.options.flag_pantry_staples {
            let staples = self.store.pantry_staples(household_id)?;
            flag_staples(&mut lines, &staples);
        }

        let list = GroceryList::new_current(household_id, week_start, now);
        let items: Vec<GroceryItem> = lines
            .into_iter()
            .enumerate()
            .map(|(i, line)| {
                GroceryItem::new(
                    &list.id,
                    &line.name,
                    line.quantity,
                    line.unit,
                    line.category,
                    i as i64,
                    ItemSource::MealPlan,
                )
            })
            .collect();

        let demoted = self.store.replace_current_list(&list, &items)?;
        if demoted.len() > 1 {
            warn!(household_id, demoted = demoted.len(), "household had several current lists");
        }

        info!(
            household_id,
            list_id = %list.id,
            items = items.len(),
            entries = entries.len(),
            "generated grocery list"
        );

        self.audit(
            "grocery_list_generated",
            "grocery_list",
            &list.id,
            serde_json::json!({
                "household_id": household_id,
                "week_start": format_date(week_start),
                "items": items.len(),
                "demoted": demoted,
            }),
        );

        Ok(list)
    }

    // ========================================================================
    // READING
    // ========================================================================

    pub fn current_list(&self, household_id: &str) -> Result<Option<ListView>> {
        let Some(list) = current_list(&self.store, household_id)? else {
            return Ok(None);
        };
        let mut items = self.store.list_items(&list.id)?;
        crate::models::grocery::sort_for_display(&mut items);
        Ok(Some(ListView { list, items }))
    }

    // ========================================================================
    // USER EDITS
    // ========================================================================

    /// Add an item by hand. Starts an empty current list if there is none.
    pub fn add_manual_item(
        &self,
        household_id: &str,
        name: &str,
        quantity: Option<f64>,
        unit: Option<&str>,
    ) -> Result<GroceryItem> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PlannerError::invalid("name", "item name is empty"));
        }

        let list = self.current_or_new_list(household_id)?;
        let item = GroceryItem::new(
            &list.id,
            name,
            quantity,
            unit.map(str::trim).filter(|u| !u.is_empty()).map(str::to_string),
            categorize(name),
            self.next_sort_order(&list.id)?,
            ItemSource::Manual,
        );
        self.store.insert_item(&item)?;

        info!(household_id, item = %item.name, "added manual item");
        Ok(item)
    }

    /// Add the named pantry staples to the current list
    pub fn restock_staples(&self, household_id: &str, names: &[String]) -> Result<Vec<GroceryItem>> {
        let staples = self.store.pantry_staples(household_id)?;

        // resolve every name before writing anything
        let chosen: Vec<&PantryStaple> = names
            .iter()
            .map(|name| {
                staples
                    .iter()
                    .find(|s| s.name.eq_ignore_ascii_case(name.trim()))
                    .ok_or_else(|| PlannerError::not_found("pantry staple", name.as_str()))
            })
            .collect::<Result<_>>()?;

        let list = self.current_or_new_list(household_id)?;
        let first = self.next_sort_order(&list.id)?;

        let added: Vec<GroceryItem> = chosen
            .into_iter()
            .enumerate()
            .map(|(i, staple)| {
                GroceryItem::new(
                    &list.id,
                    &staple.name,
                    None,
                    None,
                    categorize(&staple.name),
                    first + i as i64,
                    ItemSource::PantryStaple,
                )
            })
            .collect();
        self.store.insert_items(&added)?;

        info!(household_id, added = added.len(), "restocked pantry staples");
        Ok(added)
    }

    pub fn set_checked(&self, item_id: &str, checked: bool) -> Result<GroceryItem> {
        self.store.set_item_checked(item_id, checked)?;
        let item = self.store.get_item(item_id)?;

        let event_type = if checked { "grocery_item_checked" } else { "grocery_item_unchecked" };
        self.audit(event_type, "grocery_item", item_id, serde_json::json!({"list_id": item.list_id}));
        Ok(item)
    }

    pub fn toggle_item(&self, item_id: &str) -> Result<GroceryItem> {
        let item = self.store.get_item(item_id)?;
        self.set_checked(item_id, !item.checked)
    }

    pub fn remove_item(&self, item_id: &str) -> Result<()> {
        self.store.delete_item(item_id)
    }

    // ========================================================================
    // HELPERS
    // ========================================================================

    fn current_or_new_list(&self, household_id: &str) -> Result<GroceryList> {
        if let Some(list) = current_list(&self.store, household_id)? {
            return Ok(list);
        }

        let now = Utc::now();
        let list = GroceryList::new_current(household_id, week_start(now.date_naive()), now);
        self.store.replace_current_list(&list, &[])?;
        info!(household_id, list_id = %list.id, "started empty grocery list");
        Ok(list)
    }

    fn next_sort_order(&self, list_id: &str) -> Result<i64> {
        let items = self.store.list_items(list_id)?;
        Ok(items.iter().map(|i| i.sort_order + 1).max().unwrap_or(0))
    }

    /// Audit failures are logged, never surfaced
    fn audit(&self, event_type: &str, entity_type: &str, entity_id: &str, data: serde_json::Value) {
        let event = Event::new(event_type, entity_type, entity_id, data, &self.options.actor);
        if let Err(e) = self.store.record_event(&event) {
            warn!(event_type, entity_id, error = %e, "failed to record event");
        }
    }
}

/// Recategorize lines covered by a pantry staple, keeping display order
fn flag_staples(lines: &mut [AggregatedIngredient], staples: &[PantryStaple]) {
    for line in lines.iter_mut() {
        if staples.iter().any(|s| s.covers(&line.name)) {
            line.category = GroceryCategory::VerifyPantry;
        }
    }
    lines.sort_by_key(|line| line.category.sort_order());
}

// ============================================================================
// TESTS
// ============================================================================
