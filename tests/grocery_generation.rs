// End-to-end list generation against a real SQLite store, with a wrapper
// that can make individual store calls fail.

use std::cell::Cell;

use chrono::NaiveDate;
use grocery_planner::store::Event;
use grocery_planner::{
    EntryKind, GroceryCategory, GroceryItem, GroceryList, GroceryPlanner, GroceryStore, Ingredient,
    MealPlanEntry, MealSlot, PantryStaple, PlannerError, PlannerOptions, Recipe, Result,
    SqliteStore,
};

const HOUSEHOLD: &str = "household-1";

// ============================================================================
// FAILURE INJECTION
// ============================================================================

#[derive(Default)]
struct Faults {
    recipes: Cell<bool>,
    entries: Cell<bool>,
    replace: Cell<bool>,
    items: Cell<bool>,
}

struct FaultyStore {
    inner: SqliteStore,
    faults: Faults,
}

impl FaultyStore {
    fn new() -> Self {
        FaultyStore {
            inner: SqliteStore::open_in_memory().unwrap(),
            faults: Faults::default(),
        }
    }
}

fn injected_read(what: &'static str) -> PlannerError {
    PlannerError::read(what)("injected read failure")
}

impl GroceryStore for FaultyStore {
    fn recipes_for_household(&self, household_id: &str) -> Result<Vec<Recipe>> {
        if self.faults.recipes.get() {
            return Err(injected_read("recipes"));
        }
        self.inner.recipes_for_household(household_id)
    }

    fn meal_plan_entries(
        &self,
        household_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MealPlanEntry>> {
        if self.faults.entries.get() {
            return Err(injected_read("meal plan entries"));
        }
        self.inner.meal_plan_entries(household_id, start, end)
    }

    fn current_lists(&self, household_id: &str) -> Result<Vec<GroceryList>> {
        self.inner.current_lists(household_id)
    }

    fn replace_current_list(&self, list: &GroceryList, items: &[GroceryItem]) -> Result<Vec<String>> {
        if self.faults.replace.get() {
            return Err(PlannerError::write("grocery list")("injected write failure"));
        }
        self.inner.replace_current_list(list, items)
    }

    fn list_items(&self, list_id: &str) -> Result<Vec<GroceryItem>> {
        self.inner.list_items(list_id)
    }

    fn get_item(&self, item_id: &str) -> Result<GroceryItem> {
        self.inner.get_item(item_id)
    }

    fn insert_item(&self, item: &GroceryItem) -> Result<()> {
        self.inner.insert_item(item)
    }

    fn insert_items(&self, items: &[GroceryItem]) -> Result<()> {
        if self.faults.items.get() {
            return Err(PlannerError::write("grocery items")("injected write failure"));
        }
        self.inner.insert_items(items)
    }

    fn set_item_checked(&self, item_id: &str, checked: bool) -> Result<()> {
        self.inner.set_item_checked(item_id, checked)
    }

    fn delete_item(&self, item_id: &str) -> Result<()> {
        self.inner.delete_item(item_id)
    }

    fn pantry_staples(&self, household_id: &str) -> Result<Vec<PantryStaple>> {
        self.inner.pantry_staples(household_id)
    }

    fn record_event(&self, event: &Event) -> Result<()> {
        self.inner.record_event(event)
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

/// Monday 2024-03-04
fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
}

fn day(offset: i64) -> NaiveDate {
    monday() + chrono::Duration::days(offset)
}

/// Two recipes sharing onion (same unit) and milk (different units)
fn seed(store: &SqliteStore) -> (Recipe, Recipe) {
    let pancakes = Recipe::new(
        HOUSEHOLD,
        "Pancakes",
        4,
        vec![
            Ingredient::new("Flour", Some(2.0), Some("cup")),
            Ingredient::new("Milk", Some(1.5), Some("cup")),
            Ingredient::new("Eggs", Some(2.0), None),
        ],
    );
    let stir_fry = Recipe::new(
        HOUSEHOLD,
        "Chicken Stir Fry",
        2,
        vec![
            Ingredient::new("Chicken breast", Some(1.0), Some("lb")),
            Ingredient::new("onion", Some(1.0), Some("whole")),
            Ingredient::new("milk", Some(100.0), Some("ml")),
        ],
    );
    store.insert_recipe(&pancakes).unwrap();
    store.insert_recipe(&stir_fry).unwrap();
    (pancakes, stir_fry)
}

fn plan(store: &SqliteStore, date: NaiveDate, slot: MealSlot, kind: EntryKind) {
    store
        .insert_meal_plan_entry(&MealPlanEntry::with_kind(HOUSEHOLD, date, slot, kind))
        .unwrap();
}

fn cook(recipe: &Recipe, servings_override: Option<u32>) -> EntryKind {
    EntryKind::Recipe {
        recipe_id: recipe.id.clone(),
        servings_override,
    }
}

fn find<'a>(items: &'a [GroceryItem], name: &str, unit: Option<&str>) -> &'a GroceryItem {
    items
        .iter()
        .find(|i| i.name.eq_ignore_ascii_case(name) && i.unit.as_deref() == unit)
        .unwrap_or_else(|| panic!("no item {name} ({unit:?})"))
}

// ============================================================================
// GENERATION
// ============================================================================

#[test]
fn test_week_generation_scales_merges_and_categorizes() {
    let planner = GroceryPlanner::new(SqliteStore::open_in_memory().unwrap());
    let (pancakes, stir_fry) = seed(planner.store());

    plan(planner.store(), day(0), MealSlot::Breakfast, cook(&pancakes, Some(8)));
    plan(planner.store(), day(2), MealSlot::Dinner, cook(&stir_fry, None));
    plan(planner.store(), day(6), MealSlot::Dinner, cook(&stir_fry, None));
    plan(planner.store(), day(3), MealSlot::Lunch, EntryKind::EatOut);
    plan(planner.store(), day(4), MealSlot::Lunch, EntryKind::Leftovers);
    // next Monday is outside the week
    plan(planner.store(), day(7), MealSlot::Dinner, cook(&pancakes, None));

    let list = planner.generate_for_week(HOUSEHOLD, day(3)).unwrap();
    assert_eq!(list.week_start, monday());
    assert!(list.is_current);

    let view = planner.current_list(HOUSEHOLD).unwrap().unwrap();
    assert_eq!(view.list.id, list.id);
    let items = &view.items;

    // pancakes doubled by the 8-serving override
    assert_eq!(find(items, "flour", Some("cup")).quantity, Some(4.0));
    assert_eq!(find(items, "eggs", None).quantity, Some(4.0));
    assert_eq!(find(items, "milk", Some("cup")).quantity, Some(3.0));

    // stir fry planned twice, merged into one line each
    assert_eq!(find(items, "chicken breast", Some("lb")).quantity, Some(2.0));
    assert_eq!(find(items, "onion", Some("whole")).quantity, Some(2.0));
    assert_eq!(find(items, "milk", Some("ml")).quantity, Some(200.0));

    assert_eq!(items.len(), 6);

    assert_eq!(find(items, "onion", Some("whole")).category, GroceryCategory::Produce);
    assert_eq!(find(items, "chicken breast", Some("lb")).category, GroceryCategory::Meat);
    assert_eq!(find(items, "flour", Some("cup")).category, GroceryCategory::Pantry);

    let orders: Vec<u8> = items.iter().map(|i| i.category.sort_order()).collect();
    let mut sorted = orders.clone();
    sorted.sort();
    assert_eq!(orders, sorted);
    assert!(items.iter().all(|i| !i.checked));
}

#[test]
fn test_regeneration_leaves_exactly_one_current_list() {
    let planner = GroceryPlanner::new(SqliteStore::open_in_memory().unwrap());
    let (pancakes, _) = seed(planner.store());
    plan(planner.store(), day(1), MealSlot::Breakfast, cook(&pancakes, None));

    let first = planner.generate_for_week(HOUSEHOLD, monday()).unwrap();
    let view = planner.current_list(HOUSEHOLD).unwrap().unwrap();
    planner.toggle_item(&view.items[0].id).unwrap();

    let second = planner.generate_for_week(HOUSEHOLD, monday()).unwrap();
    let third = planner.generate_for_week(HOUSEHOLD, monday()).unwrap();
    assert_ne!(first.id, second.id);
    assert_ne!(second.id, third.id);

    let current = planner.store().current_lists(HOUSEHOLD).unwrap();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].id, third.id);

    // history is kept, only demoted
    let all = planner.store().lists_for_household(HOUSEHOLD).unwrap();
    assert_eq!(all.len(), 3);

    // a fresh list starts unchecked
    let view = planner.current_list(HOUSEHOLD).unwrap().unwrap();
    assert!(view.items.iter().all(|i| !i.checked));
}

#[test]
fn test_empty_week_still_produces_an_empty_current_list() {
    let planner = GroceryPlanner::new(SqliteStore::open_in_memory().unwrap());
    seed(planner.store());

    let list = planner.generate_for_week(HOUSEHOLD, monday()).unwrap();
    let view = planner.current_list(HOUSEHOLD).unwrap().unwrap();
    assert_eq!(view.list.id, list.id);
    assert!(view.items.is_empty());
}

#[test]
fn test_deleted_recipe_is_skipped() {
    let planner = GroceryPlanner::new(SqliteStore::open_in_memory().unwrap());
    let (pancakes, stir_fry) = seed(planner.store());
    plan(planner.store(), day(0), MealSlot::Dinner, cook(&stir_fry, None));
    plan(planner.store(), day(1), MealSlot::Breakfast, cook(&pancakes, None));
    planner.store().delete_recipe(&pancakes.id).unwrap();

    planner.generate_for_week(HOUSEHOLD, monday()).unwrap();
    let view = planner.current_list(HOUSEHOLD).unwrap().unwrap();

    assert_eq!(view.items.len(), 3);
    assert!(view.items.iter().all(|i| !i.name.eq_ignore_ascii_case("flour")));
}

#[test]
fn test_pantry_flag_moves_staples_to_verify_pantry() {
    let options = PlannerOptions {
        flag_pantry_staples: true,
        ..PlannerOptions::default()
    };
    let planner = GroceryPlanner::with_options(SqliteStore::open_in_memory().unwrap(), options);
    let (pancakes, _) = seed(planner.store());
    planner
        .store()
        .insert_pantry_staple(&PantryStaple::new(HOUSEHOLD, "flour"))
        .unwrap();
    plan(planner.store(), day(0), MealSlot::Breakfast, cook(&pancakes, None));

    planner.generate_for_week(HOUSEHOLD, monday()).unwrap();
    let view = planner.current_list(HOUSEHOLD).unwrap().unwrap();

    assert_eq!(find(&view.items, "flour", Some("cup")).category, GroceryCategory::VerifyPantry);
    assert_eq!(find(&view.items, "milk", Some("cup")).category, GroceryCategory::Dairy);
}

// ============================================================================
// FAILURES
// ============================================================================

#[test]
fn test_read_failure_aborts_without_writing() {
    let store = FaultyStore::new();
    let (pancakes, _) = seed(&store.inner);
    plan(&store.inner, day(0), MealSlot::Breakfast, cook(&pancakes, None));

    let planner = GroceryPlanner::new(&store);
    let previous = planner.generate_for_week(HOUSEHOLD, monday()).unwrap();

    store.faults.entries.set(true);
    let err = planner.generate_for_week(HOUSEHOLD, monday()).unwrap_err();
    assert!(err.is_read_failure());

    store.faults.entries.set(false);
    store.faults.recipes.set(true);
    let err = planner.generate_for_week(HOUSEHOLD, monday()).unwrap_err();
    assert!(err.is_read_failure());

    let lists = store.inner.lists_for_household(HOUSEHOLD).unwrap();
    assert_eq!(lists.len(), 1);
    assert_eq!(lists[0].id, previous.id);
    assert!(lists[0].is_current);
}

#[test]
fn test_write_failure_keeps_previous_list_current() {
    let store = FaultyStore::new();
    let (pancakes, _) = seed(&store.inner);
    plan(&store.inner, day(0), MealSlot::Breakfast, cook(&pancakes, None));

    let planner = GroceryPlanner::new(&store);
    let previous = planner.generate_for_week(HOUSEHOLD, monday()).unwrap();

    store.faults.replace.set(true);
    let err = planner.generate_for_week(HOUSEHOLD, monday()).unwrap_err();
    assert!(matches!(err, PlannerError::StorageWrite { .. }));

    let view = planner.current_list(HOUSEHOLD).unwrap().unwrap();
    assert_eq!(view.list.id, previous.id);
    assert_eq!(view.items.len(), 3);
}

#[test]
fn test_failed_restock_adds_no_staples() {
    let store = FaultyStore::new();
    store.inner.insert_pantry_staple(&PantryStaple::new(HOUSEHOLD, "rice")).unwrap();
    store.inner.insert_pantry_staple(&PantryStaple::new(HOUSEHOLD, "olive oil")).unwrap();

    let planner = GroceryPlanner::new(&store);
    planner.add_manual_item(HOUSEHOLD, "bananas", Some(6.0), None).unwrap();

    store.faults.items.set(true);
    let names = vec!["rice".to_string(), "olive oil".to_string()];
    let err = planner.restock_staples(HOUSEHOLD, &names).unwrap_err();
    assert!(matches!(err, PlannerError::StorageWrite { .. }));

    let view = planner.current_list(HOUSEHOLD).unwrap().unwrap();
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].name, "bananas");

    store.faults.items.set(false);
    let added = planner.restock_staples(HOUSEHOLD, &names).unwrap();
    assert_eq!(added.len(), 2);
    assert_eq!(added[0].sort_order, 1);
    assert_eq!(added[1].sort_order, 2);
}
