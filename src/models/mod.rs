// Domain models
//
// Each struct mirrors one table. Ids are UUID v4 strings.

pub mod dining;
pub mod grocery;
pub mod household;
pub mod meal_plan;
pub mod recipe;
pub mod task;

pub use dining::{DiningDraft, DiningKind, DiningLog};
pub use grocery::{GroceryCategory, GroceryItem, GroceryList, ItemSource, PantryStaple};
pub use household::{Household, HouseholdMember, Invitation, MemberRole};
pub use meal_plan::{EntryKind, MealPlanEntry, MealSlot};
pub use recipe::{Ingredient, Recipe, RecipeDraft};
pub use task::{HouseholdTask, TaskDraft};
