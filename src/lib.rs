// Grocery Planner - Core Library
// Meal plans in, categorized grocery lists out. Used by the CLI, the API
// server, and the tests.

pub mod aggregator;
pub mod categorizer;
pub mod config;
pub mod dates;
pub mod error;
pub mod export;
pub mod households;
pub mod models;
pub mod planner;
pub mod store;
pub mod telemetry;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use aggregator::{aggregate, scale_factor, AggregatedIngredient};
pub use categorizer::categorize;
pub use config::Config;
pub use error::{PlannerError, Result};
pub use models::{
    DiningDraft, DiningKind, DiningLog, EntryKind, GroceryCategory, GroceryItem, GroceryList,
    Household, HouseholdMember, HouseholdTask, Ingredient, Invitation, ItemSource, MealPlanEntry,
    MealSlot, MemberRole, PantryStaple, Recipe, RecipeDraft, TaskDraft,
};
pub use planner::{GroceryPlanner, ListView, PlannerOptions};
pub use store::{Event, GroceryStore, SqliteStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
