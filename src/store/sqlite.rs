// 🗄️ SQLite store - households, recipes, meal plans, grocery lists
//
// One connection, WAL mode. The "one current list per household" rule is
// enforced twice: by a partial unique index, and by doing demote + insert
// inside one transaction.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use tracing::{debug, info};

use super::{Event, GroceryStore};
use crate::dates::{format_date, DATE_FORMAT};
use crate::error::{PlannerError, Result};
use crate::models::{
    DiningLog, EntryKind, GroceryItem, GroceryList, Household, HouseholdMember, HouseholdTask,
    Ingredient, Invitation, MealPlanEntry, PantryStaple, Recipe,
};

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection) -> rusqlite::Result<()> {
    // WAL for crash recovery; in-memory databases silently stay in "memory" mode
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS households (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS household_members (
            household_id TEXT NOT NULL REFERENCES households(id) ON DELETE CASCADE,
            user_id TEXT NOT NULL,
            display_name TEXT NOT NULL,
            role TEXT NOT NULL CHECK (role IN ('owner', 'member')),
            joined_at TEXT NOT NULL,
            PRIMARY KEY (household_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS invitations (
            id TEXT PRIMARY KEY,
            household_id TEXT NOT NULL REFERENCES households(id) ON DELETE CASCADE,
            email TEXT NOT NULL,
            code_hash TEXT UNIQUE NOT NULL,
            created_at TEXT NOT NULL,
            expires_at TEXT NOT NULL,
            accepted_at TEXT
        );

        CREATE TABLE IF NOT EXISTS recipes (
            id TEXT PRIMARY KEY,
            household_id TEXT NOT NULL,
            title TEXT NOT NULL,
            servings INTEGER NOT NULL CHECK (servings > 0),
            ingredients TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        -- recipe_id is not a foreign key; entries left dangling by a
        -- deleted recipe are skipped at generation time
        CREATE TABLE IF NOT EXISTS meal_plan_entries (
            id TEXT PRIMARY KEY,
            household_id TEXT NOT NULL,
            date TEXT NOT NULL,
            slot TEXT NOT NULL CHECK (slot IN ('breakfast', 'lunch', 'dinner')),
            entry_type TEXT NOT NULL CHECK (entry_type IN ('recipe', 'eat_out', 'leftovers')),
            recipe_id TEXT,
            servings_override INTEGER CHECK (servings_override IS NULL OR servings_override > 0),
            notes TEXT,
            CHECK ((entry_type = 'recipe') = (recipe_id IS NOT NULL))
        );

        CREATE TABLE IF NOT EXISTS grocery_lists (
            id TEXT PRIMARY KEY,
            household_id TEXT NOT NULL,
            week_start TEXT NOT NULL,
            is_current INTEGER NOT NULL DEFAULT 0,
            generated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS grocery_items (
            id TEXT PRIMARY KEY,
            list_id TEXT NOT NULL REFERENCES grocery_lists(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            quantity REAL,
            unit TEXT,
            category TEXT NOT NULL,
            checked INTEGER NOT NULL DEFAULT 0,
            sort_order INTEGER NOT NULL,
            source TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS pantry_staples (
            id TEXT PRIMARY KEY,
            household_id TEXT NOT NULL,
            name TEXT NOT NULL,
            UNIQUE (household_id, name COLLATE NOCASE)
        );

        CREATE TABLE IF NOT EXISTS tasks (
            id TEXT PRIMARY KEY,
            household_id TEXT NOT NULL,
            title TEXT NOT NULL,
            assigned_to TEXT,
            due_date TEXT,
            completed_at TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS dining_logs (
            id TEXT PRIMARY KEY,
            household_id TEXT NOT NULL,
            restaurant TEXT NOT NULL,
            visited_on TEXT NOT NULL,
            kind TEXT NOT NULL CHECK (kind IN ('dine_in', 'takeout', 'delivery')),
            dishes TEXT NOT NULL,
            total_cost REAL,
            rating INTEGER CHECK (rating IS NULL OR rating BETWEEN 1 AND 5),
            notes TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_one_current_list
            ON grocery_lists(household_id) WHERE is_current = 1;
        CREATE INDEX IF NOT EXISTS idx_plan_household_date
            ON meal_plan_entries(household_id, date);
        CREATE INDEX IF NOT EXISTS idx_recipes_household ON recipes(household_id);
        CREATE INDEX IF NOT EXISTS idx_items_list ON grocery_items(list_id);
        CREATE INDEX IF NOT EXISTS idx_tasks_household ON tasks(household_id);
        CREATE INDEX IF NOT EXISTS idx_dining_household ON dining_logs(household_id, visited_on);
        CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id);",
    )?;

    Ok(())
}

// ============================================================================
// ROW MAPPING
// ============================================================================

fn conversion_err<E>(idx: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

fn date_col(row: &Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|e| conversion_err(idx, e))
}

fn timestamp_col(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_err(idx, e))
}

fn optional_date_col(row: &Row, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).map_err(|e| conversion_err(idx, e)))
        .transpose()
}

fn optional_timestamp_col(row: &Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| conversion_err(idx, e))
    })
    .transpose()
}

/// Columns backed by a FromStr enum
fn parsed_col<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = PlannerError>,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| conversion_err(idx, e))
}

const RECIPE_COLUMNS: &str = "id, household_id, title, servings, ingredients, created_at";

fn row_to_recipe(row: &Row) -> rusqlite::Result<Recipe> {
    let ingredients_json: String = row.get(4)?;
    let ingredients: Vec<Ingredient> =
        serde_json::from_str(&ingredients_json).map_err(|e| conversion_err(4, e))?;

    Ok(Recipe {
        id: row.get(0)?,
        household_id: row.get(1)?,
        title: row.get(2)?,
        servings: row.get(3)?,
        ingredients,
        created_at: timestamp_col(row, 5)?,
    })
}

const ENTRY_COLUMNS: &str =
    "id, household_id, date, slot, entry_type, recipe_id, servings_override, notes";

fn row_to_entry(row: &Row) -> rusqlite::Result<MealPlanEntry> {
    let entry_type: String = row.get(4)?;
    let kind = match entry_type.as_str() {
        "recipe" => EntryKind::Recipe {
            recipe_id: row.get(5)?,
            servings_override: row.get(6)?,
        },
        "eat_out" => EntryKind::EatOut,
        "leftovers" => EntryKind::Leftovers,
        other => {
            return Err(conversion_err(
                4,
                PlannerError::invalid("entry type", format!("unknown entry type '{other}'")),
            ))
        }
    };

    Ok(MealPlanEntry {
        id: row.get(0)?,
        household_id: row.get(1)?,
        date: date_col(row, 2)?,
        slot: parsed_col(row, 3)?,
        kind,
        notes: row.get(7)?,
    })
}

const LIST_COLUMNS: &str = "id, household_id, week_start, is_current, generated_at";

fn row_to_list(row: &Row) -> rusqlite::Result<GroceryList> {
    Ok(GroceryList {
        id: row.get(0)?,
        household_id: row.get(1)?,
        week_start: date_col(row, 2)?,
        is_current: row.get(3)?,
        generated_at: timestamp_col(row, 4)?,
    })
}

const ITEM_COLUMNS: &str = "id, list_id, name, quantity, unit, category, checked, sort_order, source";

fn row_to_item(row: &Row) -> rusqlite::Result<GroceryItem> {
    Ok(GroceryItem {
        id: row.get(0)?,
        list_id: row.get(1)?,
        name: row.get(2)?,
        quantity: row.get(3)?,
        unit: row.get(4)?,
        category: parsed_col(row, 5)?,
        checked: row.get(6)?,
        sort_order: row.get(7)?,
        source: parsed_col(row, 8)?,
    })
}

fn row_to_member(row: &Row) -> rusqlite::Result<HouseholdMember> {
    Ok(HouseholdMember {
        household_id: row.get(0)?,
        user_id: row.get(1)?,
        display_name: row.get(2)?,
        role: parsed_col(row, 3)?,
        joined_at: timestamp_col(row, 4)?,
    })
}

fn row_to_invitation(row: &Row) -> rusqlite::Result<Invitation> {
    Ok(Invitation {
        id: row.get(0)?,
        household_id: row.get(1)?,
        email: row.get(2)?,
        code_hash: row.get(3)?,
        created_at: timestamp_col(row, 4)?,
        expires_at: timestamp_col(row, 5)?,
        accepted_at: optional_timestamp_col(row, 6)?,
    })
}

const TASK_COLUMNS: &str = "id, household_id, title, assigned_to, due_date, completed_at, created_at";

fn row_to_task(row: &Row) -> rusqlite::Result<HouseholdTask> {
    Ok(HouseholdTask {
        id: row.get(0)?,
        household_id: row.get(1)?,
        title: row.get(2)?,
        assigned_to: row.get(3)?,
        due_date: optional_date_col(row, 4)?,
        completed_at: optional_timestamp_col(row, 5)?,
        created_at: timestamp_col(row, 6)?,
    })
}

const DINING_COLUMNS: &str =
    "id, household_id, restaurant, visited_on, kind, dishes, total_cost, rating, notes, created_at";

fn row_to_dining(row: &Row) -> rusqlite::Result<DiningLog> {
    let dishes_json: String = row.get(5)?;
    Ok(DiningLog {
        id: row.get(0)?,
        household_id: row.get(1)?,
        restaurant: row.get(2)?,
        visited_on: date_col(row, 3)?,
        kind: parsed_col(row, 4)?,
        dishes: serde_json::from_str(&dishes_json).map_err(|e| conversion_err(5, e))?,
        total_cost: row.get(6)?,
        rating: row.get(7)?,
        notes: row.get(8)?,
        created_at: timestamp_col(row, 9)?,
    })
}

fn insert_item_on(conn: &Connection, item: &GroceryItem) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO grocery_items (id, list_id, name, quantity, unit, category, checked, sort_order, source)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            item.id,
            item.list_id,
            item.name,
            item.quantity,
            item.unit,
            item.category.as_str(),
            item.checked,
            item.sort_order,
            item.source.as_str(),
        ],
    )
}

fn insert_member_on(conn: &Connection, member: &HouseholdMember) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO household_members (household_id, user_id, display_name, role, joined_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            member.household_id,
            member.user_id,
            member.display_name,
            member.role.as_str(),
            member.joined_at.to_rfc3339(),
        ],
    )
}

// ============================================================================
// STORE
// ============================================================================

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a database file and make sure the schema exists
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).map_err(PlannerError::read("database file"))?;
        info!(path = %path.as_ref().display(), "opened database");
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(PlannerError::read("in-memory database"))?;
        Self::from_connection(conn)
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        setup_database(&conn).map_err(PlannerError::write("schema"))?;
        Ok(SqliteStore { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    // ------------------------------------------------------------------------
    // Households
    // ------------------------------------------------------------------------

    /// Insert the household and its owner in one transaction
    pub fn insert_household(&self, household: &Household, owner: &HouseholdMember) -> Result<()> {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(PlannerError::write("household"))?;

        tx.execute(
            "INSERT INTO households (id, name, created_at) VALUES (?1, ?2, ?3)",
            params![household.id, household.name, household.created_at.to_rfc3339()],
        )
        .map_err(PlannerError::write("household"))?;
        insert_member_on(&tx, owner).map_err(PlannerError::write("household member"))?;

        tx.commit().map_err(PlannerError::write("household"))?;
        Ok(())
    }

    pub fn get_household(&self, household_id: &str) -> Result<Household> {
        self.conn
            .query_row(
                "SELECT id, name, created_at FROM households WHERE id = ?1",
                [household_id],
                |row| {
                    Ok(Household {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        created_at: timestamp_col(row, 2)?,
                    })
                },
            )
            .optional()
            .map_err(PlannerError::read("household"))?
            .ok_or_else(|| PlannerError::not_found("household", household_id))
    }

    pub fn household_members(&self, household_id: &str) -> Result<Vec<HouseholdMember>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT household_id, user_id, display_name, role, joined_at
                 FROM household_members
                 WHERE household_id = ?1
                 ORDER BY joined_at",
            )
            .map_err(PlannerError::read("household members"))?;

        let members = stmt
            .query_map([household_id], row_to_member)
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(PlannerError::read("household members"))?;

        Ok(members)
    }

    pub fn insert_invitation(&self, invitation: &Invitation) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO invitations (id, household_id, email, code_hash, created_at, expires_at, accepted_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    invitation.id,
                    invitation.household_id,
                    invitation.email,
                    invitation.code_hash,
                    invitation.created_at.to_rfc3339(),
                    invitation.expires_at.to_rfc3339(),
                    invitation.accepted_at.map(|t| t.to_rfc3339()),
                ],
            )
            .map_err(PlannerError::write("invitation"))?;
        Ok(())
    }

    pub fn find_invitation_by_hash(&self, code_hash: &str) -> Result<Option<Invitation>> {
        self.conn
            .query_row(
                "SELECT id, household_id, email, code_hash, created_at, expires_at, accepted_at
                 FROM invitations WHERE code_hash = ?1",
                [code_hash],
                row_to_invitation,
            )
            .optional()
            .map_err(PlannerError::read("invitation"))
    }

    /// Mark accepted and add the member atomically. Fails if already accepted.
    pub fn accept_invitation(
        &self,
        invitation_id: &str,
        member: &HouseholdMember,
        accepted_at: DateTime<Utc>,
    ) -> Result<()> {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(PlannerError::write("invitation"))?;

        let updated = tx
            .execute(
                "UPDATE invitations SET accepted_at = ?1 WHERE id = ?2 AND accepted_at IS NULL",
                params![accepted_at.to_rfc3339(), invitation_id],
            )
            .map_err(PlannerError::write("invitation"))?;
        if updated == 0 {
            return Err(PlannerError::invalid("invitation", "already accepted"));
        }

        insert_member_on(&tx, member).map_err(PlannerError::write("household member"))?;
        tx.commit().map_err(PlannerError::write("invitation"))?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Recipes
    // ------------------------------------------------------------------------

    pub fn insert_recipe(&self, recipe: &Recipe) -> Result<()> {
        recipe.validate()?;
        let ingredients_json =
            serde_json::to_string(&recipe.ingredients).map_err(PlannerError::write("recipe"))?;

        self.conn
            .execute(
                "INSERT INTO recipes (id, household_id, title, servings, ingredients, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    recipe.id,
                    recipe.household_id,
                    recipe.title,
                    recipe.servings,
                    ingredients_json,
                    recipe.created_at.to_rfc3339(),
                ],
            )
            .map_err(PlannerError::write("recipe"))?;

        debug!(recipe_id = %recipe.id, title = %recipe.title, "inserted recipe");
        Ok(())
    }

    /// Overwrite title, servings and ingredients of a stored recipe
    pub fn update_recipe(&self, recipe: &Recipe) -> Result<()> {
        recipe.validate()?;
        let ingredients_json =
            serde_json::to_string(&recipe.ingredients).map_err(PlannerError::write("recipe"))?;

        let updated = self
            .conn
            .execute(
                "UPDATE recipes SET title = ?1, servings = ?2, ingredients = ?3 WHERE id = ?4",
                params![recipe.title, recipe.servings, ingredients_json, recipe.id],
            )
            .map_err(PlannerError::write("recipe"))?;
        if updated == 0 {
            return Err(PlannerError::not_found("recipe", recipe.id.as_str()));
        }

        debug!(recipe_id = %recipe.id, title = %recipe.title, "updated recipe");
        Ok(())
    }

    pub fn get_recipe(&self, recipe_id: &str) -> Result<Recipe> {
        self.conn
            .query_row(
                &format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = ?1"),
                [recipe_id],
                row_to_recipe,
            )
            .optional()
            .map_err(PlannerError::read("recipe"))?
            .ok_or_else(|| PlannerError::not_found("recipe", recipe_id))
    }

    pub fn delete_recipe(&self, recipe_id: &str) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM recipes WHERE id = ?1", [recipe_id])
            .map_err(PlannerError::write("recipe"))?;
        if deleted == 0 {
            return Err(PlannerError::not_found("recipe", recipe_id));
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Meal plan
    // ------------------------------------------------------------------------

    pub fn insert_meal_plan_entry(&self, entry: &MealPlanEntry) -> Result<()> {
        entry.validate()?;
        self.conn
            .execute(
                "INSERT INTO meal_plan_entries (id, household_id, date, slot, entry_type, recipe_id, servings_override, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    entry.id,
                    entry.household_id,
                    format_date(entry.date),
                    entry.slot.as_str(),
                    entry.kind.tag(),
                    entry.recipe_id(),
                    entry.servings_override(),
                    entry.notes,
                ],
            )
            .map_err(PlannerError::write("meal plan entry"))?;
        Ok(())
    }

    pub fn delete_meal_plan_entry(&self, entry_id: &str) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM meal_plan_entries WHERE id = ?1", [entry_id])
            .map_err(PlannerError::write("meal plan entry"))?;
        if deleted == 0 {
            return Err(PlannerError::not_found("meal plan entry", entry_id));
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Grocery lists
    // ------------------------------------------------------------------------

    pub fn get_list(&self, list_id: &str) -> Result<GroceryList> {
        self.conn
            .query_row(
                &format!("SELECT {LIST_COLUMNS} FROM grocery_lists WHERE id = ?1"),
                [list_id],
                row_to_list,
            )
            .optional()
            .map_err(PlannerError::read("grocery list"))?
            .ok_or_else(|| PlannerError::not_found("grocery list", list_id))
    }

    /// Every list of a household, newest first
    pub fn lists_for_household(&self, household_id: &str) -> Result<Vec<GroceryList>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {LIST_COLUMNS} FROM grocery_lists WHERE household_id = ?1 ORDER BY generated_at DESC"
            ))
            .map_err(PlannerError::read("grocery lists"))?;

        let lists = stmt
            .query_map([household_id], row_to_list)
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(PlannerError::read("grocery lists"))?;

        Ok(lists)
    }

    // ------------------------------------------------------------------------
    // Pantry staples
    // ------------------------------------------------------------------------

    pub fn insert_pantry_staple(&self, staple: &PantryStaple) -> Result<()> {
        if staple.name.is_empty() {
            return Err(PlannerError::invalid("pantry staple", "name is empty"));
        }
        self.conn
            .execute(
                "INSERT INTO pantry_staples (id, household_id, name) VALUES (?1, ?2, ?3)",
                params![staple.id, staple.household_id, staple.name],
            )
            .map_err(PlannerError::write("pantry staple"))?;
        Ok(())
    }

    pub fn delete_pantry_staple(&self, staple_id: &str) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM pantry_staples WHERE id = ?1", [staple_id])
            .map_err(PlannerError::write("pantry staple"))?;
        if deleted == 0 {
            return Err(PlannerError::not_found("pantry staple", staple_id));
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Tasks
    // ------------------------------------------------------------------------

    pub fn insert_task(&self, task: &HouseholdTask) -> Result<()> {
        task.validate()?;
        self.conn
            .execute(
                "INSERT INTO tasks (id, household_id, title, assigned_to, due_date, completed_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    task.id,
                    task.household_id,
                    task.title,
                    task.assigned_to,
                    task.due_date.map(format_date),
                    task.completed_at.map(|t| t.to_rfc3339()),
                    task.created_at.to_rfc3339(),
                ],
            )
            .map_err(PlannerError::write("task"))?;
        Ok(())
    }

    pub fn get_task(&self, task_id: &str) -> Result<HouseholdTask> {
        self.conn
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
                [task_id],
                row_to_task,
            )
            .optional()
            .map_err(PlannerError::read("task"))?
            .ok_or_else(|| PlannerError::not_found("task", task_id))
    }

    /// Open tasks first (earliest due date first, undated last), then done ones
    pub fn tasks_for_household(&self, household_id: &str) -> Result<Vec<HouseholdTask>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks WHERE household_id = ?1
                 ORDER BY completed_at IS NOT NULL, due_date IS NULL, due_date, created_at"
            ))
            .map_err(PlannerError::read("tasks"))?;

        let tasks = stmt
            .query_map([household_id], row_to_task)
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(PlannerError::read("tasks"))?;

        Ok(tasks)
    }

    pub fn complete_task(&self, task_id: &str, completed_at: DateTime<Utc>) -> Result<HouseholdTask> {
        let mut task = self.get_task(task_id)?;
        if task.is_done() {
            return Err(PlannerError::invalid("task", "already completed"));
        }

        self.conn
            .execute(
                "UPDATE tasks SET completed_at = ?1 WHERE id = ?2",
                params![completed_at.to_rfc3339(), task_id],
            )
            .map_err(PlannerError::write("task"))?;

        task.completed_at = Some(completed_at);
        Ok(task)
    }

    pub fn delete_task(&self, task_id: &str) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1", [task_id])
            .map_err(PlannerError::write("task"))?;
        if deleted == 0 {
            return Err(PlannerError::not_found("task", task_id));
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Dining log
    // ------------------------------------------------------------------------

    pub fn insert_dining_log(&self, log: &DiningLog) -> Result<()> {
        log.validate()?;
        let dishes_json = serde_json::to_string(&log.dishes).map_err(PlannerError::write("dining log"))?;

        self.conn
            .execute(
                "INSERT INTO dining_logs (id, household_id, restaurant, visited_on, kind, dishes, total_cost, rating, notes, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    log.id,
                    log.household_id,
                    log.restaurant,
                    format_date(log.visited_on),
                    log.kind.as_str(),
                    dishes_json,
                    log.total_cost,
                    log.rating,
                    log.notes,
                    log.created_at.to_rfc3339(),
                ],
            )
            .map_err(PlannerError::write("dining log"))?;
        Ok(())
    }

    /// Most recent visits first
    pub fn dining_logs(&self, household_id: &str) -> Result<Vec<DiningLog>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {DINING_COLUMNS} FROM dining_logs WHERE household_id = ?1
                 ORDER BY visited_on DESC, created_at DESC"
            ))
            .map_err(PlannerError::read("dining logs"))?;

        let logs = stmt
            .query_map([household_id], row_to_dining)
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(PlannerError::read("dining logs"))?;

        Ok(logs)
    }

    pub fn delete_dining_log(&self, log_id: &str) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM dining_logs WHERE id = ?1", [log_id])
            .map_err(PlannerError::write("dining log"))?;
        if deleted == 0 {
            return Err(PlannerError::not_found("dining log", log_id));
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------------

    pub fn events_for_entity(&self, entity_type: &str, entity_id: &str) -> Result<Vec<Event>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
                 FROM events
                 WHERE entity_type = ?1 AND entity_id = ?2
                 ORDER BY id",
            )
            .map_err(PlannerError::read("events"))?;

        let events = stmt
            .query_map(params![entity_type, entity_id], |row| {
                let data_json: String = row.get(5)?;
                Ok(Event {
                    event_id: row.get(0)?,
                    timestamp: timestamp_col(row, 1)?,
                    event_type: row.get(2)?,
                    entity_type: row.get(3)?,
                    entity_id: row.get(4)?,
                    data: serde_json::from_str(&data_json).map_err(|e| conversion_err(5, e))?,
                    actor: row.get(6)?,
                })
            })
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(PlannerError::read("events"))?;

        Ok(events)
    }
}

impl GroceryStore for SqliteStore {
    fn recipes_for_household(&self, household_id: &str) -> Result<Vec<Recipe>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {RECIPE_COLUMNS} FROM recipes WHERE household_id = ?1 ORDER BY title"
            ))
            .map_err(PlannerError::read("recipes"))?;

        let recipes = stmt
            .query_map([household_id], row_to_recipe)
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(PlannerError::read("recipes"))?;

        Ok(recipes)
    }

    fn meal_plan_entries(
        &self,
        household_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MealPlanEntry>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM meal_plan_entries
                 WHERE household_id = ?1 AND date >= ?2 AND date <= ?3
                 ORDER BY date"
            ))
            .map_err(PlannerError::read("meal plan entries"))?;

        let mut entries = stmt
            .query_map(
                params![household_id, format_date(start), format_date(end)],
                row_to_entry,
            )
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(PlannerError::read("meal plan entries"))?;

        // slot order is breakfast/lunch/dinner, not alphabetical
        entries.sort_by_key(|e| (e.date, e.slot.rank()));
        Ok(entries)
    }

    fn current_lists(&self, household_id: &str) -> Result<Vec<GroceryList>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {LIST_COLUMNS} FROM grocery_lists WHERE household_id = ?1 AND is_current = 1"
            ))
            .map_err(PlannerError::read("current grocery lists"))?;

        let lists = stmt
            .query_map([household_id], row_to_list)
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(PlannerError::read("current grocery lists"))?;

        Ok(lists)
    }

    fn replace_current_list(&self, list: &GroceryList, items: &[GroceryItem]) -> Result<Vec<String>> {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(PlannerError::write("grocery list"))?;

        let demoted: Vec<String> = {
            let mut stmt = tx
                .prepare("SELECT id FROM grocery_lists WHERE household_id = ?1 AND is_current = 1")
                .map_err(PlannerError::read("current grocery lists"))?;
            let ids = stmt
                .query_map([&list.household_id], |row| row.get(0))
                .and_then(|rows| rows.collect::<rusqlite::Result<Vec<String>>>())
                .map_err(PlannerError::read("current grocery lists"))?;
            ids
        };

        tx.execute(
            "UPDATE grocery_lists SET is_current = 0 WHERE household_id = ?1 AND is_current = 1",
            [&list.household_id],
        )
        .map_err(PlannerError::write("grocery list demotion"))?;

        tx.execute(
            "INSERT INTO grocery_lists (id, household_id, week_start, is_current, generated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                list.id,
                list.household_id,
                format_date(list.week_start),
                list.is_current,
                list.generated_at.to_rfc3339(),
            ],
        )
        .map_err(PlannerError::write("grocery list"))?;

        for item in items {
            insert_item_on(&tx, item).map_err(PlannerError::write("grocery items"))?;
        }

        tx.commit().map_err(PlannerError::write("grocery list"))?;

        debug!(
            list_id = %list.id,
            items = items.len(),
            demoted = demoted.len(),
            "replaced current grocery list"
        );
        Ok(demoted)
    }

    fn list_items(&self, list_id: &str) -> Result<Vec<GroceryItem>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {ITEM_COLUMNS} FROM grocery_items WHERE list_id = ?1 ORDER BY sort_order"
            ))
            .map_err(PlannerError::read("grocery items"))?;

        let items = stmt
            .query_map([list_id], row_to_item)
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(PlannerError::read("grocery items"))?;

        Ok(items)
    }

    fn get_item(&self, item_id: &str) -> Result<GroceryItem> {
        self.conn
            .query_row(
                &format!("SELECT {ITEM_COLUMNS} FROM grocery_items WHERE id = ?1"),
                [item_id],
                row_to_item,
            )
            .optional()
            .map_err(PlannerError::read("grocery item"))?
            .ok_or_else(|| PlannerError::not_found("grocery item", item_id))
    }

    fn insert_item(&self, item: &GroceryItem) -> Result<()> {
        insert_item_on(&self.conn, item).map_err(PlannerError::write("grocery item"))?;
        Ok(())
    }

    fn insert_items(&self, items: &[GroceryItem]) -> Result<()> {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(PlannerError::write("grocery items"))?;

        for item in items {
            insert_item_on(&tx, item).map_err(PlannerError::write("grocery items"))?;
        }

        tx.commit().map_err(PlannerError::write("grocery items"))?;
        Ok(())
    }

    fn set_item_checked(&self, item_id: &str, checked: bool) -> Result<()> {
        let updated = self
            .conn
            .execute(
                "UPDATE grocery_items SET checked = ?1 WHERE id = ?2",
                params![checked, item_id],
            )
            .map_err(PlannerError::write("grocery item"))?;
        if updated == 0 {
            return Err(PlannerError::not_found("grocery item", item_id));
        }
        Ok(())
    }

    fn delete_item(&self, item_id: &str) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM grocery_items WHERE id = ?1", [item_id])
            .map_err(PlannerError::write("grocery item"))?;
        if deleted == 0 {
            return Err(PlannerError::not_found("grocery item", item_id));
        }
        Ok(())
    }

    fn pantry_staples(&self, household_id: &str) -> Result<Vec<PantryStaple>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, household_id, name FROM pantry_staples
                 WHERE household_id = ?1 ORDER BY name COLLATE NOCASE",
            )
            .map_err(PlannerError::read("pantry staples"))?;

        let staples = stmt
            .query_map([household_id], |row| {
                Ok(PantryStaple {
                    id: row.get(0)?,
                    household_id: row.get(1)?,
                    name: row.get(2)?,
                })
            })
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(PlannerError::read("pantry staples"))?;

        Ok(staples)
    }

    fn record_event(&self, event: &Event) -> Result<()> {
        let data_json = serde_json::to_string(&event.data).map_err(PlannerError::write("event"))?;

        self.conn
            .execute(
                "INSERT INTO events (event_id, timestamp, event_type, entity_type, entity_id, data, actor)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    event.event_id,
                    event.timestamp.to_rfc3339(),
                    event.event_type,
                    event.entity_type,
                    event.entity_id,
                    data_json,
                    event.actor,
                ],
            )
            .map_err(PlannerError::write("event"))?;

        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
