use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use grocery_planner::dates::{parse_plan_date, week_range};
use grocery_planner::export::export_items_csv;
use grocery_planner::households::{accept_invitation, create_household, invite};
use grocery_planner::models::grocery::format_quantity;
use grocery_planner::telemetry::init_tracing;
use grocery_planner::{
    Config, DiningDraft, DiningKind, EntryKind, GroceryCategory, GroceryPlanner, GroceryStore,
    HouseholdTask, MealPlanEntry, MealSlot, PantryStaple, PlannerOptions, RecipeDraft, SqliteStore,
};

#[derive(Parser)]
#[command(name = "grocery-planner", version, about = "Meal plans in, grocery lists out")]
struct Cli {
    /// Database file (overrides GROCERY_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the database schema
    Init,
    #[command(subcommand)]
    Household(HouseholdCommand),
    #[command(subcommand)]
    Recipe(RecipeCommand),
    #[command(subcommand)]
    Plan(PlanCommand),
    /// Build a new current grocery list from a week of the meal plan
    Generate {
        #[arg(long)]
        household: String,
        /// Any day of the week to shop for (default: today)
        #[arg(long)]
        week_of: Option<String>,
    },
    #[command(subcommand)]
    List(ListCommand),
    #[command(subcommand)]
    Staple(StapleCommand),
    #[command(subcommand)]
    Task(TaskCommand),
    #[command(subcommand)]
    Dining(DiningCommand),
    /// Add pantry staples to the current list
    Restock {
        #[arg(long)]
        household: String,
        names: Vec<String>,
    },
}

#[derive(Subcommand)]
enum HouseholdCommand {
    Create {
        name: String,
        #[arg(long)]
        user: String,
        #[arg(long)]
        display_name: String,
    },
    Members {
        #[arg(long)]
        household: String,
    },
    Invite {
        #[arg(long)]
        household: String,
        email: String,
    },
    Join {
        code: String,
        #[arg(long)]
        user: String,
        #[arg(long)]
        display_name: String,
    },
}

#[derive(Subcommand)]
enum RecipeCommand {
    /// Import recipes from a JSON file (one object or an array)
    Add {
        #[arg(long)]
        household: String,
        file: PathBuf,
    },
    /// Replace a recipe's title, servings and ingredients from a JSON file
    Edit { recipe_id: String, file: PathBuf },
    List {
        #[arg(long)]
        household: String,
    },
}

#[derive(Args)]
struct EntryArgs {
    #[arg(long)]
    household: String,
    /// YYYY-MM-DD
    #[arg(long)]
    date: String,
    #[arg(long)]
    slot: MealSlotArg,
    /// Recipe to cook; omit together with --eat-out/--leftovers
    #[arg(long, conflicts_with_all = ["eat_out", "leftovers"])]
    recipe: Option<String>,
    #[arg(long, requires = "recipe")]
    servings: Option<u32>,
    #[arg(long, conflicts_with = "leftovers")]
    eat_out: bool,
    #[arg(long)]
    leftovers: bool,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum MealSlotArg {
    Breakfast,
    Lunch,
    Dinner,
}

impl From<MealSlotArg> for MealSlot {
    fn from(arg: MealSlotArg) -> Self {
        match arg {
            MealSlotArg::Breakfast => MealSlot::Breakfast,
            MealSlotArg::Lunch => MealSlot::Lunch,
            MealSlotArg::Dinner => MealSlot::Dinner,
        }
    }
}

#[derive(Subcommand)]
enum PlanCommand {
    Add(EntryArgs),
    /// Show the week containing --week-of
    List {
        #[arg(long)]
        household: String,
        #[arg(long)]
        week_of: Option<String>,
    },
    Remove { entry_id: String },
}

#[derive(Subcommand)]
enum ListCommand {
    Show {
        #[arg(long)]
        household: String,
    },
    /// Toggle an item's checked flag
    Check { item_id: String },
    Add {
        #[arg(long)]
        household: String,
        name: String,
        #[arg(long)]
        quantity: Option<f64>,
        #[arg(long)]
        unit: Option<String>,
    },
    Remove { item_id: String },
    Export {
        #[arg(long)]
        household: String,
        path: PathBuf,
    },
}

#[derive(Subcommand)]
enum StapleCommand {
    Add {
        #[arg(long)]
        household: String,
        name: String,
    },
    List {
        #[arg(long)]
        household: String,
    },
    Remove { staple_id: String },
}

#[derive(Subcommand)]
enum TaskCommand {
    Add {
        #[arg(long)]
        household: String,
        title: String,
        #[arg(long)]
        assign: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        due: Option<String>,
    },
    List {
        #[arg(long)]
        household: String,
    },
    Done { task_id: String },
    Remove { task_id: String },
}

#[derive(Subcommand)]
enum DiningCommand {
    /// Record a restaurant visit or order
    Log {
        #[arg(long)]
        household: String,
        restaurant: String,
        /// dine_in, takeout or delivery
        #[arg(long, default_value = "dine_in")]
        kind: String,
        /// YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
        #[arg(long = "dish")]
        dishes: Vec<String>,
        #[arg(long)]
        cost: Option<f64>,
        #[arg(long)]
        rating: Option<u8>,
    },
    List {
        #[arg(long)]
        household: String,
    },
    Remove { log_id: String },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = Config::load()?;
    let db_path = cli.db.clone().unwrap_or_else(|| config.db_path.clone());
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("Failed to open database {:?}", db_path))?;

    let options = PlannerOptions {
        flag_pantry_staples: config.flag_pantry_staples,
        actor: "cli".to_string(),
    };
    let planner = GroceryPlanner::with_options(store, options);

    run(cli.command, &planner)
}

fn run(command: Command, planner: &GroceryPlanner<SqliteStore>) -> Result<()> {
    let store = planner.store();

    match command {
        Command::Init => {
            println!("✓ Database ready");
        }

        Command::Household(cmd) => run_household(cmd, store)?,

        Command::Recipe(RecipeCommand::Add { household, file }) => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read recipe file: {:?}", file))?;
            let drafts: Vec<RecipeDraft> = match serde_json::from_str::<Vec<RecipeDraft>>(&content) {
                Ok(many) => many,
                Err(_) => vec![serde_json::from_str(&content).context("Failed to parse recipe JSON")?],
            };

            for draft in drafts {
                let recipe = draft.into_recipe(&household)?;
                store.insert_recipe(&recipe)?;
                println!("✓ {} ({}) - {} ingredients", recipe.title, recipe.id, recipe.ingredients.len());
            }
        }

        Command::Recipe(RecipeCommand::Edit { recipe_id, file }) => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read recipe file: {:?}", file))?;
            let draft: RecipeDraft = serde_json::from_str(&content).context("Failed to parse recipe JSON")?;

            let recipe = draft.revise(store.get_recipe(&recipe_id)?)?;
            store.update_recipe(&recipe)?;
            println!("✓ {} updated - {} ingredients", recipe.title, recipe.ingredients.len());
        }

        Command::Recipe(RecipeCommand::List { household }) => {
            for recipe in store.recipes_for_household(&household)? {
                println!("{}  {} (serves {})", recipe.id, recipe.title, recipe.servings);
            }
        }

        Command::Plan(PlanCommand::Add(args)) => {
            let kind = match (args.recipe, args.eat_out, args.leftovers) {
                (Some(recipe_id), _, _) => EntryKind::Recipe {
                    recipe_id,
                    servings_override: args.servings,
                },
                (None, true, _) => EntryKind::EatOut,
                (None, false, true) => EntryKind::Leftovers,
                (None, false, false) => anyhow::bail!("Pass --recipe, --eat-out or --leftovers"),
            };
            let date = parse_plan_date(&args.date)?;
            let entry = MealPlanEntry::with_kind(&args.household, date, args.slot.into(), kind);
            store.insert_meal_plan_entry(&entry)?;
            println!("✓ {} {} planned ({})", entry.date, entry.slot, entry.kind.tag());
        }

        Command::Plan(PlanCommand::List { household, week_of }) => {
            let day = resolve_day(week_of.as_deref())?;
            let (start, end) = week_range(day);
            for entry in store.meal_plan_entries(&household, start, end)? {
                let what = match &entry.kind {
                    EntryKind::Recipe { recipe_id, servings_override } => match servings_override {
                        Some(s) => format!("recipe {recipe_id} x{s}"),
                        None => format!("recipe {recipe_id}"),
                    },
                    other => other.tag().to_string(),
                };
                println!("{} {:<9} {}", entry.date, entry.slot.as_str(), what);
            }
        }

        Command::Plan(PlanCommand::Remove { entry_id }) => {
            store.delete_meal_plan_entry(&entry_id)?;
            println!("✓ Removed plan entry {entry_id}");
        }

        Command::Generate { household, week_of } => {
            let day = resolve_day(week_of.as_deref())?;
            let list = planner.generate_for_week(&household, day)?;
            info!(list_id = %list.id, "list generated");
            print_current(planner, &household)?;
        }

        Command::List(cmd) => run_list(cmd, planner)?,

        Command::Staple(StapleCommand::Add { household, name }) => {
            let staple = PantryStaple::new(&household, &name);
            store.insert_pantry_staple(&staple)?;
            println!("✓ {} added to pantry staples", staple.name);
        }

        Command::Staple(StapleCommand::List { household }) => {
            for staple in store.pantry_staples(&household)? {
                println!("{}  {}", staple.id, staple.name);
            }
        }

        Command::Staple(StapleCommand::Remove { staple_id }) => {
            store.delete_pantry_staple(&staple_id)?;
            println!("✓ Removed staple {staple_id}");
        }

        Command::Task(cmd) => run_task(cmd, store)?,

        Command::Dining(cmd) => run_dining(cmd, store)?,

        Command::Restock { household, names } => {
            let added = planner.restock_staples(&household, &names)?;
            println!("✓ Added {} staples", added.len());
        }
    }

    Ok(())
}

fn run_household(cmd: HouseholdCommand, store: &SqliteStore) -> Result<()> {
    match cmd {
        HouseholdCommand::Create { name, user, display_name } => {
            let household = create_household(store, &name, &user, &display_name)?;
            println!("✓ Household {} created: {}", household.name, household.id);
        }
        HouseholdCommand::Members { household } => {
            for member in store.household_members(&household)? {
                println!("{:<8} {} ({})", member.role.as_str(), member.display_name, member.user_id);
            }
        }
        HouseholdCommand::Invite { household, email } => {
            let (invitation, code) = invite(store, &household, &email, Utc::now())?;
            println!("✓ Invitation for {} - code {} (expires {})", invitation.email, code, invitation.expires_at);
        }
        HouseholdCommand::Join { code, user, display_name } => {
            let member = accept_invitation(store, &code, &user, &display_name, Utc::now())?;
            println!("✓ Joined household {}", member.household_id);
        }
    }
    Ok(())
}

fn run_task(cmd: TaskCommand, store: &SqliteStore) -> Result<()> {
    match cmd {
        TaskCommand::Add { household, title, assign, due } => {
            let due_date = due.as_deref().map(parse_plan_date).transpose()?;
            let task = HouseholdTask::new(&household, &title, assign.as_deref(), due_date);
            store.insert_task(&task)?;
            println!("✓ Task added: {} ({})", task.title, task.id);
        }
        TaskCommand::List { household } => {
            for task in store.tasks_for_household(&household)? {
                let mark = if task.is_done() { "x" } else { " " };
                let due = task.due_date.map(|d| format!(" due {d}")).unwrap_or_default();
                let who = task.assigned_to.as_deref().map(|a| format!(" @{a}")).unwrap_or_default();
                println!("[{mark}] {}{due}{who}  {}", task.title, task.id);
            }
        }
        TaskCommand::Done { task_id } => {
            let task = store.complete_task(&task_id, Utc::now())?;
            println!("✓ Done: {}", task.title);
        }
        TaskCommand::Remove { task_id } => {
            store.delete_task(&task_id)?;
            println!("✓ Removed task {task_id}");
        }
    }
    Ok(())
}

fn run_dining(cmd: DiningCommand, store: &SqliteStore) -> Result<()> {
    match cmd {
        DiningCommand::Log { household, restaurant, kind, date, dishes, cost, rating } => {
            let draft = DiningDraft {
                restaurant,
                visited_on: resolve_day(date.as_deref())?,
                kind: kind.parse::<DiningKind>()?,
                dishes,
                total_cost: cost,
                rating,
                notes: None,
            };
            let log = draft.into_log(&household)?;
            store.insert_dining_log(&log)?;
            println!("✓ Logged {} ({}) on {}", log.restaurant, log.kind, log.visited_on);
        }
        DiningCommand::List { household } => {
            for log in store.dining_logs(&household)? {
                let rating = log.rating.map(|r| "★".repeat(r as usize)).unwrap_or_default();
                println!("{} {:<24} {:<9} {} {}", log.visited_on, log.restaurant, log.kind.as_str(), log.dishes.join(", "), rating);
            }
        }
        DiningCommand::Remove { log_id } => {
            store.delete_dining_log(&log_id)?;
            println!("✓ Removed dining log {log_id}");
        }
    }
    Ok(())
}

fn run_list(cmd: ListCommand, planner: &GroceryPlanner<SqliteStore>) -> Result<()> {
    match cmd {
        ListCommand::Show { household } => print_current(planner, &household)?,
        ListCommand::Check { item_id } => {
            let item = planner.toggle_item(&item_id)?;
            let mark = if item.checked { "x" } else { " " };
            println!("[{mark}] {}", item.label());
        }
        ListCommand::Add { household, name, quantity, unit } => {
            let item = planner.add_manual_item(&household, &name, quantity, unit.as_deref())?;
            println!("✓ Added {} to {}", item.label(), item.category.display_name());
        }
        ListCommand::Remove { item_id } => {
            planner.remove_item(&item_id)?;
            println!("✓ Removed {item_id}");
        }
        ListCommand::Export { household, path } => {
            let view = planner
                .current_list(&household)?
                .context("Household has no current grocery list")?;
            export_items_csv(&path, &view.items)?;
            println!("✓ Exported {} items to {:?}", view.items.len(), path);
        }
    }
    Ok(())
}

fn resolve_day(week_of: Option<&str>) -> Result<chrono::NaiveDate> {
    Ok(match week_of {
        Some(raw) => parse_plan_date(raw)?,
        None => Utc::now().date_naive(),
    })
}

fn print_current(planner: &GroceryPlanner<SqliteStore>, household: &str) -> Result<()> {
    let Some(view) = planner.current_list(household)? else {
        println!("No current grocery list. Run: grocery-planner generate --household {household}");
        return Ok(());
    };

    println!("🛒 Week of {} ({} items)", view.list.week_start, view.items.len());

    let mut last: Option<GroceryCategory> = None;
    for item in &view.items {
        if last != Some(item.category) {
            println!("\n{}", item.category.display_name());
            last = Some(item.category);
        }
        let mark = if item.checked { "x" } else { " " };
        let quantity = item.quantity.map(format_quantity).unwrap_or_default();
        println!(
            "  [{mark}] {:<28} {:>6} {:<6} {}",
            item.name,
            quantity,
            item.unit.as_deref().unwrap_or(""),
            item.id
        );
    }

    Ok(())
}
