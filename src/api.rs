// 🌐 REST API (feature = "server")
//
// Thin axum layer over GroceryPlanner. The SQLite store sits behind one
// mutex; every handler is a short synchronous critical section.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tracing::error;

use crate::dates::{parse_plan_date, week_range};
use crate::error::PlannerError;
use crate::models::{
    DiningDraft, DiningLog, EntryKind, GroceryItem, GroceryList, HouseholdTask, MealPlanEntry,
    MealSlot, PantryStaple, Recipe, RecipeDraft, TaskDraft,
};
use crate::planner::{GroceryPlanner, ListView, PlannerOptions};
use crate::store::{GroceryStore, SqliteStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<SqliteStore>>,
    options: PlannerOptions,
}

impl AppState {
    pub fn new(store: SqliteStore, options: PlannerOptions) -> Self {
        AppState {
            store: Arc::new(Mutex::new(store)),
            options,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, SqliteStore>, ApiError> {
        self.store
            .lock()
            .map_err(|_| ApiError::Internal("store lock poisoned".to_string()))
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

#[derive(Debug)]
pub enum ApiError {
    Planner(PlannerError),
    Internal(String),
}

impl From<PlannerError> for ApiError {
    fn from(e: PlannerError) -> Self {
        ApiError::Planner(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Planner(PlannerError::NotFound { .. }) => (StatusCode::NOT_FOUND, self.message()),
            ApiError::Planner(PlannerError::Invalid { .. }) => (StatusCode::BAD_REQUEST, self.message()),
            _ => {
                error!(error = %self.message(), "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };

        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(message),
        };
        (status, Json(body)).into_response()
    }
}

impl ApiError {
    fn message(&self) -> String {
        match self {
            ApiError::Planner(e) => e.to_string(),
            ApiError::Internal(msg) => msg.clone(),
        }
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> Json<ApiResponse<&'static str>> {
    ApiResponse::ok("OK")
}

/// GET /api/households/:id/recipes
async fn list_recipes(State(state): State<AppState>, Path(household_id): Path<String>) -> ApiResult<Vec<Recipe>> {
    let store = state.lock()?;
    Ok(ApiResponse::ok(store.recipes_for_household(&household_id)?))
}

/// POST /api/households/:id/recipes
async fn create_recipe(
    State(state): State<AppState>,
    Path(household_id): Path<String>,
    Json(draft): Json<RecipeDraft>,
) -> ApiResult<Recipe> {
    let recipe = draft.into_recipe(&household_id)?;
    let store = state.lock()?;
    store.insert_recipe(&recipe)?;
    Ok(ApiResponse::ok(recipe))
}

/// PUT /api/households/:id/recipes/:recipe_id
async fn update_recipe(
    State(state): State<AppState>,
    Path((household_id, recipe_id)): Path<(String, String)>,
    Json(draft): Json<RecipeDraft>,
) -> ApiResult<Recipe> {
    let store = state.lock()?;
    let existing = store.get_recipe(&recipe_id)?;
    if existing.household_id != household_id {
        return Err(PlannerError::not_found("recipe", recipe_id).into());
    }

    let recipe = draft.revise(existing)?;
    store.update_recipe(&recipe)?;
    Ok(ApiResponse::ok(recipe))
}

#[derive(Deserialize)]
struct RangeQuery {
    start: String,
    end: Option<String>,
}

/// GET /api/households/:id/meal-plan?start=YYYY-MM-DD[&end=YYYY-MM-DD]
/// Without `end`, returns the week containing `start`.
async fn list_meal_plan(
    State(state): State<AppState>,
    Path(household_id): Path<String>,
    Query(range): Query<RangeQuery>,
) -> ApiResult<Vec<MealPlanEntry>> {
    let start = parse_plan_date(&range.start)?;
    let (start, end) = match range.end {
        Some(end) => (start, parse_plan_date(&end)?),
        None => week_range(start),
    };

    let store = state.lock()?;
    Ok(ApiResponse::ok(store.meal_plan_entries(&household_id, start, end)?))
}

#[derive(Deserialize)]
struct NewEntry {
    date: String,
    slot: MealSlot,
    #[serde(flatten)]
    kind: EntryKind,
    notes: Option<String>,
}

/// POST /api/households/:id/meal-plan
async fn create_meal_plan_entry(
    State(state): State<AppState>,
    Path(household_id): Path<String>,
    Json(body): Json<NewEntry>,
) -> ApiResult<MealPlanEntry> {
    let date = parse_plan_date(&body.date)?;
    let mut entry = MealPlanEntry::with_kind(&household_id, date, body.slot, body.kind);
    entry.notes = body.notes;

    let store = state.lock()?;
    store.insert_meal_plan_entry(&entry)?;
    Ok(ApiResponse::ok(entry))
}

/// DELETE /api/meal-plan/:entry_id
async fn delete_meal_plan_entry(State(state): State<AppState>, Path(entry_id): Path<String>) -> ApiResult<String> {
    let store = state.lock()?;
    store.delete_meal_plan_entry(&entry_id)?;
    Ok(ApiResponse::ok(entry_id))
}

#[derive(Deserialize, Default)]
struct GenerateRequest {
    /// Any day of the week to shop for; defaults to today
    week_of: Option<String>,
}

/// POST /api/households/:id/grocery-list/generate
async fn generate_list(
    State(state): State<AppState>,
    Path(household_id): Path<String>,
    body: Bytes,
) -> ApiResult<GroceryList> {
    // an empty body means "this week"; anything else must parse
    let request: GenerateRequest = if body.iter().all(u8::is_ascii_whitespace) {
        GenerateRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| PlannerError::invalid("request body", e.to_string()))?
    };
    let day = match request.week_of {
        Some(raw) => parse_plan_date(&raw)?,
        None => chrono::Utc::now().date_naive(),
    };

    let store = state.lock()?;
    let planner = GroceryPlanner::with_options(&*store, state.options.clone());
    Ok(ApiResponse::ok(planner.generate_for_week(&household_id, day)?))
}

/// GET /api/households/:id/grocery-list
async fn current_list(
    State(state): State<AppState>,
    Path(household_id): Path<String>,
) -> Result<Json<ApiResponse<ListView>>, ApiError> {
    let store = state.lock()?;
    let planner = GroceryPlanner::with_options(&*store, state.options.clone());
    planner
        .current_list(&household_id)?
        .map(ApiResponse::ok)
        .ok_or_else(|| ApiError::Planner(PlannerError::not_found("current grocery list", household_id)))
}

#[derive(Deserialize)]
struct NewItem {
    name: String,
    quantity: Option<f64>,
    unit: Option<String>,
}

/// POST /api/households/:id/grocery-list/items
async fn add_item(
    State(state): State<AppState>,
    Path(household_id): Path<String>,
    Json(body): Json<NewItem>,
) -> ApiResult<GroceryItem> {
    let store = state.lock()?;
    let planner = GroceryPlanner::with_options(&*store, state.options.clone());
    let item = planner.add_manual_item(&household_id, &body.name, body.quantity, body.unit.as_deref())?;
    Ok(ApiResponse::ok(item))
}

/// POST /api/items/:item_id/toggle
async fn toggle_item(State(state): State<AppState>, Path(item_id): Path<String>) -> ApiResult<GroceryItem> {
    let store = state.lock()?;
    let planner = GroceryPlanner::with_options(&*store, state.options.clone());
    Ok(ApiResponse::ok(planner.toggle_item(&item_id)?))
}

/// DELETE /api/items/:item_id
async fn delete_item(State(state): State<AppState>, Path(item_id): Path<String>) -> ApiResult<String> {
    let store = state.lock()?;
    let planner = GroceryPlanner::with_options(&*store, state.options.clone());
    planner.remove_item(&item_id)?;
    Ok(ApiResponse::ok(item_id))
}

#[derive(Deserialize)]
struct NewStaple {
    name: String,
}

/// GET /api/households/:id/staples
async fn list_staples(State(state): State<AppState>, Path(household_id): Path<String>) -> ApiResult<Vec<PantryStaple>> {
    let store = state.lock()?;
    Ok(ApiResponse::ok(store.pantry_staples(&household_id)?))
}

/// POST /api/households/:id/staples
async fn create_staple(
    State(state): State<AppState>,
    Path(household_id): Path<String>,
    Json(body): Json<NewStaple>,
) -> ApiResult<PantryStaple> {
    let staple = PantryStaple::new(&household_id, &body.name);
    let store = state.lock()?;
    store.insert_pantry_staple(&staple)?;
    Ok(ApiResponse::ok(staple))
}

/// DELETE /api/staples/:staple_id
async fn delete_staple(State(state): State<AppState>, Path(staple_id): Path<String>) -> ApiResult<String> {
    let store = state.lock()?;
    store.delete_pantry_staple(&staple_id)?;
    Ok(ApiResponse::ok(staple_id))
}

/// GET /api/households/:id/tasks
async fn list_tasks(State(state): State<AppState>, Path(household_id): Path<String>) -> ApiResult<Vec<HouseholdTask>> {
    let store = state.lock()?;
    Ok(ApiResponse::ok(store.tasks_for_household(&household_id)?))
}

/// POST /api/households/:id/tasks
async fn create_task(
    State(state): State<AppState>,
    Path(household_id): Path<String>,
    Json(draft): Json<TaskDraft>,
) -> ApiResult<HouseholdTask> {
    let task = draft.into_task(&household_id)?;
    let store = state.lock()?;
    store.insert_task(&task)?;
    Ok(ApiResponse::ok(task))
}

/// POST /api/tasks/:task_id/complete
async fn complete_task(State(state): State<AppState>, Path(task_id): Path<String>) -> ApiResult<HouseholdTask> {
    let store = state.lock()?;
    Ok(ApiResponse::ok(store.complete_task(&task_id, chrono::Utc::now())?))
}

/// DELETE /api/tasks/:task_id
async fn delete_task(State(state): State<AppState>, Path(task_id): Path<String>) -> ApiResult<String> {
    let store = state.lock()?;
    store.delete_task(&task_id)?;
    Ok(ApiResponse::ok(task_id))
}

/// GET /api/households/:id/dining
async fn list_dining(State(state): State<AppState>, Path(household_id): Path<String>) -> ApiResult<Vec<DiningLog>> {
    let store = state.lock()?;
    Ok(ApiResponse::ok(store.dining_logs(&household_id)?))
}

/// POST /api/households/:id/dining
async fn create_dining(
    State(state): State<AppState>,
    Path(household_id): Path<String>,
    Json(draft): Json<DiningDraft>,
) -> ApiResult<DiningLog> {
    let log = draft.into_log(&household_id)?;
    let store = state.lock()?;
    store.insert_dining_log(&log)?;
    Ok(ApiResponse::ok(log))
}

/// DELETE /api/dining/:log_id
async fn delete_dining(State(state): State<AppState>, Path(log_id): Path<String>) -> ApiResult<String> {
    let store = state.lock()?;
    store.delete_dining_log(&log_id)?;
    Ok(ApiResponse::ok(log_id))
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route(
            "/households/:household_id/recipes",
            get(list_recipes).post(create_recipe),
        )
        .route("/households/:household_id/recipes/:recipe_id", put(update_recipe))
        .route(
            "/households/:household_id/meal-plan",
            get(list_meal_plan).post(create_meal_plan_entry),
        )
        .route("/meal-plan/:entry_id", delete(delete_meal_plan_entry))
        .route("/households/:household_id/grocery-list", get(current_list))
        .route("/households/:household_id/grocery-list/generate", post(generate_list))
        .route("/households/:household_id/grocery-list/items", post(add_item))
        .route("/items/:item_id/toggle", post(toggle_item))
        .route("/items/:item_id", delete(delete_item))
        .route("/households/:household_id/staples", get(list_staples).post(create_staple))
        .route("/staples/:staple_id", delete(delete_staple))
        .route("/households/:household_id/tasks", get(list_tasks).post(create_task))
        .route("/tasks/:task_id/complete", post(complete_task))
        .route("/tasks/:task_id", delete(delete_task))
        .route("/households/:household_id/dining", get(list_dining).post(create_dining))
        .route("/dining/:log_id", delete(delete_dining))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// TESTS
// ============================================================================
