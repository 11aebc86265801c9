// Grocery Planner - Web Server
// REST API over the household's recipes, meal plan and grocery list

use anyhow::{Context, Result};
use tracing::info;

use grocery_planner::api::{router, AppState};
use grocery_planner::telemetry::init_tracing;
use grocery_planner::{Config, PlannerOptions, SqliteStore};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    println!("🌐 Grocery Planner - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = Config::load()?;

    let store = SqliteStore::open(&config.db_path)
        .with_context(|| format!("Failed to open database {:?}", config.db_path))?;
    println!("✓ Database opened: {:?}", config.db_path);

    let options = PlannerOptions {
        flag_pantry_staples: config.flag_pantry_staples,
        actor: "api".to_string(),
    };
    let app = router(AppState::new(store, options));

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!(%addr, "server listening");
    println!("\n🚀 Server running on http://localhost:{}", config.port);
    println!("   API: http://localhost:{}/api/health", config.port);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await.context("Server stopped with an error")?;
    Ok(())
}
