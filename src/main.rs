//! Game Language Verify backend
//!
//! A REST backend that keeps a catalog of games and their localized versions
//! consistent, with SQLite persistence and bearer-token authorization.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod models;
mod normalize;
mod promotion;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use clap::{Parser, Subcommand};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Arc<Config>,
}

/// The possible commands for the backend
#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server (the default)
    Serve,
    /// Remove favorites whose game or version no longer exists
    PruneFavorites,
    /// Print a signed bearer token
    IssueToken {
        /// User id to put in the token
        #[clap(long)]
        user: String,
        /// Grant admin rights
        #[clap(long)]
        admin: bool,
    },
}

/// The cli parser for the backend
#[derive(Parser)]
#[clap(version, about = "Game Language Verify catalog backend")]
struct Cli {
    #[clap(subcommand)]
    command: Option<Command>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::PruneFavorites => {
            let repo = Repository::new(db::init_database(&config.db_path).await?);
            let report = repo.prune_favorites().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Command::IssueToken { user, admin } => {
            let token = auth::issue_token(&config.jwt_secret, &user, admin, config.token_ttl)?;
            println!("{}", token);
            Ok(())
        }
    }
}

async fn serve(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Starting Game Language Verify backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    let revision = repo.get_revision_id().await?;
    tracing::info!("Catalog at revision {}", revision);

    // Create application state
    let state = AppState {
        repo,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API routes; each handler declares the identity it needs
    let api_routes = Router::new()
        // Catalog
        .route("/catalog/revision", get(api::get_revision))
        // Games
        .route("/games", get(api::list_games).post(api::create_game))
        .route("/games/by-name", get(api::find_game_by_name))
        .route("/games/upsert", post(api::upsert_game))
        .route(
            "/games/{id}",
            get(api::get_game)
                .put(api::put_game)
                .delete(api::delete_game),
        )
        .route("/games/{id}/versions", post(api::add_version))
        .route(
            "/games/{id}/versions/{version_id}",
            put(api::replace_version).delete(api::remove_version),
        )
        // Posts
        .route("/posts", get(api::list_posts).post(api::create_post))
        .route(
            "/posts/{id}",
            get(api::get_post)
                .put(api::update_post)
                .delete(api::delete_post),
        )
        .route("/posts/{id}/release", post(api::release_post))
        // Reactions
        .route(
            "/posts/{id}/reactions",
            get(api::get_reactions).post(api::react),
        )
        .route("/posts/{id}/reactions/stats", get(api::get_reaction_stats))
        // Favorites
        .route(
            "/me/favorites",
            get(api::list_favorites)
                .put(api::toggle_favorite)
                .delete(api::clear_favorites),
        )
        .route(
            "/me/favorites/{game_id}/{version_id}",
            delete(api::remove_favorite),
        );

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
