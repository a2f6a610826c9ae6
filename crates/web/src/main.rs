use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use gifoff_storage::{Database, LeagueStore, MemoryStore};
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod error;
mod features;
mod middleware;
mod state;

use config::Config;
use features::{brackets, challenges, entries, groups, leaderboard};
use middleware::auth::ApiKeys;
use state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        groups::handlers::create_group,
        groups::handlers::create_player,
        groups::handlers::add_member,
        challenges::handlers::list_challenges,
        challenges::handlers::create_challenge,
        challenges::handlers::get_challenge,
        challenges::handlers::add_prompt,
        challenges::handlers::close_challenge,
        challenges::handlers::retry_ratings,
        entries::handlers::submit_entry,
        entries::handlers::score_entry,
        leaderboard::handlers::get_standings,
        leaderboard::handlers::get_history,
        leaderboard::handlers::get_player_ratings,
        brackets::handlers::get_bracket,
    ),
    components(
        schemas(
            gifoff_storage::dto::group::CreateGroupRequest,
            gifoff_storage::dto::group::CreatePlayerRequest,
            gifoff_storage::dto::group::AddMemberRequest,
            gifoff_storage::dto::group::MembershipResponse,
            gifoff_storage::dto::challenge::CreateChallengeRequest,
            gifoff_storage::dto::challenge::CreatePromptRequest,
            gifoff_storage::dto::challenge::ChallengeSummary,
            gifoff_storage::dto::challenge::ChallengeDetail,
            gifoff_storage::dto::challenge::PromptDetail,
            gifoff_storage::dto::challenge::CloseOutcome,
            gifoff_storage::dto::challenge::RatingOutcome,
            gifoff_storage::dto::entry::SubmitEntryRequest,
            gifoff_storage::dto::entry::ScoreEntryRequest,
            gifoff_storage::dto::leaderboard::Standing,
            gifoff_storage::dto::leaderboard::HistoryTable,
            gifoff_storage::dto::leaderboard::HistoryColumn,
            gifoff_storage::dto::leaderboard::HistoryRow,
            gifoff_storage::dto::bracket::BracketResponse,
            gifoff_storage::dto::bracket::BracketLeaf,
            gifoff_storage::dto::bracket::FirstRoundPairing,
            gifoff_storage::services::scoring::PlayerTotal,
            gifoff_storage::services::scoring::RankedPlayer,
            gifoff_storage::models::Group,
            gifoff_storage::models::Player,
            gifoff_storage::models::Challenge,
            gifoff_storage::models::Phase,
            gifoff_storage::models::Prompt,
            gifoff_storage::models::Entry,
            gifoff_storage::models::RatingSnapshot,
        )
    ),
    tags(
        (name = "groups", description = "Groups, players and membership"),
        (name = "challenges", description = "Challenge lifecycle"),
        (name = "entries", description = "Entry submission and judging"),
        (name = "leaderboard", description = "Standings and rating history"),
        (name = "brackets", description = "Tournament seeding"),
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("API Key")
                        .build(),
                ),
            )
        }
    }
}

fn app(state: AppState, api_keys: ApiKeys) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .merge(groups::routes::routes(api_keys.clone()))
        .merge(challenges::routes::routes(api_keys.clone()))
        .merge(entries::routes::routes(api_keys))
        .merge(leaderboard::routes::routes())
        .merge(brackets::routes::routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .with_state(state)
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn LeagueStore>> {
    let Some(database_url) = &config.database_url else {
        tracing::warn!("DATABASE_URL not set, keeping all data in memory");
        return Ok(Arc::new(MemoryStore::new()));
    };

    tracing::info!(
        "Connecting to database at: {}",
        database_url.split('@').next_back().unwrap_or("unknown")
    );
    let db = Database::new(database_url)
        .await
        .context("Failed to initialize database")?
        .with_lock_timeout(config.group_lock_timeout);
    tracing::info!("Database connection established");

    tracing::info!("Running database migrations");
    db.run_migrations()
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Database migrations completed successfully");

    Ok(Arc::new(db))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting GIF-off API");

    let config = Config::from_env().context("Failed to load API configuration")?;
    tracing::info!("Configuration loaded successfully");

    let store = open_store(&config).await?;
    let state = AppState::build(store, &config);

    let api_keys = ApiKeys::from_comma_separated(&config.api_keys);
    if api_keys.is_empty() {
        tracing::warn!("API_KEYS is empty, protected endpoints will reject every request");
    }

    let bind_address = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;
    tracing::info!("Starting server at http://{}", bind_address);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", bind_address);

    axum::serve(listener, app(state, api_keys))
        .await
        .context("Server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use gifoff_storage::services::RatingConfig;
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_app() -> Router {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            database_url: None,
            api_keys: "secret".to_string(),
            group_lock_timeout: Duration::from_millis(500),
            notification_queue: 4,
            rating: RatingConfig::default(),
        };
        let state = AppState::build(Arc::new(MemoryStore::new()), &config);
        app(state, ApiKeys::from_comma_separated(&config.api_keys))
    }

    fn create_group(token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/groups")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder
            .body(Body::from(r#"{"name":"Office"}"#))
            .unwrap()
    }

    #[tokio::test]
    async fn test_bracket_endpoint() {
        let ok = test_app()
            .oneshot(Request::get("/api/brackets/16").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);

        let too_small = test_app()
            .oneshot(Request::get("/api/brackets/1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(too_small.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_protected_endpoint_requires_key() {
        let denied = test_app().oneshot(create_group(None)).await.unwrap();
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

        let wrong = test_app().oneshot(create_group(Some("nope"))).await.unwrap();
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

        let created = test_app().oneshot(create_group(Some("secret"))).await.unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_unknown_group_standings_is_not_found() {
        let response = test_app()
            .oneshot(
                Request::get(format!("/api/groups/{}/standings", uuid::Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
