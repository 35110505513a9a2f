use anyhow::Context;
use std::time::Duration;
use storage::Database;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod error;
mod features;
mod middleware;
mod routes;
mod state;

use config::Config;
use features::waitlist::{handlers, services};
use middleware::auth::ApiKeys;
use state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::join_waitlist,
        handlers::list_waitlist,
        handlers::get_waitlist_summary,
        handlers::get_my_entry,
        handlers::offer_spot,
        handlers::get_entry,
        handlers::leave_waitlist,
        handlers::respond_to_offer,
        handlers::expire_overdue_offers,
    ),
    components(
        schemas(
            storage::dto::waitlist::JoinWaitlistRequest,
            storage::dto::waitlist::OfferSpotRequest,
            storage::dto::waitlist::RespondToOfferRequest,
            storage::dto::waitlist::WaitlistEntryResponse,
            storage::dto::waitlist::LeaveWaitlistResponse,
            storage::dto::waitlist::WaitlistSummary,
            storage::dto::waitlist::ExpirySweepResponse,
            storage::models::WaitlistEntry,
            storage::models::WaitlistStatus,
        )
    ),
    tags(
        (name = "waitlist", description = "Event waitlist and offer endpoints"),
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

    tracing::info!("Starting waitlist API");

    let config = Config::from_env().context("Failed to load API configuration")?;
    tracing::info!("Configuration loaded successfully");

    let db = match &config.database_url {
        Some(database_url) => {
            tracing::info!(
                "Connecting to database at: {}",
                database_url.split('@').next_back().unwrap_or("unknown")
            );
            let db = Database::new(database_url)
                .await
                .context("Failed to initialize database")?;
            tracing::info!("Database connection established");

            tracing::info!("Running database migrations");
            db.run_migrations()
                .await
                .context("Failed to run migrations")?;
            tracing::info!("Database migrations completed successfully");

            Some(db)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, waitlist entries are kept in memory only");
            None
        }
    };

    let api_keys = ApiKeys::from_comma_separated(&config.api_keys);
    if api_keys.is_empty() {
        tracing::warn!("API_KEYS is empty, organizer endpoints will reject every request");
    }

    let state = AppState {
        waitlist: services::build_coordinator(db.as_ref()),
        offer_hours: config.offer_hours,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    let app = routes::api(api_keys)
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors);

    let bind_address = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server at http://{}", bind_address);
    tracing::info!(
        "Swagger UI available at http://{}/swagger-ui/",
        bind_address
    );

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    axum::serve(listener, app).await?;

    Ok(())
}
