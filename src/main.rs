use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;
use clinrec_core::{Catalogue, CoreConfig, CoreContext};

/// Main entry point for the clinical records server
///
/// Resolves configuration from the environment once, seeds the test-type catalogue when one
/// is configured, and serves the REST API (with Swagger UI at `/swagger-ui`).
///
/// # Environment Variables
/// - `CLINREC_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `CLINREC_CATALOGUE`: Path to a lab/imaging test-type catalogue (YAML, optional)
/// - `CLINREC_SEQUENCE_PADDING`: Digits in generated record numbers (default: 6)
/// - `CLINREC_<SEQUENCE>_PREFIX`: Prefix override per sequence, e.g. `CLINREC_SURGERY_PREFIX`
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - a configuration value is invalid,
/// - the catalogue cannot be read, parsed or imported, or
/// - the server address cannot be bound.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clinrec=info".parse()?)
                .add_directive("clinrec_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = Arc::new(CoreConfig::from_lookup(|key| std::env::var(key).ok())?);
    let ctx = CoreContext::in_memory(cfg);

    if let Some(path) = std::env::var("CLINREC_CATALOGUE").ok().map(PathBuf::from) {
        tracing::info!("++ Importing catalogue {}", path.display());
        Catalogue::load(&path)?.import(&ctx)?;
    }

    let rest_addr = std::env::var("CLINREC_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    tracing::info!("++ Starting clinical records REST on {}", rest_addr);

    let app = api_rest::router(AppState::new(ctx));
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
