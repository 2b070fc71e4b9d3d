use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use api_rest::AppState;
use hms_core::config::{data_dir_from_env_value, flag_from_env_value};
use hms_core::mailer::ResendMailer;
use hms_core::{CoreConfig, DischargeSummaryStore, YamlFileStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Settings read from the environment once at startup.
struct Settings {
    rest_addr: SocketAddr,
    api_key: String,
    mocks: bool,
    quiet_mocks: bool,
    resend_api_key: Option<String>,
    resend_api_base: Option<String>,
}

/// `RUST_LOG` plus info-level output from the HMS crates and the REST layer.
fn log_filter() -> anyhow::Result<EnvFilter> {
    Ok(EnvFilter::from_default_env()
        .add_directive("hms=info".parse()?)
        .add_directive("api_rest=info".parse()?))
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_required(name: &str) -> anyhow::Result<String> {
    env_opt(name).with_context(|| format!("{name} must be set"))
}

/// Main entry point for the HMS application
///
/// Serves the discharge summary REST API on port 3000 (configurable via HMS_REST_ADDR).
/// Every route except `/health` requires the `x-api-key`, `x-user-id` and `x-hospital-id`
/// headers.
///
/// # Environment Variables
/// - `HMS_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `HMS_DATA_DIR`: Directory for record storage (default: "hms_data")
/// - `API_KEY`: API key expected from the front end (required)
/// - `SESSION_SECRET`: Key for signed cookies (required)
/// - `HONEYPOT_SECRET`: Key for the honeypot timestamp (default: `SESSION_SECRET`)
/// - `TESTING`: Disables the honeypot timestamp check when set
/// - `HMS_ENFORCE_TENANT_MATCH`: Reject posts for another hospital (default: true)
/// - `MOCKS`: Start the mock email API and send mail to it
/// - `RESEND_API_KEY`, `RESEND_API_BASE`: Email provider credentials and endpoint
/// - `HMS_ENV`: `test` silences the mock startup message
///
/// # Returns
/// * `Ok(())` - If the server starts and shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration is invalid or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(log_filter()?)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings {
        rest_addr: std::env::var("HMS_REST_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".into())
            .parse::<SocketAddr>()
            .context("HMS_REST_ADDR is not a socket address")?,
        api_key: env_required("API_KEY")?,
        mocks: flag_from_env_value("MOCKS", std::env::var("MOCKS").ok(), false)?,
        quiet_mocks: std::env::var("HMS_ENV").is_ok_and(|v| v == "test"),
        resend_api_key: env_opt("RESEND_API_KEY"),
        resend_api_base: env_opt("RESEND_API_BASE"),
    };

    let cfg = CoreConfig::new(
        data_dir_from_env_value(std::env::var("HMS_DATA_DIR").ok()),
        &env_required("SESSION_SECRET")?,
        env_opt("HONEYPOT_SECRET").as_deref(),
    )?
    .with_honeypot_valid_from(std::env::var("TESTING").is_err())
    .with_enforce_tenant_match(flag_from_env_value(
        "HMS_ENFORCE_TENANT_MATCH",
        std::env::var("HMS_ENFORCE_TENANT_MATCH").ok(),
        true,
    )?);
    let cfg = Arc::new(cfg);

    let mut resend_api_base = settings.resend_api_base;
    if settings.mocks {
        let server = hms_mocks::start_resend_mock(([127, 0, 0, 1], 0).into()).await?;
        resend_api_base = Some(server.base_url());
        if !settings.quiet_mocks {
            tracing::info!("Mock server installed on {}", server.addr());
        }
        server.shutdown_on_signal();
    }
    // No route sends mail yet; only the resolved endpoint is reported.
    let mailer = ResendMailer::new(resend_api_base, settings.resend_api_key, settings.mocks);
    tracing::info!("++ Email delivery via {}", mailer.base_url());

    let store: Arc<dyn DischargeSummaryStore> = Arc::new(YamlFileStore::from_config(&cfg));
    tracing::info!("++ Records stored under {}", cfg.discharge_summary_dir().display());

    let app = api_rest::router(AppState::new(cfg, store, settings.api_key));

    tracing::info!("++ Starting HMS REST on {}", settings.rest_addr);
    let listener = tokio::net::TcpListener::bind(settings.rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(hms_mocks::shutdown_signal())
        .await?;

    tracing::info!("HMS REST stopped");
    Ok(())
}
