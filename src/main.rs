use axum_extra::extract::cookie::Key;
use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use planforge::db::Storage;
use planforge::llm::client::LlmClient;
use planforge::router::{ForgeState, forge_router};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = &planforge::config::CONFIG;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.database_url,
        gemini_model = %cfg.gemini_model,
        loglevel = %cfg.loglevel,
        llm_configured = cfg.gemini_api_key.as_deref().is_some_and(|k| !k.is_empty()),
    );

    let storage = Storage::connect(&cfg.database_url).await?;

    let llm = LlmClient::from_config(cfg);
    if matches!(llm, LlmClient::Disabled) {
        warn!("PLANFORGE_GEMINI_API_KEY not set; plan generation is unavailable");
    }

    let key = match cfg.session_secret.as_deref() {
        Some(secret) if secret.len() >= 32 => Key::derive_from(secret.as_bytes()),
        Some(_) => {
            warn!("PLANFORGE_SESSION_SECRET shorter than 32 bytes; generating a per-process key");
            Key::generate()
        }
        None => {
            warn!("PLANFORGE_SESSION_SECRET not set; session cookies reset on restart");
            Key::generate()
        }
    };

    let state = ForgeState::new(storage, llm, key);
    let app = forge_router(state);

    let listener = TcpListener::bind(&cfg.bind_addr).await?;
    info!("HTTP server listening on {}", cfg.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
