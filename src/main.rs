use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use portfolio_content::cms::CmsClient;
use portfolio_content::config::Config;
use portfolio_content::contact::ContactGuard;
use portfolio_content::db;
use portfolio_content::routes::{self, AppState};
use portfolio_content::translate::Translator;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("portfolio_content=info".parse()?),
        )
        .init();

    info!("Starting portfolio content service");

    let config = Config::from_env()?;

    let pool = db::connect(&config.database_url).await?;
    db::init_schema(&pool).await?;
    info!("Database ready at {}", config.database_url);

    let http = reqwest::Client::new();
    let cms = CmsClient::from_config(&http, &config);
    let translator = Translator::from_config(http, cms.clone(), &config);

    if config.cms_write_token.is_none() {
        info!("No CMS write token configured; translation and contact persistence are disabled");
    }
    if config.admin_token.is_none() {
        info!("No admin token configured; admin routes are disabled");
    }

    let state = AppState {
        config: config.clone(),
        db: pool,
        cms,
        translator,
        contact_guard: Arc::new(ContactGuard::default()),
    };

    let app = routes::build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
