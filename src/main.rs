//! Multiblog - a small multi-author blogging server

use anyhow::Result;
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use multiblog::{
    api::{self, AppState},
    config::Config,
    db,
    theme::ThemeEngine,
};

const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "multiblog=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Multiblog...");

    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    let applied = db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed ({} applied)", applied);

    let theme_engine = ThemeEngine::new(&config.theme.path, &config.theme.active)?;
    tracing::info!("Theme engine initialized: {}", theme_engine.current_theme());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(pool.clone(), config, theme_engine);

    #[cfg(feature = "demo")]
    seed_demo(&state).await?;

    // Expired sessions are also dropped lazily on lookup
    {
        let users = state.user_service.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SESSION_CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                match users.cleanup_expired_sessions().await {
                    Ok(0) => {}
                    Ok(removed) => tracing::info!("Removed {} expired sessions", removed),
                    Err(e) => tracing::warn!("Session cleanup failed: {}", e),
                }
            }
        });
    }

    let app = api::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("Database pool closed");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

/// Demo mode: a `demo` user (password `demo1234`) with one blog
#[cfg(feature = "demo")]
async fn seed_demo(state: &AppState) -> Result<()> {
    use multiblog::models::{BlogInput, RegisterInput};
    use multiblog::services::UserServiceError;

    let input = RegisterInput {
        username: "demo".to_string(),
        email: "demo@multiblog.local".to_string(),
        password: "demo1234".to_string(),
    };
    match state.user_service.register(input).await {
        Ok(user) => {
            let blog = state
                .blog_service
                .create(
                    user.id,
                    BlogInput {
                        title: "Demo blog".to_string(),
                        description: "Log in as demo / demo1234 to write here.".to_string(),
                    },
                )
                .await?;
            tracing::info!("Demo mode: created user 'demo' and blog {}", blog.id);
        }
        Err(UserServiceError::Duplicate(_)) => {}
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
