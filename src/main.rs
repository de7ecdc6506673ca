use tradelog::api::router::create_router;
use tradelog::config::AppConfig;
use tradelog::{db, metrics, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);

    tracing::info!("Connecting to database...");
    let db = db::init_pool(&config.database_url, config.db_max_connections).await?;
    tracing::info!("Database connected");

    sqlx::migrate!("./migrations").run(&db).await?;
    tracing::info!("Migrations applied");

    let metrics_handle = metrics::init_metrics();

    let state = AppState {
        db,
        config,
        metrics_handle,
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router).await?;

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();
}
