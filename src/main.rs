use quiz_backfill::{
    config::{get_config, init_config},
    database::pool::create_pool,
    routes,
    services::scheduler::start_backfill_schedule,
    AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    init_config()?;
    let config = get_config();

    let pool = create_pool(config).await?;
    let app_state = AppState::new(pool, config)?;

    // Keep the scheduler handle alive for as long as the server runs.
    let _scheduler = match config.backfill_schedule.as_deref() {
        Some(schedule) => {
            Some(start_backfill_schedule(app_state.backfill_service.clone(), schedule).await?)
        }
        None => None,
    };

    let app = routes::router(app_state, config.admin_rps);

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
