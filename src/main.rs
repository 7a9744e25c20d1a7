use dotenvy::dotenv;
use thex_bot::{
    bot,
    config::{database, settings},
    errors::Result,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load configuration. A missing token stops startup here.
    let app_config = settings::load_app_config()
        .inspect_err(|e| error!("Critical error loading application configuration: {e}"))?;
    let token = settings::load_token().inspect_err(|e| error!("{e}"))?;
    info!("Command prefix is {:?}", app_config.prefix);

    // 4. Connect and make sure every table exists
    let db = database::create_connection(&app_config.database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {e}"))?;

    // 5. Run the bot
    bot::run_bot(token, app_config, db).await
}
